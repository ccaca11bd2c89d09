const UNITS: [&str; 5] = ["", " Thousand", " Million", " Billion", " Trillion"];

/// 以千進位單位顯示金額，例如 `1_234_567.0` -> `1 Million`
pub fn human_readable(number: f64) -> String {
    let magnitude = if number == 0.0 || !number.is_finite() {
        0
    } else {
        ((number.abs().log10() / 3.0).floor() as i64).clamp(0, UNITS.len() as i64 - 1) as usize
    };

    let scaled = number / 10f64.powi(3 * magnitude as i32);
    format!("{:.0}{}", scaled, UNITS[magnitude])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_readable() {
        assert_eq!(human_readable(0.0), "0");
        assert_eq!(human_readable(999.0), "999");
        assert_eq!(human_readable(12_345.0), "12 Thousand");
        assert_eq!(human_readable(1_234_567.0), "1 Million");
        assert_eq!(human_readable(-2_600_000_000.0), "-3 Billion");
        assert_eq!(human_readable(4.2e18), "4200000 Trillion");
    }

    #[test]
    fn test_fractions_below_one() {
        assert_eq!(human_readable(0.4), "0");
    }
}
