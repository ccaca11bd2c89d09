use crate::utils::error::{EtlError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 分隔符號必須是單一 ASCII 字元，且不能是換行字元
pub fn validate_delimiter(field_name: &str, delimiter: char) -> Result<u8> {
    if !delimiter.is_ascii() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: delimiter.to_string(),
            reason: "Delimiter must be a single ASCII character".to_string(),
        });
    }

    if matches!(delimiter, '\n' | '\r') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: delimiter.escape_default().to_string(),
            reason: "Delimiter cannot be a line terminator".to_string(),
        });
    }

    Ok(delimiter as u8)
}

pub fn validate_extension(field_name: &str, extension: &str) -> Result<()> {
    let trimmed = extension.trim_start_matches('.');
    if trimmed.is_empty() || trimmed.contains(['/', '\\']) {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: extension.to_string(),
            reason: "Extension must be a plain suffix such as 'csv'".to_string(),
        });
    }
    Ok(())
}

pub fn validate_columns(field_name: &str, columns: &[String]) -> Result<()> {
    for column in columns {
        validate_non_empty_string(field_name, column)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("workers", 5, 1).is_ok());
        assert!(validate_positive_number("workers", 0, 1).is_err());
    }

    #[test]
    fn test_validate_delimiter() {
        assert_eq!(validate_delimiter("delimiter", ',').unwrap(), b',');
        assert_eq!(validate_delimiter("delimiter", '\t').unwrap(), b'\t');
        assert!(validate_delimiter("delimiter", '\n').is_err());
        assert!(validate_delimiter("delimiter", '§').is_err());
    }

    #[test]
    fn test_validate_extension() {
        assert!(validate_extension("extension", "csv").is_ok());
        assert!(validate_extension("extension", ".tsv").is_ok());
        assert!(validate_extension("extension", ".").is_err());
        assert!(validate_extension("extension", "a/b").is_err());
    }

    #[test]
    fn test_validate_columns() {
        let ok = vec!["UnitPrice".to_string(), "TotalPrice".to_string()];
        assert!(validate_columns("stats_columns", &ok).is_ok());

        let blank = vec!["UnitPrice".to_string(), "  ".to_string()];
        assert!(validate_columns("stats_columns", &blank).is_err());
    }
}
