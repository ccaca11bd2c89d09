use crate::utils::error::EtlError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// 分組加總結果，鍵的順序為第一次出現的順序
pub type AggregateResult = IndexMap<String, f64>;

/// 標頭列解析出的欄位名稱，依檔案中的順序排列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    columns: Vec<String>,
}

impl ColumnSchema {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// 欄位在資料列中的位置；重複的欄位名稱取第一個
    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.position(column).is_some()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// 一筆資料列：欄位名稱到原始字串值的對應，加上從 0 起算的列索引
#[derive(Debug, Clone)]
pub struct Record {
    index: usize,
    schema: Arc<ColumnSchema>,
    fields: csv::StringRecord,
}

impl Record {
    pub(crate) fn new(index: usize, schema: Arc<ColumnSchema>, fields: csv::StringRecord) -> Self {
        Self {
            index,
            schema,
            fields,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.schema
            .position(column)
            .and_then(|position| self.fields.get(position))
    }

    /// 依標頭順序列出 (欄位, 值)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.schema
            .columns()
            .iter()
            .map(String::as_str)
            .zip(self.fields.iter())
    }
}

/// 單一欄位的統計快照；count 為 0 時 mean/min/max 為 None
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub count: u64,
    pub sum: f64,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// 每個檔案的輸出紀錄，交給報表與繪圖等下游使用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub total_revenue: f64,
    pub revenue_per_region: AggregateResult,
    pub file_name: String,
    #[serde(default)]
    pub statistics: IndexMap<String, StatsSnapshot>,
    #[serde(default)]
    pub rows: usize,
    #[serde(default)]
    pub skipped_rows: usize,
}

/// 單一檔案的處理結果，失敗不會影響同批次的其他檔案
#[derive(Debug)]
pub struct FileOutcome {
    pub file_name: String,
    pub path: PathBuf,
    pub result: Result<FileReport, EtlError>,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn report(&self) -> Option<&FileReport> {
        self.result.as_ref().ok()
    }
}

/// 指派給單一 worker 的檔案集合
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub worker_id: usize,
    pub files: Vec<PathBuf>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// 單一 worker 依序產生的檔案結果
#[derive(Debug)]
pub struct WorkerResult {
    pub worker_id: usize,
    pub outcomes: Vec<FileOutcome>,
}

/// 遇到欄位數不足的資料列時的處理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaPolicy {
    /// 略過該列並計數
    #[default]
    Skip,
    /// 整個檔案以 SchemaMismatch 失敗
    Fail,
}

impl std::str::FromStr for SchemaPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(SchemaPolicy::Skip),
            "fail" => Ok(SchemaPolicy::Fail),
            other => Err(format!("unknown short-row policy '{}' (expected skip or fail)", other)),
        }
    }
}

impl std::fmt::Display for SchemaPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaPolicy::Skip => write!(f, "skip"),
            SchemaPolicy::Fail => write!(f, "fail"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_lookup_by_column_name() {
        let schema = Arc::new(ColumnSchema::new(vec![
            "StockCode".to_string(),
            "Country".to_string(),
            "TotalPrice".to_string(),
        ]));
        let record = Record::new(
            3,
            schema,
            csv::StringRecord::from(vec!["22180", "Russia", "79.84"]),
        );

        assert_eq!(record.index(), 3);
        assert_eq!(record.get("Country"), Some("Russia"));
        assert_eq!(record.get("Quantity"), None);

        let pairs: Vec<_> = record.iter().collect();
        assert_eq!(pairs[2], ("TotalPrice", "79.84"));
    }

    #[test]
    fn test_schema_policy_from_str() {
        assert_eq!("skip".parse::<SchemaPolicy>().unwrap(), SchemaPolicy::Skip);
        assert_eq!(" FAIL ".parse::<SchemaPolicy>().unwrap(), SchemaPolicy::Fail);
        assert!("pad".parse::<SchemaPolicy>().is_err());
    }

    #[test]
    fn test_file_report_serializes_expected_keys() {
        let mut per_region = AggregateResult::new();
        per_region.insert("Germany".to_string(), 24.96);
        let report = FileReport {
            total_revenue: 24.96,
            revenue_per_region: per_region,
            file_name: "2021".to_string(),
            statistics: IndexMap::new(),
            rows: 1,
            skipped_rows: 0,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["file_name"], "2021");
        assert_eq!(json["revenue_per_region"]["Germany"], 24.96);
        assert!(json.get("total_revenue").is_some());
    }
}
