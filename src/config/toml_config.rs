use crate::core::{ConfigProvider, SchemaPolicy};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub job: JobConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub parallel: ParallelConfig,
    #[serde(default)]
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub data_dir: String,
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub value_column: String,
    pub group_column: String,
    pub stats_columns: Vec<String>,
    pub on_short_row: SchemaPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// 未設定時為 3；設為 0 時使用 CPU 核心數。
    /// worker 數多於檔案數時整個執行會以 PartitionInfeasible 失敗，
    /// 因此 0 只適合檔案數不少於核心數的資料目錄。
    pub workers: usize,
}

pub const DEFAULT_WORKERS: usize = 3;

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub output_path: String,
    pub write_reports: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
    /// 額外寫入的日誌檔，例如 `logs/main_logs.txt`
    pub log_file: Option<String>,
}

fn default_extension() -> String {
    "csv".to_string()
}

fn default_delimiter() -> char {
    ','
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            value_column: "TotalPrice".to_string(),
            group_column: "Country".to_string(),
            stats_columns: vec!["UnitPrice".to_string(), "TotalPrice".to_string()],
            on_short_row: SchemaPolicy::Skip,
        }
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
            write_reports: true,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|source| EtlError::FileAccess {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，未定義的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("job.name", &self.job.name)?;
        validation::validate_path("source.data_dir", &self.source.data_dir)?;
        validation::validate_extension("source.extension", &self.source.extension)?;
        validation::validate_delimiter("source.delimiter", self.source.delimiter)?;
        validation::validate_non_empty_string(
            "aggregation.value_column",
            &self.aggregation.value_column,
        )?;
        validation::validate_non_empty_string(
            "aggregation.group_column",
            &self.aggregation.group_column,
        )?;
        validation::validate_columns("aggregation.stats_columns", &self.aggregation.stats_columns)?;

        if self.load.write_reports {
            validation::validate_path("load.output_path", &self.load.output_path)?;
        }

        Ok(())
    }

    /// 實際使用的 worker 數
    pub fn workers(&self) -> usize {
        match self.parallel.workers {
            0 => num_cpus::get(),
            n => n,
        }
    }

    /// 取得監控設定
    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_file.as_deref())
            .map(Path::new)
    }
}

impl ConfigProvider for TomlConfig {
    fn data_dir(&self) -> &str {
        &self.source.data_dir
    }

    fn file_extension(&self) -> &str {
        &self.source.extension
    }

    fn delimiter(&self) -> char {
        self.source.delimiter
    }

    fn worker_count(&self) -> usize {
        self.workers()
    }

    fn value_column(&self) -> &str {
        &self.aggregation.value_column
    }

    fn group_column(&self) -> &str {
        &self.aggregation.group_column
    }

    fn stats_columns(&self) -> &[String] {
        &self.aggregation.stats_columns
    }

    fn schema_policy(&self) -> SchemaPolicy {
        self.aggregation.on_short_row
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
