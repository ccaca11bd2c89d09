#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::{ConfigProvider, SchemaPolicy};
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "sales-etl")]
#[command(about = "Aggregate revenue per region over a folder of CSV files in parallel")]
pub struct CliConfig {
    /// Folder containing the input files
    #[arg(long, default_value = "./data")]
    pub data_dir: String,

    /// Only files with this extension are processed
    #[arg(long, default_value = "csv")]
    pub extension: String,

    #[arg(long, default_value = "3")]
    pub workers: usize,

    #[arg(long, default_value = ",")]
    pub delimiter: char,

    #[arg(long, default_value = "TotalPrice")]
    pub value_column: String,

    #[arg(long, default_value = "Country")]
    pub group_column: String,

    #[arg(long, value_delimiter = ',', default_values = ["UnitPrice", "TotalPrice"])]
    pub stats_columns: Vec<String>,

    /// What to do with rows that have fewer fields than the header: skip or fail
    #[arg(long, default_value = "skip")]
    pub on_short_row: SchemaPolicy,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    /// Aggregate only, do not write JSON reports
    #[arg(long)]
    pub no_write: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    /// Also append logs to this file, e.g. logs/main_logs.txt
    #[arg(long)]
    pub log_file: Option<String>,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn data_dir(&self) -> &str {
        &self.data_dir
    }

    fn file_extension(&self) -> &str {
        &self.extension
    }

    fn delimiter(&self) -> char {
        self.delimiter
    }

    fn worker_count(&self) -> usize {
        self.workers
    }

    fn value_column(&self) -> &str {
        &self.value_column
    }

    fn group_column(&self) -> &str {
        &self.group_column
    }

    fn stats_columns(&self) -> &[String] {
        &self.stats_columns
    }

    fn schema_policy(&self) -> SchemaPolicy {
        self.on_short_row
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("data_dir", &self.data_dir)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_extension("extension", &self.extension)?;
        validation::validate_positive_number("workers", self.workers, 1)?;
        validation::validate_delimiter("delimiter", self.delimiter)?;
        validation::validate_non_empty_string("value_column", &self.value_column)?;
        validation::validate_non_empty_string("group_column", &self.group_column)?;
        validation::validate_columns("stats_columns", &self.stats_columns)?;
        Ok(())
    }
}
