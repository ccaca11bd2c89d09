pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalStorage, CliConfig};

pub use config::toml_config::TomlConfig;
pub use core::{
    aggregate::AggregationPlan,
    coordinator::{CoordinatorReport, ParallelCoordinator},
    etl::{EtlEngine, RunSummary, WriteFailure},
    runner::{BatchRunner, RunnerSettings},
};
pub use utils::error::{EtlError, Result};
