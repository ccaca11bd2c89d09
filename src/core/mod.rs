pub mod aggregate;
pub mod batch;
pub mod coordinator;
pub mod etl;
pub mod reader;
pub mod runner;
pub mod stats;

pub use crate::domain::model::{
    AggregateResult, Batch, ColumnSchema, FileOutcome, FileReport, Record, SchemaPolicy,
    StatsSnapshot, WorkerResult,
};
pub use crate::domain::ports::{ConfigProvider, Storage};
pub use crate::utils::error::Result;
