use crate::core::aggregate::AggregationPlan;
use crate::core::coordinator::{CoordinatorReport, ParallelCoordinator};
use crate::core::reader::ReaderOptions;
use crate::core::runner::RunnerSettings;
use crate::core::{ConfigProvider, FileReport, Storage};
use crate::utils::error::{EtlError, Result};
use crate::utils::logger;
use crate::utils::monitor::SystemMonitor;
use crate::utils::validation::validate_delimiter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// 輸出資料夾名稱格式，例如 `March 05 2024 14-03-59`
pub const OUTPUT_DIR_FORMAT: &str = "%B %d %Y %H-%M-%S";

/// 寫出失敗的單一報表；其他報表照常寫出
#[derive(Debug)]
pub struct WriteFailure {
    pub file_name: String,
    pub error: EtlError,
}

#[derive(Debug)]
pub struct RunSummary {
    /// 報表寫入的資料夾；未寫入時為 None
    pub output_dir: Option<PathBuf>,
    pub report: CoordinatorReport,
    pub write_failures: Vec<WriteFailure>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn completed(&self) -> usize {
        self.report.completed()
    }

    pub fn failed_files(&self) -> usize {
        self.report.failed_files()
    }

    pub fn grand_total(&self) -> f64 {
        self.report.grand_total()
    }
}

pub struct EtlEngine<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    monitor: SystemMonitor,
    write_reports: bool,
}

impl<S: Storage, C: ConfigProvider> EtlEngine<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self::new_with_monitoring(storage, config, false)
    }

    pub fn new_with_monitoring(storage: S, config: C, monitor_enabled: bool) -> Self {
        Self {
            storage,
            config,
            monitor: SystemMonitor::new(monitor_enabled),
            write_reports: true,
        }
    }

    /// 關閉後只做彙總，不寫出 JSON 報表
    pub fn with_report_writing(mut self, enabled: bool) -> Self {
        self.write_reports = enabled;
        self
    }

    pub fn coordinator(&self) -> Result<ParallelCoordinator> {
        let delimiter = validate_delimiter("delimiter", self.config.delimiter())?;
        let settings = RunnerSettings {
            plan: AggregationPlan {
                value_column: self.config.value_column().to_string(),
                group_column: self.config.group_column().to_string(),
                stats_columns: self.config.stats_columns().to_vec(),
            },
            reader: ReaderOptions {
                delimiter,
                on_short_row: self.config.schema_policy(),
            },
        };
        Ok(ParallelCoordinator::new(self.config.worker_count(), settings))
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        tracing::info!("Starting aggregation with {} worker(s)", self.config.worker_count());
        self.monitor.log_stats("Start");

        // Aggregate
        let coordinator = self.coordinator()?;
        let data_dir = PathBuf::from(self.config.data_dir());
        let extension = self.config.file_extension().to_string();
        let dispatch = logger::current_dispatch();

        let report = tokio::task::spawn_blocking(move || {
            tracing::dispatcher::with_default(&dispatch, || {
                coordinator.run_directory(&data_dir, &extension)
            })
        })
        .await
        .map_err(|e| EtlError::ProcessingError {
            message: format!("aggregation task failed: {}", e),
        })??;

        self.monitor.log_stats("Aggregation");
        self.log_failures(&report);

        // Load
        let (output_dir, write_failures) = if self.write_reports {
            let (dir, failures) = self.load(&report).await;
            (Some(dir), failures)
        } else {
            (None, Vec::new())
        };
        self.monitor.log_final_stats();

        let elapsed = started.elapsed();
        tracing::info!("Overall time taken: {:?}", elapsed);

        Ok(RunSummary {
            output_dir,
            report,
            write_failures,
            elapsed,
        })
    }

    fn log_failures(&self, report: &CoordinatorReport) {
        for outcome in &report.outcomes {
            if let Err(e) = &outcome.result {
                tracing::warn!(
                    "⚠️ {} skipped: {} ({})",
                    outcome.file_name,
                    e,
                    e.recovery_suggestion()
                );
            }
        }
        for failure in &report.failed_workers {
            tracing::error!(
                "❌ {} ({} file(s) not processed)",
                failure.error,
                failure.files.len()
            );
        }
    }

    async fn load(&self, report: &CoordinatorReport) -> (PathBuf, Vec<WriteFailure>) {
        let folder = chrono::Local::now().format(OUTPUT_DIR_FORMAT).to_string();
        let mut failures = Vec::new();

        for file_report in report.reports() {
            let path = format!("{}/{}.json", folder, file_report.file_name);
            if let Err(error) = self.write_report(&path, file_report).await {
                tracing::error!("❌ Failed to write {}: {}", path, error);
                failures.push(WriteFailure {
                    file_name: file_report.file_name.clone(),
                    error,
                });
            }
        }

        (Path::new(self.config.output_path()).join(folder), failures)
    }

    async fn write_report(&self, path: &str, file_report: &FileReport) -> Result<()> {
        let data = serde_json::to_vec(file_report)?;
        tracing::debug!("Writing {} ({} bytes)", path, data.len());
        self.storage.write_file(path, &data).await
    }
}
