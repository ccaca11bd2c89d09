use crate::core::aggregate::{summarize, AggregationPlan};
use crate::core::reader::{ReaderOptions, RowReader};
use crate::domain::model::{Batch, FileOutcome, FileReport, WorkerResult};
use crate::utils::error::Result;
use std::path::Path;
use std::time::Instant;

/// 每個 worker 各自持有一份的處理設定
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerSettings {
    pub plan: AggregationPlan,
    pub reader: ReaderOptions,
}

/// 檔案識別名稱：去掉副檔名的檔名，例如 `data/2021.csv` -> `2021`
pub fn file_name_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// 依序處理一個批次內的所有檔案
pub struct BatchRunner {
    worker_id: usize,
    settings: RunnerSettings,
}

impl BatchRunner {
    pub fn new(worker_id: usize, settings: RunnerSettings) -> Self {
        Self {
            worker_id,
            settings,
        }
    }

    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// 單一檔案失敗只會記錄在該檔案的結果中，批次會繼續處理下一個檔案
    pub fn run(&self, batch: &Batch) -> WorkerResult {
        let started = Instant::now();
        tracing::info!(
            "Worker {} starting batch of {} file(s)",
            self.worker_id,
            batch.len()
        );

        let outcomes: Vec<FileOutcome> = batch
            .files
            .iter()
            .map(|path| self.process_file(path))
            .collect();

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        tracing::info!(
            "Batch for worker {} finished in {:?} ({} ok, {} failed)",
            self.worker_id,
            started.elapsed(),
            outcomes.len() - failed,
            failed
        );

        WorkerResult {
            worker_id: self.worker_id,
            outcomes,
        }
    }

    pub fn process_file(&self, path: &Path) -> FileOutcome {
        let file_name = file_name_of(path);
        let started = Instant::now();
        let result = self.aggregate_file(path, &file_name);

        match &result {
            Ok(report) => {
                tracing::debug!(
                    "{}: {} rows ({} skipped), total {:.2} in {:?}",
                    file_name,
                    report.rows,
                    report.skipped_rows,
                    report.total_revenue,
                    started.elapsed()
                );
                for (column, stats) in &report.statistics {
                    tracing::debug!("{} {}: {:?}", file_name, column, stats);
                }
            }
            Err(e) => {
                tracing::warn!("❌ {} failed: {}", path.display(), e);
            }
        }

        FileOutcome {
            file_name,
            path: path.to_path_buf(),
            result,
        }
    }

    fn aggregate_file(&self, path: &Path, file_name: &str) -> Result<FileReport> {
        let mut rows = RowReader::open(path, &self.settings.reader)?;
        self.settings.plan.check_schema(rows.schema())?;
        let summary = summarize(rows.by_ref(), &self.settings.plan)?;

        Ok(FileReport {
            total_revenue: summary.total,
            revenue_per_region: summary.per_group,
            file_name: file_name.to_string(),
            statistics: summary.stats,
            rows: summary.rows,
            skipped_rows: rows.skipped_rows(),
        })
    }
}
