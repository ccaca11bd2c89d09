//! Fixed-size worker pool over statically partitioned file batches.
//!
//! Each worker is an OS thread that owns its batch and a copy of the runner
//! settings; results come back over a channel and are flattened in dispatch
//! order once every worker has been joined. There is no cancellation and no
//! timeout: a worker that never returns stalls the join.

use crate::core::batch::{distinct_paths, partition};
use crate::core::runner::{BatchRunner, RunnerSettings};
use crate::domain::model::{Batch, FileOutcome, FileReport, WorkerResult};
use crate::utils::error::{EtlError, Result};
use crate::utils::logger;
use std::any::Any;
use std::path::{Path, PathBuf};
use std::thread;

/// Lifecycle of one worker as seen by the coordinator.
#[derive(Debug)]
pub enum WorkerState {
    Idle,
    Running(Batch),
    Done(WorkerResult),
    Failed { batch: Batch, error: EtlError },
}

/// A worker that ended without producing a result.
#[derive(Debug)]
pub struct WorkerFailure {
    pub worker_id: usize,
    pub files: Vec<PathBuf>,
    pub error: EtlError,
}

#[derive(Debug, Default)]
pub struct CoordinatorReport {
    /// Per-file outcomes, worker 0's files first.
    pub outcomes: Vec<FileOutcome>,
    pub failed_workers: Vec<WorkerFailure>,
}

impl CoordinatorReport {
    pub fn reports(&self) -> impl Iterator<Item = &FileReport> {
        self.outcomes.iter().filter_map(FileOutcome::report)
    }

    pub fn completed(&self) -> usize {
        self.reports().count()
    }

    pub fn failed_files(&self) -> usize {
        self.outcomes.len() - self.completed()
    }

    pub fn grand_total(&self) -> f64 {
        self.reports().map(|report| report.total_revenue).sum()
    }
}

/// Lists files in `dir` (not recursive) whose extension matches, sorted by path.
pub fn discover_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let wanted = extension.trim_start_matches('.');
    let entries = std::fs::read_dir(dir).map_err(|source| EtlError::FileAccess {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub struct ParallelCoordinator {
    worker_count: usize,
    settings: RunnerSettings,
}

impl ParallelCoordinator {
    pub fn new(worker_count: usize, settings: RunnerSettings) -> Self {
        Self {
            worker_count,
            settings,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    pub fn run_directory<P: AsRef<Path>>(
        &self,
        dir: P,
        extension: &str,
    ) -> Result<CoordinatorReport> {
        let files = discover_files(&dir, extension)?;
        tracing::info!(
            "Found {} .{} file(s) in {}",
            files.len(),
            extension.trim_start_matches('.'),
            dir.as_ref().display()
        );
        self.run(&files)
    }

    /// Partition `files`, process every batch on its own thread and flatten
    /// the results.
    ///
    /// Returns [`EtlError::PartitionInfeasible`] without spawning anything
    /// when there are more workers than distinct files.
    pub fn run<P: Into<PathBuf> + Clone>(&self, files: &[P]) -> Result<CoordinatorReport> {
        let files = distinct_paths(files);
        let batches = partition(&files, self.worker_count);
        if batches.is_empty() {
            return Err(EtlError::PartitionInfeasible {
                workers: self.worker_count,
                files: files.len(),
            });
        }

        let settings = self.settings.clone();
        Ok(self.dispatch(batches, move |batch: &Batch| {
            BatchRunner::new(batch.worker_id, settings.clone()).run(batch)
        }))
    }

    fn dispatch<F>(&self, batches: Vec<Batch>, work: F) -> CoordinatorReport
    where
        F: Fn(&Batch) -> WorkerResult + Send + Clone + 'static,
    {
        let dispatch = logger::current_dispatch();
        let (result_sender, result_receiver) = crossbeam_channel::bounded(batches.len());
        let mut states: Vec<WorkerState> = batches.iter().map(|_| WorkerState::Idle).collect();
        let mut handles = Vec::with_capacity(batches.len());

        for batch in batches {
            let worker_id = batch.worker_id;
            let worker_batch = batch.clone();
            let result_sender = result_sender.clone();
            let dispatch = dispatch.clone();
            let work = work.clone();

            let spawned = thread::Builder::new()
                .name(format!("agg-worker-{}", worker_id))
                .spawn(move || {
                    tracing::dispatcher::with_default(&dispatch, || {
                        let _span = tracing::info_span!("worker", id = worker_id).entered();
                        let result = work(&worker_batch);
                        // 接收端在所有 worker join 之前不會關閉
                        let _ = result_sender.send(result);
                    })
                });

            match spawned {
                Ok(handle) => {
                    states[worker_id] = WorkerState::Running(batch);
                    handles.push((worker_id, handle));
                }
                Err(e) => {
                    tracing::error!("❌ Could not start worker {}: {}", worker_id, e);
                    states[worker_id] = WorkerState::Failed {
                        batch,
                        error: EtlError::WorkerFault {
                            worker_id,
                            message: format!("failed to spawn thread: {}", e),
                        },
                    };
                }
            }
        }
        drop(result_sender);

        for (worker_id, handle) in handles {
            if let Err(payload) = handle.join() {
                let message = panic_message(payload.as_ref());
                tracing::error!("❌ Worker {} panicked: {}", worker_id, message);
                mark_failed(&mut states[worker_id], worker_id, message);
            }
        }

        for result in result_receiver.iter() {
            let worker_id = result.worker_id;
            states[worker_id] = WorkerState::Done(result);
        }

        flatten(states)
    }
}

fn mark_failed(state: &mut WorkerState, worker_id: usize, message: String) {
    let batch = match std::mem::replace(state, WorkerState::Idle) {
        WorkerState::Running(batch) | WorkerState::Failed { batch, .. } => batch,
        WorkerState::Idle | WorkerState::Done(_) => Batch {
            worker_id,
            files: Vec::new(),
        },
    };
    *state = WorkerState::Failed {
        batch,
        error: EtlError::WorkerFault { worker_id, message },
    };
}

fn flatten(states: Vec<WorkerState>) -> CoordinatorReport {
    let mut report = CoordinatorReport::default();

    for (worker_id, state) in states.into_iter().enumerate() {
        match state {
            WorkerState::Done(result) => report.outcomes.extend(result.outcomes),
            WorkerState::Failed { batch, error } => report.failed_workers.push(WorkerFailure {
                worker_id,
                files: batch.files,
                error,
            }),
            WorkerState::Running(batch) => report.failed_workers.push(WorkerFailure {
                worker_id,
                files: batch.files,
                error: EtlError::WorkerFault {
                    worker_id,
                    message: "worker exited without reporting a result".to_string(),
                },
            }),
            WorkerState::Idle => {}
        }
    }

    report
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sales_dir(years: &[u32]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (i, year) in years.iter().enumerate() {
            let content = format!(
                "UnitPrice,TotalPrice,Country\n1.0,{}.5,Germany\n2.0,1.25,India\n",
                i + 1
            );
            fs::write(dir.path().join(format!("{}.csv", year)), content).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "not a csv").unwrap();
        dir
    }

    #[test]
    fn test_discover_files_filters_and_sorts() {
        let dir = sales_dir(&[2022, 2020, 2021]);
        let files = discover_files(dir.path(), ".csv").unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["2020.csv", "2021.csv", "2022.csv"]);
    }

    #[test]
    fn test_discover_missing_dir() {
        assert!(matches!(
            discover_files("no/such/dir", "csv"),
            Err(EtlError::FileAccess { .. })
        ));
    }

    #[test]
    fn test_run_flattens_in_dispatch_order() {
        let dir = sales_dir(&[2015, 2016, 2017, 2018, 2019, 2020, 2021]);
        let coordinator = ParallelCoordinator::new(3, RunnerSettings::default());
        let report = coordinator.run_directory(dir.path(), "csv").unwrap();

        let names: Vec<&str> = report.outcomes.iter().map(|o| o.file_name.as_str()).collect();
        // Batches: [2015, 2016, 2021], [2017, 2018], [2019, 2020]
        assert_eq!(
            names,
            vec!["2015", "2016", "2021", "2017", "2018", "2019", "2020"]
        );
        assert_eq!(report.completed(), 7);
        assert!(report.failed_workers.is_empty());
    }

    #[test]
    fn test_too_many_workers() {
        let dir = sales_dir(&[2020, 2021]);
        let coordinator = ParallelCoordinator::new(3, RunnerSettings::default());
        assert!(matches!(
            coordinator.run_directory(dir.path(), "csv"),
            Err(EtlError::PartitionInfeasible {
                workers: 3,
                files: 2
            })
        ));
    }

    #[test]
    fn test_infeasible_counts_distinct_files() {
        let coordinator = ParallelCoordinator::new(3, RunnerSettings::default());
        let result = coordinator.run(&["a.csv", "a.csv", "b.csv"]);
        assert!(matches!(
            result,
            Err(EtlError::PartitionInfeasible {
                workers: 3,
                files: 2
            })
        ));
    }

    #[test]
    fn test_worker_panic_keeps_sibling_results() {
        let coordinator = ParallelCoordinator::new(3, RunnerSettings::default());
        let batches = partition(&["a.csv", "b.csv", "c.csv", "d.csv"], 3);

        let report = coordinator.dispatch(batches, |batch: &Batch| {
            if batch.worker_id == 1 {
                panic!("out of memory");
            }
            WorkerResult {
                worker_id: batch.worker_id,
                outcomes: batch
                    .files
                    .iter()
                    .map(|path| FileOutcome {
                        file_name: crate::core::runner::file_name_of(path),
                        path: path.clone(),
                        result: Err(EtlError::ProcessingError {
                            message: "stub".to_string(),
                        }),
                    })
                    .collect(),
            }
        });

        let names: Vec<&str> = report.outcomes.iter().map(|o| o.file_name.as_str()).collect();
        assert_eq!(names, vec!["a", "d", "c"]);
        assert_eq!(report.failed_workers.len(), 1);

        let failure = &report.failed_workers[0];
        assert_eq!(failure.worker_id, 1);
        assert_eq!(failure.files, vec![PathBuf::from("b.csv")]);
        match &failure.error {
            EtlError::WorkerFault { message, .. } => assert_eq!(message, "out of memory"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new(String::from("boom"));
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic payload");
    }
}
