use crate::utils::error::{EtlError, Result};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::dispatcher::{self, DefaultGuard, Dispatch};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Layer, Registry};

/// 日誌收集器的生命週期控制
///
/// 建立時將 subscriber 設為目前執行緒的預設值，drop 時還原。
/// 工作執行緒透過 [`current_dispatch`] 取得同一個 subscriber。
pub struct LogGuard {
    dispatch: Dispatch,
    _guard: DefaultGuard,
}

impl LogGuard {
    fn install(dispatch: Dispatch) -> Self {
        let guard = dispatcher::set_default(&dispatch);
        Self {
            dispatch,
            _guard: guard,
        }
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("sales_etl=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sales_etl=info"))
    }
}

type FileLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// 額外把日誌附加寫入檔案（不含顏色碼），目錄不存在時會自動建立
fn file_layer(log_file: Option<&Path>) -> Result<Option<FileLayer>> {
    let Some(path) = log_file else {
        return Ok(None);
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| EtlError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;

    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_thread_names(true)
        .with_writer(Mutex::new(file));
    Ok(Some(layer.boxed()))
}

pub fn init_cli_logger(verbose: bool, log_file: Option<&Path>) -> Result<LogGuard> {
    let subscriber = tracing_subscriber::registry()
        .with(file_layer(log_file)?)
        .with(env_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_names(true)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        );

    Ok(LogGuard::install(Dispatch::new(subscriber)))
}

pub fn init_json_logger(verbose: bool, log_file: Option<&Path>) -> Result<LogGuard> {
    let subscriber = tracing_subscriber::registry()
        .with(file_layer(log_file)?)
        .with(env_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_names(true)
                .with_file(false)
                .with_line_number(false)
                .json(), // 方便交給外部的日誌收集系統
        );

    Ok(LogGuard::install(Dispatch::new(subscriber)))
}

/// 目前執行緒使用中的 subscriber，用來傳遞給新開的工作執行緒
pub fn current_dispatch() -> Dispatch {
    dispatcher::get_default(|dispatch| dispatch.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::subscriber::NoSubscriber;

    #[test]
    fn test_guard_scopes_dispatch_to_current_thread() {
        let guard = init_cli_logger(false, None).unwrap();
        assert!(!current_dispatch().is::<NoSubscriber>());

        drop(guard);
        assert!(current_dispatch().is::<NoSubscriber>());
    }

    #[test]
    fn test_log_file_receives_events() {
        let dir = tempfile::TempDir::new().unwrap();
        let log_path = dir.path().join("logs").join("main_logs.txt");

        let guard = init_cli_logger(false, Some(&log_path)).unwrap();
        tracing::info!(target: "sales_etl", "written to file");
        drop(guard);

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("written to file"));
        assert!(content.contains("INFO"));
        assert!(!content.contains("\u{1b}["));
    }

    #[test]
    fn test_unwritable_log_file_is_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = init_json_logger(false, Some(dir.path()));
        assert!(matches!(result, Err(EtlError::FileAccess { .. })));
    }
}
