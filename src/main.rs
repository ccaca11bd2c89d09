use clap::Parser;
use sales_etl::utils::error::{EtlError, ErrorSeverity};
use sales_etl::utils::format::human_readable;
use sales_etl::utils::{logger, validation::Validate};
use sales_etl::{CliConfig, EtlEngine, LocalStorage, RunSummary};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌，guard 存活期間有效
    let log_file = config.log_file.as_deref().map(Path::new);
    let _log_guard = if config.json_logs {
        logger::init_json_logger(config.verbose, log_file)?
    } else {
        logger::init_cli_logger(config.verbose, log_file)?
    };

    tracing::info!("Starting sales-etl CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let write_reports = !config.no_write;
    let storage = LocalStorage::new(config.output_path.clone());
    let engine = EtlEngine::new_with_monitoring(storage, config, monitor_enabled)
        .with_report_writing(write_reports);

    match engine.run().await {
        Ok(summary) => print_summary(&summary),
        Err(e) => exit_with(e),
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    for report in summary.report.reports() {
        println!(
            "📄 {}: total revenue {} ({:.2}) across {} region(s)",
            report.file_name,
            human_readable(report.total_revenue),
            report.total_revenue,
            report.revenue_per_region.len()
        );
    }

    println!(
        "✅ {} file(s) aggregated, {} failed, grand total {}",
        summary.completed(),
        summary.failed_files(),
        human_readable(summary.grand_total())
    );
    if let Some(dir) = &summary.output_dir {
        println!("📁 Reports saved to: {}", dir.display());
    }
    for failure in &summary.write_failures {
        eprintln!("⚠️ {} was not saved: {}", failure.file_name, failure.error);
    }
    if !summary.report.failed_workers.is_empty() {
        eprintln!(
            "⚠️ {} worker(s) failed; their files were not processed",
            summary.report.failed_workers.len()
        );
    }
}

fn exit_with(e: EtlError) {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };

    if exit_code > 0 {
        std::process::exit(exit_code);
    }
}
