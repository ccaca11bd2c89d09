use anyhow::Context;
use clap::Parser;
use sales_etl::core::batch::partition;
use sales_etl::core::coordinator::discover_files;
use sales_etl::core::ConfigProvider;
use sales_etl::utils::format::human_readable;
use sales_etl::utils::{logger, validation::Validate};
use sales_etl::{EtlEngine, LocalStorage, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-etl")]
#[command(about = "Revenue aggregation driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "etl-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override worker count from config
    #[arg(long)]
    workers: Option<usize>,

    /// Dry run - show the batches that would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;

    let verbose = args.verbose || config.log_level() == Some("debug");
    let _log_guard = logger::init_cli_logger(verbose, config.log_file())
        .context("failed to open the log file")?;

    tracing::info!("🚀 Starting TOML-based aggregation");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(workers) = args.workers {
        config.parallel.workers = workers;
        tracing::info!("🔧 Worker count overridden to: {}", workers);
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("{} ({})", e.user_friendly_message(), e.recovery_suggestion()))?;

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        return perform_dry_run(&config);
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    let write_reports = config.load.write_reports;
    let storage = LocalStorage::new(config.output_path().to_string());
    let engine = EtlEngine::new_with_monitoring(storage, config, monitor_enabled)
        .with_report_writing(write_reports);

    let summary = engine.run().await.context("aggregation run failed")?;

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

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Job: {}", config.job.name);
    if !config.job.description.is_empty() {
        println!("  Description: {}", config.job.description);
    }
    println!(
        "  Source: {} (*.{}, delimiter {:?})",
        config.data_dir(),
        config.file_extension(),
        config.delimiter()
    );
    println!(
        "  Aggregate: sum of {} grouped by {}",
        config.value_column(),
        config.group_column()
    );
    println!("  Statistics: {}", config.stats_columns().join(", "));
    println!("  Short rows: {}", config.schema_policy());
    println!("  Workers: {}", config.worker_count());
    println!("  Output: {}", config.output_path());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }
}

fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    let files = discover_files(config.data_dir(), config.file_extension())
        .with_context(|| format!("cannot list {}", config.data_dir()))?;
    let batches = partition(&files, config.worker_count());

    if batches.is_empty() {
        anyhow::bail!(
            "{} worker(s) requested but only {} file(s) found",
            config.worker_count(),
            files.len()
        );
    }

    for batch in &batches {
        println!("  Worker {} ({} file(s)):", batch.worker_id, batch.len());
        for file in &batch.files {
            println!("    - {}", file.display());
        }
    }

    Ok(())
}
