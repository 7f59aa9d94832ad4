use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::Level;

use gcpinv::collectors;
use gcpinv::config::Config;
use gcpinv::export;
use gcpinv::gcp::client::{format_gcp_error, GcpClient};
use gcpinv::inventory::registry::ConstructorRegistry;

/// Cloud inventory exporter for GCP
#[derive(Parser, Debug)]
#[command(name = "gcpinv", version = gcpinv::VERSION, about, long_about = None)]
struct Args {
    /// GCP project to inventory
    #[arg(short, long)]
    project: Option<String>,

    /// Comma-separated list of regions (defaults to configured regions)
    #[arg(short, long)]
    regions: Option<String>,

    /// Directory to write CSV files to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Comma-separated subset of collectors to run (defaults to all)
    #[arg(short, long)]
    collectors: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .init();

    tracing::info!("gcpinv started with log level: {:?}", level);

    Some(guard)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let config = Config::load();
    let project = args
        .project
        .clone()
        .unwrap_or_else(|| config.effective_project());

    if project.is_empty() {
        return Err(anyhow::anyhow!(
            "No GCP project configured. Set GOOGLE_CLOUD_PROJECT or use --project flag"
        ));
    }

    let regions = match args.regions.as_deref() {
        Some(list) => split_list(list),
        None => config.effective_regions(),
    };
    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| config.effective_output_dir());

    tracing::info!("Using project: {}, regions: {:?}", project, regions);

    let client = GcpClient::new(&project).await?;

    // Phase one: register constructors. Phase two: build the shared name
    // cache and instantiate everything. Any failure here is fatal - the run
    // never starts with a partial collector set.
    let mut constructors = ConstructorRegistry::new();
    collectors::register_defaults(&mut constructors);
    if let Some(subset) = args.collectors.as_deref() {
        constructors.retain_named(&split_list(subset))?;
    }

    let registry = constructors.instantiate(&client, &regions).await?;

    std::fs::create_dir_all(&output_dir)?;

    let mut total_rows = 0usize;
    for name in registry.names() {
        let Some(collector) = registry.get(name) else {
            continue;
        };

        let mut rows = Vec::new();
        for region in &regions {
            match collector.collect(region).await {
                Ok(mut resources) => {
                    tracing::info!("{}: {} resources in {}", name, resources.len(), region);
                    rows.append(&mut resources);
                }
                Err(e) => {
                    // A single collector/region failure leaves the rest of
                    // the run intact.
                    tracing::error!("{} failed in {}: {}", name, region, e);
                    eprintln!("{} failed in {}: {}", name, region, format_gcp_error(&e));
                }
            }
        }

        let count = rows.len();
        let path = export::write_collector_csv(&output_dir, collector.as_ref(), rows)?;
        println!("{} -> {} rows ({})", name, count, path.display());
        total_rows += count;
    }

    println!(
        "Inventory complete: {} rows across {} collectors in {}",
        total_rows,
        registry.len(),
        output_dir.display()
    );

    Ok(())
}
