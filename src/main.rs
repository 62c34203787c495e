use anyhow::Result;
use clap::Parser;
use muni_anomaly::{
    config::{Settings, YearSetting},
    pipeline,
};
use std::{path::PathBuf, process::ExitCode};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Flag anomalous, missing and non-numeric municipal metrics for a target year"
)]
struct Args {
    /// CSV with two header rows (metric codes, metric names)
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// Directory the report is written to
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// |z| above which a value is an anomaly [default: 2.0]
    #[arg(short, long)]
    threshold: Option<f64>,
    #[arg(short = 'y', long)]
    target_year: Option<String>,
    /// jurisdiction, category or none
    #[arg(long)]
    split_by: Option<String>,
    /// keep-first or reject
    #[arg(long)]
    on_duplicate: Option<String>,
    /// YAML file with the same keys; flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(output) => {
            println!(
                "✅ Anomaly detection complete! Output saved to: {}",
                output.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            println!("❌ Error during anomaly detection: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<PathBuf> {
    let file = match &args.config {
        Some(path) => Settings::from_yaml_file(path)?,
        None => Settings::default(),
    };
    let flags = Settings {
        input: args.input,
        output: args.output,
        threshold: args.threshold,
        target_year: args.target_year.map(YearSetting::Text),
        split_by: args.split_by,
        on_duplicate: args.on_duplicate,
    };
    let config = file.merge(flags).resolve()?;
    info!(
        threshold = config.detect.threshold(),
        target_year = config.detect.target_year(),
        "starting"
    );

    let summary = pipeline::run(&config)?;
    Ok(summary.output)
}
