//! Mock Stub Registry - CLI Entry Point

use anyhow::Result;
use clap::Parser;
use mock_stub_registry::{MockConfig, Scenario};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "stub-registry",
    about = "Replay calls against declarative mocks and verify them",
    version
)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "stubs.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Print default configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout carries only outcomes
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.print_config {
        let default_config = include_str!("../demos/default-config.yaml");
        println!("{}", default_config);
        return Ok(());
    }

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {:?}", args.config);
    }
    info!(path = ?args.config, "Loading configuration");
    let config = MockConfig::from_file(&args.config)?;

    if args.validate {
        let stubs: usize = config.mocks.iter().map(|m| m.stubs.len()).sum();
        println!(
            "Configuration is valid ({} mocks, {} stubs defined)",
            config.mocks.len(),
            stubs
        );
        return Ok(());
    }

    let scenario = Scenario::new(config)?;
    let report = scenario.run()?;

    for call in &report.calls {
        println!("{}", serde_json::to_string(call)?);
    }
    for verification in &report.verifications {
        println!("{}", serde_json::to_string(verification)?);
    }

    if !report.passed() {
        anyhow::bail!(
            "{} of {} verifications failed",
            report.failed_verifications(),
            report.verifications.len()
        );
    }

    info!(
        calls = report.calls.len(),
        verifications = report.verifications.len(),
        "All verifications passed"
    );
    Ok(())
}
