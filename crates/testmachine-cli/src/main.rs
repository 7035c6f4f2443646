//! Binary entrypoint for the TestMachine demos.
//!
//! ```text
//! testmachine [floats|integers]
//! ```
//!
//! Environment:
//! - `TESTMACHINE_SEED`: run seed (printed with every result)
//! - `TESTMACHINE_TRIALS`: trial budget
//! - `TESTMACHINE_CONFIG`: YAML file with a full `SearchConfig`
//! - `TESTMACHINE_JSON`: also print the run as JSON
//! - `RUST_LOG`: log filter, `info` by default
mod demos;

use anyhow::{Context, Result};
use testmachine_core::SearchConfig;
use testmachine_report::{to_json, TextReporter};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let demo = std::env::args().nth(1).unwrap_or_else(|| "floats".to_string());
    if demo == "--help" || demo == "-h" {
        print_usage();
        return Ok(());
    }

    let config = load_config()?;
    let mut machine = demos::build(&demo, config)?;
    machine.set_reporter(TextReporter::stdout()?);

    info!(demo = %demo, "running demo");
    let result = machine.run()?;
    info!(summary = %result.summary(), "done");

    if std::env::var("TESTMACHINE_JSON").is_ok() {
        println!("{}", serde_json::to_string_pretty(&to_json(&result)?)?);
    }
    Ok(())
}

/// `TESTMACHINE_CONFIG` first, then individual overrides.
fn load_config() -> Result<SearchConfig> {
    let mut config = match std::env::var("TESTMACHINE_CONFIG") {
        Ok(path) => {
            let yaml = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config file {}", path))?;
            SearchConfig::from_yaml(&yaml).with_context(|| format!("parsing config file {}", path))?
        }
        Err(_) => SearchConfig::default(),
    };

    if let Ok(seed) = std::env::var("TESTMACHINE_SEED") {
        let seed = seed.parse().with_context(|| format!("TESTMACHINE_SEED={} is not a u64", seed))?;
        config = config.with_seed(seed);
    }
    if let Ok(trials) = std::env::var("TESTMACHINE_TRIALS") {
        let trials = trials
            .parse()
            .with_context(|| format!("TESTMACHINE_TRIALS={} is not a u64", trials))?;
        config = config.with_max_trials(trials);
    }
    config.validate()?;
    Ok(config)
}

fn print_usage() {
    println!("usage: testmachine [DEMO]\n\ndemos:");
    for (name, description) in demos::DEMOS {
        println!("  {:<10} {}", name, description);
    }
}
