mod commands;
mod logging;
mod progress;

use std::process;
use std::sync::atomic::Ordering;

use anyhow::Context;
use asset_duper_core::keys::ScanMode;
use asset_duper_core::listing::{CsvColumnSource, ReferenceListSource, WalkSource};
use asset_duper_core::{parse_key, AppConfig, ReconcileEngine, Termination};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, SourceArgs};
use dotenv::dotenv;
use progress::CliReporter;
use tracing::{error, info, warn};

type Records = Box<dyn Iterator<Item = Result<String, asset_duper_core::Error>>>;

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match asset_duper_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    let outcome = match args.command {
        Some(Commands::Analyze {
            source,
            column,
            bucket_wide,
        }) => run_analyze(with_mode(&config, bucket_wide), &source, column.as_deref()),
        Some(Commands::Compare {
            reference,
            target,
            column,
        }) => run_compare(config, &reference, &target, column.as_deref()),
        Some(Commands::ParseKey { key, bucket_wide }) => {
            print_parsed_key(&with_mode(&config, bucket_wide), &key);
            Ok(())
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = outcome {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn with_mode(config: &AppConfig, bucket_wide: bool) -> AppConfig {
    let mut config = config.clone();
    if bucket_wide {
        config.scan_mode = ScanMode::BucketWide;
    }
    config
}

fn open_source(
    source: &SourceArgs,
    column: Option<&str>,
    config: &AppConfig,
) -> anyhow::Result<(Records, String)> {
    if let Some(path) = &source.keys_csv {
        let column = column.unwrap_or(&config.path_column);
        let records = CsvColumnSource::open(path, column)
            .with_context(|| format!("opening {}", path.display()))?;
        return Ok((Box::new(records), format!("{} [{}]", path.display(), column)));
    }
    if let Some(path) = &source.key_list {
        let records = ReferenceListSource::open(path, &config.reference_header_token)
            .with_context(|| format!("opening {}", path.display()))?;
        return Ok((Box::new(records), path.display().to_string()));
    }
    if let Some(dir) = &source.local_dir {
        anyhow::ensure!(dir.is_dir(), "{} is not a directory", dir.display());
        return Ok((Box::new(WalkSource::new(dir)), dir.display().to_string()));
    }
    anyhow::bail!("no input source given")
}

/// Ctrl-C stops the running build between two records; reports still get written.
fn install_interrupt_handler(engine: &ReconcileEngine) -> anyhow::Result<()> {
    let token = engine.cancel_token();
    ctrlc::set_handler(move || {
        warn!("Interrupt received, stopping after the current record...");
        token.store(true, Ordering::SeqCst);
    })
    .context("installing Ctrl-C handler")?;
    Ok(())
}

fn run_analyze(config: AppConfig, source: &SourceArgs, column: Option<&str>) -> anyhow::Result<()> {
    let (records, label) = open_source(source, column, &config)?;
    let engine = ReconcileEngine::new(config);
    install_interrupt_handler(&engine)?;

    let reporter = CliReporter::new();
    let result = engine.analyze(records, &label, &reporter)?;

    println!();
    info!(
        "Build: {}, Analysis: {}, Reports: {}",
        format!("{:.2}s", result.build_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.analysis_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.report_duration.as_secs_f64()).green(),
    );
    info!(
        "{} records, {} UUID/filename combinations in {} batches",
        format!("{}", result.counters.records_seen).cyan(),
        format!("{}", result.identities).cyan(),
        format!("{}", result.batches).cyan(),
    );
    info!(
        "{} duplicate groups across batches, {} files proposed for removal",
        format!("{}", result.duplicate_groups).red(),
        format!("{}", result.removal_candidates).red(),
    );

    match result.termination {
        Termination::Exhausted => Ok(()),
        Termination::Cancelled => {
            warn!("{}", "Listing was cancelled; reports cover a partial inventory".yellow());
            Ok(())
        }
        Termination::Failed(err) => {
            Err(anyhow::Error::new(err).context("listing failed; partial reports were written"))
        }
    }
}

fn run_compare(
    config: AppConfig,
    reference: &std::path::Path,
    target: &SourceArgs,
    column: Option<&str>,
) -> anyhow::Result<()> {
    let left = ReferenceListSource::open(reference, &config.reference_header_token)
        .with_context(|| format!("opening {}", reference.display()))?;
    let (right, label) = open_source(target, column, &config)?;
    info!("Comparing {} against {}", reference.display(), label);

    let engine = ReconcileEngine::new(config);
    install_interrupt_handler(&engine)?;

    let reporter = CliReporter::new();
    let result = engine.compare(left, right, &reporter)?;

    println!();
    info!(
        "Reference: {} assets, target: {} assets ({})",
        format!("{}", result.left_identities).cyan(),
        format!("{}", result.right_identities).cyan(),
        format!("{:.2}s", result.build_duration.as_secs_f64()).green(),
    );
    info!(
        "{} missing from target, {} extra in target",
        format!("{}", result.missing).red(),
        format!("{}", result.extra).yellow(),
    );
    if result.partial {
        warn!("{}", "Comparison was cancelled; lists are incomplete".yellow());
    }
    Ok(())
}

fn print_parsed_key(config: &AppConfig, key: &str) {
    let parsed = parse_key(key, &config.batch_strategy());
    println!("batch:    {}", parsed.batch.as_deref().unwrap_or("-"));
    println!("uuid:     {}", parsed.uuid.as_deref().unwrap_or("-"));
    println!("filename: {}", parsed.filename.as_deref().unwrap_or("-"));
    match parsed.identity() {
        Some(identity) => println!("identity: {}", identity.to_string().green()),
        None => println!("identity: {}", "none (record would be skipped)".red()),
    }
}
