//! Clipdeck command-line front end
//!
//! Collects files into the workflow's queues, runs one operation and
//! reports the outcome.

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use clipdeck::cli::{Args, Commands};
use clipdeck::config::Config;
use clipdeck::error::ClipdeckError;
use clipdeck::probe::display_duration;
use clipdeck::timecode;
use clipdeck::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    if let Commands::InitConfig { path } = &args.command {
        Config::write_default(path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = Config::load(args.config.as_deref(), Path::new("config.toml"))?;

    let mut workflow = Workflow::new(config).await?;

    match args.command {
        Commands::Probe { files } => {
            println!("{:<50} {:>10}", "File", "Duration");
            println!("{}", "-".repeat(61));
            for file in &files {
                let name = file.file_name().unwrap_or(file.as_os_str()).to_string_lossy();
                println!("{:<50} {:>10}", name, workflow.probe_duration(file).await);
            }
        }
        Commands::Extract { inputs } => {
            for input in inputs {
                let files = if input.is_dir() {
                    workflow.collect_media_files(&input)
                } else {
                    vec![input]
                };
                for file in files {
                    workflow.queue_for_extract(file).await;
                }
            }

            if workflow.extract_queue().is_empty() {
                return Err(ClipdeckError::Precondition("No files to extract".to_string()).into());
            }
            print_queue("Extract queue", workflow.extract_queue().iter().map(|f| (f.display_name(), f.duration)));

            let spinner = start_spinner("Extracting audio...")?;
            let report = workflow.extract_all().await;
            for (path, error) in &report.failed {
                warn!("{}: {}", path.display(), error);
            }

            if report.is_success() {
                spinner.finish_with_message(format!("Extracted {} files", report.converted.len()));
            } else {
                spinner.abandon_with_message(format!(
                    "Extracted {} files, {} failed",
                    report.converted.len(),
                    report.failed.len()
                ));
                anyhow::bail!("{} of {} files failed", report.failed.len(), report.failed.len() + report.converted.len());
            }
        }
        Commands::Merge { output, inputs, move_up, move_down } => {
            for input in inputs {
                if !workflow.queue_for_merge(input.clone()).await {
                    warn!("Ignoring duplicate file: {}", input.display());
                }
            }
            for index in move_up {
                workflow.merge_queue_mut().move_up(index);
            }
            for index in move_down {
                workflow.merge_queue_mut().move_down(index);
            }
            print_queue("Merge order", workflow.merge_queue().iter().map(|f| (f.display_name(), f.duration)));

            let spinner = start_spinner("Merging...")?;
            let result = workflow.merge_queued(&output).await;
            finish_spinner(&spinner, &result, |path| format!("Merged into {}", path.display()))?;
        }
        Commands::Trim { input, output, start, end } => {
            info!("Duration of {}: {}", input.display(), workflow.probe_duration(&input).await);
            if timecode::canonicalize(&start).is_some()
                && timecode::canonicalize(&end).is_some()
                && timecode::parse(&end) <= timecode::parse(&start)
            {
                warn!("End time {} is not after start time {}", end, start);
            }

            let spinner = start_spinner("Trimming...")?;
            let result = workflow.trim(&input, &output, &start, &end).await;
            finish_spinner(&spinner, &result, |path| format!("Trimmed into {}", path.display()))?;
        }
        Commands::Split { input, at } => {
            info!("Duration of {}: {}", input.display(), workflow.probe_duration(&input).await);

            let spinner = start_spinner("Splitting...")?;
            let result = workflow.split(&input, &at).await;
            finish_spinner(&spinner, &result, |(first, second)| {
                format!("Split into {} and {}", first.display(), second.display())
            })?;
        }
        Commands::InitConfig { .. } => {}
    }

    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".clipdeck").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "clipdeck.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("clipdeck.log").display());

    Ok(())
}

fn print_queue(title: &str, files: impl Iterator<Item = (String, Option<u64>)>) {
    println!("\n{}:", title);
    for (index, (name, duration)) in files.enumerate() {
        println!("{:>3}. {:<50} {:>10}", index, name, display_duration(duration));
    }
}

fn start_spinner(message: &'static str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    Ok(spinner)
}

fn finish_spinner<T>(
    spinner: &ProgressBar,
    result: &clipdeck::error::Result<T>,
    done: impl FnOnce(&T) -> String,
) -> Result<()> {
    match result {
        Ok(value) => {
            spinner.finish_with_message(done(value));
            Ok(())
        }
        Err(e) => {
            spinner.abandon_with_message("Failed");
            Err(anyhow::anyhow!("{}", e))
        }
    }
}
