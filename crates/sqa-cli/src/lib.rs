//! SQA command line
//!
//! `sqa analyze <dir>` loads a design-document directory, runs the selected
//! passes, and prints the report. Exit status is 0 whenever a report was
//! produced, whatever it contains; unreadable input or a bad configuration
//! exits non-zero with a single error line.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use sqa_core::{AnalysisConfig, Analyzer, ReportFormat, Severity};
use std::path::PathBuf;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "SQA_LOG";

/// Command-line definition
#[must_use]
pub fn command() -> Command {
    Command::new("sqa")
        .version(sqa_core::VERSION)
        .about("Specification quality analysis for structured design documents")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Raise log level (-v info, -vv debug); logs go to stderr"),
        )
        .subcommand(
            Command::new("analyze")
                .about("Analyze a corpus directory and print the report")
                .arg(
                    Arg::new("dir")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory holding spec.md, plan.md, tasks.md, data-model.md, contracts/"),
                )
                .arg(
                    Arg::new("passes")
                        .long("passes")
                        .value_delimiter(',')
                        .num_args(1..)
                        .help("Comma-separated passes to run (default: all)"),
                )
                .arg(
                    Arg::new("threshold")
                        .long("threshold")
                        .value_parser(value_parser!(Severity))
                        .help("Minimum severity that receives remediation edits: LOW, MEDIUM, HIGH"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .value_parser(value_parser!(ReportFormat))
                        .help("Report format: json or markdown"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML configuration file; flags override its values"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the report to a file instead of stdout"),
                )
                .arg(
                    Arg::new("timeout-ms")
                        .long("timeout-ms")
                        .value_parser(value_parser!(u64))
                        .help("Per-pass timeout in milliseconds"),
                )
                .arg(
                    Arg::new("workers")
                        .long("workers")
                        .value_parser(value_parser!(usize))
                        .help("Maximum passes running at once"),
                ),
        )
}

/// Log level for a `-v` count
#[must_use]
pub fn log_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Install the stderr tracing subscriber
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

/// Configuration from the config file, overridden by flags
///
/// # Errors
///
/// Fails if the config file cannot be loaded.
pub fn config_from(args: &ArgMatches) -> anyhow::Result<AnalysisConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnalysisConfig::new(),
    };

    if let Some(passes) = args.get_many::<String>("passes") {
        config = config.with_passes(passes.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()));
    }
    if let Some(threshold) = args.get_one::<Severity>("threshold") {
        config = config.with_threshold(*threshold);
    }
    if let Some(format) = args.get_one::<ReportFormat>("format") {
        config = config.with_format(*format);
    }
    if let Some(timeout) = args.get_one::<u64>("timeout-ms") {
        config = config.with_pass_timeout_ms(*timeout);
    }
    if let Some(workers) = args.get_one::<usize>("workers") {
        config = config.with_max_workers(*workers);
    }
    Ok(config)
}

/// Run `analyze` and return the rendered report
///
/// # Errors
///
/// Fails on configuration, ingestion, or remediation-ordering errors.
pub async fn analyze(args: &ArgMatches) -> anyhow::Result<String> {
    let config = config_from(args)?;
    let format = config.format;
    let dir = args
        .get_one::<PathBuf>("dir")
        .context("missing corpus directory")?;

    let analyzer = Analyzer::new(config)?;
    let report = analyzer.analyze_dir(dir).await?;
    Ok(report.render(format)?)
}

/// Dispatch parsed arguments; writes the report to stdout or `--output`
///
/// # Errors
///
/// Fails on any analysis error or if the output file cannot be written.
pub async fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("analyze", args)) => {
            let rendered = analyze(args).await?;
            match args.get_one::<PathBuf>("output") {
                Some(path) => {
                    tokio::fs::write(path, rendered)
                        .await
                        .with_context(|| format!("writing report to {}", path.display()))?;
                    tracing::info!(path = %path.display(), "report written");
                }
                None => println!("{rendered}"),
            }
            Ok(())
        }
        _ => anyhow::bail!("unknown command; see `sqa --help`"),
    }
}
