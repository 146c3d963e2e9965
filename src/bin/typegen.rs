//! typegen: format embedded SQL and generate result types for Go packages.
//!
//! # Usage
//!
//! ```bash
//! # Format every query and generate types under the current directory
//! typegen --database-url postgres://localhost/app
//!
//! # Only reformat queries, no database needed
//! typegen ./internal/store --skip-typegen
//!
//! # Show what would change
//! typegen --dry-run --format json
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use colored::*;
use tracing_subscriber::EnvFilter;
use typegen::prelude::*;

#[derive(Parser)]
#[command(name = "typegen")]
#[command(version)]
#[command(about = "Format embedded SQL in Go sources and generate typed result structs", long_about = None)]
#[command(after_help = "EXAMPLES:
    typegen --database-url postgres://localhost/app
    typegen ./internal/store --skip-typegen
    typegen --dry-run --format json")]
struct Cli {
    /// Root directory to process
    root: Option<PathBuf>,

    /// Database connection URL
    #[arg(long, env = "TYPEGEN_DATABASE_URL")]
    database_url: Option<String>,

    /// Config file (default: <ROOT>/typegen.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Don't write anything, just report what would change
    #[arg(short, long)]
    dry_run: bool,

    /// Only format queries, skip type generation
    #[arg(long)]
    skip_typegen: bool,

    /// Concurrent external tool invocations
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(2);
    }

    match run(&cli).await {
        Ok(report) => {
            print_report(&report, &cli.format);
            if !report.is_clean() {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "typegen=debug" } else { "typegen=info" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

async fn run(cli: &Cli) -> anyhow::Result<Report> {
    let root = cli.root.clone().unwrap_or_else(|| PathBuf::from("."));
    let mut config = Config::load(&root, cli.config.as_deref())?;

    config.root = root;
    if let Some(url) = &cli.database_url {
        config.database_url = Some(url.clone());
    } else if config.database_url.is_none() {
        config.database_url = std::env::var("DATABASE_URL").ok();
    }
    if cli.jobs.is_some() {
        config.jobs = cli.jobs;
    }
    config.dry_run |= cli.dry_run;
    config.skip_typegen |= cli.skip_typegen;

    let engine = Engine::connect(config).await?;
    Ok(engine.run().await?)
}

fn print_report(report: &Report, format: &OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(report).unwrap_or_default()
            );
        }
        OutputFormat::Text => {
            let verb = if report.dry_run { "Would rewrite" } else { "Rewrote" };
            for path in &report.files_rewritten {
                println!("{} {}", verb.green(), path.display().to_string().cyan());
            }
            let verb = if report.dry_run { "Would write" } else { "Wrote" };
            for path in &report.generated {
                println!("{} {}", verb.green(), path.display().to_string().cyan());
            }

            if !report.diagnostics.is_empty() {
                println!();
                println!("{}", "Errors:".red().bold());
                for d in report.diagnostics.iter() {
                    println!(
                        "  {} {} {}",
                        format!("[{}]", d.stage).yellow(),
                        d.location.to_string().white(),
                        d.error
                    );
                }
            }

            println!();
            println!(
                "{} files, {} queries, {} types, {} renames, {} errors",
                report.files_scanned.to_string().cyan(),
                report.call_sites.to_string().cyan(),
                report.types.to_string().cyan(),
                report.renames.to_string().cyan(),
                if report.is_clean() {
                    "0".green()
                } else {
                    report.diagnostics.len().to_string().red()
                }
            );
        }
    }
}
