//! schemashift: compare schema lock files
//!
//! # Usage
//!
//! ```bash
//! # What changed since the last dump?
//! schemashift diff schema-dump.lock current.lock
//!
//! # Machine-readable
//! schemashift diff schema-dump.lock current.lock --format json
//!
//! # Preview a table from field specs
//! schemashift fields id:primary title:string[150] email:string:unique
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use schemashift::prelude::*;

#[derive(Parser)]
#[command(name = "schemashift")]
#[command(version)]
#[command(about = "Schema diffs and migration action plans", long_about = None)]
#[command(after_help = "EXAMPLES:
    schemashift diff schema-dump.lock current.lock
    schemashift diff old.lock new.lock --format json
    schemashift fields id:primary title:string[150] email:string:unique")]
struct Cli {
    /// Engine config file (TOML)
    #[arg(long, global = true, env = "SCHEMASHIFT_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Diff a baseline lock file against the current one
    Diff {
        baseline: PathBuf,
        current: PathBuf,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Parse field specs into columns, indexes and a primary key
    Fields {
        #[arg(required = true)]
        specs: Vec<String>,

        /// Table name for the preview
        #[arg(short, long, default_value = "new_table")]
        table: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "schemashift=debug" } else { "schemashift=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => EngineConfig::default(),
    };

    match &cli.command {
        Commands::Diff {
            baseline,
            current,
            format,
        } => run_diff(baseline, current, *format, &config),
        Commands::Fields { specs, table } => {
            show_fields(table, specs);
            Ok(())
        }
    }
}

fn run_diff(
    baseline: &Path,
    current: &Path,
    format: OutputFormat,
    config: &EngineConfig,
) -> Result<()> {
    let baseline = Snapshot::load(baseline)
        .with_context(|| format!("Failed to read baseline '{}'", baseline.display()))?;
    let current = Snapshot::load(current)
        .with_context(|| format!("Failed to read current '{}'", current.display()))?;

    let diff = diff_snapshots_with(&baseline, &current, &config.diff);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&diff)?),
        OutputFormat::Text => print_diff(&diff),
    }
    Ok(())
}

fn print_diff(diff: &SchemaDiff) {
    if diff.is_empty() {
        println!("{}", "No schema changes.".green());
        return;
    }

    for table in &diff.tables.add {
        println!("{} table {}", "+".green().bold(), table.cyan());
    }
    for table in &diff.tables.remove {
        println!("{} table {}", "-".red().bold(), table.cyan());
    }

    for table in diff.changed_tables() {
        println!();
        println!("{}", table.cyan().bold());

        if let Some(columns) = diff.columns.get(table) {
            for (name, column) in &columns.add {
                let ty = column.column_type.as_ref().map(ToString::to_string).unwrap_or_default();
                println!("  {} column {} {}", "+".green(), name, ty.dimmed());
            }
            for name in columns.remove.keys() {
                println!("  {} column {}", "-".red(), name);
            }
            for (name, changes) in &columns.changed {
                let attributes = changes
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("  {} column {} {}", "~".yellow(), name, attributes.dimmed());
            }
        }
        if let Some(indexes) = diff.indexes.get(table) {
            for name in indexes.remove.keys() {
                println!("  {} index {}", "-".red(), name);
            }
            for name in indexes.add.keys() {
                println!("  {} index {}", "+".green(), name);
            }
        }
        if let Some(constraints) = diff.constraints.get(table) {
            for name in constraints.remove.keys() {
                println!("  {} constraint {}", "-".red(), name);
            }
            for name in constraints.add.keys() {
                println!("  {} constraint {}", "+".green(), name);
            }
        }
    }
}

fn show_fields(table: &str, specs: &[String]) {
    let ignored: Vec<&String> = specs
        .iter()
        .filter(|s| schemashift::parser::parse_field(s).is_err())
        .collect();
    for spec in &ignored {
        println!("{} ignoring invalid field spec '{}'", "⚠".yellow(), spec);
    }

    let plan = schemashift::parser::new_table(table, specs);
    println!("{} {}", "Table:".green().bold(), plan.table().name.cyan());

    println!("{}", "Columns:".green().bold());
    for column in plan.columns() {
        let mut details = Vec::new();
        if let Some(limit) = column.limit {
            details.push(format!("limit={}", limit));
        }
        if let (Some(p), Some(s)) = (column.precision, column.scale) {
            details.push(format!("precision={},{}", p, s));
        }
        if !column.null {
            details.push("not null".to_string());
        }
        if column.identity {
            details.push("identity".to_string());
        }
        let ty = column.column_type.as_ref().map(ToString::to_string).unwrap_or_default();
        println!("  {} {} {}", column.name, ty.yellow(), details.join(" ").dimmed());
    }

    if !plan.indexes().is_empty() {
        println!("{}", "Indexes:".green().bold());
        for index in plan.indexes() {
            let kind = if index.is_unique() { "unique" } else { "index" };
            println!(
                "  {} {} ({})",
                index.name.as_deref().unwrap_or_default(),
                kind.dimmed(),
                index.columns.join(", ")
            );
        }
    }

    let primary_key = &plan.table().options.primary_key;
    if !primary_key.is_empty() {
        println!("{} {}", "Primary key:".green().bold(), primary_key.join(", "));
    }
}
