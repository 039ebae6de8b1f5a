use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use std::process;

use unwrapcheck_core::config::load_config;
use unwrapcheck_core::loader::{expand_pattern, load_path};
use unwrapcheck_core::{
    check_unit, classify, CheckResult, Classification, Config, Error, Mode, Position, Unit,
};

const EXIT_CLEAN: i32 = 0;
const EXIT_FINDINGS: i32 = 1;
const EXIT_ERROR: i32 = 2;

/// unwrapcheck - Unwrap accessor checks for Go error types
///
/// Flags error types that wrap other errors but do not expose them through
/// `Unwrap() error` or `Unwrap() []error`.
#[derive(Parser)]
#[command(name = "unwrapcheck", version, about, long_about = None)]
struct Cli {
    /// Suppress summary lines on stdout
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check Go packages for missing or mistyped Unwrap accessors
    Check {
        /// Files, directories, or `dir/...` patterns
        #[arg(default_value = ".")]
        paths: Vec<String>,
        /// Require `Unwrap() []error` for types wrapping several errors
        #[arg(long)]
        strict_unwrap: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Config file (default: nearest .unwrapcheck.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show how each declared type is classified
    Classify {
        /// Files, directories, or `dir/...` patterns
        #[arg(default_value = ".")]
        paths: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match cli.command {
        Commands::Check {
            paths,
            strict_unwrap,
            json,
            config,
        } => cmd_check(&paths, strict_unwrap, json, config, cli.quiet),
        Commands::Classify { paths, json } => cmd_classify(&paths, json, cli.quiet),
        Commands::Version => {
            println!(
                "unwrapcheck {} (unwrapcheck-core {})",
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_VERSION")
            );
            EXIT_CLEAN
        }
    };

    process::exit(exit_code);
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .init();
}

fn report_error(err: &Error) {
    eprintln!("{} {}", "error:".red().bold(), err);
}

/// Load every package the patterns name; failures don't stop other packages
fn load_units(patterns: &[String]) -> (Vec<Unit>, Vec<Error>) {
    let mut units = Vec::new();
    let mut errors = Vec::new();
    for pattern in patterns {
        let targets = match expand_pattern(pattern) {
            Ok(targets) => targets,
            Err(err) => {
                errors.push(err);
                continue;
            }
        };
        for target in targets {
            match load_path(&target) {
                Ok(loaded) => units.extend(loaded),
                Err(err) => errors.push(err),
            }
        }
    }
    (units, errors)
}

fn cmd_check(
    paths: &[String],
    strict_unwrap: bool,
    json: bool,
    config_path: Option<PathBuf>,
    quiet: bool,
) -> i32 {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut config: Config = match load_config(config_path.as_deref(), &cwd) {
        Ok(config) => config,
        Err(err) => {
            report_error(&err);
            return EXIT_ERROR;
        }
    };
    if strict_unwrap {
        config.strict_unwrap = true;
    }
    tracing::debug!(strict_unwrap = config.strict_unwrap, "effective config");

    let (units, errors) = load_units(paths);
    let results: Vec<CheckResult> = units.iter().map(|u| check_unit(u, &config)).collect();
    let count: usize = results.iter().map(|r| r.diagnostics.len()).sum();

    if json {
        let diagnostics: Vec<_> = results.iter().flat_map(|r| &r.diagnostics).collect();
        let output = serde_json::json!({
            "clean": count == 0 && errors.is_empty(),
            "packages": units.len(),
            "count": count,
            "diagnostics": diagnostics,
            "errors": errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
    } else {
        for result in &results {
            for diagnostic in &result.diagnostics {
                eprintln!(
                    "{}: {}",
                    diagnostic.position.to_string().bold(),
                    diagnostic.message
                );
            }
        }
        for err in &errors {
            report_error(err);
        }
        if !quiet {
            if !errors.is_empty() {
                println!(
                    "{} {} finding(s) in {} package(s), {} error(s)",
                    "✗".red(),
                    count,
                    units.len(),
                    errors.len()
                );
            } else if count == 0 {
                println!(
                    "{} {} package(s) checked, no findings",
                    "✓".green(),
                    units.len()
                );
            } else {
                println!(
                    "{} {} finding(s) in {} package(s)",
                    "✗".red(),
                    count,
                    units.len()
                );
            }
        }
    }

    if !errors.is_empty() {
        EXIT_ERROR
    } else if count > 0 {
        EXIT_FINDINGS
    } else {
        EXIT_CLEAN
    }
}

/// One declared type as reported by `classify`
#[derive(Serialize)]
struct TypeRow<'a> {
    package: &'a str,
    name: &'a str,
    position: &'a Position,
    error_type: bool,
    unresolved: bool,
    classification: Classification,
}

fn cmd_classify(paths: &[String], json: bool, quiet: bool) -> i32 {
    let (units, errors) = load_units(paths);

    let mut rows = Vec::new();
    for unit in &units {
        for (id, decl) in unit.decls() {
            if decl.alias || decl.is_anonymous() {
                continue;
            }
            rows.push(TypeRow {
                package: &unit.package,
                name: &decl.name,
                position: &decl.position,
                error_type: unit.satisfies_error_contract(&unit.declared_type(id)),
                unresolved: decl.definition.contains_invalid(),
                classification: classify(unit, &decl.definition, Mode::DECLARATION),
            });
        }
    }

    if json {
        let output = serde_json::json!({
            "types": rows,
            "errors": errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
    } else {
        for row in &rows {
            let kind = if row.error_type {
                "error type".yellow()
            } else {
                "type".normal()
            };
            println!(
                "{}: {}.{} {} {}",
                row.position,
                row.package,
                row.name,
                kind,
                row.classification.to_string().bold()
            );
        }
        for err in &errors {
            report_error(err);
        }
        if !quiet {
            println!("{} type(s) in {} package(s)", rows.len(), units.len());
        }
    }

    if errors.is_empty() {
        EXIT_CLEAN
    } else {
        EXIT_ERROR
    }
}
