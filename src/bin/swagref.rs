//! Swagger reference CLI
//!
//! Command-line interface for resolving and checking Swagger 2.0 documents.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use swagref::{
    check, materialize, resolve, Fetch, FileStatus, Mode, ResolveOptions, Severity,
    StandardFetcher,
};

#[derive(Parser)]
#[command(name = "swagref")]
#[command(about = "Resolve and check $ref references in Swagger 2.0 documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve all references in a document
    Resolve {
        /// Document source: file path or URL (http:// or https://)
        document: String,

        /// Output mode: inline (substitute references) or preserving
        /// (keep references, attach resolution lookups)
        #[arg(long, default_value = "inline")]
        mode: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Leave references into other documents unresolved
        #[arg(long)]
        no_external: bool,

        /// Cap reference chain depth
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Check files for broken references (syntax, missing targets, locations)
    Check {
        /// File or directory to check
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Resolve {
            document,
            mode,
            output,
            pretty,
            no_external,
            max_depth,
        } => run_resolve(&document, &mode, output, pretty, no_external, max_depth),

        Commands::Check {
            path,
            format,
            strict,
            quiet,
        } => run_check(&path, &format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_resolve(
    source: &str,
    mode: &str,
    output: Option<PathBuf>,
    pretty: bool,
    no_external: bool,
    max_depth: Option<usize>,
) -> Result<(), u8> {
    let Some(mode) = Mode::parse(mode) else {
        eprintln!("Error: unknown mode \"{}\": expected inline or preserving", mode);
        return Err(2);
    };

    let fetcher = StandardFetcher;
    let bytes = fetcher.fetch(source).map_err(|e| {
        eprintln!("Error: {}", e);
        3u8
    })?;
    let root: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| {
        eprintln!("Error: {} is not a JSON document: {}", source, e);
        2u8
    })?;

    let mut options = ResolveOptions::new().follow_external(!no_external);
    if let Some(depth) = max_depth {
        options = options.max_depth(depth);
    }

    let graph = resolve(&root, source, &fetcher, &options).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let resolved = materialize(&graph, &root, mode).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let json_output = if pretty {
        serde_json::to_string_pretty(&resolved)
    } else {
        serde_json::to_string(&resolved)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn run_check(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = check(path, strict);

    if format == "json" {
        match serde_json::to_string_pretty(&result) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                return Err(2);
            }
        }
    } else {
        // Text output
        if !quiet {
            println!("Checking {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let color = match diag.severity {
                    Severity::Error => "\x1b[31m",
                    Severity::Warning => "\x1b[33m",
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color,
                        match diag.severity {
                            Severity::Error => "error",
                            Severity::Warning => "warning",
                        },
                        diag.code,
                        diag.path,
                        diag.message
                    );
                }
            }
        }

        println!();
        if result.is_ok() && (!strict || result.warnings == 0) {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.is_ok() && (!strict || result.warnings == 0) {
        Ok(())
    } else {
        Err(1)
    }
}
