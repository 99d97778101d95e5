//! typegraph: type declaration and namespace dependency graph extractor
//!
//! Scans a C# or Java source tree, writes a metadata document and declaration
//! dump per type, and a `graph.csv` per namespace describing inherit,
//! implement and reference edges between types.

mod config;
mod run;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use typegraph_core::{AnalyzeOptions, GraphTable, OutputLayout, analyze};

use crate::config::Config;
use crate::run::RunMetadata;

/// Log file written into each run directory.
const LOG_FILE: &str = "typegraph.log";

/// Extract type declarations and namespace dependency graphs
#[derive(Parser)]
#[command(name = "typegraph")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to .typegraph directory or config file (default: search for .typegraph/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a source tree and write per-type artifacts and namespace graphs
    Analyze {
        /// Source directory (default: project root from config or current dir)
        #[arg(long)]
        source: Option<PathBuf>,

        /// Output directory (default: output root from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write directly into the output directory instead of a timestamped run directory
        #[arg(long)]
        no_run_dir: bool,
    },

    /// Initialize a new .typegraph directory with config file
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Print the nodes and edges of a graph.csv
    Show {
        /// Path to a graph.csv file
        graph: PathBuf,
    },
}

fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Initialize logging for interactive use. Logs to stderr.
fn init_logging(verbose: bool) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter(verbose))
        .init();
}

/// Initialize logging for an analysis run.
///
/// Logs to stderr and to a single file in the run directory. The returned
/// guard flushes the file writer when dropped.
fn init_run_logging(run_dir: &Path, verbose: bool) -> Option<WorkerGuard> {
    let log_path = run_dir.join(LOG_FILE);

    let file = match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Failed to create log file: {}", e);
            // Fall back to stderr logging
            init_logging(verbose);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(env_filter(verbose))
        .init();

    Some(guard)
}

/// Load config from an explicit path or auto-discover `.typegraph/config.toml`.
///
/// Returns the config and the path to the `.typegraph` directory (for resolving relative paths).
fn load_config(override_path: Option<&PathBuf>) -> Result<(Config, Option<PathBuf>)> {
    if let Some(path) = override_path {
        // Explicit path override - a .typegraph directory or the config file itself
        let config_file = if path.is_dir() {
            path.join(config::CONFIG_FILE)
        } else {
            path.clone()
        };
        let typegraph_dir = config_file.parent().unwrap_or(path).to_path_buf();
        let config = Config::from_file(&config_file)?;
        return Ok((config, Some(typegraph_dir)));
    }

    // Auto-discover by walking up directory tree
    match Config::find_and_load() {
        Ok(Some((config, typegraph_dir))) => Ok((config, Some(typegraph_dir))),
        Ok(None) => Ok((Config::default(), None)),
        Err(e) => {
            eprintln!("Warning: Error searching for config: {:#}, using defaults", e);
            Ok((Config::default(), None))
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            source,
            output,
            no_run_dir,
        } => {
            let (config, config_dir) = load_config(cli.config.as_ref())?;

            let errors = config.validate();
            if !errors.is_empty() {
                for error in &errors {
                    eprintln!("Config error: {}", error);
                }
                anyhow::bail!("Invalid configuration ({} errors)", errors.len());
            }

            let source_root =
                source.unwrap_or_else(|| config.resolve_project_root(config_dir.as_deref()));
            // Canonicalize to resolve relative paths like "." or ".."
            let source_root = source_root.canonicalize().unwrap_or(source_root);
            let output_root =
                output.unwrap_or_else(|| config.resolve_output_root(config_dir.as_deref()));

            let started_at = Utc::now();
            let layout = if config.output.run_subdir && !no_run_dir {
                OutputLayout::for_run(&output_root, started_at)?
            } else {
                std::fs::create_dir_all(&output_root).with_context(|| {
                    format!("Failed to create output directory {}", output_root.display())
                })?;
                OutputLayout::new(output_root)
            };

            let _guard = if config.logging.file {
                init_run_logging(layout.root(), cli.verbose)
            } else {
                init_logging(cli.verbose);
                None
            };

            match &config_dir {
                Some(dir) => info!("Using config from {}", dir.display()),
                None => tracing::debug!("No .typegraph/config.toml found, using defaults"),
            }
            info!(
                "Analyzing {} -> {}",
                source_root.display(),
                layout.root().display()
            );

            let options = AnalyzeOptions {
                extensions: config
                    .scan
                    .extensions
                    .iter()
                    .map(|ext| ext.trim_start_matches('.').to_string())
                    .collect(),
                respect_gitignore: config.scan.respect_gitignore,
                include_hidden: config.scan.include_hidden,
            };
            let metadata = RunMetadata::new(started_at, source_root.clone(), options.extensions.clone());

            let summary = analyze(&source_root, &layout, &options)
                .with_context(|| format!("Analysis of {} failed", source_root.display()))?;

            info!(
                "Analyzed {} files ({} skipped): {} types in {} namespaces, {} nodes, {} edges",
                summary.files_scanned,
                summary.files_skipped,
                summary.types,
                summary.namespaces,
                summary.nodes,
                summary.edges
            );
            if summary.merged_declarations > 0 {
                info!(
                    "Merged {} partial declarations into earlier parts",
                    summary.merged_declarations
                );
            }

            run::write_metadata(layout.root(), &metadata.finish(summary))?;
            println!("{}", layout.root().display());
        }

        Commands::Init { force } => {
            use config::{CONFIG_FILE, DEFAULT_CONFIG, TYPEGRAPH_DIR};

            init_logging(cli.verbose);

            let typegraph_dir = PathBuf::from(TYPEGRAPH_DIR);
            let config_path = typegraph_dir.join(CONFIG_FILE);

            if config_path.exists() && !force {
                anyhow::bail!(".typegraph/config.toml already exists. Use --force to overwrite.");
            }

            // Create .typegraph directory if it doesn't exist
            if !typegraph_dir.exists() {
                std::fs::create_dir_all(&typegraph_dir)?;
                info!("Created {}/", typegraph_dir.display());
            }

            std::fs::write(&config_path, DEFAULT_CONFIG)?;
            info!("Wrote {}", config_path.display());
        }

        Commands::Show { graph } => {
            init_logging(cli.verbose);

            let table = GraphTable::read(&graph)
                .with_context(|| format!("Failed to read {}", graph.display()))?;
            print!("{}", render_table(&table));
        }
    }

    Ok(())
}

/// Render a graph table as two aligned text tables.
fn render_table(table: &GraphTable) -> String {
    let mut out = String::new();

    let id_width = table
        .nodes
        .iter()
        .map(|n| n.identifier.len())
        .chain(std::iter::once("IDENTIFIER".len()))
        .max()
        .unwrap_or_default();
    out.push_str(&format!("Nodes ({}):\n", table.nodes.len()));
    out.push_str(&format!("  {:<id_width$}  {:<10}  NAME\n", "IDENTIFIER", "KIND"));
    for node in &table.nodes {
        out.push_str(&format!(
            "  {:<id_width$}  {:<10}  {}\n",
            node.identifier,
            node.kind.as_str(),
            node.display_name
        ));
    }

    let source_width = table
        .edges
        .iter()
        .map(|e| e.source_id.len())
        .chain(std::iter::once("SOURCE".len()))
        .max()
        .unwrap_or_default();
    out.push_str(&format!("\nEdges ({}):\n", table.edges.len()));
    out.push_str(&format!("  {:<source_width$}  {:<10}  TARGET\n", "SOURCE", "LABEL"));
    for edge in &table.edges {
        out.push_str(&format!(
            "  {:<source_width$}  {:<10}  {}\n",
            edge.source_id,
            edge.label.as_str(),
            edge.target_id
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze_flags() {
        let cli = Cli::parse_from([
            "typegraph",
            "-v",
            "analyze",
            "--source",
            "src",
            "--output",
            "out",
            "--no-run-dir",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Analyze {
                source,
                output,
                no_run_dir,
            } => {
                assert_eq!(source, Some(PathBuf::from("src")));
                assert_eq!(output, Some(PathBuf::from("out")));
                assert!(no_run_dir);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_render_table() {
        let table = GraphTable::parse(
            "Type,Identifier,Source,Target,Label,TypeKind\n\
             node,Pkg.Base,,,Base,Interface\n\
             node,Pkg.Derived,,,Derived,Class\n\
             edge,,Pkg.Derived,Pkg.Base,implement,\n",
        );
        let text = render_table(&table);
        assert!(text.starts_with("Nodes (2):\n"));
        assert!(text.contains("  Pkg.Derived  Class       Derived\n"));
        assert!(text.contains("Edges (1):\n"));
        assert!(text.contains("  Pkg.Derived  implement   Pkg.Base\n"));
    }
}
