//! Command line front end for repository maintenance tasks.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hotbox::archive;
use hotbox::config::HotboxConfig;
use hotbox::logging::init_logging;
use hotbox::repair::repair_repository;
use hotbox::repository::Repository;
use hotbox::resolve::Resolver;
use hotbox::rules::ScriptFailure;
use hotbox::store::OrdinalStore;
use hotbox::types::{SelectedNode, Selection};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hotbox", version, about = "Filesystem-backed popup menu repository")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the repository layout if it is missing.
    Init,

    /// Renumber every folder of the repository.
    Repair,

    /// Export the repository as an archive.
    Export {
        /// Output file; defaults to base64 on stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Merge an archive into the repository.
    Import {
        /// Archive file to merge.
        input: PathBuf,

        /// Treat the input as base64 text rather than a binary archive.
        #[arg(long)]
        base64: bool,
    },

    /// Show the items that would resolve for a selection of node classes.
    Resolve {
        /// Selected node classes, e.g. `Blur Merge`. Empty means no
        /// selection.
        classes: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => HotboxConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => HotboxConfig::from_env(),
    };
    init_logging(Some(&config.logging))?;

    let store = OrdinalStore::new(config.script_suffix.clone());
    let local = Repository::local(&config.location);

    match cli.command {
        Command::Init => {
            local.ensure_layout()?;
            println!("Initialized repository at {}", config.location.display());
        }
        Command::Repair => {
            local.ensure_layout()?;
            repair_repository(&store, &local)?;
            println!("Repaired repository at {}", config.location.display());
        }
        Command::Export { output } => match output {
            Some(output) => {
                let written = archive::export_to_file(local.root(), &output)?;
                println!("Exported to {}", written.display());
            }
            None => {
                println!("{}", archive::export_to_base64(local.root())?);
            }
        },
        Command::Import { input, base64 } => {
            let report = if base64 {
                let text = std::fs::read_to_string(&input)
                    .with_context(|| format!("Failed to read {}", input.display()))?;
                archive::import_from_base64(&store, &local, &text)?
            } else {
                archive::import_from_file(&store, &local, &input)?
            };
            println!(
                "Merged archive: {} updated, {} created",
                report.updated, report.created
            );
        }
        Command::Resolve { classes } => {
            // No host interpreter here, so every rule evaluates false.
            let runner =
                |_: &str, _: &Selection| -> Result<bool, ScriptFailure> { Ok(false) };
            let resolver = Resolver::new(&store, &runner, &config.layout);
            let selection = Selection::of(
                classes
                    .iter()
                    .map(|class| SelectedNode::new(class.clone(), class.clone()))
                    .collect(),
            );
            let menu = resolver.resolve(&config.repositories(), &selection);

            for (label, half) in [("contextual", &menu.contextual), ("global", &menu.global)] {
                println!("{} ({} rows):", label, half.row_count());
                for row in &half.rows {
                    let names: Vec<String> = row
                        .iter()
                        .map(|resolved| {
                            store
                                .display_name(&resolved.item.path)
                                .unwrap_or_else(|| resolved.item.ordinal.to_name())
                        })
                        .collect();
                    println!("  {}", names.join(" | "));
                }
            }
        }
    }

    Ok(())
}
