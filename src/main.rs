//! lasercam CLI - compile CAD curves into laser G-code

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use lasercam::{init_logging, profile_provider, run_job, Config, RunOptions, BUILD_DATE, VERSION};

#[derive(Parser)]
#[command(name = "lasercam")]
#[command(about = "Compile CAD curves into G-code for CO2 laser cutters", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (.toml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a document into a G-code file
    Compile {
        /// Document description (.json)
        document: PathBuf,
        /// Material profile name
        #[arg(short, long)]
        material: Option<String>,
        /// Output path without material suffix or extension
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Layer to cut when no layer matches the configured name
        #[arg(long)]
        cut_layer: Option<String>,
        /// Layer to engrave when no layer matches the configured name
        #[arg(long)]
        engrave_layer: Option<String>,
        /// Spread cuts on heat-sensitive material
        #[arg(long)]
        interleave: bool,
        /// Abort when validation flags any geometry
        #[arg(long)]
        strict: bool,
        /// Print the job summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the materials of the configured catalog
    Materials,
    /// Write a default configuration file
    InitConfig {
        /// Destination (.toml or .json)
        path: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();
    tracing::debug!("lasercam {} built {}", VERSION, BUILD_DATE);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Compile {
            document,
            material,
            output,
            cut_layer,
            engrave_layer,
            interleave,
            strict,
            json,
        } => {
            let options = RunOptions {
                document,
                material,
                output,
                cut_layer,
                engrave_layer,
                interleave,
                strict,
                timestamp: Some(chrono::Utc::now()),
            };
            let (job, path) = run_job(&config, &options)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&job.summary)?);
            } else {
                for line in job.summary.lines() {
                    println!("{line}");
                }
                println!("Output: {}", path.display());
            }
        }
        Commands::Materials => {
            let catalog = profile_provider(&config.profiles).load_catalog(VERSION)?;
            for profile in &catalog.materials {
                let note = if profile.heat_sensitive {
                    " (heat sensitive)"
                } else {
                    ""
                };
                println!("{}{}", profile.name, note);
            }
        }
        Commands::InitConfig { path } => {
            config.save_to_file(&path)?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}
