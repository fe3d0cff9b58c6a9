use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use shipwright_core::configs::settings::{RunArgs, RunSettings, DEFAULT_TARGET};
use shipwright_core::pipeline_manager::{PipelineManager, PipelineManagerConfig};
use tracing_subscriber::{prelude::*, EnvFilter};

mod commands;

/// Shipwright - A sequential build pipeline runner
#[derive(Parser)]
#[command(name = "shipwright")]
#[command(about = "Run build, test, pack and publish tasks in dependency order")]
#[command(version)]
struct Cli {
    /// Path to the workspace root (defaults to current directory)
    #[arg(short, long, default_value = ".", global = true)]
    workspace: PathBuf,

    /// Pipeline file, relative to the workspace root
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a target and run it with its dependencies
    Run {
        /// Task to run
        #[arg(default_value = DEFAULT_TARGET)]
        target: String,
        /// Publish credential; falls back to NUGET_API_KEY
        #[arg(long)]
        api_key: Option<String>,
        /// Never push packages
        #[arg(long)]
        no_push: bool,
        /// Release on the stable channel even without VERSION
        #[arg(long)]
        stable: bool,
    },
    /// Show the execution plan for a target without running it
    Plan {
        #[arg(default_value = DEFAULT_TARGET)]
        target: String,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the tasks declared in the pipeline file
    List,
    /// Print the JSON Schema of the pipeline file
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    configure_tracing()?;

    if let Commands::Schema = cli.command {
        return commands::schema::execute();
    }

    let run_args = match &cli.command {
        Commands::Run {
            target,
            api_key,
            no_push,
            stable,
        } => RunArgs {
            target: Some(target.clone()),
            api_key: api_key.clone(),
            no_push: *no_push,
            stable: *stable,
        },
        _ => RunArgs::default(),
    };
    let settings = RunSettings::from_env(run_args);
    if settings.ci {
        colored::control::set_override(false);
    }

    let manager = PipelineManager::new(PipelineManagerConfig {
        workspace_root: cli.workspace,
        pipeline_file: cli.file,
        settings,
    })
    .map_err(|e| anyhow!("Failed to load pipeline: {}", e))?;

    match cli.command {
        Commands::Run { .. } => commands::run::execute(&manager).await,
        Commands::Plan { target, json } => commands::plan::execute(&manager, &target, json),
        Commands::List => commands::list::execute(&manager),
        Commands::Schema => Ok(()),
    }
}

fn configure_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|err| anyhow!(err.to_string()))
}
