//! `storili-deploy`: keeps story agents on the platform in step with the
//! story records on disk.

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use storili_deploy::config::{self, ConfigError, DeployConfig};
use storili_deploy::{
    report, status_rows, DeployError, PromptConfirm, ProxyBindings, Synchronizer,
};
use storili_platform::{ElevenLabsClient, PlatformError};
use storili_registry::Registry;
use storili_stories::{ConfigSource, StoryDirectory};
use storili_types::StoryId;
use thiserror::Error;

#[derive(Parser)]
#[command(name = "storili-deploy")]
#[command(version, about = "Deploy story agents to the conversational platform", long_about = None)]
struct Cli {
    /// Configuration file.
    #[arg(
        long,
        env = "STORILI_CONFIG_PATH",
        default_value = config::DEFAULT_CONFIG_PATH
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or update agents for the given stories
    Deploy {
        /// Stories to deploy, in order
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        stories: Vec<String>,
        /// Deploy every story in the stories directory
        #[arg(long)]
        all: bool,
    },
    /// Show deployed agents from the local registry
    Status,
    /// Check that every registered agent still exists on the platform
    Audit,
    /// List agents on the platform, flagging ones no story tracks
    Remote,
    /// Print the proxy's access bindings for the current registry
    Bindings,
    /// Delete a deployed agent after confirmation
    Delete {
        /// Platform agent identifier
        agent_id: String,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("failed to render bindings: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config::load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    config::init_tracing(&config.logging);

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: DeployConfig) -> Result<(), CliError> {
    let mut out = io::stdout().lock();
    let registry = Registry::load(&config.registry.path);

    match command {
        Command::Status => {
            report::write_status(&mut out, &status_rows(&registry))?;
        }
        Command::Bindings => {
            let table = ProxyBindings::from_registry(&registry).to_toml()?;
            out.write_all(table.as_bytes())?;
        }
        Command::Deploy { stories, all } => {
            let mut sync = connect(&config, registry)?;
            let story_ids = if all {
                sync.source().story_ids().map_err(DeployError::from)?
            } else {
                stories
                    .into_iter()
                    .map(StoryId::new)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(DeployError::from)?
            };
            let batch = sync.deploy_many(&story_ids).await;
            for deployed in &batch.reports {
                report::write_deploy(&mut out, deployed)?;
            }
            report::write_binding_hint(&mut out, &batch.reports)?;
            if let Some(e) = batch.failure {
                return Err(e.into());
            }
        }
        Command::Audit => {
            let sync = connect(&config, registry)?;
            report::write_audit(&mut out, &sync.audit().await)?;
        }
        Command::Remote => {
            let sync = connect(&config, registry)?;
            report::write_remote(&mut out, &sync.remote_agents().await?)?;
        }
        Command::Delete { agent_id } => {
            let mut sync = connect(&config, registry)?;
            let outcome = {
                let mut confirm = PromptConfirm::new(io::stdin().lock(), &mut out);
                sync.delete(&agent_id, &mut confirm).await?
            };
            report::write_delete(&mut out, &outcome, &agent_id)?;
        }
    }
    Ok(())
}

/// Builds a synchronizer for commands that reach the platform.
fn connect(
    config: &DeployConfig,
    registry: Registry,
) -> Result<Synchronizer<StoryDirectory, ElevenLabsClient>, CliError> {
    config.require_api_key()?;
    let platform = ElevenLabsClient::new(config.platform.clone())?;
    let source = StoryDirectory::new(&config.stories.dir);
    Ok(Synchronizer::new(source, platform, registry))
}
