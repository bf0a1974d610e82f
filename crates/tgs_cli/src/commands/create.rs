//! Create commands - Add a stack or the remote state containers.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tokio::process::Command;
use tracing::{debug, info};

use tgs_config::{ConfigLoader, ConfigWriter, DEFAULT_STACK};

use super::{display_path, GlobalOptions};

#[derive(Subcommand)]
pub enum CreateCommands {
    /// Create a stack from the starter template
    Stack(CreateStackArgs),

    /// Create the remote state container of every subscription
    Container(CreateContainerArgs),
}

#[derive(Args)]
pub struct CreateStackArgs {
    /// Stack name
    #[arg(default_value = DEFAULT_STACK)]
    name: String,
}

#[derive(Args)]
pub struct CreateContainerArgs {
    /// Print the commands without running them
    #[arg(long)]
    dry_run: bool,
}

pub async fn execute(command: CreateCommands, global: &GlobalOptions) -> Result<()> {
    match command {
        CreateCommands::Stack(args) => create_stack(args, global),
        CreateCommands::Container(args) => create_container(args, global).await,
    }
}

fn create_stack(args: CreateStackArgs, global: &GlobalOptions) -> Result<()> {
    let layout = global.project()?;
    let path = ConfigWriter::create_stack(&layout, &args.name)
        .with_context(|| format!("Failed to create stack '{}'", args.name))?;

    if !global.quiet {
        println!("✅ Stack created: {}", display_path(&layout, &path));
        println!("   Reference it from an environment with `stack: <name>` in config.yaml");
    }
    Ok(())
}

async fn create_container(args: CreateContainerArgs, global: &GlobalOptions) -> Result<()> {
    let layout = global.project()?;
    let raw = ConfigLoader::read_project(&layout)?;
    let topology = ConfigLoader::decode_topology(&raw.topology)?;

    for (name, subscription) in &topology.subscriptions {
        let state = &subscription.remote_state;
        let container_args = [
            "storage",
            "container",
            "create",
            "--name",
            state.container(),
            "--account-name",
            state.name.as_str(),
            "--auth-mode",
            "login",
        ];

        if args.dry_run {
            println!("az {}", container_args.join(" "));
            continue;
        }

        info!(
            "Creating container '{}' in '{}' for subscription '{}'",
            state.container(),
            state.name,
            name
        );
        let output = Command::new("az")
            .args(container_args)
            .output()
            .await
            .context("Failed to run the Azure CLI (is `az` installed?)")?;
        debug!("az exited with {}", output.status);

        if !output.status.success() {
            anyhow::bail!(
                "Container creation failed for subscription '{}': {}",
                name,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        if !global.quiet {
            println!("✅ {}: {}/{}", name, state.name, state.container());
        }
    }

    Ok(())
}
