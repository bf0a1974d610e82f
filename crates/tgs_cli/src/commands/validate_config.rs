//! Validate-config command - Check the topology document only.

use anyhow::Result;
use clap::Args;
use tracing::info;

use tgs_config::{ConfigLoader, ConfigValidator};

use super::validate::finish;
use super::GlobalOptions;

#[derive(Args)]
pub struct ValidateConfigArgs {}

pub async fn execute(_args: ValidateConfigArgs, global: &GlobalOptions) -> Result<()> {
    let layout = global.project()?;
    info!("Validating {:?}", layout.config_path());

    let raw = ConfigLoader::read_project(&layout)?;
    let (topology, stacks) = ConfigLoader::decode(&raw.topology, &raw.stacks)?;

    finish(ConfigValidator::validate_topology(&topology, &stacks), global.quiet)
}
