//! List command - Show stacks and where they are deployed.

use std::collections::BTreeMap;

use anyhow::Result;
use clap::Args;

use tgs_config::ConfigLoader;

use super::GlobalOptions;

#[derive(Args)]
pub struct ListArgs {}

pub async fn execute(_args: ListArgs, global: &GlobalOptions) -> Result<()> {
    let layout = global.project()?;
    let raw = ConfigLoader::read_project(&layout)?;
    let (topology, stacks) = ConfigLoader::decode(&raw.topology, &raw.stacks)?;

    let mut deployments: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for (name, subscription) in &topology.subscriptions {
        for environment in &subscription.environments {
            deployments
                .entry(environment.stack_name())
                .or_default()
                .push(format!("{}/{}", name, environment.name));
        }
    }

    println!("📦 Stacks in '{}':", topology.name);
    if stacks.is_empty() {
        println!("   (none)");
    }
    for (key, stack) in &stacks {
        let regions: Vec<&str> = stack.architecture.regions.keys().map(String::as_str).collect();
        println!(
            "  {} v{} - {} component(s), {} unit(s), regions: {}",
            key,
            stack.stack.version,
            stack.components.len(),
            stack.units().len(),
            regions.join(", ")
        );
        match deployments.get(key.as_str()) {
            Some(envs) => println!("      deployed to: {}", envs.join(", ")),
            None => println!("      not deployed by any environment"),
        }
    }

    for (missing, envs) in deployments.iter().filter(|(key, _)| !stacks.contains_key(**key)) {
        println!("  ⚠️  {} (missing) referenced by {}", missing, envs.join(", "));
    }

    Ok(())
}
