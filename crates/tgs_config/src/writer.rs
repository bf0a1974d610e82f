//! Config document writing utilities.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::models::{
    Component, Environment, RegionComponent, RemoteState, StackConfig, StackMeta, Subscription,
    TopologyConfig,
};
use crate::project::ProjectLayout;

const TOPOLOGY_HEADER: &str = "# Deployment topology: subscriptions, remote state and environments.\n\
# Environments without a `stack` deploy the `main` stack.\n\n";

const STACK_HEADER: &str = "# Stack definition: components and their placement per region.\n\
# Dependencies use `region.component[.app]`; `{region}` and `{app}` expand to\n\
# the region and app of the instance declaring them.\n\n";

/// Writer for topology and stack documents.
pub struct ConfigWriter;

impl ConfigWriter {
    /// Write the topology document.
    pub fn write_topology(layout: &ProjectLayout, topology: &TopologyConfig) -> ConfigResult<()> {
        let path = layout.config_path();
        debug!("Writing topology to {:?}", path);

        let content = format!("{}{}", TOPOLOGY_HEADER, serde_yaml::to_string(topology)?);
        write(&path, &content)
    }

    /// Write a stack document under `stacks/<key>.yaml`.
    pub fn write_stack(layout: &ProjectLayout, key: &str, stack: &StackConfig) -> ConfigResult<PathBuf> {
        let path = layout.stack_path(key);
        debug!("Writing stack to {:?}", path);

        let content = format!("{}{}", STACK_HEADER, serde_yaml::to_string(stack)?);
        write(&path, &content)?;
        Ok(path)
    }

    /// Create a new stack from the starter template. Refuses to overwrite.
    pub fn create_stack(layout: &ProjectLayout, name: &str) -> ConfigResult<PathBuf> {
        let key = Self::stack_key(name);
        let path = layout.stack_path(&key);
        if path.exists() {
            return Err(ConfigError::AlreadyExists(path));
        }
        Self::write_stack(layout, &key, &Self::default_stack(&key))
    }

    /// Starter topology: one subscription with dev/test/prod on the `main` stack.
    pub fn default_topology(project_name: &str) -> TopologyConfig {
        let mut topology = TopologyConfig {
            name: project_name.to_string(),
            ..Default::default()
        };

        let state_name = format!(
            "st{}tfstate",
            project_name
                .to_lowercase()
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
        );

        topology.subscriptions.insert(
            "default".to_string(),
            Subscription {
                remote_state: RemoteState {
                    name: state_name,
                    resource_group: format!("rg-{}-tfstate", project_name.to_lowercase()),
                    container: None,
                },
                environments: ["dev", "test", "prod"].into_iter().map(Environment::new).collect(),
            },
        );

        topology
    }

    /// Starter stack: resource group, service plan and per-app web apps.
    pub fn default_stack(name: &str) -> StackConfig {
        let mut stack = StackConfig {
            stack: StackMeta {
                name: name.to_string(),
                version: "1.0.0".to_string(),
                description: format!("{} stack", name),
            },
            ..Default::default()
        };

        let azurerm = |source: &str, description: &str, deps: &[&str]| Component {
            source: source.to_string(),
            provider: "azurerm".to_string(),
            version: "4.14.0".to_string(),
            description: description.to_string(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
        };

        stack.components.insert(
            "rg".to_string(),
            azurerm("azurerm_resource_group", "Resource group", &[]),
        );
        stack.components.insert(
            "plan".to_string(),
            azurerm("azurerm_service_plan", "App service plan", &["{region}.rg"]),
        );
        stack.components.insert(
            "webapp".to_string(),
            azurerm(
                "azurerm_linux_web_app",
                "Linux web app",
                &["{region}.rg", "{region}.plan"],
            ),
        );

        stack.architecture.regions.insert(
            "eastus2".to_string(),
            vec![
                RegionComponent::new("rg"),
                RegionComponent::new("plan"),
                RegionComponent::new("webapp").with_apps(["api", "web"]),
            ],
        );

        stack
    }

    /// File stem for a stack name.
    fn stack_key(name: &str) -> String {
        name.to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }
}

fn write(path: &Path, content: &str) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| ConfigError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::ConfigValidator;

    #[test]
    fn test_stack_key() {
        assert_eq!(ConfigWriter::stack_key("Edge Stack"), "edge-stack");
        assert_eq!(ConfigWriter::stack_key("  main  "), "main");
    }

    #[test]
    fn test_default_stack_is_valid() {
        let report = ConfigValidator::validate_stack("main", &ConfigWriter::default_stack("main"));
        assert!(report.is_valid(), "{:?}", report.errors);
    }

    #[test]
    fn test_default_topology_state_name() {
        let topology = ConfigWriter::default_topology("CUST-TP");
        let sub = &topology.subscriptions["default"];
        assert_eq!(sub.remote_state.name, "stcusttptfstate");
        assert_eq!(sub.environments.len(), 3);
    }
}
