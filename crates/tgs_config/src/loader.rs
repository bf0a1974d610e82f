//! Config document loading.
//!
//! Decoding turns bytes into the typed model and fails with a structural error
//! on malformed YAML. Loading decodes and then validates, returning every
//! validation problem at once.

use std::collections::BTreeMap;
use std::fs;

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::models::{StackConfig, TopologyConfig};
use crate::project::ProjectLayout;
use crate::validator::{ConfigValidator, ValidationIssue};

/// Topology and stacks that passed validation.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub topology: TopologyConfig,
    pub stacks: BTreeMap<String, StackConfig>,
    pub warnings: Vec<ValidationIssue>,
}

impl LoadedConfig {
    pub fn stack(&self, name: &str) -> ConfigResult<&StackConfig> {
        self.stacks
            .get(name)
            .ok_or_else(|| ConfigError::StackNotFound(name.to_string()))
    }
}

/// Raw document bytes as read from disk.
#[derive(Debug, Clone, Default)]
pub struct RawDocuments {
    pub topology: Vec<u8>,
    pub stacks: BTreeMap<String, Vec<u8>>,
}

/// Loader for config documents.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Decode and validate.
    pub fn load(topology: &[u8], stacks: &BTreeMap<String, Vec<u8>>) -> ConfigResult<LoadedConfig> {
        let (topology, stacks) = Self::decode(topology, stacks)?;

        let report = ConfigValidator::validate(&topology, &stacks);
        if !report.is_valid() {
            return Err(ConfigError::Invalid(report));
        }

        info!(
            "Loaded project '{}' with {} stack(s)",
            topology.name,
            stacks.len()
        );

        Ok(LoadedConfig {
            topology,
            stacks,
            warnings: report.warnings,
        })
    }

    /// Decode without validating.
    pub fn decode(
        topology: &[u8],
        stacks: &BTreeMap<String, Vec<u8>>,
    ) -> ConfigResult<(TopologyConfig, BTreeMap<String, StackConfig>)> {
        let topology = Self::decode_topology(topology)?;

        let mut decoded = BTreeMap::new();
        for (name, bytes) in stacks {
            decoded.insert(name.clone(), Self::decode_stack(name, bytes)?);
        }

        Ok((topology, decoded))
    }

    pub fn decode_topology(bytes: &[u8]) -> ConfigResult<TopologyConfig> {
        serde_yaml::from_slice(bytes).map_err(|e| ConfigError::Structural {
            location: "config.yaml".to_string(),
            message: e.to_string(),
        })
    }

    pub fn decode_stack(name: &str, bytes: &[u8]) -> ConfigResult<StackConfig> {
        serde_yaml::from_slice(bytes).map_err(|e| ConfigError::Structural {
            location: format!("stacks/{}.yaml", name),
            message: e.to_string(),
        })
    }

    /// Read, decode and validate a project's documents.
    pub fn from_project(layout: &ProjectLayout) -> ConfigResult<LoadedConfig> {
        let raw = Self::read_project(layout)?;
        Self::load(&raw.topology, &raw.stacks)
    }

    /// Read every document of a project.
    pub fn read_project(layout: &ProjectLayout) -> ConfigResult<RawDocuments> {
        let config_path = layout.config_path();
        debug!("Reading topology from {:?}", config_path);

        let topology = fs::read(&config_path).map_err(|e| ConfigError::io(&config_path, e))?;

        let mut stacks = BTreeMap::new();
        for name in Self::discover_stacks(layout)? {
            let path = layout.stack_path(&name);
            debug!("Reading stack from {:?}", path);
            let bytes = fs::read(&path).map_err(|e| ConfigError::io(&path, e))?;
            stacks.insert(name, bytes);
        }

        Ok(RawDocuments { topology, stacks })
    }

    /// Read and decode a single stack.
    pub fn read_stack(layout: &ProjectLayout, name: &str) -> ConfigResult<StackConfig> {
        let path = layout.stack_path(name);
        if !path.exists() {
            return Err(ConfigError::StackNotFound(name.to_string()));
        }
        let bytes = fs::read(&path).map_err(|e| ConfigError::io(&path, e))?;
        Self::decode_stack(name, &bytes)
    }

    /// Names of every stack file in `stacks/`, sorted.
    pub fn discover_stacks(layout: &ProjectLayout) -> ConfigResult<Vec<String>> {
        let pattern = layout.stacks_dir().join("*.yaml");
        let mut names = Vec::new();

        for entry in glob::glob(&pattern.to_string_lossy())? {
            match entry {
                Ok(path) => {
                    if let Some(stem) = path.file_stem() {
                        names.push(stem.to_string_lossy().into_owned());
                    }
                }
                Err(e) => debug!("Skipping unreadable stack entry: {}", e),
            }
        }

        names.sort();
        Ok(names)
    }
}
