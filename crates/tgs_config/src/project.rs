//! Project layout discovery and initialization.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::models::DEFAULT_STACK;
use crate::writer::ConfigWriter;

/// Locations of the configuration documents and generated output of a project.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root_path: PathBuf,
}

impl ProjectLayout {
    /// Directory holding `config.yaml` and `stacks/`.
    pub const CONFIG_DIR: &'static str = ".tgs";
    /// Directory the Terragrunt tree is generated into.
    pub const OUTPUT_DIR: &'static str = ".infra";
    /// Directory the pipeline files are generated into.
    pub const PIPELINE_DIR: &'static str = ".azuredevops";

    /// Check if a project exists at the given path.
    pub fn exists(path: impl AsRef<Path>) -> bool {
        path.as_ref().join(Self::CONFIG_DIR).join("config.yaml").exists()
    }

    /// Find the project root by walking up the directory tree.
    pub fn find_root(start_path: impl AsRef<Path>) -> Option<PathBuf> {
        let mut current = start_path.as_ref().to_path_buf();
        loop {
            if Self::exists(&current) {
                return Some(current);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Initialize a new project with a default topology and `main` stack.
    pub fn init(path: impl AsRef<Path>, project_name: &str) -> ConfigResult<Self> {
        let layout = Self {
            root_path: path.as_ref().to_path_buf(),
        };

        let config_path = layout.config_path();
        if config_path.exists() {
            return Err(ConfigError::AlreadyExists(layout.config_dir()));
        }

        info!("Initializing project '{}' at {:?}", project_name, layout.root_path);

        let stacks_dir = layout.stacks_dir();
        fs::create_dir_all(&stacks_dir).map_err(|e| ConfigError::io(&stacks_dir, e))?;

        ConfigWriter::write_topology(&layout, &ConfigWriter::default_topology(project_name))?;
        ConfigWriter::create_stack(&layout, DEFAULT_STACK)?;

        debug!("Project initialized");
        Ok(layout)
    }

    /// Open an existing project rooted exactly at `path`.
    pub fn open(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let root_path = path.as_ref().to_path_buf();
        let config_path = root_path.join(Self::CONFIG_DIR).join("config.yaml");

        if !config_path.exists() {
            return Err(ConfigError::NotFound(config_path));
        }

        Ok(Self { root_path })
    }

    /// Layout rooted at `path` without checking that anything exists yet.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: path.into(),
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root_path.join(Self::CONFIG_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir().join("config.yaml")
    }

    pub fn stacks_dir(&self) -> PathBuf {
        self.config_dir().join("stacks")
    }

    pub fn stack_path(&self, name: &str) -> PathBuf {
        self.stacks_dir().join(format!("{}.yaml", name))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root_path.join(Self::OUTPUT_DIR)
    }

    pub fn pipeline_dir(&self) -> PathBuf {
        self.root_path.join(Self::PIPELINE_DIR)
    }
}
