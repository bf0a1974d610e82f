//! CLI command definitions.
//!
//! Each subcommand lives in its own module with an `Args` struct and an async
//! `execute` function.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use tgs_config::{ConfigError, ConfigLoader, LoadedConfig, ProjectLayout, ValidationReport};

pub mod create;
pub mod details;
pub mod diagram;
pub mod generate;
pub mod init;
pub mod list;
pub mod pipeline;
pub mod plan;
pub mod validate;
pub mod validate_config;

/// tgs - Terragrunt stack scaffolder
#[derive(Parser)]
#[command(name = "tgs")]
#[command(version, about = "tgs - multi-region Terragrunt tree and pipeline generator")]
#[command(long_about = r#"
tgs turns a declarative topology (subscriptions, environments) and stacks
(components, regions, apps, dependencies) into a dependency-ordered Terragrunt
tree and Azure DevOps pipelines.

WORKFLOW:
  init              → Create .tgs/config.yaml and the main stack
  create stack      → Add a stack from the starter template
  create container  → Create the remote state container per subscription
  validate          → Check topology and stacks, report every problem
  plan              → Show what generate would change
  generate          → Write the .infra/ tree
  pipeline          → Write .azuredevops/ pipelines

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  4 - Generation error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Project root (defaults to the nearest directory containing .tgs/)
    #[arg(long, global = true, env = "TGS_ROOT")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a project with a default topology and stack
    Init(init::InitArgs),

    /// Create a stack or the remote state container
    #[command(subcommand)]
    Create(create::CreateCommands),

    /// List stacks and the environments deploying them
    List(list::ListArgs),

    /// Generate the Terragrunt tree
    Generate(generate::GenerateArgs),

    /// Show what generate would change without writing
    Plan(plan::PlanArgs),

    /// Validate the topology and stacks
    Validate(validate::ValidateArgs),

    /// Validate the topology document only
    #[command(name = "validate-config")]
    ValidateConfig(validate_config::ValidateConfigArgs),

    /// Show a stack's components, units and deployment stages
    Details(details::DetailsArgs),

    /// Print a stack's dependency graph as Mermaid
    Diagram(diagram::DiagramArgs),

    /// Generate Azure DevOps pipelines
    Pipeline(pipeline::PipelineArgs),
}

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub root: Option<PathBuf>,
    pub quiet: bool,
}

impl GlobalOptions {
    /// Open the project at `--root`/`TGS_ROOT`, or the nearest one above the current directory.
    pub fn project(&self) -> Result<ProjectLayout> {
        if let Some(root) = &self.root {
            return ProjectLayout::open(root).with_context(|| format!("No tgs project at {:?}", root));
        }

        let current_dir = std::env::current_dir()?;
        let root = ProjectLayout::find_root(&current_dir).ok_or_else(|| {
            ConfigError::NotFound(current_dir.join(ProjectLayout::CONFIG_DIR).join("config.yaml"))
        })?;
        Ok(ProjectLayout::open(root)?)
    }
}

/// Load and validate the project, printing every validation problem.
///
/// Dependency cycles count as validation errors so nothing is generated from a
/// stack that cannot be ordered.
pub fn load_validated(layout: &ProjectLayout, quiet: bool) -> Result<LoadedConfig> {
    match ConfigLoader::from_project(layout) {
        Ok(loaded) => {
            let mut cycles = ValidationReport::new();
            validate::check_all_cycles(&loaded.stacks, &mut cycles);
            if !cycles.is_valid() {
                print_report(&cycles);
                return Err(ConfigError::Invalid(cycles).into());
            }

            if !quiet {
                for warning in &loaded.warnings {
                    println!("⚠️  {}", warning);
                }
            }
            Ok(loaded)
        }
        Err(err) => {
            if let Some(report) = err.report() {
                print_report(report);
            }
            Err(err.into())
        }
    }
}

/// Print errors and warnings of a report.
pub fn print_report(report: &ValidationReport) {
    for error in &report.errors {
        eprintln!("❌ {}", error);
    }
    for warning in &report.warnings {
        println!("⚠️  {}", warning);
    }
}

/// Render `path` relative to the project root when possible.
pub fn display_path(layout: &ProjectLayout, path: &Path) -> String {
    path.strip_prefix(layout.root_path())
        .unwrap_or(path)
        .display()
        .to_string()
}
