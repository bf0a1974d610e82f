//! Validate command - Check the topology and stacks.

use std::collections::BTreeMap;

use anyhow::Result;
use clap::Args;
use tracing::{debug, info};

use tgs_config::{ConfigError, ConfigLoader, ConfigValidator, StackConfig, ValidationReport};
use tgs_graph::{DependencyGraph, GraphError};

use super::{print_report, GlobalOptions};

#[derive(Args)]
pub struct ValidateArgs {
    /// Validate a single stack instead of the whole project
    stack: Option<String>,
}

pub async fn execute(args: ValidateArgs, global: &GlobalOptions) -> Result<()> {
    let layout = global.project()?;

    let report = match &args.stack {
        Some(name) => {
            info!("Validating stack: {}", name);
            let stack = ConfigLoader::read_stack(&layout, name)?;
            let mut report = ConfigValidator::validate_stack(name, &stack);
            check_cycles(name, &stack, &mut report);
            report
        }
        None => {
            info!("Validating project at {:?}", layout.root_path());
            let raw = ConfigLoader::read_project(&layout)?;
            let (topology, stacks) = ConfigLoader::decode(&raw.topology, &raw.stacks)?;
            let mut report = ConfigValidator::validate(&topology, &stacks);
            check_all_cycles(&stacks, &mut report);
            report
        }
    };

    finish(report, global.quiet)
}

/// Report dependency cycles, which only surface once the graph is built.
pub fn check_cycles(key: &str, stack: &StackConfig, report: &mut ValidationReport) {
    match DependencyGraph::build(stack) {
        Ok(graph) => debug!("Stack '{}' has {} stage(s)", key, graph.stage_count()),
        Err(err @ GraphError::Cycle { .. }) => {
            report.add_error(format!("stack '{}'", key), err.to_string());
        }
        // Notation problems are already reported by the validator
        Err(err) => debug!("Skipping cycle check for '{}': {}", key, err),
    }
}

pub fn check_all_cycles(stacks: &BTreeMap<String, StackConfig>, report: &mut ValidationReport) {
    for (key, stack) in stacks {
        check_cycles(key, stack, report);
    }
}

/// Print a report and fail when it has errors.
pub fn finish(report: ValidationReport, quiet: bool) -> Result<()> {
    print_report(&report);

    if !report.is_valid() {
        println!();
        println!("❌ Validation failed with {} error(s)", report.errors.len());
        return Err(ConfigError::Invalid(report).into());
    }

    if !quiet {
        println!("✅ Validation passed ({} warning(s))", report.warnings.len());
    }
    Ok(())
}
