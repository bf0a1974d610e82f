//! Details command - Show a stack's components, units and stages.

use anyhow::Result;
use clap::Args;

use tgs_config::{ConfigLoader, DEFAULT_STACK};
use tgs_graph::{order_for_pipeline, DependencyGraph};

use super::GlobalOptions;

#[derive(Args)]
pub struct DetailsArgs {
    /// Stack name
    #[arg(default_value = DEFAULT_STACK)]
    stack: String,
}

pub async fn execute(args: DetailsArgs, global: &GlobalOptions) -> Result<()> {
    let layout = global.project()?;
    let stack = ConfigLoader::read_stack(&layout, &args.stack)?;
    let graph = DependencyGraph::build(&stack)?;

    println!("📦 {} v{}", stack.stack.name, stack.stack.version);
    if !stack.stack.description.is_empty() {
        println!("   {}", stack.stack.description);
    }

    println!();
    println!("Components:");
    for (name, component) in &stack.components {
        println!("  {} ({} {} {})", name, component.source, component.provider, component.version);
        for dep in &component.deps {
            println!("      depends on {}", dep);
        }
    }

    println!();
    println!("Deployment stages:");
    for stage in order_for_pipeline(&graph) {
        println!("  Stage {}:", stage.index);
        for unit in &stage.units {
            let deps: Vec<String> = graph.dependencies_of(unit).iter().map(ToString::to_string).collect();
            if deps.is_empty() {
                println!("    {}", unit);
            } else {
                println!("    {} <- {}", unit, deps.join(", "));
            }
        }
    }

    Ok(())
}
