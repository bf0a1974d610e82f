//! Diagram command - Print a stack's dependency graph as Mermaid.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use tgs_config::{ConfigLoader, DEFAULT_STACK};
use tgs_graph::{render_mermaid, DependencyGraph};

use super::GlobalOptions;

#[derive(Args)]
pub struct DiagramArgs {
    /// Stack name
    #[arg(default_value = DEFAULT_STACK)]
    stack: String,

    /// Write the diagram to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn execute(args: DiagramArgs, global: &GlobalOptions) -> Result<()> {
    let layout = global.project()?;
    let stack = ConfigLoader::read_stack(&layout, &args.stack)?;
    let diagram = render_mermaid(&DependencyGraph::build(&stack)?);

    match args.output {
        Some(path) => {
            fs::write(&path, &diagram).with_context(|| format!("Failed to write {:?}", path))?;
            if !global.quiet {
                println!("✅ Diagram written to {}", path.display());
            }
        }
        None => print!("{}", diagram),
    }
    Ok(())
}
