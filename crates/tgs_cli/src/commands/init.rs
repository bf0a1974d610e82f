//! Init command - Create a project.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use tgs_config::{ProjectLayout, DEFAULT_STACK};

use super::{display_path, GlobalOptions};

#[derive(Args)]
pub struct InitArgs {
    /// Path to initialize (defaults to --root or the current directory)
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Project name used in resource names (defaults to the directory name)
    #[arg(short, long)]
    name: Option<String>,
}

pub async fn execute(args: InitArgs, global: &GlobalOptions) -> Result<()> {
    let path = match args.path.or_else(|| global.root.clone()) {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    let name = match args.name {
        Some(name) => name,
        None => path
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "project".to_string()),
    };

    info!("Initializing project '{}' at {:?}", name, path);

    let layout = ProjectLayout::init(&path, &name).context("Failed to initialize project")?;

    if !global.quiet {
        println!("✅ Project '{}' initialized", name);
        println!();
        println!("Created:");
        println!("  📄 {}", display_path(&layout, &layout.config_path()));
        println!("  📄 {}", display_path(&layout, &layout.stack_path(DEFAULT_STACK)));
        println!();
        println!("Next steps:");
        println!("  tgs validate");
        println!("  tgs generate");
    }

    Ok(())
}
