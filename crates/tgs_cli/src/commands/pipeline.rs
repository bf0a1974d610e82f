//! Pipeline command - Write Azure DevOps pipelines.

use anyhow::Result;
use clap::Args;

use tgs_config::ProjectLayout;
use tgs_scaffold::PipelineGenerator;

use super::{display_path, load_validated, GlobalOptions};

#[derive(Args)]
pub struct PipelineArgs {
    /// Show which files would change without writing
    #[arg(long)]
    dry_run: bool,
}

pub async fn execute(args: PipelineArgs, global: &GlobalOptions) -> Result<()> {
    let layout = global.project()?;
    let loaded = load_validated(&layout, global.quiet)?;

    let records = PipelineGenerator::new(layout.pipeline_dir(), ProjectLayout::OUTPUT_DIR)
        .with_dry_run(args.dry_run)
        .generate(&loaded.topology, &loaded.stacks)?;

    if !global.quiet {
        for record in &records {
            println!("  {:<9} {}", record.action, record.path.display());
        }
        println!(
            "✅ Pipelines {} {}",
            if args.dry_run { "planned for" } else { "written to" },
            display_path(&layout, &layout.pipeline_dir())
        );
    }
    Ok(())
}
