//! Plan command - Show what generate would change.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use tgs_scaffold::{FileAction, GenerationReport};

use super::{load_validated, GlobalOptions};

#[derive(Args)]
pub struct PlanArgs {
    /// Output directory to compare against (defaults to <root>/.infra)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Provider schema dump from `terraform providers schema -json`
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(args: PlanArgs, global: &GlobalOptions) -> Result<()> {
    let layout = global.project()?;
    let loaded = load_validated(&layout, global.quiet || args.json)?;
    let output = args.output.unwrap_or_else(|| layout.output_dir());

    let report = super::generate::run(output, args.schema, true, loaded).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for file in report.changed() {
        let marker = match file.action {
            FileAction::Create => "+",
            _ => "~",
        };
        println!("  {} {}", marker, file.path.display());
    }
    if report.is_unchanged() {
        println!("✅ Tree is up to date ({} unit(s))", report.units);
    } else {
        print_summary(&report);
    }
    Ok(())
}

/// One-line count of file actions.
pub fn print_summary(report: &GenerationReport) {
    println!(
        "   {} created, {} updated, {} unchanged, {} preserved",
        report.count(FileAction::Create),
        report.count(FileAction::Update),
        report.count(FileAction::Unchanged),
        report.count(FileAction::Preserved)
    );
}
