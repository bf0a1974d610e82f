//! Generate command - Write the Terragrunt tree.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use tgs_config::LoadedConfig;
use tgs_scaffold::{GenerationReport, Generator, NoSchema, ProviderSchemaFile, SchemaSource};

use super::{display_path, load_validated, GlobalOptions};

#[derive(Args)]
pub struct GenerateArgs {
    /// Output directory (defaults to <root>/.infra)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Provider schema dump from `terraform providers schema -json`
    #[arg(long)]
    schema: Option<PathBuf>,
}

pub async fn execute(args: GenerateArgs, global: &GlobalOptions) -> Result<()> {
    let layout = global.project()?;
    let loaded = load_validated(&layout, global.quiet)?;
    let output = args.output.unwrap_or_else(|| layout.output_dir());

    let report = run(output.clone(), args.schema, false, loaded).await?;

    if !global.quiet {
        println!(
            "✅ Generated {} unit(s) into {}",
            report.units,
            display_path(&layout, &output)
        );
        super::plan::print_summary(&report);
    }
    Ok(())
}

/// Run the generator on a blocking task; Ctrl-C stops it before the next unit.
pub async fn run(
    output: PathBuf,
    schema: Option<PathBuf>,
    dry_run: bool,
    loaded: LoadedConfig,
) -> Result<GenerationReport> {
    let schema: Arc<dyn SchemaSource> = match schema {
        Some(path) => Arc::new(
            ProviderSchemaFile::load(&path)
                .with_context(|| format!("Failed to load provider schema {:?}", path))?,
        ),
        None => Arc::new(NoSchema),
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let signal = {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping after the current unit");
                cancel.store(true, Ordering::SeqCst);
            }
        })
    };

    let generator = Generator::new(output)
        .with_dry_run(dry_run)
        .with_cancel(cancel)
        .with_schema(schema);

    info!("Starting generation");
    let result = tokio::task::spawn_blocking(move || {
        generator.generate(&loaded.topology, &loaded.stacks)
    })
    .await;
    signal.abort();

    Ok(result.context("Generation task failed")??)
}
