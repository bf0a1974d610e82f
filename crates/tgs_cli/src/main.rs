//! tgs CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Validation failure
//! - 4: Generation error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tgs_config::ConfigError;
use tgs_graph::GraphError;
use tgs_scaffold::ScaffoldError;

mod commands;

use commands::{Cli, Commands, GlobalOptions};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const GENERATION_ERROR: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over the defaults
    let default_level = if cli.verbose {
        "tgs=debug"
    } else if cli.quiet {
        "tgs=warn"
    } else {
        "tgs=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,{}", default_level)));

    // Logging may already be initialized when embedded
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let global = GlobalOptions {
        root: cli.root.clone(),
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args, &global).await,
        Commands::Create(command) => commands::create::execute(command, &global).await,
        Commands::List(args) => commands::list::execute(args, &global).await,
        Commands::Generate(args) => commands::generate::execute(args, &global).await,
        Commands::Plan(args) => commands::plan::execute(args, &global).await,
        Commands::Validate(args) => commands::validate::execute(args, &global).await,
        Commands::ValidateConfig(args) => commands::validate_config::execute(args, &global).await,
        Commands::Details(args) => commands::details::execute(args, &global).await,
        Commands::Diagram(args) => commands::diagram::execute(args, &global).await,
        Commands::Pipeline(args) => commands::pipeline::execute(args, &global).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Map the first typed error in the chain to an exit code.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if cause.downcast_ref::<ScaffoldError>().is_some() || cause.downcast_ref::<GraphError>().is_some() {
            return ExitCodes::GENERATION_ERROR;
        }
        if let Some(config) = cause.downcast_ref::<ConfigError>() {
            return match config {
                ConfigError::Invalid(_) | ConfigError::Structural { .. } => ExitCodes::VALIDATION_FAILURE,
                ConfigError::NotFound(_) | ConfigError::AlreadyExists(_) | ConfigError::StackNotFound(_) => {
                    ExitCodes::INVALID_ARGS
                }
                _ => ExitCodes::GENERAL_ERROR,
            };
        }
    }
    ExitCodes::GENERAL_ERROR
}
