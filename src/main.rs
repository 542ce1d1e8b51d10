//! comware-push - push full configurations to Comware 7 switches
//!
//! This is the main entry point for the comware-push CLI.

mod cli;

use anyhow::{Context, Result};
use cli::commands::CommandContext;
use cli::output::OutputFormatter;
use cli::{Cli, Commands};
use comware_push::config::Config;
use comware_push::error::Error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    init_logging(cli.verbosity(), cli.is_json());

    if cli.verbosity() >= 2 {
        eprintln!("comware-push v{}", comware_push::version());
    }

    let exit_code = match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            OutputFormatter::new(!cli.no_color, cli.is_json(), cli.verbosity())
                .error(&format!("{:#}", e));
            exit_code_for(&e)
        }
    };

    std::process::exit(exit_code);
}

async fn run(cli: &Cli) -> Result<i32> {
    let config = Config::load(cli.config.as_ref()).context("Failed to load config")?;
    let mut ctx = CommandContext::new(cli, config);

    match &cli.command {
        Commands::Apply(args) => args.execute(&mut ctx).await,
        Commands::Plan(args) => args.execute(&mut ctx).await,
    }
}

/// Exit code of the crate error behind `err`, 1 for anything else
fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<Error>().map_or(1, Error::exit_code)
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(verbosity >= 3),
            )
            .init();
    }
}
