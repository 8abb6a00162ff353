mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::io::IsTerminal;

use clap::Parser;
use clap::error::ErrorKind;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::RunConfig;
use crate::error::{CliError, exit_code};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.kind() == ErrorKind::DisplayVersion => {
            let _ = err.print();
            std::process::exit(exit_code::SUCCESS);
        }
        // Help and argument errors both go to stderr and fail.
        Err(err) => {
            eprint!("{}", err.render());
            std::process::exit(exit_code::GENERAL);
        }
    };

    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let cfg = RunConfig::load(&cli)?;
    tracing::debug!(?cfg, "effective configuration");

    if cli.lax {
        info!("--lax has no effect; every rule is reconnected");
    }

    if cli.dump {
        return commands::dump::handle(&cfg, cli.output);
    }
    commands::persist::handle(&cfg, cli.once).await
}
