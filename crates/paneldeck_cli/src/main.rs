//! `paneldeck` command-line entry point.
//!
//! # Responsibility
//! - Render dashboard manifests and resolve deep-link fragments from the
//!   shell.
//! - Keep `ping`/`version` probes for quick core linkage checks.

use clap::Parser;
use paneldeck_core::{default_log_level, init_logging, init_stderr_logging, LoggingError};

mod cli;
mod commands;

use crate::cli::{Cli, Command};
use crate::commands::{run_parse, run_render, run_tab_content};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = start_logging(&cli) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let outcome = match &cli.command {
        Command::Render(args) => run_render(&args.manifest, args.fragment.as_deref()),
        Command::TabContent(args) => run_tab_content(&args.manifest, &args.tab, args.detail),
        Command::Parse(args) => run_parse(&args.context, &args.fragment),
        Command::Ping => Ok(format!("paneldeck_core ping={}", paneldeck_core::ping())),
        Command::Version => Ok(format!(
            "paneldeck_core version={}",
            paneldeck_core::core_version()
        )),
    };

    match outcome {
        Ok(output) => println!("{output}"),
        Err(error) => {
            log::error!("event=cli_command module=cli status=error error={error:#}");
            eprintln!("error: {error:#}");
            std::process::exit(1);
        }
    }
}

fn start_logging(cli: &Cli) -> Result<(), LoggingError> {
    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    match &cli.log_dir {
        Some(dir) => init_logging(level, &dir.to_string_lossy()),
        None => init_stderr_logging(level),
    }
}
