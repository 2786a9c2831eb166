// ============================================================================
// tvstream-cli/src/main.rs
// ============================================================================
//
// TVSTREAM CLI: Entry Point
//
// Parses arguments, initializes logging, loads the engine config and
// dispatches to the selected command. Errors are printed to stderr and turn
// into a non-zero exit code.
//
// AI-ASSISTANT-INFO: Main entry point for the tvstream command-line tool

use std::process;

use clap::Parser;
use log::debug;
use tvstream_cli::config::load_config;
use tvstream_cli::error::{CliResult, suggestion};
use tvstream_cli::terminal::{print_error, set_color};
use tvstream_cli::{Cli, Commands, logging, run_args, run_concat, run_play, run_probe};

fn run(cli: Cli) -> CliResult<()> {
    if let Some(path) = logging::init(cli.verbose, cli.log_dir.as_deref(), cli.command.name())? {
        debug!("Logging to {}", path.display());
    }

    let config = || load_config(cli.config.as_deref());
    match &cli.command {
        Commands::Args(args) => run_args(args, config()?),
        Commands::Probe(args) => run_probe(args),
        Commands::Play(args) => run_play(args, config()?),
        Commands::Concat(args) => run_concat(args, config()?),
    }
}

fn main() {
    let cli = Cli::parse();
    if cli.no_color || std::env::var_os("NO_COLOR").is_some() {
        set_color(false);
    }

    if let Err(err) = run(cli) {
        debug!("{err:?}");
        print_error("Command failed", &err.to_string(), suggestion(&err));
        process::exit(1);
    }
}
