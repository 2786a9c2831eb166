// tvstream-cli/src/lib.rs
//
// Library portion of the tvstream CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod terminal;

// Re-export items needed by the binary or integration tests
pub use cli::{ArgsArgs, Cli, Commands, ConcatArgs, PlayArgs, ProbeArgs};
pub use commands::args::run_args;
pub use commands::concat::run_concat;
pub use commands::play::run_play;
pub use commands::probe::run_probe;
