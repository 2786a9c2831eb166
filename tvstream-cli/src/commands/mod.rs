//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// `args`: print the compiled transcoder invocation for an item.
pub mod args;
/// `concat`: loop a list of files on one transcoder.
pub mod concat;
/// `play`: run one item as a channel session.
pub mod play;
/// `probe`: describe a media file as an item.
pub mod probe;
pub mod session;
