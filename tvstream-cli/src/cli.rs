// tvstream-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tvstream_core::HardwareAccelerationMode;

use crate::config::DEFAULT_CHANNEL;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "tvstream: virtual channel transcode engine",
    long_about = "Compiles channel items into ffmpeg invocations and runs them as channel sessions via tvstream-core."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output for troubleshooting
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine configuration file (JSON); TVSTREAM_* variables override it
    #[arg(long, global = true, env = "TVSTREAM_CONFIG", value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Write logs to a timestamped file in this directory instead of stderr
    #[arg(long, global = true, value_name = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Disable colored terminal output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prints the ffmpeg arguments compiled for an item
    Args(ArgsArgs),
    /// Probes a media file and prints it as an item descriptor
    Probe(ProbeArgs),
    /// Plays one item as a channel session
    Play(PlayArgs),
    /// Plays files back to back, looping, on a single transcoder
    Concat(ConcatArgs),
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Args(_) => "args",
            Commands::Probe(_) => "probe",
            Commands::Play(_) => "play",
            Commands::Concat(_) => "concat",
        }
    }
}

/// Item and output selection shared by `args` and `play`.
#[derive(Args, Debug)]
pub struct ItemArgs {
    /// Item descriptor (JSON), e.g. the output of `tvstream probe`
    #[arg(short = 'i', long = "item", required = true, value_name = "ITEM_FILE")]
    pub item: PathBuf,

    /// Optional: Output profile (JSON); defaults to 1080p H.264 MPEG-TS
    #[arg(short = 'p', long = "profile", value_name = "PROFILE_FILE")]
    pub profile: Option<PathBuf>,

    /// Optional: Override the hardware acceleration mode (none, nvenc, qsv, vaapi)
    #[arg(long, value_name = "MODE")]
    pub hwaccel: Option<HardwareAccelerationMode>,
}

#[derive(Args, Debug)]
pub struct ArgsArgs {
    #[command(flatten)]
    pub item: ItemArgs,

    /// Print the arguments as a JSON array instead of a shell-like line
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Media file to probe
    #[arg(value_name = "INPUT_FILE")]
    pub input: PathBuf,

    /// Optional: Start offset written into the descriptor, in milliseconds
    #[arg(long, value_name = "MS")]
    pub start_ms: Option<u64>,
}

/// Session options shared by `play` and `concat`.
#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Channel identifier; one session runs per channel
    #[arg(short = 'c', long, default_value = DEFAULT_CHANNEL)]
    pub channel: String,

    /// Optional: Write the byte stream to this file instead of stdout
    #[arg(short = 'o', long = "output", value_name = "OUTPUT_FILE")]
    pub output: Option<PathBuf>,

    /// Optional: Stop the session after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub limit: Option<u64>,
}

#[derive(Args, Debug)]
pub struct PlayArgs {
    #[command(flatten)]
    pub item: ItemArgs,

    #[command(flatten)]
    pub session: SessionArgs,
}

#[derive(Args, Debug)]
pub struct ConcatArgs {
    /// Files to play in order; the list loops
    #[arg(required = true, num_args = 1.., value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Write an HLS playlist into the stream directory instead of a byte stream
    #[arg(long)]
    pub hls: bool,

    #[command(flatten)]
    pub session: SessionArgs,
}
