//! Implementation of the 'play' subcommand.
//!
//! Compiles one item into a session spec for the requested channel and runs
//! it. MPEG-TS/MKV/NUT profiles stream to stdout or `--output`; HLS profiles
//! write a playlist under the engine's stream directory.

use log::info;
use tvstream_core::{CoreConfig, item_session};

use crate::cli::PlayArgs;
use crate::commands::session::run_session;
use crate::config::{load_item, load_profile};
use crate::error::CliResult;

pub fn run_play(args: &PlayArgs, config: CoreConfig) -> CliResult<()> {
    let item = load_item(&args.item.item)?;
    let profile = load_profile(args.item.profile.as_deref(), args.item.hwaccel, &config)?;

    info!(
        "Playing {} on channel {} ({} {:?})",
        item.path, args.session.channel, profile.resolution, profile.output_format
    );
    let spec = item_session(&args.session.channel, &item, &profile, &config)?;
    run_session(config, spec, &args.session)
}
