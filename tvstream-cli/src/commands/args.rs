//! Implementation of the 'args' subcommand.
//!
//! Compiles an item against an output profile and prints the resulting
//! transcoder invocation without running it.

use log::debug;
use serde_json::json;
use tvstream_core::{CoreConfig, OutputProfile, PlayableItem, TranscodeRequest, compile_item};

use crate::cli::ArgsArgs;
use crate::config::{load_item, load_profile};
use crate::error::CliResult;
use crate::terminal::{print_section, print_status};

pub fn run_args(args: &ArgsArgs, config: CoreConfig) -> CliResult<()> {
    let item = load_item(&args.item.item)?;
    let profile = load_profile(args.item.profile.as_deref(), args.item.hwaccel, &config)?;

    if !args.json {
        print_section("Pipeline");
        print_status("Item", &item.path, true);
        print_status("Kind", item.kind.as_str(), false);
        print_status("Output", &format!("{} {:?}", profile.resolution, profile.output_format), false);
    }

    let rendered = render_args(&item, &profile, &config, args.json)?;
    println!("{rendered}");
    Ok(())
}

/// Compiles `item` and renders the invocation, as JSON or as a shell-like line.
pub fn render_args(item: &PlayableItem, profile: &OutputProfile, config: &CoreConfig, as_json: bool) -> CliResult<String> {
    let pipeline = compile_item(item, profile, config)?;
    let accel = pipeline.accel();
    debug!("Resolved acceleration: decode {} / encode {}", accel.decoder, accel.encoder);

    let request = TranscodeRequest::from_pipeline(&config.ffmpeg_path, &pipeline)?;
    if as_json {
        let env: serde_json::Map<String, serde_json::Value> = request
            .env
            .iter()
            .map(|(k, v)| (k.clone(), json!(v)))
            .collect();
        let value = json!({
            "program": request.program.display().to_string(),
            "env": env,
            "args": request.args,
            "decoder": accel.decoder.as_str(),
            "encoder": accel.encoder.as_str(),
        });
        return Ok(value.to_string());
    }

    print_status("Decoder", accel.decoder.as_str(), false);
    print_status("Encoder", accel.encoder.as_str(), false);
    Ok(request.display())
}
