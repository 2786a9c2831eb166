// ============================================================================
// tvstream-cli/src/config.rs
// ============================================================================
//
// INPUT LOADING: Engine Config, Items and Output Profiles
//
// The engine config is layered: built-in defaults, then an optional JSON
// file, then TVSTREAM_* environment variables. Items and profiles are JSON
// documents in the same shape the core serializes them in.
//
// AI-ASSISTANT-INFO: Configuration and descriptor loading for the CLI

use std::fs;
use std::path::Path;

use log::debug;
use serde::de::DeserializeOwned;
use tvstream_core::{CoreConfig, CoreError, HardwareAccelerationMode, OutputProfile, PlayableItem};

use crate::error::{CliErrorContext, CliResult};

/// Channel used when none is given.
pub const DEFAULT_CHANNEL: &str = "1";

/// Loads and validates the engine config.
pub fn load_config(path: Option<&Path>) -> CliResult<CoreConfig> {
    let config = match path {
        Some(path) => {
            debug!("Loading engine config from {}", path.display());
            CoreConfig::from_json_file(path)
                .cli_with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => CoreConfig::default(),
    };
    let config = config.with_env_overrides()?;
    config.validate()?;
    Ok(config)
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> CliResult<T> {
    let text = fs::read_to_string(path).cli_with_context(|| format!("Failed to read {what} {}", path.display()))?;
    serde_json::from_str(&text)
        .map_err(|e| CoreError::JsonParseError(format!("{what} {}: {e}", path.display())))
}

/// Loads a playable item and rejects it early if it cannot be compiled.
pub fn load_item(path: &Path) -> CliResult<PlayableItem> {
    let item: PlayableItem = read_json(path, "item")?;
    item.validate()?;
    Ok(item)
}

/// Loads the output profile.
///
/// Without a profile file the defaults are used with the engine's hardware
/// acceleration mode. `hwaccel` overrides either.
pub fn load_profile(
    path: Option<&Path>,
    hwaccel: Option<HardwareAccelerationMode>,
    config: &CoreConfig,
) -> CliResult<OutputProfile> {
    let mut profile = match path {
        Some(path) => read_json(path, "profile")?,
        None => OutputProfile {
            hardware_acceleration: config.hardware_acceleration,
            ..OutputProfile::default()
        },
    };
    if let Some(mode) = hwaccel {
        profile.hardware_acceleration = mode;
    }
    Ok(profile)
}
