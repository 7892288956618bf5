//! Profile loading for the chatline binary
//!
//! The profile is looked up in this order: `--config`, then
//! `<config dir>/chatline/profile.toml`. An explicit path must exist; the
//! default one may be absent, in which case the built-in defaults apply.

use crate::args::CliArgs;
use anyhow::{bail, Context, Result};
use chatline_console::ConsoleConfig;
use std::path::PathBuf;
use tracing::debug;

pub const PROFILE_FILE: &str = "profile.toml";

/// Default profile location.
pub fn default_profile_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chatline")
        .join(PROFILE_FILE)
}

/// Loads the profile and applies command-line overrides.
pub fn load_profile(args: &CliArgs) -> Result<ConsoleConfig> {
    let path = match &args.config {
        Some(path) => {
            if !path.exists() {
                bail!("profile '{}' does not exist", path.display());
            }
            path.clone()
        }
        None => default_profile_path(),
    };
    debug!(target: "chatline", path = %path.display(), "loading profile");

    let mut config = ConsoleConfig::load(&path)
        .with_context(|| format!("failed to load profile '{}'", path.display()))?;
    args.apply_to(&mut config);
    config.resolve_paths();
    config
        .validate()
        .context("invalid settings after command-line overrides")?;
    Ok(config)
}
