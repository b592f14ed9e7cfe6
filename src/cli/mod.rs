pub mod ask;
pub mod doctor;
pub mod play;
pub mod profile_cmd;
pub mod scripts_cmd;

use crate::config::Config;
use crate::script::library::ScriptLibrary;
use crate::script::Script;
use anyhow::Result;
use std::path::Path;

/// Pick the script a command should use: an explicit file wins, then a
/// library name, then the configured default.
pub fn resolve_script(config: &Config, name: Option<&str>, file: Option<&Path>) -> Result<Script> {
    if let Some(path) = file {
        return ScriptLibrary::load_file(path);
    }
    let library = ScriptLibrary::load(Some(&config.scripts_dir()))?;
    library.require(name.unwrap_or(&config.playback.script))
}
