use crate::config::Config;
use crate::content::ContentBundle;
use crate::render;
use crate::script::library::ScriptLibrary;
use anyhow::{Context, Result};
use std::path::Path;

pub fn list(config: &Config) -> Result<()> {
    let dir = config.scripts_dir();
    let library = ScriptLibrary::load(Some(&dir))?;
    for script in library.iter() {
        let marker = if script.name() == config.playback.script {
            "*"
        } else {
            " "
        };
        println!(
            "{} {:<20} {:>2} steps  {}",
            marker,
            script.name(),
            script.len(),
            script.title()
        );
    }
    println!("\noverlay directory: {}", dir.display());
    Ok(())
}

/// Print the state after the first `at` steps, without playing anything.
pub fn show(
    config: &Config,
    name: Option<&str>,
    file: Option<&Path>,
    at: usize,
    json: bool,
) -> Result<()> {
    let script = super::resolve_script(config, name, file)?;
    let replay = script.replay_to(at).with_context(|| {
        format!(
            "--at {} is beyond the end of '{}' ({} steps)",
            at,
            script.name(),
            script.len()
        )
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&replay)?);
        return Ok(());
    }

    let content = ContentBundle::bundled()?;
    println!("{}", render::render_state(&replay.state, &content, false));
    println!("{}", render::render_transcript(&replay.messages));
    println!("\n[{}/{}] {}", at, script.len(), script.title());
    Ok(())
}
