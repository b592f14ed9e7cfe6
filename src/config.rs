use crate::logging::LoggingSettings;
use crate::player::{PlaybackSettings, PlaybackSpeed, Timing};
use crate::script::library::DEFAULT_SCRIPT;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "pablo.toml";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PlaybackConfig {
    pub script: String,
    pub speed: PlaybackSpeed,
    pub autoplay: bool,
    pub simulate_typing: bool,
    pub muted: bool,
    pub booking_sentinel: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        let defaults = PlaybackSettings::default();
        Self {
            script: DEFAULT_SCRIPT.to_string(),
            speed: defaults.speed,
            autoplay: defaults.autoplay,
            simulate_typing: defaults.simulate_typing,
            muted: defaults.muted,
            booking_sentinel: defaults.booking_sentinel,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub directory: Option<String>,
    pub retention_days: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProfileConfig {
    /// Profile JSON file. Defaults to `~/.pablo/profile.json`.
    pub path: Option<String>,
    /// Script overlay directory. Defaults to `~/.pablo/scripts`.
    pub scripts_dir: Option<String>,
}

impl Config {
    /// Search the usual places for `pablo.toml`. Returns the defaults and
    /// `None` when no file exists.
    pub fn load_with_path() -> Result<(Self, Option<PathBuf>)> {
        let mut candidates = Vec::new();

        if let Ok(explicit) = std::env::var("PABLO_CONFIG") {
            candidates.push(PathBuf::from(explicit));
        }

        candidates.push(PathBuf::from(CONFIG_FILE));

        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("pablo").join(CONFIG_FILE));
        }

        candidates.push(crate::paths::config_dir().join(CONFIG_FILE));

        for path in candidates {
            if path.exists() {
                let config = Self::load_from(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((Config::default(), None))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.playback.script.trim().is_empty() {
            anyhow::bail!("playback.script cannot be empty");
        }
        if self.playback.booking_sentinel.is_empty() {
            anyhow::bail!("playback.booking_sentinel cannot be empty");
        }
        if self.timing.assistant_char_ms == 0 {
            anyhow::bail!("timing.assistant_char_ms must be greater than 0");
        }
        if self.timing.user_char_ms == 0 {
            anyhow::bail!("timing.user_char_ms must be greater than 0");
        }
        if self.logging.retention_days == Some(0) {
            anyhow::bail!("logging.retention_days must be greater than 0");
        }
        Ok(())
    }

    pub fn playback_settings(&self) -> PlaybackSettings {
        PlaybackSettings {
            timing: self.timing.clone(),
            speed: self.playback.speed,
            autoplay: self.playback.autoplay,
            simulate_typing: self.playback.simulate_typing,
            muted: self.playback.muted,
            booking_sentinel: self.playback.booking_sentinel.clone(),
        }
    }

    pub fn logging_settings(&self, suppress_stderr: bool) -> LoggingSettings<'_> {
        LoggingSettings {
            level: self.logging.level.as_deref(),
            directory: self.logging.directory.as_deref(),
            retention_days: self.logging.retention_days,
            suppress_stderr,
        }
    }

    pub fn profile_path(&self) -> PathBuf {
        crate::profile::profile_file(self.profile.path.as_deref())
    }

    pub fn scripts_dir(&self) -> PathBuf {
        match self.profile.scripts_dir.as_deref() {
            Some(dir) => crate::paths::expand_tilde(dir),
            None => crate::paths::scripts_dir(),
        }
    }
}
