use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

// ---------------------------------------------------------------------------
// Persisted format: ~/.pablo/profile.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub likes: Vec<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "Sabrina".to_string(),
            likes: vec!["family-friendly".to_string(), "food".to_string()],
        }
    }
}

impl Profile {
    /// Load from `~/.pablo/profile.json`. Returns the default profile if the
    /// file is missing or invalid.
    pub fn load(file: &Path) -> Self {
        if !file.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(file) {
            Ok(content) => match serde_json::from_str::<Profile>(&content) {
                Ok(profile) if !profile.name.trim().is_empty() => profile,
                Ok(_) => {
                    warn!("Ignoring profile.json with an empty name");
                    Self::default()
                }
                Err(e) => {
                    warn!("Failed to parse profile.json: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read profile.json: {}", e);
                Self::default()
            }
        }
    }

    /// Save to disk. Creates parent directories if needed.
    pub fn save(&self, file: &Path) -> anyhow::Result<()> {
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(file, json)?;
        Ok(())
    }

    pub fn set_name(&mut self, name: &str) -> anyhow::Result<()> {
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("Profile name cannot be empty");
        }
        self.name = name.to_string();
        Ok(())
    }

    /// Add a liked tag. Returns false if it was already present or blank.
    pub fn like(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.likes.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            return false;
        }
        self.likes.push(tag.to_string());
        true
    }

    /// Remove a liked tag. Returns false if it was not present.
    pub fn unlike(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        let before = self.likes.len();
        self.likes.retain(|t| !t.eq_ignore_ascii_case(tag));
        self.likes.len() != before
    }

    /// Likes joined for display, e.g. `family-friendly, food`.
    pub fn likes_summary(&self) -> String {
        self.likes.join(", ")
    }
}

/// Resolve the profile file: configured path, or `~/.pablo/profile.json`.
pub fn profile_file(configured: Option<&str>) -> PathBuf {
    match configured {
        Some(path) => crate::paths::expand_tilde(path),
        None => crate::paths::profile_file(),
    }
}
