//! Script library.
//!
//! Loads the scripts compiled in from `assets/scripts/`, then overlays any
//! `.yaml`/`.yml` files found in the user's scripts directory
//! (`~/.pablo/scripts/` by default). An overlay file replaces the bundled
//! script with the same file stem or adds a new one.

use super::Script;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Script played when nothing else is configured.
pub const DEFAULT_SCRIPT: &str = "super-dad-nyc";

// ---------------------------------------------------------------------------
// Embedded defaults (compile-time)
// ---------------------------------------------------------------------------

const BUNDLED: &[(&str, &str)] = &[
    (
        "super-dad-nyc",
        include_str!("../../assets/scripts/super-dad-nyc.yaml"),
    ),
    (
        "midtown-family",
        include_str!("../../assets/scripts/midtown-family.yaml"),
    ),
    (
        "social-onboarding",
        include_str!("../../assets/scripts/social-onboarding.yaml"),
    ),
    (
        "tokyo-hello",
        include_str!("../../assets/scripts/tokyo-hello.yaml"),
    ),
];

pub struct ScriptLibrary {
    scripts: BTreeMap<String, Script>,
}

impl ScriptLibrary {
    /// Create a library seeded with the bundled scripts, optionally overlaid
    /// with files from `override_dir`.
    pub fn load(override_dir: Option<&Path>) -> Result<Self> {
        let mut scripts = BTreeMap::new();
        for (name, content) in BUNDLED {
            let script = Script::from_yaml_str(name, content)
                .with_context(|| format!("bundled script '{}' is invalid", name))?;
            scripts.insert(name.to_string(), script);
        }

        if let Some(dir) = override_dir {
            Self::overlay_from_dir(&mut scripts, dir);
        }

        Ok(Self { scripts })
    }

    pub fn get(&self, name: &str) -> Option<&Script> {
        self.scripts.get(name)
    }

    /// Like [`get`](Self::get) but reports the available names on a miss.
    pub fn require(&self, name: &str) -> Result<Script> {
        match self.scripts.get(name) {
            Some(script) => Ok(script.clone()),
            None => anyhow::bail!(
                "Unknown script '{}'. Available: {}",
                name,
                self.names().collect::<Vec<_>>().join(", ")
            ),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scripts.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Script> {
        self.scripts.values()
    }

    /// Load a single script file; the file stem becomes its name.
    pub fn load_file(path: &Path) -> Result<Script> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid script path: {}", path.display()))?;
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        Script::from_yaml_str(name, &content)
    }

    // -- private -------------------------------------------------------------

    fn overlay_from_dir(scripts: &mut BTreeMap<String, Script>, dir: &Path) {
        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(_) => return, // no overlay directory
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yaml" || ext == "yml");
            if !is_yaml {
                continue;
            }
            match Self::load_file(&path) {
                Ok(script) => {
                    debug!("Loaded script overlay {}", path.display());
                    scripts.insert(script.name().to_string(), script);
                }
                Err(e) => warn!("Skipping script {}: {:#}", path.display(), e),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Speaker;

    #[test]
    fn bundled_scripts_load() {
        let library = ScriptLibrary::load(None).unwrap();
        let names: Vec<_> = library.names().collect();
        assert_eq!(
            names,
            vec!["midtown-family", "social-onboarding", "super-dad-nyc", "tokyo-hello"]
        );
        assert!(library.get(DEFAULT_SCRIPT).is_some());
    }

    #[test]
    fn super_dad_script_ends_with_everything_visible() {
        let library = ScriptLibrary::load(None).unwrap();
        let script = library.require("super-dad-nyc").unwrap();
        assert_eq!(script.len(), 9);
        assert_eq!(script.steps()[0].speaker, Speaker::Assistant);
        assert!(script.steps()[7].text.starts_with("Booking = done!"));

        let state = script.replay_to(script.len()).unwrap().state;
        assert_eq!(state.current_property_id.as_deref(), Some("p2"));
        assert_eq!(state.location_tag, "new-york");
        assert!(state.compare_mode);
        assert!(state.itinerary_visible);
        assert!(state.extras_visible);
    }

    #[test]
    fn onboarding_script_toggles_auth_prompt() {
        let library = ScriptLibrary::load(None).unwrap();
        let script = library.require("social-onboarding").unwrap();
        assert!(script.replay_to(3).unwrap().state.auth_prompt_visible);
        let done = script.replay_to(script.len()).unwrap().state;
        assert!(!done.auth_prompt_visible);
        assert!(done.personalized);
    }

    #[test]
    fn unknown_script_lists_names() {
        let library = ScriptLibrary::load(None).unwrap();
        let err = library.require("nope").unwrap_err();
        assert!(err.to_string().contains("tokyo-hello"));
    }

    #[test]
    fn overlay_from_tempdir() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("tokyo-hello.yaml"),
            "steps:\n  - speaker: assistant\n    text: custom hello\n",
        )
        .unwrap();
        std::fs::write(
            tmp.path().join("beach.yml"),
            "title: Beach\nsteps:\n  - speaker: user\n    text: sand\n",
        )
        .unwrap();
        std::fs::write(tmp.path().join("broken.yaml"), "steps: [[[").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let library = ScriptLibrary::load(Some(tmp.path())).unwrap();
        let tokyo = library.get("tokyo-hello").unwrap();
        assert_eq!(tokyo.len(), 1);
        assert_eq!(tokyo.steps()[0].text, "custom hello");
        assert_eq!(library.get("beach").unwrap().title(), "Beach");
        assert!(library.get("broken").is_none());
        assert!(library.get("notes").is_none());
    }

    #[test]
    fn missing_overlay_dir_is_fine() {
        let library = ScriptLibrary::load(Some(Path::new("/nonexistent/pablo/scripts"))).unwrap();
        assert_eq!(library.names().count(), BUNDLED.len());
    }
}
