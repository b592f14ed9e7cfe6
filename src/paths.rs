use std::path::PathBuf;
use std::sync::OnceLock;

static PABLO_HOME: OnceLock<PathBuf> = OnceLock::new();

/// Returns the Pablo home directory (`~/.pablo/`).
/// Supports `$PABLO_HOME` env override. Cached via `OnceLock`.
pub fn pablo_home() -> &'static PathBuf {
    PABLO_HOME.get_or_init(|| {
        if let Ok(val) = std::env::var("PABLO_HOME") {
            let p = PathBuf::from(val);
            if !p.as_os_str().is_empty() {
                return p;
            }
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pablo")
    })
}

/// `~/.pablo/config/`
pub fn config_dir() -> PathBuf {
    pablo_home().join("config")
}

/// `~/.pablo/logs/`
pub fn logs_dir() -> PathBuf {
    pablo_home().join("logs")
}

/// `~/.pablo/scripts/`
pub fn scripts_dir() -> PathBuf {
    pablo_home().join("scripts")
}

/// `~/.pablo/profile.json`
pub fn profile_file() -> PathBuf {
    pablo_home().join("profile.json")
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
