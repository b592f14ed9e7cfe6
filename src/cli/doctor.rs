use crate::config::Config;
use crate::content::ContentBundle;
use crate::profile::Profile;
use crate::script::library::ScriptLibrary;
use anyhow::Result;
use std::path::Path;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

fn ok(label: &str, detail: &str) {
    println!("  {GREEN}[OK]{RESET}   {label}: {detail}");
}

fn fail(label: &str, detail: &str) {
    println!("  {RED}[FAIL]{RESET} {label}: {detail}");
}

fn info(label: &str, detail: &str) {
    println!("  {CYAN}[INFO]{RESET} {label}: {detail}");
}

pub fn run(config: &Config, config_path: Option<&Path>) -> Result<()> {
    println!("pablo doctor\n");

    let version = env!("CARGO_PKG_VERSION");
    ok("Version", version);

    match config_path {
        Some(p) => ok("Config", &p.display().to_string()),
        None => info("Config", "(default)"),
    }
    match config.validate() {
        Ok(()) => ok("Settings", "valid"),
        Err(e) => fail("Settings", &e.to_string()),
    }

    ok("Home", &crate::paths::pablo_home().display().to_string());

    check_scripts(config);
    check_content();
    check_profile(config);
    check_log_dir(config);

    let playback = &config.playback;
    info(
        "Playback",
        &format!(
            "speed {}, typing {}, audio {}",
            playback.speed,
            if playback.simulate_typing { "on" } else { "off" },
            if playback.muted { "muted" } else { "on" }
        ),
    );

    println!();
    Ok(())
}

fn check_scripts(config: &Config) {
    let dir = config.scripts_dir();
    match ScriptLibrary::load(Some(&dir)) {
        Ok(library) => {
            let count = library.names().count();
            ok("Scripts", &format!("{} available", count));
            match library.get(&config.playback.script) {
                Some(s) => ok("Default script", &format!("{} ({} steps)", s.name(), s.len())),
                None => fail(
                    "Default script",
                    &format!("'{}' not found", config.playback.script),
                ),
            }
        }
        Err(e) => fail("Scripts", &format!("{:#}", e)),
    }

    if dir.exists() {
        let count = std::fs::read_dir(&dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| {
                        e.path()
                            .extension()
                            .is_some_and(|ext| ext == "yaml" || ext == "yml")
                    })
                    .count()
            })
            .unwrap_or(0);
        ok(
            "Script overlays",
            &format!("{} files in {}", count, dir.display()),
        );
    } else {
        info(
            "Script overlays",
            &format!("{} (not found)", dir.display()),
        );
    }
}

fn check_content() {
    match ContentBundle::bundled() {
        Ok(content) => ok(
            "Content",
            &format!(
                "{} destinations, {} properties",
                content.destinations.len(),
                content.properties.len()
            ),
        ),
        Err(e) => fail("Content", &format!("{:#}", e)),
    }
}

fn check_profile(config: &Config) {
    let path = config.profile_path();
    if !path.exists() {
        info("Profile", &format!("{} (not found, using defaults)", path.display()));
        return;
    }
    let profile = Profile::load(&path);
    ok(
        "Profile",
        &format!("{} likes {} ({})", profile.name, profile.likes_summary(), path.display()),
    );
}

fn check_log_dir(config: &Config) {
    let log_dir = config
        .logging
        .directory
        .as_deref()
        .map(crate::paths::expand_tilde)
        .unwrap_or_else(crate::paths::logs_dir);
    report_log_dir(&log_dir);
}

fn report_log_dir(dir: &Path) {
    if !dir.exists() {
        info("Logs", &format!("{} (not found)", dir.display()));
        return;
    }
    // Check writable by trying to create a temp file
    let test_path = dir.join(".doctor-check");
    match std::fs::write(&test_path, "") {
        Ok(_) => {
            let _ = std::fs::remove_file(&test_path);
            ok("Logs", &dir.display().to_string());
        }
        Err(_) => fail("Logs", &format!("{} (not writable)", dir.display())),
    }
}
