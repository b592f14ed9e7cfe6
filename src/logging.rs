use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const RETENTION_DAYS: u64 = 30;
const LOG_FILE_PREFIX: &str = "pablo";
const FILE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub struct LoggingSettings<'a> {
    pub level: Option<&'a str>,
    pub directory: Option<&'a str>,
    pub retention_days: Option<u64>,
    /// The `play` transcript owns the terminal; only the file layer stays on.
    pub suppress_stderr: bool,
}

pub fn setup_tracing_with_settings(settings: LoggingSettings<'_>) -> Result<PathBuf> {
    let log_dir = resolve_log_dir(settings.directory)?;
    let retention_days = settings.retention_days.unwrap_or(RETENTION_DAYS);
    let _ = cleanup_old_logs(&log_dir, retention_days);

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    // Dropping the guard would stop the background writer.
    let _ = LOG_GUARD.set(guard);

    let stderr_layer = (!settings.suppress_stderr).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(true)
            .with_line_number(true)
            .with_level(true)
            .compact()
            .boxed()
    });

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_timer(file_timer())
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .compact();

    let default_filter = || {
        let base = settings.level.unwrap_or("info");
        EnvFilter::new(format!("pablo={level},tokio=warn", level = base))
    };

    let filter = if settings.level.is_some() {
        default_filter()
    } else {
        match EnvFilter::try_from_default_env() {
            Ok(env_filter) => env_filter,
            Err(_) => default_filter(),
        }
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    Ok(log_dir)
}

/// Local wall-clock time for the file layer, so log lines line up with the
/// daily file they roll into.
fn file_timer() -> ChronoLocal {
    ChronoLocal::new(FILE_TIME_FORMAT.to_string())
}

fn resolve_log_dir(configured: Option<&str>) -> Result<PathBuf> {
    let dir = match configured {
        Some(path) => crate::paths::expand_tilde(path),
        None => crate::paths::logs_dir(),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn cleanup_old_logs(log_dir: &Path, retention_days: u64) -> Result<()> {
    let now = SystemTime::now();
    let max_age = Duration::from_secs(60 * 60 * 24 * retention_days);
    for entry in std::fs::read_dir(log_dir)? {
        let entry = match entry {
            Ok(v) => v,
            Err(_) => continue,
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(v) => v,
            None => continue,
        };
        if !file_name.starts_with(LOG_FILE_PREFIX) {
            continue;
        }
        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(v) => v,
            Err(_) => continue,
        };
        let age = match now.duration_since(modified) {
            Ok(v) => v,
            Err(_) => continue,
        };
        if age > max_age {
            let _ = std::fs::remove_file(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_keeps_fresh_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pablo.2026-01-01"), "x").unwrap();
        std::fs::write(dir.path().join("other.log"), "y").unwrap();

        cleanup_old_logs(dir.path(), 30).unwrap();

        assert!(dir.path().join("pablo.2026-01-01").exists());
        assert!(dir.path().join("other.log").exists());
    }

    #[test]
    fn file_timer_uses_local_millisecond_format() {
        use tracing_subscriber::fmt::format::Writer;
        use tracing_subscriber::fmt::time::FormatTime;

        let mut buf = String::new();
        file_timer().format_time(&mut Writer::new(&mut buf)).unwrap();
        // e.g. "2026-10-19 14:03:07.512"
        assert_eq!(buf.len(), 23, "{buf}");
        assert_eq!(&buf[4..5], "-");
        assert_eq!(&buf[10..11], " ");
        assert_eq!(&buf[19..20], ".");
    }

    #[test]
    fn resolve_log_dir_creates_configured_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("logs");
        let resolved = resolve_log_dir(Some(target.to_str().unwrap())).unwrap();
        assert_eq!(resolved, target);
        assert!(target.is_dir());
    }
}
