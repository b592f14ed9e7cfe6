use std::io::Write;

/// Sound played when a message is committed.
///
/// Failures are reported to the caller, which logs and ignores them; a
/// missing or blocked audio device never stalls playback.
pub trait AudioCue: Send + Sync {
    fn play(&self) -> anyhow::Result<()>;
}

/// Rings the terminal bell on stderr.
pub struct TerminalBell;

impl AudioCue for TerminalBell {
    fn play(&self) -> anyhow::Result<()> {
        let mut err = std::io::stderr().lock();
        err.write_all(b"\x07")?;
        err.flush()?;
        Ok(())
    }
}

/// No audio at all.
pub struct Silent;

impl AudioCue for Silent {
    fn play(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
