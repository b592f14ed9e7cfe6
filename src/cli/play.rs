//! `pablo play`: run a script in the terminal with line commands on stdin.

use crate::config::Config;
use crate::content::ContentBundle;
use crate::player::{
    AudioCue, NoticeKind, Phase, PlaybackSpeed, Player, PlayerEvent, Silent, TerminalBell,
};
use crate::render;
use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

const HELP: &str = "commands: p (play/pause)  s <0.5|1|1.5|2> (speed)  j <step> (jump)  r (restart)  m (mute)  ? (status)  q (quit)";

#[derive(Debug, Clone, Default)]
pub struct PlayOptions {
    pub script: Option<String>,
    pub script_file: Option<PathBuf>,
    pub speed: Option<PlaybackSpeed>,
    pub no_typing: bool,
    pub paused: bool,
    pub start: Option<i64>,
    pub mute: bool,
    pub json: bool,
    pub exit_on_finish: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    TogglePlay,
    Speed(PlaybackSpeed),
    Jump(i64),
    Restart,
    ToggleMute,
    Status,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<ControlCommand, String> {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return Err("empty command".to_string());
    };
    let arg = parts.next();
    let parsed = match (cmd, arg) {
        ("p" | "play" | "pause", None) => ControlCommand::TogglePlay,
        ("s" | "speed", Some(value)) => ControlCommand::Speed(value.parse()?),
        ("j" | "jump", Some(value)) => ControlCommand::Jump(
            value
                .parse()
                .map_err(|_| format!("invalid step '{}'", value))?,
        ),
        ("r" | "restart", None) => ControlCommand::Restart,
        ("m" | "mute", None) => ControlCommand::ToggleMute,
        ("?" | "status", None) => ControlCommand::Status,
        ("h" | "help", None) => ControlCommand::Help,
        ("q" | "quit" | "exit", None) => ControlCommand::Quit,
        ("s" | "speed" | "j" | "jump", None) => {
            return Err(format!("'{}' needs an argument", cmd));
        }
        _ => return Err(format!("unknown command '{}'", line.trim())),
    };
    if parts.next().is_some() {
        return Err(format!("too many arguments: '{}'", line.trim()));
    }
    Ok(parsed)
}

pub async fn run(opts: PlayOptions, config: &Config) -> Result<()> {
    let script = super::resolve_script(
        config,
        opts.script.as_deref(),
        opts.script_file.as_deref(),
    )?;
    let content = ContentBundle::bundled()?;

    let mut settings = config.playback_settings();
    if let Some(speed) = opts.speed {
        settings.speed = speed;
    }
    if opts.no_typing {
        settings.simulate_typing = false;
    }
    if opts.mute {
        settings.muted = true;
    }
    // Start paused so `--start` can position the cursor first.
    let autoplay = settings.autoplay && !opts.paused;
    settings.autoplay = false;

    // The bell would interleave with machine-read output.
    let audio: Arc<dyn AudioCue> = if opts.json {
        Arc::new(Silent)
    } else {
        Arc::new(TerminalBell)
    };
    let player = Player::new(script, settings, audio);
    info!("Playing '{}' as player {}", player.script().name(), player.id());

    if let Some(start) = opts.start {
        if !player.seek(start) {
            warn!("--start {} is out of range, starting from the beginning", start);
        }
    }
    let mut events = BroadcastStream::new(player.subscribe());

    let mut view = TextView::new(content, opts.json);
    if !opts.json {
        println!("{}\n", player.script().title());
        println!("{}", HELP);
        view.redraw(&player);
    }

    if autoplay {
        player.play();
    }
    if opts.exit_on_finish && player.snapshot().phase == Phase::Done {
        return Ok(());
    }

    let mut input = spawn_stdin_reader();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(Ok(event)) => {
                    let finished = matches!(event, PlayerEvent::Finished);
                    view.show(&event, &player);
                    if finished && (opts.exit_on_finish || !stdin_open) {
                        break;
                    }
                }
                Some(Err(BroadcastStreamRecvError::Lagged(n))) => {
                    debug!("Display lagged behind by {} events", n);
                }
                None => break,
            },
            line = input.recv(), if stdin_open => match line {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => match parse_command(&line) {
                    Ok(ControlCommand::Quit) => break,
                    Ok(cmd) => apply(&player, cmd, &mut view),
                    Err(msg) => eprintln!("{} ({})", msg, HELP),
                },
                None => {
                    stdin_open = false;
                    let snap = player.snapshot();
                    if snap.phase == Phase::Done || !snap.cursor.playing {
                        break;
                    }
                }
            },
        }
    }

    debug!("Player {} closed", player.id());
    Ok(())
}

/// Lines from stdin. A plain thread, so a pending read never holds up
/// runtime shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn apply(player: &Player, cmd: ControlCommand, view: &mut TextView) {
    match cmd {
        ControlCommand::TogglePlay => {
            player.toggle_play();
        }
        ControlCommand::Speed(speed) => player.set_speed(speed),
        ControlCommand::Jump(step) => {
            if !player.seek(step) {
                eprintln!(
                    "step {} is out of range (0..{})",
                    step,
                    player.script().len()
                );
            }
        }
        ControlCommand::Restart => player.restart(),
        ControlCommand::ToggleMute => {
            player.toggle_mute();
        }
        ControlCommand::Status => view.redraw(player),
        ControlCommand::Help => println!("{}", HELP),
        ControlCommand::Quit => {}
    }
}

/// Turns player events into terminal output.
struct TextView {
    content: ContentBundle,
    json: bool,
    /// Step whose characters are currently being printed.
    typing: Option<usize>,
}

impl TextView {
    fn new(content: ContentBundle, json: bool) -> Self {
        Self {
            content,
            json,
            typing: None,
        }
    }

    fn redraw(&mut self, player: &Player) {
        let snap = player.snapshot();
        if self.json {
            match serde_json::to_string(&snap) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Failed to encode snapshot: {}", e),
            }
            return;
        }
        self.end_typing_line();
        println!("{}", render::render_snapshot(&snap, &self.content));
    }

    fn end_typing_line(&mut self) {
        if self.typing.take().is_some() {
            println!();
        }
    }

    fn show(&mut self, event: &PlayerEvent, player: &Player) {
        if self.json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Failed to encode event: {}", e),
            }
            return;
        }

        match event {
            PlayerEvent::PhaseChanged {
                phase: Phase::WaitingAssistantDelay,
                ..
            } => println!("{}", render::render_thinking()),
            PlayerEvent::PhaseChanged { .. } => {}
            PlayerEvent::Typing {
                index,
                speaker,
                chunk,
            } => {
                if self.typing != Some(*index) {
                    self.end_typing_line();
                    print!("{}", render::typing_prefix(*speaker));
                    self.typing = Some(*index);
                }
                print!("{}", chunk);
                let _ = std::io::stdout().flush();
            }
            PlayerEvent::MessageCommitted {
                index,
                speaker,
                text,
            } => {
                if self.typing == Some(*index) {
                    self.typing = None;
                    println!();
                } else {
                    self.end_typing_line();
                    println!("{}{}", render::typing_prefix(*speaker), text);
                }
            }
            PlayerEvent::Loading { active: true, .. } => println!("  …"),
            PlayerEvent::Loading { .. } => {}
            PlayerEvent::StateChanged { state, .. } => {
                println!();
                println!("{}", render::render_state(state, &self.content, false));
            }
            PlayerEvent::StepCompleted { .. } => {}
            PlayerEvent::Notification {
                kind,
                visible: true,
            } => println!("{}", render::render_notice(*kind)),
            PlayerEvent::Notification {
                kind: NoticeKind::BookingConfirmed,
                visible: false,
            } => debug!("Booking confirmation dismissed"),
            PlayerEvent::Notification { .. } => {}
            PlayerEvent::Seeked { .. } | PlayerEvent::Restarted => {
                self.end_typing_line();
                println!("\n────────");
                self.redraw(player);
            }
            PlayerEvent::PlaybackChanged { .. } => {
                let snap = player.snapshot();
                self.end_typing_line();
                println!(
                    "{}{}",
                    render::render_progress(&snap.cursor, snap.total_steps, snap.phase),
                    if snap.muted { " · muted" } else { "" }
                );
            }
            PlayerEvent::Finished => {
                self.end_typing_line();
                println!("── end of script ──");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_control_commands() {
        assert_eq!(parse_command("p"), Ok(ControlCommand::TogglePlay));
        assert_eq!(
            parse_command("s 1.5x"),
            Ok(ControlCommand::Speed(PlaybackSpeed::OneAndHalf))
        );
        assert_eq!(parse_command(" j 4 "), Ok(ControlCommand::Jump(4)));
        assert_eq!(parse_command("j -1"), Ok(ControlCommand::Jump(-1)));
        assert_eq!(parse_command("r"), Ok(ControlCommand::Restart));
        assert_eq!(parse_command("m"), Ok(ControlCommand::ToggleMute));
        assert_eq!(parse_command("quit"), Ok(ControlCommand::Quit));
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(parse_command("s 3").is_err());
        assert!(parse_command("s").is_err());
        assert!(parse_command("j two").is_err());
        assert!(parse_command("p now").is_err());
        assert!(parse_command("dance").is_err());
        assert!(parse_command("").is_err());
    }
}
