mod cli;
mod concierge;
mod config;
mod content;
mod logging;
mod paths;
mod player;
mod profile;
mod render;
mod script;

use crate::config::Config;
use crate::player::PlaybackSpeed;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pablo", version)]
#[command(about = "Pablo: scripted travel-concierge conversations for demos", long_about = None)]
struct Cli {
    /// Config file. If omitted, searches $PABLO_CONFIG, ./pablo.toml and the config dirs.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(clap::Args, Debug)]
struct ScriptArgs {
    /// Script name from the library
    #[arg(long, conflicts_with = "script_file")]
    script: Option<String>,

    /// Load the script from a YAML file instead
    #[arg(long)]
    script_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a script in the terminal
    Play {
        #[command(flatten)]
        source: ScriptArgs,

        /// Playback speed: 0.5, 1, 1.5 or 2
        #[arg(long)]
        speed: Option<PlaybackSpeed>,

        /// Reveal messages instantly instead of typing them out
        #[arg(long, default_value_t = false)]
        no_typing: bool,

        /// Start paused (press `p` to play)
        #[arg(long, default_value_t = false)]
        paused: bool,

        /// Jump to this step before playing
        #[arg(long, allow_negative_numbers = true)]
        start: Option<i64>,

        /// Disable the audio cue
        #[arg(long, default_value_t = false)]
        mute: bool,

        /// Print player events as JSON lines
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Exit when the script finishes
        #[arg(long, default_value_t = false)]
        exit_on_finish: bool,
    },
    /// Show the state after a number of steps
    Show {
        #[command(flatten)]
        source: ScriptArgs,

        /// Number of steps to apply
        #[arg(long)]
        at: usize,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List available scripts
    Scripts,
    /// Ask Pablo a free-text question
    Ask {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Manage the traveller profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Diagnose installation health
    Doctor,
}

#[derive(Subcommand, Debug)]
enum ProfileAction {
    /// Show the current profile
    Show,
    /// Change the traveller name
    SetName { name: String },
    /// Add a liked tag
    Like { tag: String },
    /// Remove a liked tag
    Unlike { tag: String },
    /// Restore the default profile
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, config_path) = match &cli.config {
        Some(path) => (Config::load_from(path)?, Some(path.clone())),
        None => Config::load_with_path().unwrap_or_else(|e| {
            eprintln!("Warning: failed to load config, using defaults: {e:#}");
            (Config::default(), None)
        }),
    };

    // Lightweight subcommand, reports config problems instead of failing on them.
    if let Some(Command::Doctor) = &cli.cmd {
        return cli::doctor::run(&config, config_path.as_deref());
    }

    config.validate().context("invalid configuration")?;

    // The play transcript owns the terminal.
    let will_play = matches!(cli.cmd, None | Some(Command::Play { .. }));
    if let Err(err) = logging::setup_tracing_with_settings(config.logging_settings(will_play)) {
        eprintln!("Failed to initialize logging: {err}");
    }
    match config_path.as_ref() {
        Some(path) => tracing::debug!("Config file: {}", path.display()),
        None => tracing::debug!("Config file: (default)"),
    }

    match cli.cmd {
        None => cli::play::run(cli::play::PlayOptions::default(), &config).await?,
        Some(Command::Play {
            source,
            speed,
            no_typing,
            paused,
            start,
            mute,
            json,
            exit_on_finish,
        }) => {
            let opts = cli::play::PlayOptions {
                script: source.script,
                script_file: source.script_file,
                speed,
                no_typing,
                paused,
                start,
                mute,
                json,
                exit_on_finish,
            };
            cli::play::run(opts, &config).await?;
        }
        Some(Command::Show { source, at, json }) => {
            cli::scripts_cmd::show(
                &config,
                source.script.as_deref(),
                source.script_file.as_deref(),
                at,
                json,
            )?;
        }
        Some(Command::Scripts) => cli::scripts_cmd::list(&config)?,
        Some(Command::Ask { text, json }) => cli::ask::run(&config, &text.join(" "), json)?,
        Some(Command::Profile { action }) => {
            let pa = match action {
                ProfileAction::Show => cli::profile_cmd::ProfileAction::Show,
                ProfileAction::SetName { name } => cli::profile_cmd::ProfileAction::SetName { name },
                ProfileAction::Like { tag } => cli::profile_cmd::ProfileAction::Like { tag },
                ProfileAction::Unlike { tag } => cli::profile_cmd::ProfileAction::Unlike { tag },
                ProfileAction::Reset => cli::profile_cmd::ProfileAction::Reset,
            };
            cli::profile_cmd::run(pa, &config)?;
        }
        // Already handled above
        Some(Command::Doctor) => unreachable!(),
    }

    Ok(())
}
