use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Playback speed multiplier offered by the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum PlaybackSpeed {
    Half,
    #[default]
    Normal,
    OneAndHalf,
    Double,
}

impl PlaybackSpeed {
    pub const ALL: [PlaybackSpeed; 4] = [
        PlaybackSpeed::Half,
        PlaybackSpeed::Normal,
        PlaybackSpeed::OneAndHalf,
        PlaybackSpeed::Double,
    ];

    pub fn factor(self) -> f64 {
        match self {
            PlaybackSpeed::Half => 0.5,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::OneAndHalf => 1.5,
            PlaybackSpeed::Double => 2.0,
        }
    }

    /// `base_ms` at 1x, divided by this speed.
    pub fn scale(self, base_ms: u64) -> Duration {
        let nanos = (base_ms as f64 * 1_000_000.0 / self.factor()).round();
        Duration::from_nanos(nanos as u64)
    }
}

impl TryFrom<f64> for PlaybackSpeed {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|s| (s.factor() - value).abs() < f64::EPSILON)
            .ok_or_else(|| format!("unsupported speed {value}; expected one of 0.5, 1, 1.5, 2"))
    }
}

impl From<PlaybackSpeed> for f64 {
    fn from(speed: PlaybackSpeed) -> f64 {
        speed.factor()
    }
}

impl FromStr for PlaybackSpeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s
            .trim()
            .trim_end_matches(['x', 'X', '×'])
            .trim();
        let value: f64 = trimmed
            .parse()
            .map_err(|_| format!("invalid speed '{s}'; expected one of 0.5, 1, 1.5, 2"))?;
        Self::try_from(value)
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×", self.factor())
    }
}

/// Base durations in milliseconds at 1x.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub thinking_ms: u64,
    pub user_delay_ms: u64,
    pub assistant_char_ms: u64,
    pub user_char_ms: u64,
    pub settle_ms: u64,
    pub effect_ms: u64,
    pub payment_notice_ms: u64,
    pub confirm_gap_ms: u64,
    pub confirm_notice_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            thinking_ms: 1500,
            user_delay_ms: 800,
            assistant_char_ms: 35,
            user_char_ms: 25,
            settle_ms: 300,
            effect_ms: 300,
            payment_notice_ms: 2000,
            confirm_gap_ms: 500,
            confirm_notice_ms: 4000,
        }
    }
}

/// Everything a player needs besides the script itself.
#[derive(Debug, Clone)]
pub struct PlaybackSettings {
    pub timing: Timing,
    pub speed: PlaybackSpeed,
    pub autoplay: bool,
    pub simulate_typing: bool,
    pub muted: bool,
    /// Committed text starting with this prefix triggers the booking notices.
    pub booking_sentinel: String,
}

pub const DEFAULT_BOOKING_SENTINEL: &str = "Booking = done!";

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            timing: Timing::default(),
            speed: PlaybackSpeed::Normal,
            autoplay: true,
            simulate_typing: true,
            muted: true,
            booking_sentinel: DEFAULT_BOOKING_SENTINEL.to_string(),
        }
    }
}
