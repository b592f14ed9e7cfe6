use super::timing::PlaybackSpeed;
use super::Phase;
use crate::script::{DemoState, Speaker};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    PaymentProcessing,
    BookingConfirmed,
}

/// Broadcast by a [`Player`](super::Player) as playback progresses.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerEvent {
    PhaseChanged {
        index: usize,
        phase: Phase,
    },
    /// Newly revealed characters of the step being typed.
    Typing {
        index: usize,
        speaker: Speaker,
        chunk: String,
    },
    MessageCommitted {
        index: usize,
        speaker: Speaker,
        text: String,
    },
    Loading {
        index: usize,
        active: bool,
    },
    StateChanged {
        index: usize,
        state: DemoState,
    },
    /// Step `index` is fully committed; the cursor now points past it.
    StepCompleted {
        index: usize,
    },
    Notification {
        kind: NoticeKind,
        visible: bool,
    },
    Seeked {
        cursor: usize,
    },
    Restarted,
    PlaybackChanged {
        playing: bool,
        speed: PlaybackSpeed,
        muted: bool,
    },
    Finished,
}
