//! Timer-driven conversation player.
//!
//! A [`Player`] walks a [`Script`] one step at a time on the tokio runtime.
//! Each step runs as a single spawned task; the booking notices run as a
//! second one, and a newer notice sequence cancels the older. Every task belongs to an *epoch*: restart and seek cancel the
//! current epoch's token and start a new one, and every state mutation checks
//! the epoch id under the lock, so a task from an old epoch can never touch
//! the displayed state again.

pub mod audio;
pub mod events;
pub mod timing;

pub use audio::{AudioCue, Silent, TerminalBell};
pub use events::{NoticeKind, PlayerEvent};
pub use timing::{PlaybackSettings, PlaybackSpeed, Timing};

use crate::script::{DemoState, DisplayedMessage, Script, Speaker};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, Instrument};
use uuid::Uuid;

const EVENT_CAPACITY: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Stopped,
    WaitingAssistantDelay,
    TypingAssistant,
    WaitingUserDelay,
    TypingUser,
    CommittingEffect,
    Done,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaybackCursor {
    /// Number of fully committed steps.
    pub index: usize,
    pub playing: bool,
    pub speed: PlaybackSpeed,
    pub typing: bool,
}

/// Text of the step currently being revealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialMessage {
    pub speaker: Speaker,
    pub text: String,
}

/// Point-in-time copy of everything a display needs.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSnapshot {
    pub script: String,
    pub total_steps: usize,
    pub cursor: PlaybackCursor,
    pub phase: Phase,
    pub state: DemoState,
    pub messages: Vec<DisplayedMessage>,
    pub partial: Option<PartialMessage>,
    pub thinking: bool,
    pub loading: bool,
    pub payment_processing: bool,
    pub booking_confirmed: bool,
    pub muted: bool,
}

struct Epoch {
    id: u64,
    cancel: CancellationToken,
}

struct Inner {
    epoch: Epoch,
    index: usize,
    playing: bool,
    speed: PlaybackSpeed,
    muted: bool,
    phase: Phase,
    /// A step task owns the timeline.
    in_flight: bool,
    state: DemoState,
    messages: Vec<DisplayedMessage>,
    partial: Option<PartialMessage>,
    thinking: bool,
    loading: bool,
    payment_processing: bool,
    booking_confirmed: bool,
    /// Only the newest notice sequence may touch the notice flags.
    notice_gen: u64,
    notice_cancel: CancellationToken,
}

impl Inner {
    fn bump_epoch(&mut self) -> u64 {
        self.epoch.cancel.cancel();
        self.epoch = Epoch {
            id: self.epoch.id + 1,
            cancel: CancellationToken::new(),
        };
        self.epoch.id
    }

    fn clear_transients(&mut self) {
        self.in_flight = false;
        self.partial = None;
        self.thinking = false;
        self.loading = false;
        self.payment_processing = false;
        self.booking_confirmed = false;
    }
}

struct Shared {
    id: Uuid,
    script: Script,
    settings: PlaybackSettings,
    audio: Arc<dyn AudioCue>,
    inner: Mutex<Inner>,
    events: broadcast::Sender<PlayerEvent>,
    span: tracing::Span,
}

/// Handle to one player instance. Clones share the same timeline.
#[derive(Clone)]
pub struct Player {
    shared: Arc<Shared>,
}

impl Player {
    /// Create a player positioned at step 0.
    ///
    /// With `settings.autoplay` the first step is spawned right away, so this
    /// must then be called from within a tokio runtime.
    pub fn new(script: Script, settings: PlaybackSettings, audio: Arc<dyn AudioCue>) -> Self {
        let id = Uuid::new_v4();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let inner = Inner {
            epoch: Epoch {
                id: 0,
                cancel: CancellationToken::new(),
            },
            index: 0,
            playing: settings.autoplay,
            speed: settings.speed,
            muted: settings.muted,
            phase: Phase::Stopped,
            in_flight: false,
            state: script.initial_state().clone(),
            messages: Vec::new(),
            partial: None,
            thinking: false,
            loading: false,
            payment_processing: false,
            booking_confirmed: false,
            notice_gen: 0,
            notice_cancel: CancellationToken::new(),
        };
        let span = tracing::debug_span!("player", id = %id, script = %script.name());
        let shared = Arc::new(Shared {
            id,
            script,
            settings,
            audio,
            inner: Mutex::new(inner),
            events,
            span,
        });
        info!(
            "Player {} created for script '{}' ({} steps)",
            id,
            shared.script.name(),
            shared.script.len()
        );
        {
            let mut inner = shared.inner.lock();
            shared.schedule_next(&mut inner);
        }
        Self { shared }
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn script(&self) -> &Script {
        &self.shared.script
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.shared.events.subscribe()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        let inner = self.shared.inner.lock();
        PlayerSnapshot {
            script: self.shared.script.name().to_string(),
            total_steps: self.shared.script.len(),
            cursor: PlaybackCursor {
                index: inner.index,
                playing: inner.playing,
                speed: inner.speed,
                typing: inner.partial.is_some(),
            },
            phase: inner.phase,
            state: inner.state.clone(),
            messages: inner.messages.clone(),
            partial: inner.partial.clone(),
            thinking: inner.thinking,
            loading: inner.loading,
            payment_processing: inner.payment_processing,
            booking_confirmed: inner.booking_confirmed,
            muted: inner.muted,
        }
    }

    pub fn play(&self) {
        self.set_playing(true);
    }

    /// Stop starting new steps. A step already in progress still finishes.
    pub fn pause(&self) {
        self.set_playing(false);
    }

    pub fn toggle_play(&self) -> bool {
        let playing = !self.shared.inner.lock().playing;
        self.set_playing(playing);
        playing
    }

    /// Applies to the next delay that starts.
    pub fn set_speed(&self, speed: PlaybackSpeed) {
        let mut inner = self.shared.inner.lock();
        inner.speed = speed;
        self.shared.emit_playback(&inner);
    }

    pub fn toggle_mute(&self) -> bool {
        let mut inner = self.shared.inner.lock();
        inner.muted = !inner.muted;
        self.shared.emit_playback(&inner);
        inner.muted
    }

    /// Jump so that steps `0..=target` are shown, as if they had just been
    /// played. Out-of-range targets leave everything untouched and return
    /// `false`. Playing/paused is preserved.
    pub fn seek(&self, target: i64) -> bool {
        let shared = &self.shared;
        let Ok(target) = usize::try_from(target) else {
            debug!("Ignoring seek to negative index {}", target);
            return false;
        };
        let Some(replay) = shared.script.replay_to(target + 1) else {
            debug!("Ignoring seek to {} (script has {} steps)", target, shared.script.len());
            return false;
        };

        let mut inner = shared.inner.lock();
        let epoch = inner.bump_epoch();
        inner.clear_transients();
        inner.index = target + 1;
        inner.state = replay.state;
        inner.messages = replay.messages;
        inner.phase = Phase::Stopped;
        debug!("Player {} seeked to cursor {} (epoch {})", shared.id, inner.index, epoch);
        shared.emit(PlayerEvent::Seeked {
            cursor: inner.index,
        });
        shared.schedule_next(&mut inner);
        true
    }

    /// Back to step 0 with the script's initial state. Playing/paused and the
    /// speed are preserved.
    pub fn restart(&self) {
        let shared = &self.shared;
        let mut inner = shared.inner.lock();
        let epoch = inner.bump_epoch();
        inner.clear_transients();
        inner.index = 0;
        inner.state = shared.script.initial_state().clone();
        inner.messages.clear();
        inner.phase = Phase::Stopped;
        debug!("Player {} restarted (epoch {})", shared.id, epoch);
        shared.emit(PlayerEvent::Restarted);
        shared.schedule_next(&mut inner);
    }

    fn set_playing(&self, playing: bool) {
        let mut inner = self.shared.inner.lock();
        if inner.playing == playing {
            return;
        }
        inner.playing = playing;
        self.shared.emit_playback(&inner);
        if playing {
            self.shared.schedule_next(&mut inner);
        }
    }
}

impl Shared {
    fn emit(&self, event: PlayerEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn emit_playback(&self, inner: &Inner) {
        self.emit(PlayerEvent::PlaybackChanged {
            playing: inner.playing,
            speed: inner.speed,
            muted: inner.muted,
        });
    }

    fn set_phase(&self, inner: &mut Inner, phase: Phase) {
        if inner.phase == phase {
            return;
        }
        inner.phase = phase;
        self.emit(PlayerEvent::PhaseChanged {
            index: inner.index,
            phase,
        });
        if phase == Phase::Done {
            self.emit(PlayerEvent::Finished);
        }
    }

    /// Run `f` on the state if `epoch` is still current.
    fn update<R>(&self, epoch: u64, f: impl FnOnce(&mut Inner) -> R) -> Option<R> {
        let mut inner = self.inner.lock();
        if inner.epoch.id != epoch {
            return None;
        }
        Some(f(&mut inner))
    }

    /// Start the step at the cursor if playback allows it.
    fn schedule_next(self: &Arc<Self>, inner: &mut Inner) {
        if inner.index >= self.script.len() {
            self.set_phase(inner, Phase::Done);
            return;
        }
        if inner.in_flight {
            return;
        }
        if !inner.playing {
            self.set_phase(inner, Phase::Stopped);
            return;
        }

        inner.in_flight = true;
        let epoch = inner.epoch.id;
        let token = inner.epoch.cancel.clone();
        let index = inner.index;
        let shared = Arc::clone(self);
        tokio::spawn(
            async move {
                if shared.run_step(epoch, &token, index).await.is_none() {
                    debug!("Step {} abandoned (epoch {} ended)", index, epoch);
                }
            }
            .instrument(self.span.clone()),
        );
    }

    async fn run_step(
        self: &Arc<Self>,
        epoch: u64,
        token: &CancellationToken,
        index: usize,
    ) -> Option<()> {
        let step = self.script.step(index)?.clone();
        let timing = &self.settings.timing;
        let (wait_phase, wait_ms, type_phase, char_ms) = match step.speaker {
            Speaker::Assistant => (
                Phase::WaitingAssistantDelay,
                timing.thinking_ms,
                Phase::TypingAssistant,
                timing.assistant_char_ms,
            ),
            Speaker::User => (
                Phase::WaitingUserDelay,
                timing.user_delay_ms,
                Phase::TypingUser,
                timing.user_char_ms,
            ),
        };

        let speed = self.update(epoch, |inner| {
            inner.thinking = step.speaker == Speaker::Assistant;
            self.set_phase(inner, wait_phase);
            inner.speed
        })?;
        sleep_or_cancel(token, speed.scale(wait_ms)).await?;

        if self.settings.simulate_typing {
            let speed = self.update(epoch, |inner| {
                inner.thinking = false;
                inner.partial = Some(PartialMessage {
                    speaker: step.speaker,
                    text: String::new(),
                });
                self.set_phase(inner, type_phase);
                inner.speed
            })?;

            let period = speed.scale(char_ms).max(Duration::from_millis(1));
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            for ch in step.text.chars() {
                tokio::select! {
                    _ = token.cancelled() => return None,
                    _ = ticker.tick() => {}
                }
                self.update(epoch, |inner| {
                    if let Some(partial) = inner.partial.as_mut() {
                        partial.text.push(ch);
                    }
                    self.emit(PlayerEvent::Typing {
                        index,
                        speaker: step.speaker,
                        chunk: ch.to_string(),
                    });
                })?;
            }
            sleep_or_cancel(token, Duration::from_millis(timing.settle_ms)).await?;
        }

        let muted = self.update(epoch, |inner| {
            inner.thinking = false;
            inner.partial = None;
            inner.messages.push(DisplayedMessage::from(&step));
            self.emit(PlayerEvent::MessageCommitted {
                index,
                speaker: step.speaker,
                text: step.text.clone(),
            });
            inner.muted
        })?;
        debug!("Committed step {}", index);

        if !muted {
            if let Err(e) = self.audio.play() {
                debug!("Audio cue failed: {:#}", e);
            }
        }
        if step.text.starts_with(self.settings.booking_sentinel.as_str()) {
            self.spawn_booking_notices(epoch)?;
        }

        if let Some(effect) = &step.effect {
            self.update(epoch, |inner| {
                inner.loading = true;
                self.set_phase(inner, Phase::CommittingEffect);
                self.emit(PlayerEvent::Loading {
                    index,
                    active: true,
                });
            })?;
            sleep_or_cancel(token, Duration::from_millis(timing.effect_ms)).await?;
            self.update(epoch, |inner| {
                let prev = std::mem::take(&mut inner.state);
                inner.state = effect.apply(prev);
                inner.loading = false;
                self.emit(PlayerEvent::Loading {
                    index,
                    active: false,
                });
                self.emit(PlayerEvent::StateChanged {
                    index,
                    state: inner.state.clone(),
                });
            })?;
            debug!("Applied effect {} for step {}", effect.label(), index);
        }

        self.update(epoch, |inner| {
            inner.index = index + 1;
            inner.in_flight = false;
            self.emit(PlayerEvent::StepCompleted { index });
            self.schedule_next(inner);
        })
    }

    /// Start a notice sequence, cancelling any older one still running.
    fn spawn_booking_notices(self: &Arc<Self>, epoch: u64) -> Option<()> {
        let (generation, token) = self.update(epoch, |inner| {
            inner.notice_cancel.cancel();
            inner.notice_cancel = inner.epoch.cancel.child_token();
            inner.notice_gen += 1;
            if inner.booking_confirmed {
                inner.booking_confirmed = false;
                self.emit(PlayerEvent::Notification {
                    kind: NoticeKind::BookingConfirmed,
                    visible: false,
                });
            }
            (inner.notice_gen, inner.notice_cancel.clone())
        })?;

        let shared = Arc::clone(self);
        tokio::spawn(
            async move {
                if shared
                    .run_booking_notices(epoch, generation, &token)
                    .await
                    .is_none()
                {
                    debug!("Booking notices {} superseded (epoch {})", generation, epoch);
                }
            }
            .instrument(self.span.clone()),
        );
        Some(())
    }

    async fn run_booking_notices(
        &self,
        epoch: u64,
        generation: u64,
        token: &CancellationToken,
    ) -> Option<()> {
        let timing = &self.settings.timing;
        self.show_notice(epoch, generation, NoticeKind::PaymentProcessing, true)?;
        sleep_or_cancel(token, Duration::from_millis(timing.payment_notice_ms)).await?;
        self.show_notice(epoch, generation, NoticeKind::PaymentProcessing, false)?;
        sleep_or_cancel(token, Duration::from_millis(timing.confirm_gap_ms)).await?;
        self.show_notice(epoch, generation, NoticeKind::BookingConfirmed, true)?;
        sleep_or_cancel(token, Duration::from_millis(timing.confirm_notice_ms)).await?;
        self.show_notice(epoch, generation, NoticeKind::BookingConfirmed, false)
    }

    fn show_notice(
        &self,
        epoch: u64,
        generation: u64,
        kind: NoticeKind,
        visible: bool,
    ) -> Option<()> {
        self.update(epoch, |inner| {
            if inner.notice_gen != generation {
                return None;
            }
            match kind {
                NoticeKind::PaymentProcessing => inner.payment_processing = visible,
                NoticeKind::BookingConfirmed => inner.booking_confirmed = visible,
            }
            self.emit(PlayerEvent::Notification { kind, visible });
            Some(())
        })
        .flatten()
    }
}

/// `None` when the epoch was cancelled before `duration` elapsed.
async fn sleep_or_cancel(token: &CancellationToken, duration: Duration) -> Option<()> {
    tokio::select! {
        _ = token.cancelled() => None,
        _ = time::sleep(duration) => Some(()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{Effect, ScriptStep};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    fn set_property(id: &'static str) -> Effect {
        Effect::new(format!("property={id}"), move |s| DemoState {
            current_property_id: Some(id.to_string()),
            ..s
        })
    }

    fn enable_compare() -> Effect {
        Effect::new("compare", |s| DemoState {
            compare_mode: true,
            ..s
        })
    }

    fn three_steps() -> Script {
        Script::new(
            "e2e",
            "End to end",
            DemoState::default(),
            vec![
                ScriptStep::assistant("Here is p1").with_effect(set_property("p1")),
                ScriptStep::user("compare them"),
                ScriptStep::assistant("Side by side").with_effect(enable_compare()),
            ],
        )
    }

    fn settings(autoplay: bool, typing: bool) -> PlaybackSettings {
        PlaybackSettings {
            autoplay,
            simulate_typing: typing,
            muted: false,
            ..PlaybackSettings::default()
        }
    }

    fn silent() -> Arc<dyn AudioCue> {
        Arc::new(Silent)
    }

    async fn at(start: Instant, ms: u64) {
        time::sleep_until(start + Duration::from_millis(ms)).await;
    }

    struct CountingCue(AtomicUsize);

    impl AudioCue for CountingCue {
        fn play(&self) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingCue;

    impl AudioCue for FailingCue {
        fn play(&self) -> anyhow::Result<()> {
            anyhow::bail!("audio device blocked")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn natural_playback_matches_seek_at_every_index() {
        let script = three_steps();
        let natural = Player::new(script.clone(), settings(true, true), silent());
        let mut rx = natural.subscribe();

        let mut completed = 0;
        while completed < script.len() {
            if let PlayerEvent::StepCompleted { index } = rx.recv().await.unwrap() {
                let played = natural.snapshot();
                let seeked = Player::new(script.clone(), settings(false, true), silent());
                assert!(seeked.seek(index as i64));
                let jumped = seeked.snapshot();
                assert_eq!(played.cursor.index, jumped.cursor.index);
                assert_eq!(played.state, jumped.state, "index={index}");
                assert_eq!(played.messages, jumped.messages, "index={index}");
                completed += 1;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn restart_mid_typing_while_paused_leaves_nothing_behind() {
        let start = Instant::now();
        let player = Player::new(three_steps(), settings(true, true), silent());

        at(start, 1600).await;
        let snap = player.snapshot();
        assert_eq!(snap.phase, Phase::TypingAssistant);
        assert!(snap.partial.is_some());

        player.pause();
        player.restart();
        at(start, 20_000).await;

        let snap = player.snapshot();
        assert_eq!(snap.cursor.index, 0);
        assert!(snap.messages.is_empty());
        assert!(snap.partial.is_none());
        assert_eq!(snap.state, DemoState::default());
        assert_eq!(snap.phase, Phase::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_while_playing_replays_without_duplicates() {
        let start = Instant::now();
        let player = Player::new(three_steps(), settings(true, true), silent());

        at(start, 1600).await;
        player.restart();
        let mut rx = player.subscribe();

        let mut committed = Vec::new();
        loop {
            match rx.recv().await.unwrap() {
                PlayerEvent::MessageCommitted { index, .. } => committed.push(index),
                PlayerEvent::Finished => break,
                _ => {}
            }
        }
        assert_eq!(committed, vec![0, 1, 2]);
        let snap = player.snapshot();
        assert_eq!(snap.messages.len(), 3);
        assert_eq!(snap.phase, Phase::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn seek_cancels_in_flight_step() {
        let start = Instant::now();
        let player = Player::new(three_steps(), settings(true, true), silent());

        at(start, 1600).await;
        assert!(player.seek(1));
        let snap = player.snapshot();
        assert_eq!(snap.cursor.index, 2);
        assert!(snap.cursor.playing);
        assert!(snap.partial.is_none());
        assert!(!snap.thinking);

        at(start, 20_000).await;
        let snap = player.snapshot();
        let texts: Vec<_> = snap.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Here is p1", "compare them", "Side by side"]);
        assert_eq!(snap.state, three_steps().replay_to(3).unwrap().state);
    }

    #[tokio::test(start_paused = true)]
    async fn seek_out_of_range_is_a_noop() {
        let player = Player::new(three_steps(), settings(false, true), silent());
        assert!(player.seek(0));
        let before = player.snapshot();

        assert!(!player.seek(-1));
        assert!(!player.seek(3));
        assert!(!player.seek(i64::MAX));

        let after = player.snapshot();
        assert_eq!(before.cursor.index, after.cursor.index);
        assert_eq!(before.messages, after.messages);
        assert_eq!(before.state, after.state);
    }

    #[tokio::test(start_paused = true)]
    async fn seek_to_last_step_finishes() {
        let player = Player::new(three_steps(), settings(false, true), silent());
        assert!(player.seek(2));
        let snap = player.snapshot();
        assert_eq!(snap.cursor.index, 3);
        assert_eq!(snap.phase, Phase::Done);
        assert!(snap.state.compare_mode);
    }

    #[tokio::test(start_paused = true)]
    async fn double_speed_halves_the_thinking_delay() {
        let start = Instant::now();
        let fast = Player::new(
            three_steps(),
            PlaybackSettings {
                speed: PlaybackSpeed::Double,
                ..settings(true, false)
            },
            silent(),
        );
        let normal = Player::new(three_steps(), settings(true, false), silent());

        at(start, 740).await;
        assert!(fast.snapshot().messages.is_empty());
        at(start, 760).await;
        assert_eq!(fast.snapshot().messages.len(), 1);
        assert!(normal.snapshot().messages.is_empty());
        at(start, 1510).await;
        assert_eq!(normal.snapshot().messages.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn speed_change_applies_to_next_delay_only() {
        let start = Instant::now();
        let player = Player::new(three_steps(), settings(true, false), silent());

        at(start, 100).await;
        player.set_speed(PlaybackSpeed::Double);
        at(start, 1000).await;
        assert!(player.snapshot().messages.is_empty());
        at(start, 1510).await;
        assert_eq!(player.snapshot().messages.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn speed_change_keeps_running_reveal_period() {
        let start = Instant::now();
        let script = Script::new(
            "reveal",
            "Reveal",
            DemoState::default(),
            vec![ScriptStep::assistant("abcdefghij")],
        );
        let player = Player::new(script, settings(true, true), silent());

        // Reveal starts at 1500 with a 35 ms period.
        at(start, 1600).await;
        assert_eq!(player.snapshot().phase, Phase::TypingAssistant);
        player.set_speed(PlaybackSpeed::Double);

        // 1500 + 10 * 35 + settle 300 = 2150, not 1500 + 10 * 17.5 + 300.
        at(start, 2000).await;
        let snap = player.snapshot();
        assert!(snap.messages.is_empty());
        assert_eq!(snap.cursor.speed, PlaybackSpeed::Double);
        at(start, 2140).await;
        assert!(player.snapshot().messages.is_empty());
        at(start, 2160).await;
        assert_eq!(player.snapshot().messages.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn user_step_effect_is_applied() {
        let start = Instant::now();
        let script = Script::new(
            "user-effect",
            "User effect",
            DemoState::default(),
            vec![ScriptStep::user("show me extras").with_effect(Effect::new("extras", |s| {
                DemoState {
                    extras_visible: true,
                    ..s
                }
            }))],
        );
        let player = Player::new(script.clone(), settings(true, false), silent());

        // user delay 800, then the 300 ms effect window
        at(start, 900).await;
        let snap = player.snapshot();
        assert_eq!(snap.messages.len(), 1);
        assert!(snap.loading);
        assert!(!snap.state.extras_visible);

        at(start, 1200).await;
        let snap = player.snapshot();
        assert!(snap.state.extras_visible);
        assert_eq!(snap.phase, Phase::Done);
        assert_eq!(snap.state, script.replay_to(1).unwrap().state);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_lets_current_step_finish() {
        let start = Instant::now();
        let player = Player::new(three_steps(), settings(true, true), silent());

        at(start, 1600).await;
        player.pause();
        at(start, 10_000).await;
        let snap = player.snapshot();
        assert_eq!(snap.cursor.index, 1);
        assert_eq!(snap.messages.len(), 1);
        assert_eq!(snap.phase, Phase::Stopped);
        assert!(!snap.cursor.playing);

        player.play();
        // user delay 800 + 12 chars * 25 + settle 300
        at(start, 11_390).await;
        assert_eq!(player.snapshot().messages.len(), 1);
        at(start, 11_410).await;
        assert_eq!(player.snapshot().messages.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn loading_flag_covers_effect_delay() {
        let start = Instant::now();
        let player = Player::new(three_steps(), settings(true, true), silent());

        // thinking 1500 + 10 chars * 35 + settle 300 = commit at 2150
        at(start, 2100).await;
        let snap = player.snapshot();
        assert!(snap.messages.is_empty());
        assert_eq!(snap.partial.as_ref().map(|p| p.text.as_str()), Some("Here is p1"));

        at(start, 2300).await;
        let snap = player.snapshot();
        assert!(snap.loading);
        assert_eq!(snap.phase, Phase::CommittingEffect);
        assert_eq!(snap.messages.len(), 1);
        assert_eq!(snap.state.current_property_id, None);

        at(start, 2500).await;
        let snap = player.snapshot();
        assert!(!snap.loading);
        assert_eq!(snap.cursor.index, 1);
        assert_eq!(snap.state.current_property_id.as_deref(), Some("p1"));
    }

    #[tokio::test(start_paused = true)]
    async fn booking_sentinel_shows_both_notices_in_order() {
        let start = Instant::now();
        let script = Script::new(
            "booking",
            "Booking",
            DemoState::default(),
            vec![ScriptStep::assistant("Booking = done! See you in New York.")],
        );
        let player = Player::new(script, settings(true, false), silent());

        at(start, 2000).await;
        let snap = player.snapshot();
        assert!(snap.payment_processing);
        assert!(!snap.booking_confirmed);
        assert_eq!(snap.phase, Phase::Done);

        at(start, 3700).await;
        let snap = player.snapshot();
        assert!(!snap.payment_processing);
        assert!(!snap.booking_confirmed);

        at(start, 5000).await;
        assert!(player.snapshot().booking_confirmed);

        at(start, 8100).await;
        let snap = player.snapshot();
        assert!(!snap.payment_processing);
        assert!(!snap.booking_confirmed);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_booking_notices_replace_older_ones() {
        let start = Instant::now();
        let script = Script::new(
            "double-booking",
            "Double booking",
            DemoState::default(),
            vec![
                ScriptStep::assistant("Booking = done! one"),
                ScriptStep::assistant("Booking = done! two"),
            ],
        );
        let player = Player::new(script, settings(true, false), silent());

        // First sequence starts at 1500, the second at 3000.
        at(start, 3600).await;
        assert!(player.snapshot().payment_processing);

        at(start, 4100).await;
        let snap = player.snapshot();
        assert!(snap.payment_processing);
        assert!(!snap.booking_confirmed);

        at(start, 5100).await;
        assert!(!player.snapshot().payment_processing);

        at(start, 5600).await;
        assert!(player.snapshot().booking_confirmed);

        at(start, 8100).await;
        assert!(player.snapshot().booking_confirmed);

        at(start, 9600).await;
        let snap = player.snapshot();
        assert!(!snap.payment_processing);
        assert!(!snap.booking_confirmed);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_clears_booking_notices() {
        let start = Instant::now();
        let script = Script::new(
            "booking",
            "Booking",
            DemoState::default(),
            vec![ScriptStep::assistant("Booking = done!")],
        );
        let player = Player::new(script, settings(true, false), silent());

        at(start, 2000).await;
        assert!(player.snapshot().payment_processing);
        player.pause();
        player.restart();
        at(start, 6000).await;
        let snap = player.snapshot();
        assert!(!snap.payment_processing);
        assert!(!snap.booking_confirmed);
        assert!(snap.messages.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failing_audio_never_stops_playback() {
        let player = Player::new(three_steps(), settings(true, false), Arc::new(FailingCue));
        let mut rx = player.subscribe();
        while !matches!(rx.recv().await.unwrap(), PlayerEvent::Finished) {}
        assert_eq!(player.snapshot().messages.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn mute_suppresses_audio_cue() {
        let start = Instant::now();
        let loud = Arc::new(CountingCue(AtomicUsize::new(0)));
        let quiet = Arc::new(CountingCue(AtomicUsize::new(0)));
        let _a = Player::new(three_steps(), settings(true, false), loud.clone());
        let b = Player::new(
            three_steps(),
            PlaybackSettings {
                muted: true,
                ..settings(true, false)
            },
            quiet.clone(),
        );

        at(start, 20_000).await;
        assert_eq!(loud.0.load(Ordering::SeqCst), 3);
        assert_eq!(quiet.0.load(Ordering::SeqCst), 0);
        assert!(b.snapshot().muted);
        assert!(!b.toggle_mute());
    }

    #[tokio::test(start_paused = true)]
    async fn three_step_scenario_end_to_end() {
        let script = three_steps();
        let player = Player::new(script.clone(), settings(true, true), silent());
        let mut rx = player.subscribe();

        let mut committed = Vec::new();
        let mut typed = String::new();
        loop {
            match rx.recv().await.unwrap() {
                PlayerEvent::Typing { index: 0, chunk, .. } => typed.push_str(&chunk),
                PlayerEvent::MessageCommitted { text, .. } => committed.push(text),
                PlayerEvent::Finished => break,
                _ => {}
            }
        }
        assert_eq!(typed, "Here is p1");
        assert_eq!(committed, vec!["Here is p1", "compare them", "Side by side"]);

        let snap = player.snapshot();
        let expected = script.replay_to(3).unwrap();
        assert_eq!(snap.state, expected.state);
        assert_eq!(snap.messages, expected.messages);
        assert_eq!(snap.cursor.index, 3);
        assert_eq!(snap.phase, Phase::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_player_does_not_start() {
        let start = Instant::now();
        let player = Player::new(three_steps(), settings(false, true), silent());
        at(start, 10_000).await;
        let snap = player.snapshot();
        assert_eq!(snap.phase, Phase::Stopped);
        assert!(snap.messages.is_empty());
        assert!(player.toggle_play());
        assert!(player.snapshot().cursor.playing);
    }
}
