//! Script model and the effect-folding engine.
//!
//! A [`Script`] is an immutable, shareable list of [`ScriptStep`]s plus the
//! state the demo starts from. [`Script::replay_to`] derives the displayed
//! state for any prefix of the script; natural playback and seeking both
//! agree with it.

mod effect;
pub mod library;

pub use effect::{Effect, StatePatch};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    #[serde(alias = "pablo")]
    Assistant,
    User,
}

impl Speaker {
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::Assistant => "Pablo",
            Speaker::User => "You",
        }
    }
}

/// Visible-UI projection driven by script effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoState {
    pub current_property_id: Option<String>,
    pub compare_mode: bool,
    pub itinerary_visible: bool,
    pub extras_visible: bool,
    pub location_tag: String,
    pub auth_prompt_visible: bool,
    pub personalized: bool,
}

impl Default for DemoState {
    fn default() -> Self {
        Self {
            current_property_id: None,
            compare_mode: false,
            itinerary_visible: false,
            extras_visible: false,
            location_tag: "featured".to_string(),
            auth_prompt_visible: false,
            personalized: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScriptStep {
    pub speaker: Speaker,
    pub text: String,
    pub effect: Option<Effect>,
}

impl ScriptStep {
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
            effect: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
            effect: None,
        }
    }

    pub fn with_effect(mut self, effect: impl Into<Effect>) -> Self {
        self.effect = Some(effect.into());
        self
    }
}

/// A step that has been played. Carries no effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayedMessage {
    pub speaker: Speaker,
    pub text: String,
}

impl From<&ScriptStep> for DisplayedMessage {
    fn from(step: &ScriptStep) -> Self {
        Self {
            speaker: step.speaker,
            text: step.text.clone(),
        }
    }
}

/// Result of folding a script prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replay {
    pub state: DemoState,
    pub messages: Vec<DisplayedMessage>,
}

#[derive(Debug)]
struct ScriptInner {
    name: String,
    title: String,
    initial_state: DemoState,
    steps: Vec<ScriptStep>,
}

/// Immutable conversation script. Cloning shares the underlying steps.
#[derive(Debug, Clone)]
pub struct Script {
    inner: Arc<ScriptInner>,
}

impl Script {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        initial_state: DemoState,
        steps: Vec<ScriptStep>,
    ) -> Self {
        Self {
            inner: Arc::new(ScriptInner {
                name: name.into(),
                title: title.into(),
                initial_state,
                steps,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn title(&self) -> &str {
        &self.inner.title
    }

    pub fn initial_state(&self) -> &DemoState {
        &self.inner.initial_state
    }

    pub fn steps(&self) -> &[ScriptStep] {
        &self.inner.steps
    }

    pub fn step(&self, index: usize) -> Option<&ScriptStep> {
        self.inner.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.inner.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.steps.is_empty()
    }

    /// Fold the effects of the first `n` steps over the initial state.
    ///
    /// Returns `None` when `n` exceeds the script length.
    pub fn replay_to(&self, n: usize) -> Option<Replay> {
        let steps = self.inner.steps.get(..n)?;
        let mut state = self.inner.initial_state.clone();
        let mut messages = Vec::with_capacity(n);
        for step in steps {
            messages.push(DisplayedMessage::from(step));
            if let Some(effect) = &step.effect {
                state = effect.apply(state);
            }
        }
        Some(Replay { state, messages })
    }

    /// Parse a YAML script. `name` is the key the script is registered under.
    pub fn from_yaml_str(name: &str, content: &str) -> Result<Self> {
        let wire: ScriptWire = serde_yml::from_str(content)
            .with_context(|| format!("script '{}' is not valid YAML", name))?;
        let steps = wire
            .steps
            .into_iter()
            .map(|s| ScriptStep {
                speaker: s.speaker,
                text: s.text,
                effect: s.effect.map(Effect::from),
            })
            .collect();
        let title = wire.title.unwrap_or_else(|| name.to_string());
        let script = Self::new(name, title, wire.initial_state, steps);
        if script.is_empty() {
            anyhow::bail!("script '{}' has no steps", name);
        }
        Ok(script)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptWire {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    initial_state: DemoState,
    steps: Vec<StepWire>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StepWire {
    speaker: Speaker,
    text: String,
    #[serde(default)]
    effect: Option<StatePatch>,
}
