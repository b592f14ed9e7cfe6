use super::DemoState;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

type EffectFn = dyn Fn(DemoState) -> DemoState + Send + Sync;

/// A pure state transition attached to a script step.
///
/// Effects receive the complete state and return the complete next state;
/// they are applied in authoring order and never merged.
#[derive(Clone)]
pub struct Effect {
    apply: Arc<EffectFn>,
    label: String,
}

impl Effect {
    pub fn new<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn(DemoState) -> DemoState + Send + Sync + 'static,
    {
        Self {
            apply: Arc::new(f),
            label: label.into(),
        }
    }

    pub fn apply(&self, state: DemoState) -> DemoState {
        (self.apply)(state)
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect").field("label", &self.label).finish()
    }
}

/// Declarative effect used by YAML scripts. Present fields overwrite,
/// absent fields keep the incoming value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_property: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub clear_property: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub itinerary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_prompt: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personalized: Option<bool>,
}

impl StatePatch {
    pub fn apply(&self, mut state: DemoState) -> DemoState {
        if self.clear_property {
            state.current_property_id = None;
        }
        if let Some(id) = &self.current_property {
            state.current_property_id = Some(id.clone());
        }
        if let Some(v) = self.compare {
            state.compare_mode = v;
        }
        if let Some(v) = self.itinerary {
            state.itinerary_visible = v;
        }
        if let Some(v) = self.extras {
            state.extras_visible = v;
        }
        if let Some(tag) = &self.location {
            state.location_tag = tag.clone();
        }
        if let Some(v) = self.auth_prompt {
            state.auth_prompt_visible = v;
        }
        if let Some(v) = self.personalized {
            state.personalized = v;
        }
        state
    }

    /// Short human-readable summary, e.g. `property=p1 compare=true`.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.clear_property {
            parts.push("property=none".to_string());
        }
        if let Some(id) = &self.current_property {
            parts.push(format!("property={id}"));
        }
        if let Some(v) = self.compare {
            parts.push(format!("compare={v}"));
        }
        if let Some(v) = self.itinerary {
            parts.push(format!("itinerary={v}"));
        }
        if let Some(v) = self.extras {
            parts.push(format!("extras={v}"));
        }
        if let Some(tag) = &self.location {
            parts.push(format!("location={tag}"));
        }
        if let Some(v) = self.auth_prompt {
            parts.push(format!("auth_prompt={v}"));
        }
        if let Some(v) = self.personalized {
            parts.push(format!("personalized={v}"));
        }
        if parts.is_empty() {
            "noop".to_string()
        } else {
            parts.join(" ")
        }
    }
}

impl From<StatePatch> for Effect {
    fn from(patch: StatePatch) -> Self {
        let label = patch.describe();
        Effect::new(label, move |state| patch.apply(state))
    }
}
