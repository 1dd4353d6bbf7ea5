//! Runtime Configuration
//!
//! Configuration is per thread, like the rest of the runtime state. Call
//! [`configure`] before installing event batching or rendering; otherwise the
//! defaults apply.

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Discrete input and commit events.
const DISCRETE_EVENTS: &[&str] = &[
    "beforeinput",
    "input",
    "change",
    "compositionend",
    "keydown",
    "keyup",
    "click",
    "contextmenu",
    "submit",
    "reset",
];

/// Events that open a gesture.
const GESTURE_START_EVENTS: &[&str] = &["pointerdown", "mousedown", "touchstart"];

/// Events that close a gesture.
const GESTURE_END_EVENTS: &[&str] = &["pointerup", "mouseup", "touchend", "touchcancel"];

/// Settings for the scheduler and input boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Event types whose dispatch is treated as one interactive batch.
    pub interactive_events: Vec<String>,

    /// Collapse repeated submissions of the same re-run within one flush
    /// window into a single execution.
    pub coalesce_reruns: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let interactive_events = DISCRETE_EVENTS
            .iter()
            .chain(GESTURE_START_EVENTS)
            .chain(GESTURE_END_EVENTS)
            .map(|name| (*name).to_string())
            .collect();

        Self {
            interactive_events,
            coalesce_reruns: true,
        }
    }
}

impl RuntimeConfig {
    /// Parse a configuration from JSON. Missing keys take their defaults.
    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|err| Error::InvalidConfig(err.to_string()))
    }

    /// Whether `event_type` is one of the configured interactive events.
    pub fn is_interactive(&self, event_type: &str) -> bool {
        self.interactive_events.iter().any(|e| e == event_type)
    }
}

thread_local! {
    static CONFIG: RefCell<RuntimeConfig> = RefCell::new(RuntimeConfig::default());
}

/// Install `config` for the current thread.
pub fn configure(config: RuntimeConfig) {
    tracing::debug!(
        events = config.interactive_events.len(),
        coalesce = config.coalesce_reruns,
        "runtime configured"
    );
    CONFIG.with(|current| *current.borrow_mut() = config);
}

/// A copy of the configuration installed for the current thread.
pub fn current() -> RuntimeConfig {
    CONFIG.with(|current| current.borrow().clone())
}

pub(crate) fn coalesce_reruns() -> bool {
    CONFIG.with(|current| current.borrow().coalesce_reruns)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_discrete_and_gesture_events() {
        let config = RuntimeConfig::default();
        assert_eq!(config.interactive_events.len(), 17);
        assert!(config.is_interactive("click"));
        assert!(config.is_interactive("touchcancel"));
        assert!(!config.is_interactive("scroll"));
        assert!(config.coalesce_reruns);
    }

    #[test]
    fn json_fills_missing_keys_with_defaults() {
        let config = RuntimeConfig::from_json(r#"{ "coalesce_reruns": false }"#).unwrap();
        assert!(!config.coalesce_reruns);
        assert_eq!(config.interactive_events.len(), 17);

        let config = RuntimeConfig::from_json(r#"{ "interactive_events": ["tap"] }"#).unwrap();
        assert_eq!(config.interactive_events, vec!["tap".to_string()]);
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = RuntimeConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn configure_replaces_thread_config() {
        configure(RuntimeConfig {
            interactive_events: vec!["tap".into()],
            coalesce_reruns: false,
        });
        assert!(!coalesce_reruns());
        assert!(current().is_interactive("tap"));

        configure(RuntimeConfig::default());
        assert!(coalesce_reruns());
    }
}
