#![forbid(unsafe_code)]

//! Container configuration.

use std::fmt;
use std::str::FromStr;

use crate::error::{StateError, StateResult};

/// Environment variable overriding [`StateConfig::loop_guard`].
pub const LOOP_GUARD_ENV: &str = "FTUI_STATE_LOOP_GUARD";

/// Which binding directions skip values the other side already holds.
///
/// The child→parent direction is always guarded; without it a child update
/// would bounce between the two containers forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopGuard {
    /// Guard both directions. A single originating `set` produces exactly one
    /// publish on the origin and one on the bound counterpart.
    #[default]
    Bidirectional,
    /// Guard only child→parent. Parent→child forwards every distinct
    /// property value, so the originating child sees its own value echoed
    /// back once.
    ChildToParent,
}

impl LoopGuard {
    /// Configuration spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bidirectional => "bidirectional",
            Self::ChildToParent => "child-to-parent",
        }
    }
}

impl fmt::Display for LoopGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoopGuard {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bidirectional" => Ok(Self::Bidirectional),
            "child-to-parent" => Ok(Self::ChildToParent),
            _ => Err(StateError::InvalidConfig {
                key: LOOP_GUARD_ENV,
                value: s.to_string(),
            }),
        }
    }
}

/// Configuration for a [`StateContainer`](crate::StateContainer).
///
/// Children created with `create_child` inherit their parent's
/// configuration; their label becomes `parent.key` (or `key` when the parent
/// is unlabeled).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateConfig {
    /// Loop guard policy for child bindings.
    pub loop_guard: LoopGuard,
    /// Name reported in tracing events.
    pub label: Option<String>,
}

impl StateConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the loop guard policy.
    #[must_use]
    pub fn with_loop_guard(mut self, loop_guard: LoopGuard) -> Self {
        self.loop_guard = loop_guard;
        self
    }

    /// Set the tracing label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Default configuration with overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::InvalidConfig`] if an override is unparseable.
    pub fn from_env() -> StateResult<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Like [`StateConfig::from_env`] with an injectable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::InvalidConfig`] if an override is unparseable.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> StateResult<Self> {
        let mut config = Self::default();
        if let Some(raw) = lookup(LOOP_GUARD_ENV) {
            config.loop_guard = raw.parse()?;
        }
        Ok(config)
    }

    /// Label used in tracing fields.
    #[must_use]
    pub fn label_or_default(&self) -> &str {
        self.label.as_deref().unwrap_or("state")
    }

    pub(crate) fn for_child(&self, key: &str) -> Self {
        let label = match &self.label {
            Some(parent) => format!("{parent}.{key}"),
            None => key.to_string(),
        };
        Self {
            loop_guard: self.loop_guard,
            label: Some(label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = StateConfig::new();
        assert_eq!(config.loop_guard, LoopGuard::Bidirectional);
        assert_eq!(config.label_or_default(), "state");
    }

    #[test]
    fn builder() {
        let config = StateConfig::new()
            .with_loop_guard(LoopGuard::ChildToParent)
            .with_label("app");
        assert_eq!(config.loop_guard, LoopGuard::ChildToParent);
        assert_eq!(config.label_or_default(), "app");
    }

    #[test]
    fn parse_loop_guard() {
        assert_eq!("bidirectional".parse(), Ok(LoopGuard::Bidirectional));
        assert_eq!(" Child-To-Parent ".parse(), Ok(LoopGuard::ChildToParent));
        assert!("sideways".parse::<LoopGuard>().is_err());
        assert!("both".parse::<LoopGuard>().is_err());
        assert!("child_to_parent".parse::<LoopGuard>().is_err());
        assert_eq!(LoopGuard::ChildToParent.to_string(), "child-to-parent");
    }

    #[test]
    fn env_override() {
        let config = StateConfig::from_env_with(|key| {
            (key == LOOP_GUARD_ENV).then(|| "child-to-parent".to_string())
        })
        .unwrap();
        assert_eq!(config.loop_guard, LoopGuard::ChildToParent);

        let config = StateConfig::from_env_with(|_| None).unwrap();
        assert_eq!(config, StateConfig::default());
    }

    #[test]
    fn env_override_rejects_garbage() {
        let err = StateConfig::from_env_with(|_| Some("nope".to_string())).unwrap_err();
        assert_eq!(
            err,
            StateError::InvalidConfig {
                key: LOOP_GUARD_ENV,
                value: "nope".to_string()
            }
        );
    }

    #[test]
    fn child_labels_nest() {
        let root = StateConfig::new().with_label("app");
        assert_eq!(root.for_child("user").label.as_deref(), Some("app.user"));
        assert_eq!(
            StateConfig::new().for_child("user").label.as_deref(),
            Some("user")
        );
    }
}
