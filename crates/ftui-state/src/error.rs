#![forbid(unsafe_code)]

//! Error type for state container operations.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Non-record value | `update` on a JSON value that is not an object | `NotARecord`, state untouched |
//! | Non-record patch | patch that is not an object | `InvalidPatch`, state untouched |
//! | Unknown action | `try_call` with an unregistered name | `UnknownAction` (`call` ignores it) |
//! | Bad config | unparseable environment override | `InvalidConfig` |

use std::fmt;

/// Errors from state container operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The current value cannot be shallow-merged.
    NotARecord { found: &'static str },
    /// The partial value passed to `update` is not a record.
    InvalidPatch { found: &'static str },
    /// Strict dispatch found no action with this name.
    UnknownAction { name: String },
    /// A configuration value could not be parsed.
    InvalidConfig { key: &'static str, value: String },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotARecord { found } => {
                write!(f, "cannot merge into a non-record value ({found})")
            }
            Self::InvalidPatch { found } => {
                write!(f, "partial value must be a record, got {found}")
            }
            Self::UnknownAction { name } => write!(f, "unknown action '{name}'"),
            Self::InvalidConfig { key, value } => {
                write!(f, "invalid value '{value}' for {key}")
            }
        }
    }
}

impl std::error::Error for StateError {}

/// Result alias for state container operations.
pub type StateResult<T = ()> = Result<T, StateError>;
