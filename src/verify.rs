//! Verification modes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How many matching calls a verification expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VerificationMode {
    /// Exactly `count` calls
    Times { count: u32 },
    /// At least `count` calls
    AtLeast { count: u32 },
    /// At most `count` calls
    AtMost { count: u32 },
}

impl VerificationMode {
    pub fn times(count: u32) -> Self {
        VerificationMode::Times { count }
    }

    pub fn at_least(count: u32) -> Self {
        VerificationMode::AtLeast { count }
    }

    pub fn at_most(count: u32) -> Self {
        VerificationMode::AtMost { count }
    }

    pub fn never() -> Self {
        VerificationMode::Times { count: 0 }
    }

    pub fn at_least_once() -> Self {
        VerificationMode::AtLeast { count: 1 }
    }

    /// Whether `actual` matching calls satisfy this mode.
    pub fn check(&self, actual: usize) -> bool {
        let actual = actual as u64;
        match *self {
            VerificationMode::Times { count } => actual == u64::from(count),
            VerificationMode::AtLeast { count } => actual >= u64::from(count),
            VerificationMode::AtMost { count } => actual <= u64::from(count),
        }
    }
}

impl Default for VerificationMode {
    fn default() -> Self {
        Self::at_least_once()
    }
}

impl fmt::Display for VerificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationMode::Times { count: 0 } => write!(f, "never"),
            VerificationMode::Times { count } => write!(f, "exactly {} time(s)", count),
            VerificationMode::AtLeast { count } => write!(f, "at least {} time(s)", count),
            VerificationMode::AtMost { count } => write!(f, "at most {} time(s)", count),
        }
    }
}
