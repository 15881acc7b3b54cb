//! Error types for stub resolution, actions, and verification.

use crate::verify::VerificationMode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Errors surfaced by a mock call or a verification query.
#[derive(Debug, thiserror::Error)]
pub enum StubError {
    /// No registered stub accepted the call's arguments.
    #[error("unstubbed call {mock}.{method}({}): no stub matched", display_args(.args))]
    UnstubbedCall {
        mock: String,
        method: String,
        args: Vec<Value>,
    },

    /// The matched stub's action raised its designated error.
    #[error(transparent)]
    Action(#[from] ActionError),

    /// A verification query did not hold.
    #[error(
        "verification failed for {mock}.{method}({matcher}): expected {expected}, but was called {actual} time(s)"
    )]
    Verification {
        mock: String,
        method: String,
        matcher: String,
        expected: VerificationMode,
        actual: usize,
    },

    /// The stubbed value could not be converted to the caller's return type.
    #[error("{mock}.{method} returned a value of the wrong type: {source}")]
    ReturnType {
        mock: String,
        method: String,
        #[source]
        source: serde_json::Error,
    },

    /// A templated return value failed to render.
    #[error("failed to render template for {mock}.{method}: {source}")]
    Template {
        mock: String,
        method: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },

    /// A matcher definition could not be compiled.
    #[error("invalid matcher: {0}")]
    InvalidMatcher(String),
}

impl StubError {
    /// Whether this error is the "no stub matched" condition.
    pub fn is_unstubbed(&self) -> bool {
        matches!(self, StubError::UnstubbedCall { .. })
    }

    /// The designated error raised by a throwing action, if that is what happened.
    pub fn action_error(&self) -> Option<&ActionError> {
        match self {
            StubError::Action(err) => Some(err),
            _ => None,
        }
    }
}

/// The designated error a `Throw` action raises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ActionError {
    /// Error identifier, e.g. `unknown` or `network_down`
    pub kind: String,
    /// Human readable detail
    #[serde(default)]
    pub message: String,
}

impl ActionError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

fn display_args(args: &[Value]) -> String {
    args.iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unstubbed_display() {
        let err = StubError::UnstubbedCall {
            mock: "text_field".to_string(),
            method: "should_change_text".to_string(),
            args: vec![Value::Null, Value::String("lalla lia".to_string())],
        };
        assert!(err.is_unstubbed());
        assert_eq!(
            err.to_string(),
            "unstubbed call text_field.should_change_text(null, \"lalla lia\"): no stub matched"
        );
    }

    #[test]
    fn test_action_error_is_transparent() {
        let err: StubError = ActionError::new("unknown", "resign failed").into();
        assert!(!err.is_unstubbed());
        assert_eq!(err.to_string(), "unknown: resign failed");
        assert_eq!(err.action_error().map(|e| e.kind.as_str()), Some("unknown"));
    }
}
