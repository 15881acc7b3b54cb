//! Argument matching logic.
//!
//! A [`CallMatcher`] is a tuple of [`ArgumentMatcher`]s, one per argument
//! position. It accepts a call when the arities agree and every position
//! accepts its argument.

use crate::arg::Arg;
use crate::config::ArgMatcherDef;
use crate::error::StubError;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type PredicateFn = dyn Fn(&Arg) -> bool + Send + Sync;

/// Predicate over a single argument.
#[derive(Clone)]
pub enum ArgumentMatcher {
    /// Wildcard: accepts values and callbacks alike
    Any,
    /// Accepts callback arguments only
    AnyCallback,
    /// Exact JSON value equality. Numbers compare by representation:
    /// `1` and `1.0` are different values.
    Equals(Value),
    Null,
    NotNull,
    /// String argument containing a substring
    Contains(String),
    Regex(Regex),
    Glob(globset::GlobMatcher),
    /// JSON path expressions and their expected values (null = must exist)
    JsonPath(HashMap<String, Value>),
    Predicate(Arc<PredicateFn>),
}

impl ArgumentMatcher {
    pub fn equals(value: impl Into<Value>) -> Self {
        ArgumentMatcher::Equals(value.into())
    }

    pub fn regex(pattern: &str) -> Result<Self, StubError> {
        Regex::new(pattern)
            .map(ArgumentMatcher::Regex)
            .map_err(|e| StubError::InvalidMatcher(format!("invalid regex: {}", e)))
    }

    pub fn glob(pattern: &str) -> Result<Self, StubError> {
        globset::Glob::new(pattern)
            .map(|g| ArgumentMatcher::Glob(g.compile_matcher()))
            .map_err(|e| StubError::InvalidMatcher(format!("invalid glob: {}", e)))
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Arg) -> bool + Send + Sync + 'static,
    {
        ArgumentMatcher::Predicate(Arc::new(f))
    }

    /// Compile a configured matcher.
    pub fn from_def(def: &ArgMatcherDef) -> Result<Self, StubError> {
        Ok(match def {
            ArgMatcherDef::Any => ArgumentMatcher::Any,
            ArgMatcherDef::AnyCallback => ArgumentMatcher::AnyCallback,
            ArgMatcherDef::Equals { value } => ArgumentMatcher::Equals(value.clone()),
            ArgMatcherDef::Null => ArgumentMatcher::Null,
            ArgMatcherDef::NotNull => ArgumentMatcher::NotNull,
            ArgMatcherDef::Contains { value } => ArgumentMatcher::Contains(value.clone()),
            ArgMatcherDef::Regex { pattern } => Self::regex(pattern)?,
            ArgMatcherDef::Glob { pattern } => Self::glob(pattern)?,
            ArgMatcherDef::JsonPath { expressions } => {
                use jsonpath_rust::JsonPath;
                for path_expr in expressions.keys() {
                    JsonPath::<Value>::try_from(path_expr.as_str()).map_err(|e| {
                        StubError::InvalidMatcher(format!("invalid json path {}: {}", path_expr, e))
                    })?;
                }
                ArgumentMatcher::JsonPath(expressions.clone())
            }
        })
    }

    /// Whether this matcher accepts the argument.
    pub fn accepts(&self, arg: &Arg) -> bool {
        match self {
            ArgumentMatcher::Any => true,
            ArgumentMatcher::AnyCallback => arg.as_callback().is_some(),
            ArgumentMatcher::Predicate(f) => f(arg),
            _ => match arg.as_value() {
                Some(value) => self.accepts_value(value),
                None => false,
            },
        }
    }

    fn accepts_value(&self, value: &Value) -> bool {
        match self {
            ArgumentMatcher::Equals(expected) => value == expected,
            ArgumentMatcher::Null => value.is_null(),
            ArgumentMatcher::NotNull => !value.is_null(),
            ArgumentMatcher::Contains(needle) => {
                value.as_str().map(|s| s.contains(needle.as_str())).unwrap_or(false)
            }
            ArgumentMatcher::Regex(regex) => value.as_str().map(|s| regex.is_match(s)).unwrap_or(false),
            ArgumentMatcher::Glob(glob) => value.as_str().map(|s| glob.is_match(s)).unwrap_or(false),
            ArgumentMatcher::JsonPath(expressions) => matches_json_paths(value, expressions),
            ArgumentMatcher::Any | ArgumentMatcher::AnyCallback | ArgumentMatcher::Predicate(_) => {
                false
            }
        }
    }
}

impl fmt::Debug for ArgumentMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for ArgumentMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentMatcher::Any => write!(f, "any"),
            ArgumentMatcher::AnyCallback => write!(f, "any_callback"),
            ArgumentMatcher::Equals(value) => write!(f, "{}", value),
            ArgumentMatcher::Null => write!(f, "null"),
            ArgumentMatcher::NotNull => write!(f, "not_null"),
            ArgumentMatcher::Contains(value) => write!(f, "contains({:?})", value),
            ArgumentMatcher::Regex(regex) => write!(f, "regex({:?})", regex.as_str()),
            ArgumentMatcher::Glob(glob) => write!(f, "glob({:?})", glob.glob().glob()),
            ArgumentMatcher::JsonPath(expressions) => {
                let mut paths: Vec<_> = expressions.keys().map(String::as_str).collect();
                paths.sort_unstable();
                write!(f, "json_path({})", paths.join(", "))
            }
            ArgumentMatcher::Predicate(_) => write!(f, "predicate"),
        }
    }
}

fn matches_json_paths(json: &Value, expressions: &HashMap<String, Value>) -> bool {
    use jsonpath_rust::JsonPath;

    for (path_expr, expected) in expressions {
        let path = match JsonPath::<Value>::try_from(path_expr.as_str()) {
            Ok(p) => p,
            Err(_) => return false,
        };

        let results = path.find(json);

        // A null expectation only requires the path to resolve
        let matches = if expected.is_null() {
            !results.is_null()
        } else {
            results == *expected
        };
        if !matches {
            return false;
        }
    }
    true
}

/// Matcher over a whole argument tuple.
#[derive(Debug, Clone, Default)]
pub struct CallMatcher {
    args: Vec<ArgumentMatcher>,
}

impl CallMatcher {
    pub fn new(args: Vec<ArgumentMatcher>) -> Self {
        Self { args }
    }

    /// Wildcard over `arity` arguments.
    pub fn any(arity: usize) -> Self {
        Self {
            args: vec![ArgumentMatcher::Any; arity],
        }
    }

    pub fn from_defs(defs: &[ArgMatcherDef]) -> Result<Self, StubError> {
        defs.iter()
            .map(ArgumentMatcher::from_def)
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Whether every position accepts its argument.
    pub fn accepts(&self, args: &[Arg]) -> bool {
        self.args.len() == args.len()
            && self.args.iter().zip(args).all(|(m, a)| m.accepts(a))
    }
}

impl From<Vec<ArgumentMatcher>> for CallMatcher {
    fn from(args: Vec<ArgumentMatcher>) -> Self {
        Self::new(args)
    }
}

impl<const N: usize> From<[ArgumentMatcher; N]> for CallMatcher {
    fn from(args: [ArgumentMatcher; N]) -> Self {
        Self::new(args.into())
    }
}

impl fmt::Display for CallMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.args.iter().map(|m| m.to_string()).collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Wildcard argument matcher.
pub fn any() -> ArgumentMatcher {
    ArgumentMatcher::Any
}

/// Matcher accepting any callback argument.
pub fn any_callback() -> ArgumentMatcher {
    ArgumentMatcher::AnyCallback
}

/// Exact value matcher.
pub fn eq(value: impl Into<Value>) -> ArgumentMatcher {
    ArgumentMatcher::equals(value)
}
