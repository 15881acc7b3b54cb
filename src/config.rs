//! Configuration for declarative mocks.
//!
//! Defines mocks, their stubs, and an optional scenario of calls to replay
//! and verifications to check afterwards.

use crate::matcher::ArgumentMatcher;
use crate::verify::VerificationMode;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Main configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MockConfig {
    /// Global settings applied to every mock
    #[serde(default)]
    pub settings: MockSettings,

    /// Mock definitions
    #[serde(default)]
    pub mocks: Vec<MockDefinition>,

    /// Calls to replay, in order
    #[serde(default)]
    pub calls: Vec<CallDefinition>,

    /// Verifications to run after the calls
    #[serde(default)]
    pub verify: Vec<VerifyDefinition>,
}

impl MockConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut names = HashSet::new();
        for (i, mock) in self.mocks.iter().enumerate() {
            mock.validate()
                .map_err(|e| anyhow::anyhow!("Mock {}: {}", i, e))?;
            if !names.insert(mock.name.as_str()) {
                anyhow::bail!("Mock {}: duplicate mock name '{}'", i, mock.name);
            }
        }

        for (i, call) in self.calls.iter().enumerate() {
            if !names.contains(call.mock.as_str()) {
                anyhow::bail!("Call {}: unknown mock '{}'", i, call.mock);
            }
            if call.method.is_empty() {
                anyhow::bail!("Call {}: method cannot be empty", i);
            }
        }

        for (i, check) in self.verify.iter().enumerate() {
            if !names.contains(check.mock.as_str()) {
                anyhow::bail!("Verify {}: unknown mock '{}'", i, check.mock);
            }
            for def in &check.args {
                ArgumentMatcher::from_def(def)
                    .map_err(|e| anyhow::anyhow!("Verify {}: {}", i, e))?;
            }
        }
        Ok(())
    }
}

/// A named mock and its stubs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockDefinition {
    /// Unique mock name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Stubs, in registration order
    #[serde(default)]
    pub stubs: Vec<StubDefinition>,
}

impl MockDefinition {
    /// Validate the mock definition.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.is_empty() {
            anyhow::bail!("Mock name cannot be empty");
        }
        for (i, stub) in self.stubs.iter().enumerate() {
            stub.validate()
                .map_err(|e| anyhow::anyhow!("Stub {}: {}", i, e))?;
        }
        Ok(())
    }
}

/// A single stub definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StubDefinition {
    /// Optional identifier (defaults to `<method>#<n>`)
    #[serde(default)]
    pub id: Option<String>,

    /// Method signature this stub applies to
    pub method: String,

    /// One matcher per argument position
    #[serde(default)]
    pub args: Vec<ArgMatcherDef>,

    /// What to do when the stub matches
    pub action: ActionDef,

    /// Disabled stubs are never registered
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl StubDefinition {
    /// Validate the stub definition.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.method.is_empty() {
            anyhow::bail!("Stub method cannot be empty");
        }
        if matches!(&self.id, Some(id) if id.is_empty()) {
            anyhow::bail!("Stub id cannot be empty");
        }
        for def in &self.args {
            ArgumentMatcher::from_def(def)?;
        }
        Ok(())
    }
}

/// Argument matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArgMatcherDef {
    /// Accept any argument
    Any,
    /// Accept any callback argument
    AnyCallback,
    /// Exact JSON value match
    Equals { value: serde_json::Value },
    /// Argument must be null
    Null,
    /// Argument must be a non-null value
    NotNull,
    /// String argument must contain substring
    Contains { value: String },
    /// Regex pattern match on a string argument
    Regex { pattern: String },
    /// Glob pattern match on a string argument
    Glob { pattern: String },
    /// JSON path matching
    JsonPath {
        /// JSON path expressions and expected values
        expressions: HashMap<String, serde_json::Value>,
    },
}

/// Action configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionDef {
    /// Return a fixed value
    Return {
        #[serde(default)]
        value: serde_json::Value,
    },
    /// Return a value whose strings are rendered as templates
    Template { value: serde_json::Value },
    /// Raise a designated error
    Throw {
        error: String,
        #[serde(default)]
        message: String,
    },
    /// No side effect, no value
    DoNothing,
}

/// What a call that matches no stub produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnstubbedPolicy {
    /// Fail the call with an unstubbed-call error
    #[default]
    Fail,
    /// Return no value
    ReturnNull,
    /// Return a fixed fallback value
    ReturnValue { value: serde_json::Value },
}

/// Global settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockSettings {
    /// Behavior for calls that match no stub
    #[serde(default)]
    pub unstubbed: UnstubbedPolicy,

    /// Log all matched stubs
    #[serde(default = "default_true")]
    pub log_matches: bool,

    /// Log unstubbed calls
    #[serde(default = "default_true")]
    pub log_unmatched: bool,
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            unstubbed: UnstubbedPolicy::default(),
            log_matches: true,
            log_unmatched: true,
        }
    }
}

/// A call to replay against a mock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallDefinition {
    pub mock: String,
    pub method: String,
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
}

/// A verification to check after the calls were replayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyDefinition {
    pub mock: String,
    pub method: String,
    #[serde(default)]
    pub args: Vec<ArgMatcherDef>,
    #[serde(default)]
    pub mode: VerificationMode,
}
