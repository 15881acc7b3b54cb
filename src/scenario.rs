//! Replays configured calls against configured mocks and checks verifications.

use crate::arg::Arg;
use crate::config::MockConfig;
use crate::error::{ActionError, StubError};
use crate::matcher::CallMatcher;
use crate::mock::Mock;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{info, warn};

/// What one replayed call produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CallResult {
    Returned {
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },
    Threw {
        error: ActionError,
    },
    Unstubbed {
        message: String,
    },
    Failed {
        message: String,
    },
}

impl From<Result<Option<Value>, StubError>> for CallResult {
    fn from(result: Result<Option<Value>, StubError>) -> Self {
        match result {
            Ok(value) => CallResult::Returned { value },
            Err(StubError::Action(error)) => CallResult::Threw { error },
            Err(err) if err.is_unstubbed() => CallResult::Unstubbed {
                message: err.to_string(),
            },
            Err(err) => CallResult::Failed {
                message: err.to_string(),
            },
        }
    }
}

/// A replayed call and its result.
#[derive(Debug, Clone, Serialize)]
pub struct CallOutcome {
    pub mock: String,
    pub method: String,
    #[serde(flatten)]
    pub result: CallResult,
}

/// Result of one verification.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationOutcome {
    pub mock: String,
    pub method: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Everything a scenario run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub calls: Vec<CallOutcome>,
    pub verifications: Vec<VerificationOutcome>,
}

impl ScenarioReport {
    /// Whether every verification held.
    pub fn passed(&self) -> bool {
        self.verifications.iter().all(|v| v.passed)
    }

    pub fn failed_verifications(&self) -> usize {
        self.verifications.iter().filter(|v| !v.passed).count()
    }
}

/// Mocks built from a configuration, plus the scenario to replay.
pub struct Scenario {
    config: MockConfig,
    mocks: HashMap<String, Mock>,
}

impl Scenario {
    /// Build every configured mock.
    pub fn new(config: MockConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let mut mocks = HashMap::new();
        for def in &config.mocks {
            let mock = Mock::from_definition(def, config.settings.clone())
                .map_err(|e| anyhow::anyhow!("Mock '{}': {}", def.name, e))?;
            mocks.insert(def.name.clone(), mock);
        }

        info!(
            mocks = mocks.len(),
            calls = config.calls.len(),
            verifications = config.verify.len(),
            "Scenario loaded"
        );
        Ok(Self { config, mocks })
    }

    pub fn mock(&self, name: &str) -> Option<&Mock> {
        self.mocks.get(name)
    }

    /// Replay the configured calls, then run the verifications.
    pub fn run(&self) -> anyhow::Result<ScenarioReport> {
        let mut calls = Vec::with_capacity(self.config.calls.len());
        for call in &self.config.calls {
            let mock = self.lookup(&call.mock)?;
            let args: Vec<Arg> = call.args.iter().cloned().map(Arg::Value).collect();
            let result = CallResult::from(mock.call(&call.method, &args));
            calls.push(CallOutcome {
                mock: call.mock.clone(),
                method: call.method.clone(),
                result,
            });
        }

        let mut verifications = Vec::with_capacity(self.config.verify.len());
        for check in &self.config.verify {
            let mock = self.lookup(&check.mock)?;
            let matcher = CallMatcher::from_defs(&check.args)?;
            let outcome = match mock.verify(&check.method, matcher, check.mode) {
                Ok(()) => VerificationOutcome {
                    mock: check.mock.clone(),
                    method: check.method.clone(),
                    passed: true,
                    message: None,
                },
                Err(err) => {
                    warn!(mock = %check.mock, method = %check.method, error = %err, "Verification failed");
                    VerificationOutcome {
                        mock: check.mock.clone(),
                        method: check.method.clone(),
                        passed: false,
                        message: Some(err.to_string()),
                    }
                }
            };
            verifications.push(outcome);
        }

        Ok(ScenarioReport {
            calls,
            verifications,
        })
    }

    fn lookup(&self, name: &str) -> anyhow::Result<&Mock> {
        self.mocks
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown mock '{}'", name))
    }
}
