//! Mock objects.
//!
//! A [`Mock`] owns a stub registry, the log of calls it received, and the
//! policy for calls no stub accepts. Mocked contracts are ordinary traits:
//! implement the trait on a wrapper around `Mock` and forward each method to
//! [`Mock::call`] or [`Mock::call_as`].
//!
//! Every call is recorded before its action runs, so a call whose action
//! throws still counts for verification.

use crate::action::{Action, ActionContext};
use crate::arg::{args_to_json, Arg};
use crate::config::{MockDefinition, MockSettings, UnstubbedPolicy};
use crate::error::StubError;
use crate::matcher::CallMatcher;
use crate::registry::{StubEntry, StubRegistry};
use crate::stubber::Stubber;
use crate::template::TemplateEngine;
use crate::verify::VerificationMode;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// One intercepted call.
#[derive(Debug, Clone)]
pub struct CallRecord {
    /// Position of the call on its mock, starting at 0
    pub sequence: u64,
    pub method: String,
    pub args: Vec<Arg>,
    /// Stub that handled the call (None when unstubbed)
    pub stub_id: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// A mock object.
pub struct Mock {
    name: String,
    registry: StubRegistry,
    settings: MockSettings,
    template_engine: TemplateEngine,
    calls: Mutex<Vec<CallRecord>>,
    /// Total calls received.
    calls_total: AtomicU64,
    /// Calls handled by a stub.
    calls_matched: AtomicU64,
    /// Calls no stub accepted.
    calls_unmatched: AtomicU64,
}

impl Mock {
    /// Create a mock with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_settings(name, MockSettings::default())
    }

    pub fn with_settings(name: impl Into<String>, settings: MockSettings) -> Self {
        let name = name.into();
        Self {
            registry: StubRegistry::new(name.clone()),
            name,
            settings,
            template_engine: TemplateEngine::new(),
            calls: Mutex::new(Vec::new()),
            calls_total: AtomicU64::new(0),
            calls_matched: AtomicU64::new(0),
            calls_unmatched: AtomicU64::new(0),
        }
    }

    /// Create a mock and register its stubs in one go.
    pub fn stub<F>(name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(&mut Stubber<'_>),
    {
        let mut mock = Self::new(name);
        f(&mut mock.stubber());
        mock
    }

    /// Build a mock from a configured definition. Disabled stubs are skipped.
    pub fn from_definition(def: &MockDefinition, settings: MockSettings) -> Result<Self, StubError> {
        let mut mock = Self::with_settings(def.name.clone(), settings);
        for stub in def.stubs.iter().filter(|s| s.enabled) {
            let matcher = CallMatcher::from_defs(&stub.args)?;
            let action = Action::from_def(&stub.action);
            match &stub.id {
                Some(id) => mock.registry.register_with_id(id.clone(), &stub.method, matcher, action),
                None => mock.registry.register(&stub.method, matcher, action),
            };
        }

        info!(
            mock = %mock.name,
            description = def.description.as_deref().unwrap_or(""),
            stubs = mock.registry.len(),
            unstubbed = ?mock.settings.unstubbed,
            "Mock initialized"
        );
        Ok(mock)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &MockSettings {
        &self.settings
    }

    pub fn registry(&self) -> &StubRegistry {
        &self.registry
    }

    /// Register further stubs.
    pub fn stubber(&mut self) -> Stubber<'_> {
        Stubber::new(&mut self.registry)
    }

    /// Append a stub for `method`.
    pub fn register(&mut self, method: &str, matcher: CallMatcher, action: Action) -> &StubEntry {
        self.registry.register(method, matcher, action)
    }

    /// Look up the stub a call would resolve to, without recording anything.
    pub fn resolve(&self, method: &str, args: &[Arg]) -> Result<&StubEntry, StubError> {
        self.registry.resolve(method, args)
    }

    /// Record a call, resolve it, and run the matched action.
    ///
    /// A call no stub accepts is handled by the configured [`UnstubbedPolicy`].
    pub fn call(&self, method: &str, args: &[Arg]) -> Result<Option<Value>, StubError> {
        self.calls_total.fetch_add(1, Ordering::Relaxed);

        let resolved = self.registry.resolve(method, args);
        let stub_id = resolved.as_ref().ok().map(|entry| entry.id().to_string());
        // The log lock is released before the action runs; actions may call back into this mock
        let sequence = self.record(method, args, stub_id);

        match resolved {
            Ok(entry) => {
                self.calls_matched.fetch_add(1, Ordering::Relaxed);
                if self.settings.log_matches {
                    info!(
                        mock = %self.name,
                        method = %method,
                        stub_id = %entry.id(),
                        "Call matched stub"
                    );
                }

                let ctx = ActionContext {
                    mock: &self.name,
                    method,
                    args,
                    sequence,
                };
                entry.action().execute(&ctx, &self.template_engine)
            }
            Err(err) => {
                self.calls_unmatched.fetch_add(1, Ordering::Relaxed);
                if self.settings.log_unmatched {
                    warn!(
                        mock = %self.name,
                        method = %method,
                        args = ?args_to_json(args),
                        "No matching stub found"
                    );
                }

                match &self.settings.unstubbed {
                    UnstubbedPolicy::Fail => Err(err),
                    UnstubbedPolicy::ReturnNull => Ok(None),
                    UnstubbedPolicy::ReturnValue { value } => Ok(Some(value.clone())),
                }
            }
        }
    }

    /// [`call`](Self::call), converting the returned value into `T`.
    ///
    /// No value converts like JSON `null`, so `()` and `Option<_>` accept it.
    pub fn call_as<T: DeserializeOwned>(&self, method: &str, args: &[Arg]) -> Result<T, StubError> {
        let value = self.call(method, args)?.unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|source| StubError::ReturnType {
            mock: self.name.clone(),
            method: method.to_string(),
            source,
        })
    }

    fn record(&self, method: &str, args: &[Arg], stub_id: Option<String>) -> u64 {
        let mut calls = self.lock_calls();
        let sequence = calls.len() as u64;
        debug!(mock = %self.name, method = %method, sequence, "Recording call");
        calls.push(CallRecord {
            sequence,
            method: method.to_string(),
            args: args.to_vec(),
            stub_id,
            recorded_at: Utc::now(),
        });
        sequence
    }

    fn lock_calls(&self) -> MutexGuard<'_, Vec<CallRecord>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of every recorded call, oldest first.
    pub fn calls(&self) -> Vec<CallRecord> {
        self.lock_calls().clone()
    }

    /// Recorded calls of `method`, oldest first.
    pub fn calls_for(&self, method: &str) -> Vec<CallRecord> {
        self.lock_calls()
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    /// Number of recorded calls of `method` whose arguments `matcher` accepts.
    ///
    /// Matchers run outside the call-log lock, so a predicate may query this mock.
    pub fn call_count(&self, method: &str, matcher: &CallMatcher) -> usize {
        self.calls_for(method)
            .iter()
            .filter(|c| matcher.accepts(&c.args))
            .count()
    }

    /// Number of calls the given stub handled.
    pub fn stub_match_count(&self, stub_id: &str) -> usize {
        self.lock_calls()
            .iter()
            .filter(|c| c.stub_id.as_deref() == Some(stub_id))
            .count()
    }

    /// Check that the matching calls satisfy `mode`.
    pub fn verify(
        &self,
        method: &str,
        matcher: impl Into<CallMatcher>,
        mode: VerificationMode,
    ) -> Result<(), StubError> {
        let matcher = matcher.into();
        let actual = self.call_count(method, &matcher);
        if mode.check(actual) {
            debug!(mock = %self.name, method = %method, actual, "Verification passed");
            Ok(())
        } else {
            Err(StubError::Verification {
                mock: self.name.clone(),
                method: method.to_string(),
                matcher: matcher.to_string(),
                expected: mode,
                actual,
            })
        }
    }

    /// Check that at least one matching call happened.
    pub fn verify_called(&self, method: &str, matcher: impl Into<CallMatcher>) -> Result<(), StubError> {
        self.verify(method, matcher, VerificationMode::at_least_once())
    }

    /// Forget recorded calls and reset the counters. Stubs are kept.
    pub fn reset_calls(&self) {
        self.lock_calls().clear();
        self.calls_total.store(0, Ordering::Relaxed);
        self.calls_matched.store(0, Ordering::Relaxed);
        self.calls_unmatched.store(0, Ordering::Relaxed);
    }

    /// Get total calls received.
    pub fn total_calls(&self) -> u64 {
        self.calls_total.load(Ordering::Relaxed)
    }

    /// Get total calls matched to stubs.
    pub fn total_matched(&self) -> u64 {
        self.calls_matched.load(Ordering::Relaxed)
    }

    /// Get total unstubbed calls.
    pub fn total_unmatched(&self) -> u64 {
        self.calls_unmatched.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for Mock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mock")
            .field("name", &self.name)
            .field("stubs", &self.registry.len())
            .field("calls", &self.total_calls())
            .finish()
    }
}
