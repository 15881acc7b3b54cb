//! Builder API for registering stubs.
//!
//! ```
//! use mock_stub_registry::matcher::{any, eq};
//! use mock_stub_registry::{args, Mock};
//! use serde_json::Value;
//!
//! let mock = Mock::stub("text_field", |stubber| {
//!     stubber.when("should_change_text", [any(), eq("mamma mia")]).then_return(true);
//!     stubber.when("should_change_text", [any(), any()]).then_return(false);
//! });
//!
//! let allowed: bool = mock
//!     .call_as("should_change_text", &args![Value::Null, "mamma mia"])
//!     .unwrap();
//! assert!(allowed);
//! ```

use crate::action::Action;
use crate::arg::Arg;
use crate::error::ActionError;
use crate::matcher::CallMatcher;
use crate::registry::StubRegistry;
use serde_json::Value;

/// Registers stubs on a mock.
pub struct Stubber<'a> {
    registry: &'a mut StubRegistry,
}

impl<'a> Stubber<'a> {
    pub(crate) fn new(registry: &'a mut StubRegistry) -> Self {
        Self { registry }
    }

    /// Start a stub for `method` called with arguments accepted by `matcher`.
    pub fn when(&mut self, method: &str, matcher: impl Into<CallMatcher>) -> StubBuilder<'_> {
        StubBuilder {
            registry: &mut *self.registry,
            method: method.to_string(),
            matcher: matcher.into(),
            id: None,
        }
    }
}

/// A stub awaiting its action. Nothing is registered until a `then*` method runs.
#[must_use = "a stub is registered only once an action is chosen"]
pub struct StubBuilder<'a> {
    registry: &'a mut StubRegistry,
    method: String,
    matcher: CallMatcher,
    id: Option<String>,
}

impl<'a> StubBuilder<'a> {
    /// Give the stub an explicit id instead of `<method>#<n>`.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn then_return(self, value: impl Into<Value>) {
        self.register(Action::Return(value.into()));
    }

    /// Return `value` with its template strings rendered against each call.
    pub fn then_template(self, value: Value) {
        self.register(Action::Template(value));
    }

    /// Run `f` with the call's arguments; its result becomes the return value.
    pub fn then<F>(self, f: F)
    where
        F: Fn(&[Arg]) -> Option<Value> + Send + Sync + 'static,
    {
        self.register(Action::invoke(f));
    }

    pub fn then_throw(self, error: ActionError) {
        self.register(Action::Throw(error));
    }

    pub fn then_do_nothing(self) {
        self.register(Action::DoNothing);
    }

    fn register(self, action: Action) {
        match self.id {
            Some(id) => {
                self.registry
                    .register_with_id(id, &self.method, self.matcher, action);
            }
            None => {
                self.registry.register(&self.method, self.matcher, action);
            }
        }
    }
}
