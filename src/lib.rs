//! Mock Stub Registry
//!
//! Stub registry and argument matching for hand-written mocks. A mock keeps,
//! per method signature, an ordered list of stubs; each call is recorded,
//! resolved against those stubs in registration order, and the first stub
//! whose matchers accept the arguments runs its action.
//!
//! # Features
//!
//! - **First-match resolution**: stubs are tried in registration order, never reordered
//! - **Argument Matching**: wildcards, exact values, callbacks, regex, glob, JSON path, predicates
//! - **Actions**: return a value, render a template, run a closure, throw, do nothing
//! - **Captured Callbacks**: closures passed as arguments can be stored and invoked later
//! - **Verification**: count recorded calls by argument pattern (times, at least, at most, never)
//! - **Unstubbed Policy**: fail, return null, or return a fixed value
//!
//! # Example Configuration
//!
//! ```yaml
//! mocks:
//!   - name: text_field
//!     stubs:
//!       - method: should_change_text
//!         args: [{type: any}, {type: equals, value: "mamma mia"}]
//!         action: {type: return, value: true}
//!       - method: should_change_text
//!         args: [{type: any}, {type: any}]
//!         action: {type: return, value: false}
//! ```

pub mod action;
pub mod arg;
pub mod config;
pub mod error;
pub mod matcher;
pub mod mock;
pub mod registry;
pub mod scenario;
pub mod stubber;
pub mod template;
pub mod verify;

pub use action::Action;
pub use arg::{Arg, Callback};
pub use config::{MockConfig, MockSettings, UnstubbedPolicy};
pub use error::{ActionError, StubError};
pub use matcher::{ArgumentMatcher, CallMatcher};
pub use mock::{CallRecord, Mock};
pub use registry::{StubEntry, StubRegistry};
pub use scenario::Scenario;
pub use stubber::Stubber;
pub use verify::VerificationMode;
