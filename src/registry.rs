//! Stub registry.
//!
//! Holds, per method signature, the stubs in the order they were registered.
//! Resolution scans that list from first to last and takes the first entry
//! whose matcher accepts the arguments. A broad matcher registered early
//! shadows narrower ones registered after it, so register specific stubs
//! first and wildcards last.
//!
//! The registry is append-only and has no interior mutability: registering
//! needs `&mut self`, resolving needs `&self`.

use crate::action::Action;
use crate::arg::{args_to_json, Arg};
use crate::error::StubError;
use crate::matcher::CallMatcher;
use std::collections::HashMap;
use tracing::trace;

/// A registered stub. Immutable once created.
#[derive(Debug, Clone)]
pub struct StubEntry {
    id: String,
    matcher: CallMatcher,
    action: Action,
}

impl StubEntry {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn matcher(&self) -> &CallMatcher {
        &self.matcher
    }

    pub fn action(&self) -> &Action {
        &self.action
    }
}

/// Ordered stubs per method signature.
#[derive(Debug, Default)]
pub struct StubRegistry {
    owner: String,
    stubs: HashMap<String, Vec<StubEntry>>,
}

impl StubRegistry {
    /// Create an empty registry for the named mock.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            stubs: HashMap::new(),
        }
    }

    /// Append a stub with a generated id (`<method>#<n>`).
    pub fn register(&mut self, method: &str, matcher: CallMatcher, action: Action) -> &StubEntry {
        let n = self.stubs.get(method).map(Vec::len).unwrap_or(0);
        let id = format!("{}#{}", method, n);
        self.register_with_id(id, method, matcher, action)
    }

    /// Append a stub with an explicit id.
    pub fn register_with_id(
        &mut self,
        id: impl Into<String>,
        method: &str,
        matcher: CallMatcher,
        action: Action,
    ) -> &StubEntry {
        let entry = StubEntry {
            id: id.into(),
            matcher,
            action,
        };
        trace!(
            mock = %self.owner,
            method = %method,
            stub_id = %entry.id,
            matcher = %entry.matcher,
            "Registered stub"
        );
        let list = self.stubs.entry(method.to_string()).or_default();
        list.push(entry);
        &list[list.len() - 1]
    }

    /// Find the first stub, in registration order, accepting `args`.
    pub fn find(&self, method: &str, args: &[Arg]) -> Option<&StubEntry> {
        self.stubs
            .get(method)?
            .iter()
            .find(|entry| entry.matcher.accepts(args))
    }

    /// Like [`find`](Self::find), but a miss is an unstubbed-call error.
    pub fn resolve(&self, method: &str, args: &[Arg]) -> Result<&StubEntry, StubError> {
        self.find(method, args).ok_or_else(|| StubError::UnstubbedCall {
            mock: self.owner.clone(),
            method: method.to_string(),
            args: args_to_json(args),
        })
    }

    /// Stubs registered for a method, in registration order.
    pub fn stubs(&self, method: &str) -> &[StubEntry] {
        self.stubs.get(method).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Methods with at least one stub.
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.stubs.keys().map(String::as_str)
    }

    /// Total number of stubs across all methods.
    pub fn len(&self) -> usize {
        self.stubs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::matcher::{any, eq};
    use serde_json::{json, Value};

    fn returned(registry: &StubRegistry, method: &str, args: &[Arg]) -> Option<Value> {
        match registry.resolve(method, args).ok()?.action() {
            Action::Return(v) => Some(v.clone()),
            other => panic!("unexpected action {:?}", other),
        }
    }

    fn priority_registry() -> StubRegistry {
        let mut registry = StubRegistry::new("text_field");
        registry.register(
            "should_change_text",
            CallMatcher::from([any(), eq("pappa pia")]),
            Action::Return(json!(false)),
        );
        registry.register(
            "should_change_text",
            CallMatcher::from([any(), eq("mamma mia")]),
            Action::Return(json!(true)),
        );
        registry.register(
            "should_change_text",
            CallMatcher::from([any(), any()]),
            Action::Return(json!(false)),
        );
        registry
    }

    #[test]
    fn test_first_match_wins() {
        let registry = priority_registry();
        let m = "should_change_text";

        assert_eq!(returned(&registry, m, &args![Value::Null, "pappa pia"]), Some(json!(false)));
        assert_eq!(returned(&registry, m, &args![Value::Null, "mamma mia"]), Some(json!(true)));
        assert_eq!(returned(&registry, m, &args![Value::Null, "lalla lia"]), Some(json!(false)));

        let entry = registry.resolve(m, &args![Value::Null, "lalla lia"]).unwrap();
        assert_eq!(entry.id(), "should_change_text#2");
    }

    #[test]
    fn test_wildcard_registered_first_shadows() {
        let mut registry = StubRegistry::new("text_field");
        registry.register(
            "should_change_text",
            CallMatcher::from([any(), any()]),
            Action::Return(json!(false)),
        );
        registry.register(
            "should_change_text",
            CallMatcher::from([any(), eq("mamma mia")]),
            Action::Return(json!(true)),
        );

        let entry = registry
            .resolve("should_change_text", &args![Value::Null, "mamma mia"])
            .unwrap();
        assert_eq!(entry.id(), "should_change_text#0");
        assert!(registry.stubs("should_change_text")[1]
            .matcher()
            .accepts(&args![Value::Null, "mamma mia"]));
    }

    #[test]
    fn test_duplicate_exact_matchers() {
        let mut registry = StubRegistry::new("view");
        registry.register_with_id("first", "end_editing", CallMatcher::from([eq(true)]), Action::Return(json!(1)));
        registry.register_with_id("second", "end_editing", CallMatcher::from([eq(true)]), Action::Return(json!(2)));

        assert_eq!(registry.resolve("end_editing", &args![true]).unwrap().id(), "first");
    }

    #[test]
    fn test_unstubbed() {
        let registry = priority_registry();

        let err = registry.resolve("should_change_text", &args!["lalla lia"]).unwrap_err();
        assert!(err.is_unstubbed());

        // Unknown methods are a miss, not a structural failure
        let err = registry.resolve("become_first_responder", &args![]).unwrap_err();
        assert!(err.is_unstubbed());
        assert!(StubRegistry::default().find("anything", &[]).is_none());
    }

    #[test]
    fn test_resolve_is_stable() {
        let registry = priority_registry();
        let args = args![Value::Null, "mamma mia"];
        let first = registry.resolve("should_change_text", &args).unwrap().id().to_string();
        let second = registry.resolve("should_change_text", &args).unwrap().id().to_string();
        assert_eq!(first, second);
    }

    #[test]
    fn test_len_and_methods() {
        let mut registry = priority_registry();
        registry.register("resume", CallMatcher::default(), Action::DoNothing);

        assert_eq!(registry.len(), 4);
        assert!(!registry.is_empty());
        let mut methods: Vec<_> = registry.methods().collect();
        methods.sort_unstable();
        assert_eq!(methods, vec!["resume", "should_change_text"]);
        assert!(registry.stubs("missing").is_empty());
    }
}
