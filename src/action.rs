//! Stub actions.

use crate::arg::Arg;
use crate::config::ActionDef;
use crate::error::{ActionError, StubError};
use crate::template::{TemplateContext, TemplateEngine};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type InvokeFn = dyn Fn(&[Arg]) -> Option<Value> + Send + Sync;

/// What a matched stub does.
#[derive(Clone)]
pub enum Action {
    /// Return a fixed value
    Return(Value),
    /// Return a value whose template strings are rendered per call
    Template(Value),
    /// Run a closure with the call's arguments
    Invoke(Arc<InvokeFn>),
    /// Raise the designated error
    Throw(ActionError),
    /// No side effect and no value
    DoNothing,
}

/// Call details an action executes against.
pub struct ActionContext<'a> {
    pub mock: &'a str,
    pub method: &'a str,
    pub args: &'a [Arg],
    pub sequence: u64,
}

impl Action {
    pub fn invoke<F>(f: F) -> Self
    where
        F: Fn(&[Arg]) -> Option<Value> + Send + Sync + 'static,
    {
        Action::Invoke(Arc::new(f))
    }

    pub fn from_def(def: &ActionDef) -> Self {
        match def {
            ActionDef::Return { value } => Action::Return(value.clone()),
            ActionDef::Template { value } => Action::Template(value.clone()),
            ActionDef::Throw { error, message } => {
                Action::Throw(ActionError::new(error.clone(), message.clone()))
            }
            ActionDef::DoNothing => Action::DoNothing,
        }
    }

    /// Execute the action for one call.
    pub fn execute(
        &self,
        ctx: &ActionContext<'_>,
        templates: &TemplateEngine,
    ) -> Result<Option<Value>, StubError> {
        match self {
            Action::Return(value) => Ok(Some(value.clone())),
            Action::Template(value) => {
                let template_ctx = TemplateContext {
                    mock: ctx.mock.to_string(),
                    method: ctx.method.to_string(),
                    args: crate::arg::args_to_json(ctx.args),
                    call: ctx.sequence,
                };
                templates
                    .render_json(value, &template_ctx)
                    .map(Some)
                    .map_err(|source| StubError::Template {
                        mock: ctx.mock.to_string(),
                        method: ctx.method.to_string(),
                        source: Box::new(source),
                    })
            }
            Action::Invoke(f) => Ok(f(ctx.args)),
            Action::Throw(err) => Err(StubError::Action(err.clone())),
            Action::DoNothing => Ok(None),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Return(value) => f.debug_tuple("Return").field(value).finish(),
            Action::Template(value) => f.debug_tuple("Template").field(value).finish(),
            Action::Invoke(_) => f.write_str("Invoke(..)"),
            Action::Throw(err) => f.debug_tuple("Throw").field(err).finish(),
            Action::DoNothing => f.write_str("DoNothing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use serde_json::json;

    fn run(action: &Action, args: &[Arg]) -> Result<Option<Value>, StubError> {
        let ctx = ActionContext {
            mock: "view",
            method: "hit_test",
            args,
            sequence: 0,
        };
        action.execute(&ctx, &TemplateEngine::new())
    }

    #[test]
    fn test_return_and_do_nothing() {
        assert_eq!(run(&Action::Return(json!(true)), &[]).unwrap(), Some(json!(true)));
        assert_eq!(run(&Action::DoNothing, &[]).unwrap(), None);
    }

    #[test]
    fn test_invoke_sees_arguments() {
        let action = Action::invoke(|args| {
            let x = args[0].as_value()?.get("x")?.as_f64()?;
            Some(json!(x > 100.0))
        });
        let result = run(&action, &args![json!({"x": 145.5, "y": 0.444})]).unwrap();
        assert_eq!(result, Some(json!(true)));
    }

    #[test]
    fn test_throw() {
        let action = Action::Throw(ActionError::new("unknown", ""));
        let err = run(&action, &[]).unwrap_err();
        assert_eq!(err.action_error().unwrap().kind, "unknown");
    }

    #[test]
    fn test_template() {
        let action = Action::Template(json!({"activity_type": "{{upper args.[0]}}"}));
        let result = run(&action, &args!["activity"]).unwrap().unwrap();
        assert_eq!(result["activity_type"], "ACTIVITY");
    }

    #[test]
    fn test_from_def() {
        let def: ActionDef = serde_yaml::from_str("type: throw\nerror: unknown").unwrap();
        match Action::from_def(&def) {
            Action::Throw(err) => assert_eq!(err, ActionError::new("unknown", "")),
            other => panic!("Expected Throw, got {:?}", other),
        }
    }
}
