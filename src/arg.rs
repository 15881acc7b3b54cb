//! Call arguments.
//!
//! Arguments are dynamically typed: a JSON value, or a callback that the
//! caller passed in (a completion handler, a delegate closure). Callbacks are
//! reference counted so a stub can capture one from a call and invoke it long
//! after the call returned.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type CallbackFn = dyn Fn(&[Arg]) -> Option<Value> + Send + Sync;

/// A closure passed as a call argument.
#[derive(Clone)]
pub struct Callback {
    f: Arc<CallbackFn>,
}

impl Callback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Arg]) -> Option<Value> + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    /// Invoke the callback with the given arguments.
    pub fn invoke(&self, args: &[Arg]) -> Option<Value> {
        (self.f)(args)
    }

    /// Whether both handles refer to the same closure.
    pub fn ptr_eq(&self, other: &Callback) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

/// A single argument of a mocked call.
#[derive(Debug, Clone)]
pub enum Arg {
    Value(Value),
    Callback(Callback),
}

impl Arg {
    /// Wrap a closure as a callback argument.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&[Arg]) -> Option<Value> + Send + Sync + 'static,
    {
        Arg::Callback(Callback::new(f))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Arg::Value(v) => Some(v),
            Arg::Callback(_) => None,
        }
    }

    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            Arg::Callback(cb) => Some(cb),
            Arg::Value(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    /// JSON view of the argument, used for logging, templates, and errors.
    pub fn to_json(&self) -> Value {
        match self {
            Arg::Value(v) => v.clone(),
            Arg::Callback(_) => Value::String("<callback>".to_string()),
        }
    }
}

impl From<Callback> for Arg {
    fn from(cb: Callback) -> Self {
        Arg::Callback(cb)
    }
}

macro_rules! impl_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(v: $ty) -> Self {
                    Arg::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_from_value!(Value, bool, i32, i64, u32, u64, f64, String, &str);

/// JSON view of an argument list.
pub fn args_to_json(args: &[Arg]) -> Vec<Value> {
    args.iter().map(Arg::to_json).collect()
}

/// Build an argument list: `args![Value::Null, "mamma mia", cb]`.
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Arg::from($arg)),+]
    };
}
