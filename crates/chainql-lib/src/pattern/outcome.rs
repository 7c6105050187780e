//! Match outcomes.

use indexmap::IndexMap;
use serde_json::Value;

use chainql_core::same_node;

/// Captured values by name, in capture order.
pub type Bindings = IndexMap<String, Value>;

/// Result of a single matching or recognition step.
///
/// `Skip` is the soft-failure channel: the input simply isn't an instance of
/// what was tested. Fatal problems travel separately as [`crate::Error`].
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<T> {
    Match(T),
    Skip(Skip),
}

/// Diagnostic for a non-match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Skip {
    pub reason: String,
}

impl Skip {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for Skip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason)
    }
}

impl<T> From<Skip> for Outcome<T> {
    fn from(skip: Skip) -> Self {
        Outcome::Skip(skip)
    }
}

impl<T> Outcome<T> {
    pub fn skip(reason: impl Into<String>) -> Self {
        Outcome::Skip(Skip::new(reason))
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Outcome::Match(_))
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Outcome::Skip(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Match(value) => Outcome::Match(f(value)),
            Outcome::Skip(skip) => Outcome::Skip(skip),
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Outcome::Match(value) => f(value),
            Outcome::Skip(skip) => Outcome::Skip(skip),
        }
    }

    /// Drop the skip reason.
    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Match(value) => Some(value),
            Outcome::Skip(_) => None,
        }
    }

    pub fn skip_reason(&self) -> Option<&str> {
        match self {
            Outcome::Match(_) => None,
            Outcome::Skip(skip) => Some(&skip.reason),
        }
    }
}

/// Unwrap a `Match`, or return the `Skip` from the enclosing function.
#[macro_export]
macro_rules! matched {
    ($outcome:expr) => {
        match $outcome {
            $crate::pattern::Outcome::Match(value) => value,
            $crate::pattern::Outcome::Skip(skip) => return skip.into(),
        }
    };
}

/// A successful structural match.
#[derive(Clone, Debug, PartialEq)]
pub struct Matched {
    pub bindings: Bindings,
    /// The subtree the pattern was matched against.
    pub value: Value,
}

impl Matched {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Captured value as a string (identifier names, operators, property names).
    pub fn str(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).and_then(Value::as_str)
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        self.bindings.get(name).and_then(Value::as_f64)
    }
}

/// Merge `incoming` into `into`; a name bound twice must bind equal values.
pub(crate) fn merge(into: &mut Bindings, incoming: Bindings) -> Result<(), Skip> {
    for (name, value) in incoming {
        match into.get(&name) {
            Some(existing) if !same_node(existing, &value) => {
                return Err(Skip::new(format!(
                    "capture `{name}` bound to two different values"
                )));
            }
            Some(_) => {}
            None => {
                into.insert(name, value);
            }
        }
    }
    Ok(())
}
