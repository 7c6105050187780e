//! Structural pattern matching over expression trees.
//!
//! A [`Pattern`] describes an expected tree shape. Matching it against a node
//! yields an [`Outcome`]: either a [`Matched`] (captured bindings plus the
//! matched subtree) or a [`Skip`] explaining the first mismatch.
//!
//! Skips are data, not errors. Alternation recovers from them by trying the
//! next branch; a [`Rule`] short-circuits its build stage on them.

mod matcher;
mod outcome;
mod rule;

pub mod pat;


use std::fmt;
use std::sync::Arc;

use serde_json::Value;

pub use outcome::{Bindings, Matched, Outcome, Skip};
pub use rule::{Rule, first_of};

/// Boolean test over a candidate node.
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Derives the value to bind from a matched node.
pub type Compute = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Description of an expected tree shape.
///
/// Patterns are immutable; composite patterns own their parts and clone
/// cheaply (closures are reference counted).
#[derive(Clone)]
pub enum Pattern {
    /// Matches anything, including an absent field.
    Any,
    /// Location-insensitive structural equality with a fixed node or value.
    Literal(Value),
    /// Partial object shape: each listed field must match, others are ignored.
    Shape(Vec<(String, Pattern)>),
    /// Positional array match.
    Seq(Vec<Slot>),
    /// Ordered alternation; the first matching branch wins.
    OneOf(Vec<Pattern>),
    /// Conjunction over one node; bindings from every part are merged.
    All(Vec<Pattern>),
    /// Binds the matched node (or a value derived from it) to `name`.
    Capture {
        name: String,
        inner: Option<Box<Pattern>>,
        compute: Option<Compute>,
    },
    /// Arbitrary test; `reason` becomes the skip message on failure.
    Exists { reason: String, test: Predicate },
}

/// One position in a [`Pattern::Seq`].
#[derive(Clone)]
pub enum Slot {
    /// Exactly one element.
    One(Pattern),
    /// Zero or one element.
    Optional(Pattern),
    /// All remaining elements, each matching `each`.
    ///
    /// Bindings made inside `each` are discarded; the elements themselves are
    /// bound as an array under `capture` when given.
    Rest {
        each: Pattern,
        capture: Option<String>,
    },
}

impl Pattern {
    /// Match this pattern against `value`.
    ///
    /// Pure: the same pattern and value always produce equal outcomes.
    pub fn matches(&self, value: &Value) -> Outcome<Matched> {
        matcher::match_pattern(self, value).map(|bindings| Matched {
            bindings,
            value: value.clone(),
        })
    }

    /// Bind the node matched by this pattern to `name`.
    pub fn capture(self, name: &str) -> Pattern {
        Pattern::Capture {
            name: name.to_owned(),
            inner: Some(Box::new(self)),
            compute: None,
        }
    }

    /// Bind a value computed from the node matched by this pattern.
    pub fn computed(
        self,
        name: &str,
        compute: impl Fn(&Value) -> Value + Send + Sync + 'static,
    ) -> Pattern {
        Pattern::Capture {
            name: name.to_owned(),
            inner: Some(Box::new(self)),
            compute: Some(Arc::new(compute)),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Any => f.write_str("_"),
            Pattern::Literal(value) => write!(f, "{value}"),
            Pattern::Shape(fields) => {
                let mut map = f.debug_map();
                for (name, pattern) in fields {
                    map.entry(name, pattern);
                }
                map.finish()
            }
            Pattern::Seq(slots) => f.debug_list().entries(slots).finish(),
            Pattern::OneOf(branches) => {
                f.write_str("one_of")?;
                f.debug_list().entries(branches).finish()
            }
            Pattern::All(parts) => {
                f.write_str("all")?;
                f.debug_list().entries(parts).finish()
            }
            Pattern::Capture { name, inner, .. } => match inner {
                Some(inner) => write!(f, "{inner:?} @{name}"),
                None => write!(f, "_ @{name}"),
            },
            Pattern::Exists { reason, .. } => write!(f, "exists({reason:?})"),
        }
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::One(pattern) => write!(f, "{pattern:?}"),
            Slot::Optional(pattern) => write!(f, "{pattern:?}?"),
            Slot::Rest { each, capture } => match capture {
                Some(name) => write!(f, "{each:?}* @{name}"),
                None => write!(f, "{each:?}*"),
            },
        }
    }
}
