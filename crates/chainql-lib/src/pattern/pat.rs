//! Pattern constructors.
//!
//! Read as a small embedded DSL:
//!
//! ```
//! use chainql_lib::pattern::pat::*;
//!
//! // `<object>.<name>` with the object captured as `target`
//! let p = node("MemberExpression", [
//!     ("object", any().capture("target")),
//!     ("property", ident_named("length")),
//! ]);
//! ```

use std::sync::Arc;

use serde_json::Value;

use chainql_core::NodeExt;

use super::{Pattern, Slot};

pub fn any() -> Pattern {
    Pattern::Any
}

pub fn lit(value: impl Into<Value>) -> Pattern {
    Pattern::Literal(value.into())
}

/// Capture whatever is there.
pub fn capture(name: &str) -> Pattern {
    Pattern::Capture {
        name: name.to_owned(),
        inner: None,
        compute: None,
    }
}

pub fn exists(
    reason: impl Into<String>,
    test: impl Fn(&Value) -> bool + Send + Sync + 'static,
) -> Pattern {
    Pattern::Exists {
        reason: reason.into(),
        test: Arc::new(test),
    }
}

pub fn shape<'a>(fields: impl IntoIterator<Item = (&'a str, Pattern)>) -> Pattern {
    Pattern::Shape(
        fields
            .into_iter()
            .map(|(name, pattern)| (name.to_owned(), pattern))
            .collect(),
    )
}

pub fn one_of(branches: impl IntoIterator<Item = Pattern>) -> Pattern {
    Pattern::OneOf(branches.into_iter().collect())
}

pub fn seq(slots: impl IntoIterator<Item = Slot>) -> Pattern {
    Pattern::Seq(slots.into_iter().collect())
}

pub fn one(pattern: Pattern) -> Slot {
    Slot::One(pattern)
}

pub fn opt(pattern: Pattern) -> Slot {
    Slot::Optional(pattern)
}

pub fn rest(each: Pattern) -> Slot {
    Slot::Rest {
        each,
        capture: None,
    }
}

pub fn rest_as(name: &str, each: Pattern) -> Slot {
    Slot::Rest {
        each,
        capture: Some(name.to_owned()),
    }
}

/// Node kind test (babel spellings accepted).
pub fn kind(expected: &'static str) -> Pattern {
    exists(format!("expected {expected}"), move |v| v.unparen().is_kind(expected))
}

/// A node of the given kind with the listed fields.
pub fn node<'a>(
    kind_name: &'static str,
    fields: impl IntoIterator<Item = (&'a str, Pattern)>,
) -> Pattern {
    kind(kind_name).and(shape(fields))
}

pub fn ident() -> Pattern {
    kind(chainql_core::IDENTIFIER)
}

pub fn ident_named(name: &'static str) -> Pattern {
    exists(format!("expected identifier `{name}`"), move |v| {
        v.ident_name() == Some(name)
    })
}

/// Binds the identifier's name (a string) rather than the node.
pub fn ident_as(capture_name: &str) -> Pattern {
    ident().computed(capture_name, |v| {
        v.ident_name().map_or(Value::Null, |n| Value::from(n))
    })
}

/// A string field equal to one of `options` (operators, kinds of declarations).
pub fn str_in(options: &'static [&'static str]) -> Pattern {
    exists(format!("expected one of {options:?}"), move |v| {
        v.as_str().is_some_and(|s| options.contains(&s))
    })
}

/// `object.property` where the property name is statically known.
///
/// The name is bound under `name_capture`.
pub fn member_as(object: Pattern, name_capture: &str) -> Pattern {
    node(chainql_core::MEMBER_EXPRESSION, [("object", object)])
        .and(static_property().computed(name_capture, |v| {
            v.static_property().map_or(Value::Null, Value::from)
        }))
}

/// `object.name`
pub fn member_named(object: Pattern, name: &'static str) -> Pattern {
    node(chainql_core::MEMBER_EXPRESSION, [("object", object)])
        .and(exists(format!("expected `.{name}`"), move |v| {
            v.static_property() == Some(name)
        }))
}

fn static_property() -> Pattern {
    exists("expected a static property name", |v| {
        v.static_property().is_some()
    })
}

/// Numeric literal (including `-n`), bound as its value.
pub fn number_as(capture_name: &str) -> Pattern {
    exists("expected a numeric literal", |v| v.number().is_some()).computed(capture_name, |v| {
        v.number().map_or(Value::Null, Value::from)
    })
}

/// String literal, bound as its value.
pub fn string_as(capture_name: &str) -> Pattern {
    exists("expected a string literal", |v| v.string().is_some()).computed(capture_name, |v| {
        v.string().map_or(Value::Null, Value::from)
    })
}

/// Always matches, binding a fixed value. Marks which alternative matched.
pub fn tag(capture_name: &str, value: impl Into<Value>) -> Pattern {
    let value = value.into();
    any().computed(capture_name, move |_| value.clone())
}

/// Every pattern must match the same node; bindings are merged.
pub fn all(patterns: impl IntoIterator<Item = Pattern>) -> Pattern {
    Pattern::All(patterns.into_iter().collect())
}

impl Pattern {
    /// Conjunction with another pattern over the same node.
    pub fn and(self, other: Pattern) -> Pattern {
        match self {
            Pattern::All(mut patterns) => {
                patterns.push(other);
                Pattern::All(patterns)
            }
            first => Pattern::All(vec![first, other]),
        }
    }
}
