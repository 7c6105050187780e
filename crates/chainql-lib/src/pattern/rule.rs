//! Patterns with a build stage.

use std::sync::Arc;

use serde_json::Value;

use super::{Matched, Outcome, Pattern};

type Build<C, T> = Arc<dyn Fn(&C, Matched) -> Outcome<T> + Send + Sync>;

/// A pattern plus a function that turns its bindings into a domain value.
///
/// The build stage runs only after a structural match. It may still refuse
/// with a `Skip` for conditions a shape can't express, such as "both operands
/// reference the comparator's parameters".
pub struct Rule<C, T> {
    name: &'static str,
    pattern: Pattern,
    build: Build<C, T>,
}

impl<C, T> Clone for Rule<C, T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            pattern: self.pattern.clone(),
            build: Arc::clone(&self.build),
        }
    }
}

impl<C, T> Rule<C, T> {
    pub fn new(
        name: &'static str,
        pattern: Pattern,
        build: impl Fn(&C, Matched) -> Outcome<T> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            pattern,
            build: Arc::new(build),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Match, then build. A structural skip never reaches the build stage.
    pub fn apply(&self, context: &C, value: &Value) -> Outcome<T> {
        let matched = crate::matched!(self.pattern.matches(value));
        (self.build)(context, matched)
    }
}

/// Apply rules in order and return the first match.
pub fn first_of<C, T>(rules: &[Rule<C, T>], context: &C, value: &Value) -> Outcome<T> {
    let mut reasons = Vec::with_capacity(rules.len());
    for rule in rules {
        match rule.apply(context, value) {
            Outcome::Match(built) => return Outcome::Match(built),
            Outcome::Skip(skip) => reasons.push(format!("{}: {}", rule.name, skip.reason)),
        }
    }
    Outcome::skip(format!("no rule matched ({})", reasons.join("; ")))
}

impl<C, T> std::fmt::Debug for Rule<C, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}
