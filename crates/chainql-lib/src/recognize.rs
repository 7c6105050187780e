//! Entry points per expression kind.
//!
//! Each recognizer runs the chain analyzer over the built-in registry with a
//! fixed whitelist for the outermost operation:
//!
//! | entry point                  | outermost operation        |
//! |------------------------------|----------------------------|
//! | [`analyze_call_expression`]  | filter, map, slice, sort   |
//! | [`analyze_member_expression`]| root, length               |
//! | [`analyze_assignment`]       | insert, update, remove     |
//!
//! `Ok(Outcome::Skip(_))` means the node is ordinary code and should be left
//! alone; `Err(_)` means it is a recognized operation used incorrectly.

use serde_json::Value;

use crate::chain::{Analyzer, OpId, Registry};
use crate::ir::Command;
use crate::pattern::Outcome;
use crate::scope::RootIndex;
use crate::trace::{NoopTracer, Tracer};
use crate::{Config, Result};

#[cfg(test)]
#[path = "recognize_tests.rs"]
mod recognize_tests;

pub const CALL_OPERATIONS: &[OpId] = &[OpId::Filter, OpId::Map, OpId::Slice, OpId::Sort];
pub const MEMBER_OPERATIONS: &[OpId] = &[OpId::Root, OpId::Length];
pub const WRITE_OPERATIONS: &[OpId] = &[OpId::Insert, OpId::Update, OpId::Remove];

/// `root.c.filter(...)`, `root.c.sort(...).slice(0, 5)`, ...
pub fn analyze_call_expression(
    node: &Value,
    roots: &RootIndex,
    config: &Config,
) -> Result<Outcome<Command>> {
    analyze_call_expression_with(node, roots, config, &mut NoopTracer)
}

pub fn analyze_call_expression_with<T: Tracer>(
    node: &Value,
    roots: &RootIndex,
    config: &Config,
    tracer: &mut T,
) -> Result<Outcome<Command>> {
    recognize(node, roots, config, tracer, CALL_OPERATIONS)
}

/// `root.c`, `root.c.length`, `root.c.filter(...).length`
pub fn analyze_member_expression(
    node: &Value,
    roots: &RootIndex,
    config: &Config,
) -> Result<Outcome<Command>> {
    analyze_member_expression_with(node, roots, config, &mut NoopTracer)
}

pub fn analyze_member_expression_with<T: Tracer>(
    node: &Value,
    roots: &RootIndex,
    config: &Config,
    tracer: &mut T,
) -> Result<Outcome<Command>> {
    recognize(node, roots, config, tracer, MEMBER_OPERATIONS)
}

/// Writes back onto the collection being read:
///
/// - `root.c = root.c.map(x => test ? {...x, f: v} : x)` is an update
/// - `root.c = root.c.filter(x => keep)` removes what `keep` rejects
/// - `root.c = [...root.c, item]` inserts
///
/// An assignment whose target differs from the collection on the right is
/// not a write and is skipped.
pub fn analyze_assignment(
    node: &Value,
    roots: &RootIndex,
    config: &Config,
) -> Result<Outcome<Command>> {
    analyze_assignment_with(node, roots, config, &mut NoopTracer)
}

pub fn analyze_assignment_with<T: Tracer>(
    node: &Value,
    roots: &RootIndex,
    config: &Config,
    tracer: &mut T,
) -> Result<Outcome<Command>> {
    recognize(node, roots, config, tracer, WRITE_OPERATIONS)
}

fn recognize<T: Tracer>(
    node: &Value,
    roots: &RootIndex,
    config: &Config,
    tracer: &mut T,
    whitelist: &[OpId],
) -> Result<Outcome<Command>> {
    let mut analyzer = Analyzer::new(Registry::builtin(), roots, config, tracer);
    Ok(analyzer.analyze(node, whitelist)?.map(|resolved| resolved.command))
}
