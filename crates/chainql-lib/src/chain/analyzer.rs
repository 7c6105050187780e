//! Table-driven chain interpreter.

use serde_json::Value;

use chainql_core::NodeExt;

use super::{OpId, OperationDef, Registry};
use crate::ir::Command;
use crate::pattern::{Outcome, Skip};
use crate::scope::RootIndex;
use crate::trace::{NoopTracer, Tracer};
use crate::{Config, Error, Result};

/// An operation resolved together with its command.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved {
    pub id: OpId,
    pub command: Command,
}

/// Resolves operation chains against a [`Registry`].
///
/// Borrowing the root index keeps it read-only for the duration of an
/// analysis; the walker only appends to it between nodes.
pub struct Analyzer<'a, T: Tracer = NoopTracer> {
    registry: &'a Registry,
    roots: &'a RootIndex,
    recursion_limit: u32,
    tracer: &'a mut T,
}

impl<'a, T: Tracer> Analyzer<'a, T> {
    pub fn new(
        registry: &'a Registry,
        roots: &'a RootIndex,
        config: &Config,
        tracer: &'a mut T,
    ) -> Self {
        Self {
            registry,
            roots,
            recursion_limit: config.get_recursion_limit(),
            tracer,
        }
    }

    /// Resolve `node` as one of the operations in `whitelist`.
    ///
    /// Predecessors are resolved against the whole table; only the outermost
    /// operation is restricted.
    pub fn analyze(&mut self, node: &Value, whitelist: &[OpId]) -> Result<Outcome<Resolved>> {
        self.resolve(node, Some(whitelist), 0)
    }

    fn resolve(
        &mut self,
        node: &Value,
        whitelist: Option<&[OpId]>,
        depth: u32,
    ) -> Result<Outcome<Resolved>> {
        if depth >= self.recursion_limit {
            return Err(Error::RecursionLimitExceeded(self.recursion_limit));
        }
        let node = node.unparen();
        let registry = self.registry;

        let mut reasons = Vec::new();
        for def in registry.defs() {
            if whitelist.is_some_and(|w| !w.contains(&def.id)) || !applies(def, node) {
                continue;
            }
            self.tracer.trace_candidate(def.id, node);
            match self.attempt(def, node, depth)? {
                Outcome::Match(resolved) => {
                    self.tracer.trace_command(&resolved.command, node);
                    return Ok(Outcome::Match(resolved));
                }
                Outcome::Skip(skip) => {
                    self.tracer.trace_skip(def.id.as_str(), node, &skip);
                    reasons.push(format!("{}: {}", def.id, skip.reason));
                }
            }
        }

        if reasons.is_empty() {
            let kind = node.kind().unwrap_or("value");
            return Ok(Outcome::skip(format!("no operation applies to {kind}")));
        }
        Ok(Outcome::skip(format!(
            "no operation matched ({})",
            reasons.join("; ")
        )))
    }

    fn attempt(
        &mut self,
        def: &OperationDef,
        node: &Value,
        depth: u32,
    ) -> Result<Outcome<Resolved>> {
        if let Some(shape) = def.shape
            && let Outcome::Skip(skip) = shape(node, self.roots)
        {
            return Ok(Outcome::Skip(skip));
        }

        let source = if def.is_initial() {
            None
        } else {
            let Some(inner) = def.kind.predecessor(node) else {
                return Ok(Outcome::skip("operation has no source expression"));
            };
            let predecessor = match self.resolve(inner, None, depth + 1)? {
                Outcome::Match(resolved) => resolved,
                Outcome::Skip(skip) => {
                    return Ok(Outcome::skip(format!("source: {}", skip.reason)));
                }
            };
            if !def.follows.contains(&predecessor.id) {
                self.tracer.trace_chain_rejected(def.id, predecessor.id, node);
                return Ok(Outcome::skip(format!(
                    "`{}` cannot follow `{}`",
                    def.id, predecessor.id
                )));
            }
            Some(predecessor.command)
        };

        // From here on the node is committed to this operation.
        let args = match (def.extract)(node, self.roots) {
            Outcome::Match(args) => args,
            Outcome::Skip(Skip { reason }) => {
                return Err(Error::InvalidOperation {
                    op: def.id,
                    reason,
                    span: node.span(),
                });
            }
        };
        let Some(command) = (def.build)(source, args) else {
            return Err(Error::InvalidOperation {
                op: def.id,
                reason: "builder rejected the extracted arguments".into(),
                span: node.span(),
            });
        };
        Ok(Outcome::Match(Resolved {
            id: def.id,
            command,
        }))
    }
}

/// Kind and name are a cheap pre-filter; a row failing them is not a
/// candidate at all.
fn applies(def: &OperationDef, node: &Value) -> bool {
    def.kind.accepts(node) && def.name.is_none_or(|name| def.kind.name_of(node) == Some(name))
}
