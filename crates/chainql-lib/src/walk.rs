//! Source-order driver over a whole program.
//!
//! Visits every node pre-order, registering connector declarations as they
//! appear and offering assignments, calls and member accesses to the
//! recognizers. A recognized node becomes a [`Site`] and its subtree is not
//! visited again, so `db.todos.filter(f).length` yields one site, not three.

use serde::Serialize;
use serde_json::Value;

use chainql_core::{
    ASSIGNMENT_EXPRESSION, CALL_EXPRESSION, MEMBER_EXPRESSION, NodeExt, TRIVIA_KEYS,
    VARIABLE_DECLARATOR,
};

use crate::chain;
use crate::ir::Command;
use crate::pattern::Outcome;
use crate::recognize;
use crate::scope::RootIndex;
use crate::trace::{NoopTracer, Tracer};
use crate::{Config, Result};

#[cfg(test)]
#[path = "walk_tests.rs"]
mod walk_tests;

/// One recognized expression.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Site {
    /// Byte span of the expression, when the tree carries positions.
    pub span: Option<(u64, u64)>,
    pub command: Command,
}

/// Recognize every query and write in `program`, in source order.
pub fn analyze_program(program: &Value, config: &Config) -> Result<Vec<Site>> {
    analyze_program_with(program, config, &mut NoopTracer)
}

pub fn analyze_program_with<T: Tracer>(
    program: &Value,
    config: &Config,
    tracer: &mut T,
) -> Result<Vec<Site>> {
    config.validate()?;
    let mut walker = Walker {
        config,
        roots: RootIndex::new(config),
        tracer,
        sites: Vec::new(),
    };
    walker.visit(program)?;
    Ok(walker.sites)
}

struct Walker<'a, T: Tracer> {
    config: &'a Config,
    roots: RootIndex,
    tracer: &'a mut T,
    sites: Vec<Site>,
}

impl<T: Tracer> Walker<'_, T> {
    fn visit(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Array(items) => items.iter().try_for_each(|item| self.visit(item)),
            Value::Object(_) if value.kind().is_some() => self.visit_node(value),
            _ => Ok(()),
        }
    }

    fn visit_node(&mut self, node: &Value) -> Result<()> {
        if node.is_kind(VARIABLE_DECLARATOR) {
            self.declare(node);
        }

        let outcome = match node.kind() {
            Some(ASSIGNMENT_EXPRESSION) => recognize::analyze_assignment_with(
                node,
                &self.roots,
                self.config,
                &mut *self.tracer,
            )?,
            Some(CALL_EXPRESSION) => recognize::analyze_call_expression_with(
                node,
                &self.roots,
                self.config,
                &mut *self.tracer,
            )?,
            Some(MEMBER_EXPRESSION) => recognize::analyze_member_expression_with(
                node,
                &self.roots,
                self.config,
                &mut *self.tracer,
            )?,
            _ => Outcome::skip("not a candidate"),
        };
        if let Outcome::Match(command) = outcome {
            self.sites.push(Site {
                span: node.span(),
                command,
            });
            return Ok(());
        }

        let Value::Object(fields) = node else {
            return Ok(());
        };
        let assignment = node.is_kind(ASSIGNMENT_EXPRESSION);
        let misdirected = assignment && chain::is_misdirected_write(node, &self.roots);
        for (name, child) in fields {
            if TRIVIA_KEYS.contains(&name.as_str()) || name == "type" {
                continue;
            }
            // Assignment targets are written, not read.
            if assignment && name == "left" {
                continue;
            }
            // A write onto a different collection is left alone entirely.
            if misdirected && name == "right" {
                continue;
            }
            self.visit(child)?;
        }
        Ok(())
    }

    fn declare(&mut self, declarator: &Value) {
        if let Outcome::Match((name, binding)) = self.roots.declaration(declarator)
            && !self.roots.contains(&name)
        {
            self.tracer.trace_root(&name, &binding);
            self.roots.declare(name, binding);
        }
    }
}
