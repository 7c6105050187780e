//! Diagnostics hook for analysis.
//!
//! Analysis entry points take a generic [`Tracer`]. With [`NoopTracer`] every
//! hook is an inlined empty function and disappears from the compiled code;
//! [`PrintTracer`] collects readable lines for `--trace` style output.
//!
//! Hook points:
//! - `trace_candidate` - an operation definition is tried against a node
//! - `trace_skip` - something didn't match, with the reason
//! - `trace_chain_rejected` - a predecessor isn't in an operation's follows-set
//! - `trace_command` - a command was built
//! - `trace_root` - a root binding was discovered

use serde_json::Value;

use chainql_core::NodeExt;

use crate::chain::OpId;
use crate::ir::Command;
use crate::pattern::Skip;
use crate::scope::RootBinding;

/// How much [`PrintTracer`] records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Built commands, chain rejections, root discoveries.
    #[default]
    Default,
    /// Also every skip reason.
    Verbose,
    /// Also every candidate operation tried.
    VeryVerbose,
}

pub trait Tracer {
    fn trace_candidate(&mut self, op: OpId, node: &Value);

    /// `site` names what was being tried (an operation id or recognizer).
    fn trace_skip(&mut self, site: &str, node: &Value, skip: &Skip);

    fn trace_chain_rejected(&mut self, op: OpId, predecessor: OpId, node: &Value);

    fn trace_command(&mut self, command: &Command, node: &Value);

    fn trace_root(&mut self, name: &str, binding: &RootBinding);
}

/// Tracer that records nothing.
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn trace_candidate(&mut self, _op: OpId, _node: &Value) {}

    #[inline(always)]
    fn trace_skip(&mut self, _site: &str, _node: &Value, _skip: &Skip) {}

    #[inline(always)]
    fn trace_chain_rejected(&mut self, _op: OpId, _predecessor: OpId, _node: &Value) {}

    #[inline(always)]
    fn trace_command(&mut self, _command: &Command, _node: &Value) {}

    #[inline(always)]
    fn trace_root(&mut self, _name: &str, _binding: &RootBinding) {}
}

/// Tracer that collects one line per event.
#[derive(Debug, Default)]
pub struct PrintTracer {
    verbosity: Verbosity,
    lines: Vec<String>,
}

impl PrintTracer {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            lines: Vec::new(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_output(self) -> String {
        let mut out = self.lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    fn push(&mut self, node: Option<&Value>, message: String) {
        let at = node.and_then(NodeExt::span).map(|(s, e)| format!("{s}..{e} "));
        self.lines.push(format!("{}{message}", at.unwrap_or_default()));
    }
}

impl Tracer for PrintTracer {
    fn trace_candidate(&mut self, op: OpId, node: &Value) {
        if self.verbosity >= Verbosity::VeryVerbose {
            let kind = node.kind().unwrap_or("?");
            self.push(Some(node), format!("try {op} on {kind}"));
        }
    }

    fn trace_skip(&mut self, site: &str, node: &Value, skip: &Skip) {
        if self.verbosity >= Verbosity::Verbose {
            self.push(Some(node), format!("skip {site}: {skip}"));
        }
    }

    fn trace_chain_rejected(&mut self, op: OpId, predecessor: OpId, node: &Value) {
        self.push(Some(node), format!("reject {op}: cannot follow {predecessor}"));
    }

    fn trace_command(&mut self, command: &Command, node: &Value) {
        let headline = command.dump();
        let headline = headline.lines().next().unwrap_or_default();
        self.push(Some(node), format!("built {headline}"));
    }

    fn trace_root(&mut self, name: &str, binding: &RootBinding) {
        let target = match &binding.collection {
            Some(collection) => format!("{}.{collection}", binding.db),
            None => binding.db.clone(),
        };
        self.push(None, format!("root {name} -> {target}"));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn default_verbosity_hides_skips_and_candidates() {
        let mut tracer = PrintTracer::new(Verbosity::Default);
        let node = json!({"type": "Identifier", "name": "x"});
        tracer.trace_candidate(OpId::Filter, &node);
        tracer.trace_skip("filter", &node, &Skip::new("nope"));
        assert!(tracer.lines().is_empty());
        assert_eq!(tracer.into_output(), "");
    }

    #[test]
    fn very_verbose_records_candidates_with_spans() {
        let mut tracer = PrintTracer::new(Verbosity::VeryVerbose);
        let node = json!({"type": "CallExpression", "start": 4, "end": 9});
        tracer.trace_candidate(OpId::Sort, &node);
        tracer.trace_skip("sort", &node, &Skip::new("expected a comparator"));
        assert_eq!(
            tracer.lines(),
            ["4..9 try sort on CallExpression", "4..9 skip sort: expected a comparator"]
        );
    }

    #[test]
    fn root_lines_name_the_target() {
        let mut tracer = PrintTracer::default();
        let binding = RootBinding {
            db: "app".into(),
            collection: Some("todos".into()),
        };
        tracer.trace_root("todos", &binding);
        assert_eq!(tracer.into_output(), "root todos -> app.todos\n");
    }
}
