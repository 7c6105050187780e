//! Command IR: what a recognized chain means.
//!
//! Every non-root command owns its `source` predecessor, so a command is a
//! singly linked pipeline ending in a [`CollectionRef`]. Commands are built
//! bottom-up (a source is complete before anything points at it) and never
//! mutated afterwards.

use std::fmt::Write as _;

use serde::Serialize;
use serde_json::Value;

use chainql_core::NodeExt;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Command {
    CollectionRef(CollectionRef),
    Query(Query),
    Value(ValueAccess),
    Modification(Modification),
}

/// Root of every pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CollectionRef {
    pub db: String,
    pub collection: String,
}

/// Non-mutating read continuation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Query {
    #[serde(flatten)]
    pub op: QueryOp,
    pub source: Box<Command>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum QueryOp {
    /// `predicate` is the filter function's body, passed through untouched.
    Filter { predicate: Value },
    Map { fields: Vec<Projection> },
    Slice { from: i64, to: Option<i64> },
    Sort { fields: Vec<SortDescriptor> },
}

/// One `outputName: param.sourceProperty` entry of a `map` projection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub name: String,
    pub field: String,
}

/// Canonical ordering key, whatever comparator idiom produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SortDescriptor {
    pub field: String,
    pub ascending: bool,
}

/// Terminal read such as `length`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValueAccess {
    pub property: String,
    pub source: Box<Command>,
}

/// Mutation of a collection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Modification {
    #[serde(flatten)]
    pub op: ModOp,
    pub source: Box<Command>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum ModOp {
    Insert {
        values: Vec<Value>,
    },
    /// `update` pairs a field name with its new value expression.
    /// A `None` predicate updates every document.
    Update {
        update: Vec<(String, Value)>,
        predicate: Option<Value>,
    },
    Remove {
        predicate: Value,
    },
}

// ============================================================================
// Builders
// ============================================================================

pub fn collection(db: impl Into<String>, collection: impl Into<String>) -> Command {
    Command::CollectionRef(CollectionRef {
        db: db.into(),
        collection: collection.into(),
    })
}

pub fn query(source: Command, op: QueryOp) -> Command {
    Command::Query(Query {
        op,
        source: Box::new(source),
    })
}

pub fn value(source: Command, property: impl Into<String>) -> Command {
    Command::Value(ValueAccess {
        property: property.into(),
        source: Box::new(source),
    })
}

pub fn modification(source: Command, op: ModOp) -> Command {
    Command::Modification(Modification {
        op,
        source: Box::new(source),
    })
}

// ============================================================================
// Inspection
// ============================================================================

impl QueryOp {
    pub fn method(&self) -> &'static str {
        match self {
            QueryOp::Filter { .. } => "filter",
            QueryOp::Map { .. } => "map",
            QueryOp::Slice { .. } => "slice",
            QueryOp::Sort { .. } => "sort",
        }
    }
}

impl ModOp {
    pub fn method(&self) -> &'static str {
        match self {
            ModOp::Insert { .. } => "insert",
            ModOp::Update { .. } => "update",
            ModOp::Remove { .. } => "remove",
        }
    }
}

impl Command {
    /// Predecessor in the pipeline; `None` for a collection reference.
    pub fn source(&self) -> Option<&Command> {
        match self {
            Command::CollectionRef(_) => None,
            Command::Query(q) => Some(&q.source),
            Command::Value(v) => Some(&v.source),
            Command::Modification(m) => Some(&m.source),
        }
    }

    /// The collection at the bottom of the pipeline.
    pub fn root(&self) -> &CollectionRef {
        match self {
            Command::CollectionRef(r) => r,
            Command::Query(q) => q.source.root(),
            Command::Value(v) => v.source.root(),
            Command::Modification(m) => m.source.root(),
        }
    }

    /// Number of commands in the pipeline, root included.
    pub fn depth(&self) -> usize {
        1 + self.source().map_or(0, Command::depth)
    }

    /// Terminal commands accept no successors.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Command::Value(_) | Command::Modification(_))
    }

    /// Indented text form, outermost command first.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut current = Some(self);
        let mut indent = 0;
        while let Some(command) = current {
            let _ = writeln!(out, "{:indent$}{}", "", headline(command), indent = indent);
            current = command.source();
            indent += 2;
        }
        out
    }
}

fn headline(command: &Command) -> String {
    match command {
        Command::CollectionRef(r) => format!("CollectionRef {}.{}", r.db, r.collection),
        Command::Value(v) => format!("Value {}", v.property),
        Command::Query(q) => format!("Query {} {}", q.op.method(), query_detail(&q.op)),
        Command::Modification(m) => {
            format!("Modification {} {}", m.op.method(), modification_detail(&m.op))
        }
    }
}

fn query_detail(op: &QueryOp) -> String {
    match op {
        QueryOp::Filter { predicate } => fragment(predicate),
        QueryOp::Map { fields } => fields
            .iter()
            .map(|p| format!("{}={}", p.name, p.field))
            .collect::<Vec<_>>()
            .join(", "),
        QueryOp::Slice { from, to } => match to {
            Some(to) => format!("{from}..{to}"),
            None => format!("{from}.."),
        },
        QueryOp::Sort { fields } => fields
            .iter()
            .map(|d| format!("{} {}", d.field, if d.ascending { "asc" } else { "desc" }))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn modification_detail(op: &ModOp) -> String {
    match op {
        ModOp::Insert { values } => format!("{} value(s)", values.len()),
        ModOp::Update { update, predicate } => {
            let fields = update
                .iter()
                .map(|(name, value)| format!("{name}={}", fragment(value)))
                .collect::<Vec<_>>()
                .join(", ");
            match predicate {
                Some(predicate) => format!("{fields} where {}", fragment(predicate)),
                None => fields,
            }
        }
        ModOp::Remove { predicate } => format!("where {}", fragment(predicate)),
    }
}

/// Opaque fragments are shown by kind only.
fn fragment(node: &Value) -> String {
    format!("<{}>", node.kind().unwrap_or("?"))
}
