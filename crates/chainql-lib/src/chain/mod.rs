//! Operation registry and chain analysis.
//!
//! Each recognized operation is one [`OperationDef`] row: the node kind it
//! attaches to, an optional method/property name, a shape predicate, the
//! set of operations it may follow, an argument extractor and a builder.
//! The [`Analyzer`] is a single interpreter over that table; adding an
//! operation is a data change.
//!
//! A chain is resolved inside-out. For `db.todos.filter(f).slice(0, 5)` the
//! analyzer matches `slice`, resolves `db.todos.filter(f)` to `filter`,
//! which in turn resolves `db.todos` to `root`. Commands are then built
//! outward, each wrapping its predecessor.

mod analyzer;
mod ops;

#[cfg(test)]
mod chain_tests;

use std::fmt;
use std::sync::LazyLock;

use serde_json::Value;

use chainql_core::{
    ASSIGNMENT_EXPRESSION, CALL_EXPRESSION, IDENTIFIER, MEMBER_EXPRESSION, NodeExt,
};

use crate::ir::{self, Command, ModOp, QueryOp};
use crate::pattern::Outcome;
use crate::scope::RootIndex;

pub use analyzer::{Analyzer, Resolved};
pub(crate) use ops::is_misdirected_write;

/// Operation identifier; the states of the chain state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpId {
    Root,
    Filter,
    Map,
    Slice,
    Sort,
    Length,
    Insert,
    Update,
    Remove,
    /// Operations added by custom registries.
    Custom(&'static str),
}

impl OpId {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpId::Root => "root",
            OpId::Filter => "filter",
            OpId::Map => "map",
            OpId::Slice => "slice",
            OpId::Sort => "sort",
            OpId::Length => "length",
            OpId::Insert => "insert",
            OpId::Update => "update",
            OpId::Remove => "remove",
            OpId::Custom(name) => *name,
        }
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expression kind an operation attaches to.
///
/// Also decides where the predecessor lives: the callee's object for a
/// call, the object for a member access, the target for an assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Call,
    Member,
    Identifier,
    Assignment,
}

impl NodeKind {
    pub fn accepts(self, node: &Value) -> bool {
        node.is_kind(match self {
            NodeKind::Call => CALL_EXPRESSION,
            NodeKind::Member => MEMBER_EXPRESSION,
            NodeKind::Identifier => IDENTIFIER,
            NodeKind::Assignment => ASSIGNMENT_EXPRESSION,
        })
    }

    /// Method or property name the node carries, if any.
    pub fn name_of(self, node: &Value) -> Option<&str> {
        match self {
            NodeKind::Call => node.field("callee")?.static_property(),
            NodeKind::Member => node.static_property(),
            NodeKind::Identifier | NodeKind::Assignment => None,
        }
    }

    /// Node holding the predecessor of an operation of this kind.
    pub fn predecessor(self, node: &Value) -> Option<&Value> {
        match self {
            NodeKind::Call => node.field("callee")?.field("object"),
            NodeKind::Member => node.field("object"),
            NodeKind::Assignment => node.field("left"),
            NodeKind::Identifier => None,
        }
    }
}

/// Extracted builder arguments.
#[derive(Clone, Debug, PartialEq)]
pub enum OpArgs {
    Collection { db: String, collection: String },
    Query(QueryOp),
    Value { property: String },
    Modification(ModOp),
}

/// Tests whether a node has an operation's shape beyond kind and name.
pub type ShapeTest = fn(&Value, &RootIndex) -> Outcome<()>;

/// Pulls builder arguments out of a node already committed to an operation.
///
/// A `Skip` here is promoted to a fatal [`crate::Error::InvalidOperation`].
pub type Extract = fn(&Value, &RootIndex) -> Outcome<OpArgs>;

/// Wraps the predecessor's command. `None` if handed arguments of the wrong
/// variant.
pub type Build = fn(Option<Command>, OpArgs) -> Option<Command>;

/// One row of the operation table.
#[derive(Clone, Debug)]
pub struct OperationDef {
    pub id: OpId,
    pub kind: NodeKind,
    /// Method or property name; `None` matches any.
    pub name: Option<&'static str>,
    pub shape: Option<ShapeTest>,
    /// Operations this one may directly follow. Empty for initial
    /// operations, which have no predecessor.
    pub follows: Vec<OpId>,
    pub extract: Extract,
    pub build: Build,
}

impl OperationDef {
    pub fn is_initial(&self) -> bool {
        self.follows.is_empty()
    }
}

/// Ordered operation table. Earlier rows are tried first.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    defs: Vec<OperationDef>,
}

static STANDARD: LazyLock<Registry> = LazyLock::new(Registry::standard);

impl Registry {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in operations with the default follows table.
    pub fn standard() -> Self {
        Self {
            defs: ops::standard(),
        }
    }

    /// Shared instance of [`Registry::standard`].
    pub fn builtin() -> &'static Registry {
        &STANDARD
    }

    /// Append a row.
    pub fn register(mut self, def: OperationDef) -> Self {
        self.defs.push(def);
        self
    }

    /// Replace the follows-set of every row with this id.
    pub fn with_follows(mut self, id: OpId, follows: impl IntoIterator<Item = OpId>) -> Self {
        let follows: Vec<OpId> = follows.into_iter().collect();
        for def in self.defs.iter_mut().filter(|d| d.id == id) {
            def.follows = follows.clone();
        }
        self
    }

    /// Drop every row with this id.
    pub fn without(mut self, id: OpId) -> Self {
        self.defs.retain(|d| d.id != id);
        self
    }

    pub fn defs(&self) -> &[OperationDef] {
        &self.defs
    }

    pub fn get(&self, id: OpId) -> impl Iterator<Item = &OperationDef> {
        self.defs.iter().filter(move |d| d.id == id)
    }

    /// Whether `id` may directly follow `predecessor`.
    pub fn can_follow(&self, id: OpId, predecessor: OpId) -> bool {
        self.get(id).any(|d| d.follows.contains(&predecessor))
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn build_collection(source: Option<Command>, args: OpArgs) -> Option<Command> {
    match (source, args) {
        (None, OpArgs::Collection { db, collection }) => Some(ir::collection(db, collection)),
        _ => None,
    }
}

pub fn build_query(source: Option<Command>, args: OpArgs) -> Option<Command> {
    match (source, args) {
        (Some(source), OpArgs::Query(op)) => Some(ir::query(source, op)),
        _ => None,
    }
}

pub fn build_value(source: Option<Command>, args: OpArgs) -> Option<Command> {
    match (source, args) {
        (Some(source), OpArgs::Value { property }) => Some(ir::value(source, property)),
        _ => None,
    }
}

pub fn build_modification(source: Option<Command>, args: OpArgs) -> Option<Command> {
    match (source, args) {
        (Some(source), OpArgs::Modification(op)) => Some(ir::modification(source, op)),
        _ => None,
    }
}
