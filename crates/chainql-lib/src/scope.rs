//! Root bindings known while analyzing one file.

use std::sync::LazyLock;

use indexmap::IndexMap;
use serde_json::Value;

use chainql_core::{CALL_EXPRESSION, VARIABLE_DECLARATOR};

use crate::Config;
use crate::pattern::pat::*;
use crate::pattern::{Outcome, Rule};

#[cfg(test)]
#[path = "scope_tests.rs"]
mod scope_tests;

/// What a root identifier refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootBinding {
    pub db: String,
    /// Set when the identifier is bound to one collection rather than a
    /// whole database.
    pub collection: Option<String>,
}

/// Per-file accumulator of root bindings.
///
/// Seeded from explicit config roots and extended as connector declarations
/// are discovered. It is only read while a node is being analyzed, so one
/// index must never be shared between files analyzed in parallel; create a
/// fresh one per file.
#[derive(Clone, Debug, Default)]
pub struct RootIndex {
    bindings: IndexMap<String, RootBinding>,
    connectors: Vec<String>,
}

impl RootIndex {
    pub fn new(config: &Config) -> Self {
        let bindings = config
            .roots
            .iter()
            .map(|name| {
                let db = config.database.clone().unwrap_or_else(|| name.clone());
                (name.clone(), RootBinding { db, collection: None })
            })
            .collect();
        Self {
            bindings,
            connectors: config.connectors.clone(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&RootBinding> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn is_connector(&self, name: &str) -> bool {
        self.connectors.iter().any(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RootBinding)> {
        self.bindings.iter().map(|(name, b)| (name.as_str(), b))
    }

    /// Record a binding. The first declaration of a name wins.
    ///
    /// Returns `true` if the name was new.
    pub fn declare(&mut self, name: impl Into<String>, binding: RootBinding) -> bool {
        let name = name.into();
        if self.bindings.contains_key(&name) {
            return false;
        }
        self.bindings.insert(name, binding);
        true
    }

    /// Recognize `name = connect("db")` or `name = connect("db", "collection")`
    /// in a variable declarator.
    pub fn declaration(&self, declarator: &Value) -> Outcome<(String, RootBinding)> {
        DECLARATION.apply(self, declarator)
    }
}

static DECLARATION: LazyLock<Rule<RootIndex, (String, RootBinding)>> = LazyLock::new(|| {
    let connect = node(
        CALL_EXPRESSION,
        [
            ("callee", ident_as("connector")),
            (
                "arguments",
                seq([one(string_as("db")), opt(string_as("collection"))]),
            ),
        ],
    );
    Rule::new(
        "connector declaration",
        node(
            VARIABLE_DECLARATOR,
            [("id", ident_as("name")), ("init", connect)],
        ),
        |index: &RootIndex, m| {
            let (Some(name), Some(connector), Some(db)) =
                (m.str("name"), m.str("connector"), m.str("db"))
            else {
                return Outcome::skip("malformed connector declaration");
            };
            if !index.is_connector(connector) {
                return Outcome::skip(format!("`{connector}` is not a configured connector"));
            }
            let binding = RootBinding {
                db: db.to_owned(),
                collection: m.str("collection").map(str::to_owned),
            };
            Outcome::Match((name.to_owned(), binding))
        },
    )
});
