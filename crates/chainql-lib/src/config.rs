//! Analysis configuration.

use serde::Deserialize;

use crate::{Error, Result};

/// Where roots come from and how deep chains may nest.
///
/// Either `roots` or `connectors` must be non-empty; see [`Config::validate`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Identifiers that always denote a database root.
    pub(crate) roots: Vec<String>,
    /// Database name reported for explicit roots.
    pub(crate) database: Option<String>,
    /// Functions whose call in a declaration introduces a root binding.
    pub(crate) connectors: Vec<String>,
    /// Maximum operation chain depth.
    pub(crate) recursion_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            database: None,
            connectors: Vec::new(),
            recursion_limit: 256,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an explicit root identifier.
    pub fn root(mut self, name: impl Into<String>) -> Self {
        self.roots.push(name.into());
        self
    }

    /// Set the database name reported for explicit roots.
    pub fn database(mut self, name: impl Into<String>) -> Self {
        self.database = Some(name.into());
        self
    }

    /// Add a connector function name.
    pub fn connector(mut self, name: impl Into<String>) -> Self {
        self.connectors.push(name.into());
        self
    }

    pub fn recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn connectors(&self) -> &[String] {
        &self.connectors
    }

    pub fn get_database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn get_recursion_limit(&self) -> u32 {
        self.recursion_limit
    }

    /// Parse from JSON, e.g. `{"roots": ["db"], "database": "app"}`.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Reject configurations that can never identify a root.
    ///
    /// Runs once, before any analysis.
    pub fn validate(&self) -> Result<()> {
        if self.roots.is_empty() && self.connectors.is_empty() {
            return Err(Error::InvalidConfig(
                "either root identifiers or connector functions must be configured".into(),
            ));
        }
        let names = self.roots.iter().chain(&self.connectors);
        if let Some(bad) = names.into_iter().find(|n| !is_identifier(n)) {
            return Err(Error::InvalidConfig(format!("`{bad}` is not an identifier")));
        }
        if self.database.as_deref().is_some_and(str::is_empty) {
            return Err(Error::InvalidConfig("database name is empty".into()));
        }
        if self.recursion_limit == 0 {
            return Err(Error::InvalidConfig("recursion limit must be positive".into()));
        }
        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
