//! chainql: recognize fluent collection queries in ESTree trees.
//!
//! Code such as `db.todos.filter(t => t.done).slice(0, 10)` is matched
//! against a table of known operations and compiled into a [`Command`]
//! pipeline that an external rewriter can turn into a real database query.
//!
//! This crate provides:
//! - `pattern` - structural matcher with captures, alternation and build stages
//! - `ir` - command IR and its builders
//! - `sort` - comparator normalization
//! - `chain` - operation registry and the chain analyzer
//! - `recognize` - read/write entry points per expression kind
//! - `walk` - source-order driver over a whole program
//!
//! # Example
//!
//! ```
//! use chainql_core::build::*;
//! use chainql_lib::{Config, RootIndex, recognize};
//!
//! let config = Config::new().root("db").database("app");
//! config.validate().unwrap();
//! let roots = RootIndex::new(&config);
//!
//! let node = member(path("db.todos"), "length");
//! let command = recognize::analyze_member_expression(&node, &roots, &config)
//!     .unwrap()
//!     .ok()
//!     .unwrap();
//! assert_eq!(command.dump(), "Value length\n  CollectionRef app.todos\n");
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod chain;
pub mod config;
pub mod ir;
pub mod pattern;
pub mod recognize;
pub mod scope;
pub mod sort;
pub mod trace;
pub mod walk;

mod shapes;

pub use chain::{OpId, Registry};
pub use config::Config;
pub use ir::{Command, SortDescriptor};
pub use pattern::{Matched, Outcome, Pattern, Skip};
pub use scope::{RootBinding, RootIndex};
pub use trace::{NoopTracer, PrintTracer, Tracer, Verbosity};
pub use walk::{Site, analyze_program, analyze_program_with};

/// Fatal failures.
///
/// Unlike a [`Skip`], these mean the input committed to a recognized form
/// and then broke one of its rules; compilation of the unit should stop.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Configuration rejected before analysis started.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A recognized operation is malformed.
    #[error("invalid `{op}` operation: {reason}")]
    InvalidOperation {
        op: OpId,
        reason: String,
        span: Option<(u64, u64)>,
    },

    /// Operation chain nested deeper than the configured limit.
    #[error("operation chain deeper than the recursion limit ({0})")]
    RecursionLimitExceeded(u32),
}

/// Result type for analysis operations.
pub type Result<T> = std::result::Result<T, Error>;
