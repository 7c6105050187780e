//! Shared argument builders for CLI commands.

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

/// ESTree JSON document to analyze (positional, `-` for stdin).
pub fn input_arg() -> Arg {
    Arg::new("input")
        .value_name("TREE")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("ESTree JSON file, or - for stdin")
}

/// Explicit root identifier (--root, repeatable).
pub fn root_arg() -> Arg {
    Arg::new("root")
        .long("root")
        .short('r')
        .value_name("IDENT")
        .action(ArgAction::Append)
        .help("Identifier that always denotes a database root")
}

/// Database name for explicit roots (--database).
pub fn database_arg() -> Arg {
    Arg::new("database")
        .long("database")
        .short('d')
        .value_name("NAME")
        .help("Database name reported for explicit roots (default: the root's name)")
}

/// Connector function (--connector, repeatable).
pub fn connector_arg() -> Arg {
    Arg::new("connector")
        .long("connector")
        .short('c')
        .value_name("IDENT")
        .action(ArgAction::Append)
        .help("Function whose call in a declaration binds a root")
}

/// JSON configuration file (--config).
pub fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("JSON configuration file; flags are applied on top")
}

/// Maximum chain depth (--recursion-limit).
pub fn recursion_limit_arg() -> Arg {
    Arg::new("recursion_limit")
        .long("recursion-limit")
        .value_name("N")
        .value_parser(value_parser!(u32))
        .help("Maximum operation chain depth")
}

/// Compact JSON output (--compact).
pub fn compact_arg() -> Arg {
    Arg::new("compact")
        .long("compact")
        .action(ArgAction::SetTrue)
        .help("Output compact JSON")
}

/// Trace analysis to stderr (--trace).
pub fn trace_arg() -> Arg {
    Arg::new("trace")
        .long("trace")
        .action(ArgAction::SetTrue)
        .help("Print analysis trace to stderr")
}

/// Trace verbosity (-v, -vv).
pub fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .action(ArgAction::Count)
        .help("Trace verbosity (-v for skip reasons, -vv for every candidate); implies --trace")
}
