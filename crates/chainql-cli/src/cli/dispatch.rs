//! Dispatch logic: extract params from ArgMatches and convert to command args.

use std::path::PathBuf;

use clap::ArgMatches;

use chainql_lib::Verbosity;

use crate::commands::analyze::AnalyzeArgs;
use crate::commands::check::CheckArgs;
use crate::commands::loader::ConfigInput;

pub struct AnalyzeParams {
    pub input: PathBuf,
    pub config: ConfigParams,
    pub compact: bool,
    pub trace: bool,
    pub verbose: u8,
}

impl AnalyzeParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            input: input(m),
            config: ConfigParams::from_matches(m),
            compact: m.get_flag("compact"),
            trace: m.get_flag("trace"),
            verbose: m.get_count("verbose"),
        }
    }
}

impl From<AnalyzeParams> for AnalyzeArgs {
    fn from(p: AnalyzeParams) -> Self {
        // Any -v implies tracing.
        let verbosity = (p.trace || p.verbose > 0).then(|| match p.verbose {
            0 => Verbosity::Default,
            1 => Verbosity::Verbose,
            _ => Verbosity::VeryVerbose,
        });
        Self {
            input: p.input,
            config: p.config.into(),
            compact: p.compact,
            verbosity,
        }
    }
}

pub struct CheckParams {
    pub input: PathBuf,
    pub config: ConfigParams,
}

impl CheckParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            input: input(m),
            config: ConfigParams::from_matches(m),
        }
    }
}

impl From<CheckParams> for CheckArgs {
    fn from(p: CheckParams) -> Self {
        Self {
            input: p.input,
            config: p.config.into(),
        }
    }
}

pub struct ConfigParams {
    pub config_path: Option<PathBuf>,
    pub roots: Vec<String>,
    pub database: Option<String>,
    pub connectors: Vec<String>,
    pub recursion_limit: Option<u32>,
}

impl ConfigParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            config_path: m.get_one::<PathBuf>("config").cloned(),
            roots: strings(m, "root"),
            database: m.get_one::<String>("database").cloned(),
            connectors: strings(m, "connector"),
            recursion_limit: m.get_one::<u32>("recursion_limit").copied(),
        }
    }
}

impl From<ConfigParams> for ConfigInput {
    fn from(p: ConfigParams) -> Self {
        Self {
            config_path: p.config_path,
            roots: p.roots,
            database: p.database,
            connectors: p.connectors,
            recursion_limit: p.recursion_limit,
        }
    }
}

fn input(m: &ArgMatches) -> PathBuf {
    m.get_one::<PathBuf>("input")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("-"))
}

fn strings(m: &ArgMatches, id: &str) -> Vec<String> {
    m.get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}
