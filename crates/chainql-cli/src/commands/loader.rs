//! Reading trees and assembling configuration.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde_json::Value;

use chainql_lib::Config;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("'{path}' is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("'{path}': {source}")]
    Config {
        path: String,
        #[source]
        source: chainql_lib::Error,
    },
}

/// Configuration sources in precedence order: file first, flags on top.
#[derive(Debug, Default)]
pub struct ConfigInput {
    pub config_path: Option<PathBuf>,
    pub roots: Vec<String>,
    pub database: Option<String>,
    pub connectors: Vec<String>,
    pub recursion_limit: Option<u32>,
}

pub fn load_config(input: &ConfigInput) -> Result<Config, LoadError> {
    let mut config = match &input.config_path {
        Some(path) => {
            let text = read(path)?;
            Config::from_json(&text).map_err(|source| LoadError::Config {
                path: path.display().to_string(),
                source,
            })?
        }
        None => Config::new(),
    };
    for root in &input.roots {
        config = config.root(root);
    }
    if let Some(database) = &input.database {
        config = config.database(database);
    }
    for connector in &input.connectors {
        config = config.connector(connector);
    }
    if let Some(limit) = input.recursion_limit {
        config = config.recursion_limit(limit);
    }
    Ok(config)
}

/// Read an ESTree JSON document; `-` reads stdin.
pub fn load_tree(path: &Path) -> Result<Value, LoadError> {
    let text = read(path)?;
    serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: display(path),
        source,
    })
}

fn read(path: &Path) -> Result<String, LoadError> {
    let result = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map(|_| buf)
    } else {
        fs::read_to_string(path)
    };
    result.map_err(|source| LoadError::Read {
        path: display(path),
        source,
    })
}

fn display(path: &Path) -> String {
    if path.as_os_str() == "-" {
        return "<stdin>".to_owned();
    }
    path.display().to_string()
}
