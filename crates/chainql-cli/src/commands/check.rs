use std::path::PathBuf;

use chainql_lib::{Error, analyze_program};

use super::loader::{ConfigInput, load_config, load_tree};

pub struct CheckArgs {
    pub input: PathBuf,
    pub config: ConfigInput,
}

pub fn run(args: CheckArgs) {
    let (config, tree) = match load_config(&args.config)
        .and_then(|config| Ok((config, load_tree(&args.input)?)))
    {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = analyze_program(&tree, &config) {
        match &e {
            Error::InvalidOperation {
                span: Some((start, end)),
                ..
            } => eprintln!("error: {} (at {}..{})", e, start, end),
            _ => eprintln!("error: {}", e),
        }
        std::process::exit(1);
    }

    // Silent on success (like cargo check)
}
