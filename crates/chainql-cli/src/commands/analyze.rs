//! Print recognized commands as JSON.

use std::path::PathBuf;

use chainql_lib::{PrintTracer, Verbosity, analyze_program, analyze_program_with};

use super::loader::{ConfigInput, load_config, load_tree};

pub struct AnalyzeArgs {
    pub input: PathBuf,
    pub config: ConfigInput,
    pub compact: bool,
    /// `None` disables tracing.
    pub verbosity: Option<Verbosity>,
}

pub fn run(args: AnalyzeArgs) {
    let (config, tree) = match load_config(&args.config)
        .and_then(|config| Ok((config, load_tree(&args.input)?)))
    {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match args.verbosity {
        Some(verbosity) => {
            let mut tracer = PrintTracer::new(verbosity);
            let result = analyze_program_with(&tree, &config, &mut tracer);
            eprint!("{}", tracer.into_output());
            result
        }
        None => analyze_program(&tree, &config),
    };
    let sites = match result {
        Ok(sites) => sites,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    let output = if args.compact {
        serde_json::to_string(&sites)
    } else {
        serde_json::to_string_pretty(&sites)
    };
    match output {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
