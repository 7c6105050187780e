mod cli;
mod commands;

use cli::{AnalyzeParams, CheckParams, build_cli};

fn main() {
    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("analyze", m)) => {
            let params = AnalyzeParams::from_matches(m);
            commands::analyze::run(params.into());
        }
        Some(("check", m)) => {
            let params = CheckParams::from_matches(m);
            commands::check::run(params.into());
        }
        _ => unreachable!("clap should have caught this"),
    }
}
