//! Command builders for the CLI.

use clap::Command;

use super::args::*;

/// Root and connector configuration, shared by every command.
fn with_config_args(cmd: Command) -> Command {
    cmd.arg(root_arg())
        .arg(database_arg())
        .arg(connector_arg())
        .arg(config_arg())
        .arg(recursion_limit_arg())
}

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("chainql")
        .about("Compile fluent collection queries in ESTree trees to a query IR")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(analyze_command())
        .subcommand(check_command())
}

/// Print recognized commands as JSON.
pub fn analyze_command() -> Command {
    let cmd = Command::new("analyze")
        .about("Recognize queries and writes, print their IR as JSON")
        .override_usage(
            "\
  chainql analyze <TREE> --root <IDENT> [--database <NAME>]
  chainql analyze <TREE> --connector <IDENT>
  chainql analyze <TREE> --config <FILE>",
        )
        .after_help(
            r#"EXAMPLES:
  chainql analyze app.json --root db --database app
  chainql analyze app.json --connector connect --compact
  chainql analyze - --config chainql.json < app.json
  chainql analyze app.json --root db -vv   # trace every candidate"#,
        )
        .arg(input_arg())
        .arg(compact_arg())
        .arg(trace_arg())
        .arg(verbose_arg());
    with_config_args(cmd)
}

/// Validate without printing.
pub fn check_command() -> Command {
    let cmd = Command::new("check")
        .about("Report malformed queries and writes")
        .after_help(
            r#"EXAMPLES:
  chainql check app.json --root db
  chainql check app.json --config chainql.json"#,
        )
        .arg(input_arg());
    with_config_args(cmd)
}
