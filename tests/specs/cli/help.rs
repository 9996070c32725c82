//! CLI help output specs

use crate::prelude::*;

#[test]
fn tb_no_args_shows_usage_and_exits_zero() {
    cli().passes().stdout_has("Usage:");
}

#[test]
fn tb_help_lists_command_groups() {
    cli().args(&["--help"]).passes().stdout_has("draft").stdout_has("job");
}

#[test]
fn tb_draft_help_shows_subcommands() {
    cli().args(&["draft", "--help"]).passes().stdout_has("show").stdout_has("save");
}

#[test]
fn tb_job_help_shows_subcommands() {
    cli().args(&["job", "--help"]).passes().stdout_has("run").stdout_has("status");
}

#[test]
fn tb_job_run_help_shows_flags() {
    cli()
        .args(&["job", "run", "--help"])
        .passes()
        .stdout_has("--kind")
        .stdout_has("--params")
        .stdout_has("--timeout")
        .stdout_has("--no-wait");
}

#[test]
fn tb_version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.1");
}
