//! `wcp-validate` CLI entrypoint.
//!
//! Validates one WCP package and prints the report on stdout. The exit code
//! is 0 when the package passed, 1 when it has errors or validation could
//! not run, and 2 for usage errors.

use clap::Parser;
use std::io::Write;
use wcp_validator::cli::Cli;
use wcp_validator::error::{Result, ValidatorError};
use wcp_validator::logging;
use wcp_validator::pipeline::validate_package;
use wcp_validator::report::{format_human, format_json};

fn main() {
    let cli = Cli::parse();
    let level = logging::init(cli.verbose, cli.quiet);
    log::debug!("log level {level}");

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Validate the package and write the report, returning whether it passed.
fn run(cli: &Cli, stdout: &mut dyn Write) -> Result<bool> {
    let options = cli.validation_options()?;
    let result = validate_package(cli.package.as_std_path(), &options);

    let rendered = if cli.json {
        format_json(&result)
    } else {
        format_human(&result)
    };
    writeln!(stdout, "{}", rendered.trim_end())
        .map_err(|source| ValidatorError::WriteFailed { source })?;

    Ok(result.is_passing())
}

fn exit_code_for_run_result(result: Result<bool>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(err) => {
            write_stderr_line(stderr, format_args!("error: {err}"));
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}
