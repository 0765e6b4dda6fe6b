//! Diagnostic logging on standard error.
//!
//! The crate logs through the `log` facade. `tracing-subscriber` formats the
//! records, picking them up through its `tracing-log` bridge. Standard output
//! carries the rendered report, so diagnostics never mix with it.

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Environment variable whose filter directives override `-v` and `-q`.
pub const LOG_ENV: &str = "WCP_LOG";

/// Map verbosity flags to a level filter.
///
/// `quiet` wins over any number of `-v` flags.
#[must_use]
pub const fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the stderr subscriber at the level implied by the flags.
///
/// Directives in [`LOG_ENV`] take precedence when set. A subscriber that is
/// already installed is left in place.
#[must_use = "the returned level is the one the flags asked for"]
pub fn init(verbosity: u8, quiet: bool) -> LevelFilter {
    let level = level_for(verbosity, quiet);
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .try_init();
    if installed.is_err() {
        log::debug!("subscriber already installed");
    }
    level
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, false, LevelFilter::WARN)]
    #[case(1, false, LevelFilter::INFO)]
    #[case(2, false, LevelFilter::DEBUG)]
    #[case(3, false, LevelFilter::TRACE)]
    #[case(9, false, LevelFilter::TRACE)]
    #[case(0, true, LevelFilter::ERROR)]
    #[case(2, true, LevelFilter::ERROR)]
    fn maps_flags_to_levels(#[case] verbosity: u8, #[case] quiet: bool, #[case] want: LevelFilter) {
        assert_eq!(level_for(verbosity, quiet), want);
    }

    #[test]
    fn repeated_init_keeps_the_first_subscriber() {
        assert_eq!(init(2, false), LevelFilter::DEBUG);
        assert_eq!(init(0, true), LevelFilter::ERROR);
    }
}
