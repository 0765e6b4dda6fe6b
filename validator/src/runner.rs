//! Subprocess execution with a bounded wait.
//!
//! Used by the system-`tar` extraction backend. A child that outlives its
//! deadline is killed and reaped, and the caller receives
//! [`CommandOutcome::TimedOut`] instead of blocking. Output pipes are
//! drained while waiting so a chatty child cannot stall on a full pipe.

use std::io::{self, Read};
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Result of a bounded command invocation that managed to start.
#[derive(Debug)]
pub enum CommandOutcome {
    /// The command exited within the deadline.
    Completed(Output),
    /// The deadline elapsed and the child was killed.
    TimedOut,
}

/// Abstraction for running external commands, enabling test mocking.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner {
    /// Run `program` with `args`, waiting at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while spawning, waiting on, or reading
    /// from the child.
    fn run_with_timeout(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> io::Result<CommandOutcome>;
}

/// Runs commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run_with_timeout(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> io::Result<CommandOutcome> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        match child.wait_timeout(timeout)? {
            Some(status) => Ok(CommandOutcome::Completed(Output {
                status,
                stdout: collect(stdout)?,
                stderr: collect(stderr)?,
            })),
            None => {
                // Best effort: the child may already have exited.
                if child.kill().is_err() {
                    log::debug!("{program} exited before it could be killed");
                }
                if child.wait().is_err() {
                    log::debug!("failed to reap timed-out {program}");
                }
                Ok(CommandOutcome::TimedOut)
            }
        }
    }
}

type Drained = JoinHandle<io::Result<Vec<u8>>>;

fn drain<R: Read + Send + 'static>(mut pipe: R) -> Drained {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        pipe.read_to_end(&mut buffer)?;
        Ok(buffer)
    })
}

fn collect(reader: Option<Drained>) -> io::Result<Vec<u8>> {
    reader.map_or_else(
        || Ok(Vec::new()),
        |handle| {
            handle
                .join()
                .map_err(|_| io::Error::other("output reader panicked"))?
        },
    )
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    #[test]
    fn captures_output_of_completed_command() {
        let outcome = SystemCommandRunner
            .run_with_timeout("sh", &args(&["-c", "echo out; echo err >&2"]), Duration::from_secs(10))
            .expect("sh runs");
        let CommandOutcome::Completed(output) = outcome else {
            panic!("expected completion");
        };
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "out");
        assert_eq!(String::from_utf8_lossy(&output.stderr).trim(), "err");
    }

    #[test]
    fn reports_non_zero_exit() {
        let outcome = SystemCommandRunner
            .run_with_timeout("sh", &args(&["-c", "exit 3"]), Duration::from_secs(10))
            .expect("sh runs");
        assert!(matches!(
            outcome,
            CommandOutcome::Completed(output) if output.status.code() == Some(3)
        ));
    }

    #[test]
    fn large_stderr_does_not_stall_the_child() {
        let outcome = SystemCommandRunner
            .run_with_timeout(
                "sh",
                &args(&["-c", "head -c 200000 /dev/zero >&2"]),
                Duration::from_secs(10),
            )
            .expect("sh runs");
        let CommandOutcome::Completed(output) = outcome else {
            panic!("expected completion, not a timeout");
        };
        assert!(output.status.success());
        assert_eq!(output.stderr.len(), 200_000);
    }

    #[test]
    fn kills_command_that_outlives_deadline() {
        let outcome = SystemCommandRunner
            .run_with_timeout("sleep", &args(&["5"]), Duration::from_millis(100))
            .expect("sleep runs");
        assert!(matches!(outcome, CommandOutcome::TimedOut));
    }

    #[test]
    fn spawn_failure_is_an_io_error() {
        let result = SystemCommandRunner.run_with_timeout(
            "definitely-not-a-real-program-wcp",
            &[],
            Duration::from_secs(1),
        );
        assert!(result.is_err());
    }
}
