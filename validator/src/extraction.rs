//! Package archive extraction.
//!
//! A package is a tar archive compressed with zstd, or with xz for older
//! packages. Extraction walks [`CODEC_ORDER`] and stops at the first codec
//! that succeeds. Every attempt gets a fresh directory under the scratch
//! root and is bounded by the configured timeout.

use crate::report::ValidationReport;
use crate::runner::{CommandOutcome, CommandRunner};
use std::fmt;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Compression codecs a package may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    /// Zstandard, the preferred codec.
    Zstd,
    /// XZ, accepted for older packages.
    Xz,
}

impl Codec {
    /// Return the codec name used in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zstd => "zstd",
            Self::Xz => "xz",
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The codec packages are expected to use.
pub const PREFERRED_CODEC: Codec = Codec::Zstd;

/// Codecs in the order they are tried.
pub const CODEC_ORDER: [Codec; 2] = [PREFERRED_CODEC, Codec::Xz];

/// Which machinery performs each extraction attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ExtractionBackend {
    /// Decode with the `zstd`/`xz2` crates and unpack with `tar`.
    #[default]
    InProcess,
    /// Invoke the host's `tar` binary.
    SystemTar,
}

/// Outcome of a single codec attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The archive was unpacked.
    Succeeded,
    /// The attempt failed; try the next codec.
    Failed(String),
    /// The attempt exceeded the timeout and was stopped.
    TimedOut,
}

/// A codec paired with what happened when it was tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecAttempt {
    /// The codec tried.
    pub codec: Codec,
    /// What happened.
    pub outcome: AttemptOutcome,
}

/// A successful extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Root of the extracted package tree.
    pub root: PathBuf,
    /// The codec that succeeded.
    pub codec: Codec,
    /// Every attempt made, including the successful one.
    pub attempts: Vec<CodecAttempt>,
}

impl Extraction {
    /// Return true when a codec other than the preferred one succeeded.
    #[must_use]
    pub fn used_fallback(&self) -> bool {
        self.codec != PREFERRED_CODEC
    }
}

/// Every codec failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionFailure {
    /// Every attempt made, in order.
    pub attempts: Vec<CodecAttempt>,
    /// The per-attempt timeout in force.
    pub timeout: Duration,
}

impl fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tried: Vec<_> = self.attempts.iter().map(|a| a.codec.as_str()).collect();
        write!(
            f,
            "Failed to extract package archive (tried {})",
            tried.join(" and ")
        )?;
        for (index, attempt) in self.attempts.iter().enumerate() {
            let separator = if index == 0 { ": " } else { "; " };
            let cause = match &attempt.outcome {
                AttemptOutcome::Succeeded => "succeeded".to_owned(),
                AttemptOutcome::Failed(reason) => reason.clone(),
                AttemptOutcome::TimedOut => {
                    format!("timed out after {} seconds", self.timeout.as_secs())
                }
            };
            write!(f, "{separator}{}: {cause}", attempt.codec)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExtractionFailure {}

/// Errors raised while unpacking in process.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O or decoding error during extraction.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The attempt was cancelled after its deadline.
    #[error("extraction cancelled")]
    Cancelled,
}

/// One way of running a codec attempt.
pub trait ExtractStrategy {
    /// Unpack `archive` into the existing directory `dest` using `codec`,
    /// giving up after `timeout`.
    fn attempt(&self, codec: Codec, archive: &Path, dest: &Path, timeout: Duration)
    -> AttemptOutcome;
}

/// Decodes with the `zstd` and `xz2` crates on a worker thread.
///
/// On timeout the worker is told to stop and joined before the attempt
/// returns, so nothing writes into the attempt directory afterwards. The
/// worker checks between entries; an attempt can overrun its deadline by the
/// time it takes to unpack one entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct InProcessStrategy;

impl ExtractStrategy for InProcessStrategy {
    fn attempt(
        &self,
        codec: Codec,
        archive: &Path,
        dest: &Path,
        timeout: Duration,
    ) -> AttemptOutcome {
        let (tx, rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let worker_cancel = Arc::clone(&cancel);
        let archive = archive.to_path_buf();
        let dest = dest.to_path_buf();

        let spawned = thread::Builder::new()
            .name(format!("extract-{codec}"))
            .spawn(move || {
                let result = unpack_with(codec, &archive, &dest, &worker_cancel);
                if tx.send(result).is_err() {
                    log::debug!("{codec} extraction finished after its deadline");
                }
            });
        let worker = match spawned {
            Ok(worker) => worker,
            Err(err) => {
                return AttemptOutcome::Failed(format!(
                    "could not start extraction worker: {err}"
                ));
            }
        };

        let outcome = match rx.recv_timeout(timeout) {
            Ok(Ok(count)) => {
                log::debug!("unpacked {count} entries with {codec}");
                AttemptOutcome::Succeeded
            }
            Ok(Err(err)) => AttemptOutcome::Failed(err.to_string()),
            Err(RecvTimeoutError::Timeout) => {
                cancel.store(true, Ordering::Relaxed);
                AttemptOutcome::TimedOut
            }
            Err(RecvTimeoutError::Disconnected) => {
                AttemptOutcome::Failed("extraction worker stopped unexpectedly".to_owned())
            }
        };

        if worker.join().is_err() {
            log::debug!("{codec} extraction worker panicked");
        }
        outcome
    }
}

/// Invokes the host `tar` binary through a [`CommandRunner`].
#[derive(Debug, Clone, Default)]
pub struct SystemTarStrategy<R> {
    runner: R,
}

impl<R: CommandRunner> SystemTarStrategy<R> {
    /// Create a strategy that runs `tar` through `runner`.
    #[must_use]
    pub const fn new(runner: R) -> Self {
        Self { runner }
    }

    fn tar_args(codec: Codec, archive: &Path, dest: &Path) -> Vec<String> {
        let mut args = match codec {
            Codec::Zstd => vec!["--zstd".to_owned(), "-xf".to_owned()],
            Codec::Xz => vec!["-xJf".to_owned()],
        };
        args.push(archive.display().to_string());
        args.push("-C".to_owned());
        args.push(dest.display().to_string());
        args
    }
}

impl<R: CommandRunner> ExtractStrategy for SystemTarStrategy<R> {
    fn attempt(
        &self,
        codec: Codec,
        archive: &Path,
        dest: &Path,
        timeout: Duration,
    ) -> AttemptOutcome {
        let args = Self::tar_args(codec, archive, dest);
        match self.runner.run_with_timeout("tar", &args, timeout) {
            Ok(CommandOutcome::Completed(output)) if output.status.success() => {
                AttemptOutcome::Succeeded
            }
            Ok(CommandOutcome::Completed(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                AttemptOutcome::Failed(format!("tar exited with {}: {}", output.status, stderr.trim()))
            }
            Ok(CommandOutcome::TimedOut) => AttemptOutcome::TimedOut,
            Err(err) => AttemptOutcome::Failed(format!("failed to run tar: {err}")),
        }
    }
}

/// Extract `archive` under `scratch`, trying each codec in [`CODEC_ORDER`].
///
/// # Errors
///
/// Returns [`ExtractionFailure`] listing every attempt when no codec
/// succeeds.
pub fn extract_package(
    strategy: &dyn ExtractStrategy,
    archive: &Path,
    scratch: &Path,
    timeout: Duration,
) -> Result<Extraction, ExtractionFailure> {
    let mut attempts = Vec::with_capacity(CODEC_ORDER.len());

    for codec in CODEC_ORDER {
        let dest = scratch.join(format!("package-{codec}"));
        log::debug!("extracting {} with {codec} into {}", archive.display(), dest.display());

        let outcome = match fs::create_dir_all(&dest) {
            Ok(()) => strategy.attempt(codec, archive, &dest, timeout),
            Err(err) => AttemptOutcome::Failed(format!(
                "could not create {}: {err}",
                dest.display()
            )),
        };
        let succeeded = outcome == AttemptOutcome::Succeeded;
        attempts.push(CodecAttempt { codec, outcome });

        if succeeded {
            return Ok(Extraction {
                root: dest,
                codec,
                attempts,
            });
        }
    }

    Err(ExtractionFailure { attempts, timeout })
}

/// Extract the package and record the outcome in `report`.
///
/// Returns the extracted root on success. A fallback codec adds a warning;
/// total failure adds an error.
pub fn extract_into_report(
    strategy: &dyn ExtractStrategy,
    archive: &Path,
    scratch: &Path,
    timeout: Duration,
    report: &mut ValidationReport,
) -> Option<PathBuf> {
    match extract_package(strategy, archive, scratch, timeout) {
        Ok(extraction) => {
            log::info!("extracted package with {} compression", extraction.codec);
            if extraction.used_fallback() {
                report.add_warning(format!(
                    "WCP uses {} compression, should use {}",
                    extraction.codec, PREFERRED_CODEC
                ));
            }
            Some(extraction.root)
        }
        Err(failure) => {
            report.add_error(failure.to_string());
            None
        }
    }
}

fn unpack_with(
    codec: Codec,
    archive: &Path,
    dest: &Path,
    cancel: &AtomicBool,
) -> Result<usize, ExtractionError> {
    let file = File::open(archive)?;
    match codec {
        Codec::Zstd => unpack_entries(zstd::Decoder::new(file)?, dest, cancel),
        Codec::Xz => unpack_entries(xz2::read::XzDecoder::new(file), dest, cancel),
    }
}

fn unpack_entries<R: Read>(
    reader: R,
    dest: &Path,
    cancel: &AtomicBool,
) -> Result<usize, ExtractionError> {
    let mut archive = tar::Archive::new(reader);
    let mut count = 0;

    for entry_result in archive.entries()? {
        if cancel.load(Ordering::Relaxed) {
            return Err(ExtractionError::Cancelled);
        }
        let mut entry = entry_result?;
        let entry_path = entry.path()?.into_owned();

        validate_entry_path(&entry_path)?;
        entry.unpack_in(dest)?;
        count += 1;
    }

    Ok(count)
}

/// Validate that a tar entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|component| matches!(component, Component::ParentDir | Component::RootDir));
    if escapes {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "extraction_tests.rs"]
mod tests;
