//! Command-line argument definitions for `wcp-validate`.
//!
//! Kept apart from the entrypoint so the binary stays focused on
//! orchestration.

use crate::config::ValidatorConfig;
use crate::error::Result;
use crate::extraction::ExtractionBackend;
use crate::pipeline::ValidationOptions;
use camino::Utf8PathBuf;
use clap::Parser;

/// Validate a WCP content package before it reaches the host application.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "wcp-validate")]
#[command(version, about)]
#[command(long_about = concat!(
    "Validate a WCP content package before it reaches the host application.\n\n",
    "The package is extracted into a temporary directory and checked against the ",
    "host's acceptance contract: the runtime identifier grammar, the profile.json ",
    "schema, the declared file tree, and the layout of the nested prefix archive. ",
    "Errors block acceptance; warnings are advisory.",
))]
#[command(after_help = concat!(
    "EXIT STATUS:\n",
    "  0  the package passed (warnings allowed)\n",
    "  1  the package has errors, or validation could not run\n",
    "  2  invalid usage\n\n",
    "EXAMPLES:\n",
    "  Validate a package:\n",
    "    $ wcp-validate proton-9.0-x86_64.wcp\n\n",
    "  Emit a JSON report using the host's tar binary:\n",
    "    $ wcp-validate --json --backend system-tar proton-9.0-x86_64.wcp",
))]
pub struct Cli {
    /// Package archive to validate.
    #[arg(value_name = "PACKAGE")]
    pub package: Utf8PathBuf,

    /// TOML file overriding the built-in acceptance settings.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Seconds allowed for each extraction attempt [default: 60].
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Extraction machinery.
    #[arg(long, value_enum, default_value_t = ExtractionBackend::InProcess)]
    pub backend: ExtractionBackend,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Increase diagnostic output on stderr (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only print errors on stderr.
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Resolve validation options from defaults, the config file, and flags.
    ///
    /// # Errors
    ///
    /// Returns an error when the config file cannot be read or parsed, or
    /// when a resolved value is out of range.
    pub fn validation_options(&self) -> Result<ValidationOptions> {
        let config = ValidatorConfig::load_or_default(
            self.config.as_ref().map(|path| path.as_std_path()),
        )?
        .with_timeout_override(self.timeout)?;
        Ok(ValidationOptions {
            config,
            backend: self.backend,
        })
    }
}
