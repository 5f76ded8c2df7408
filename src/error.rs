//! Error types shared by the sweep, runner and report stages.
//!
//! Only configuration problems are fatal. Failures of individual rider
//! invocations, plots or document compiles are logged where they happen and
//! never reach this type.

use std::path::PathBuf;
use std::process::ExitCode;

use thiserror::Error;

/// Result type alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Inconsistent or out-of-range settings
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Two figures of one run would write to the same files
    #[error("duplicate figure name: {0}")]
    DuplicateFigure(String),

    /// An external program the run depends on is not available
    #[error("unable to find {}", .0.display())]
    MissingBinary(PathBuf),

    /// A subprocess could not be started at all
    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A rider output token that is not a number
    #[error("unparsable measurement {0:?}")]
    UnparsableSample(String),

    /// A data file line that does not follow `<size>\t<count>\t<values>...`
    #[error("malformed data row {line:?}: {reason}")]
    MalformedRow { line: String, reason: String },

    /// The word-processor document could not be written
    #[error("document generation failed: {0}")]
    Document(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Numeric exit status for an error that ends the run
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::Config(_) | Self::DuplicateFigure(_) => 2,
            Self::MissingBinary(_) | Self::Spawn { .. } => 3,
            Self::UnparsableSample(_) | Self::MalformedRow { .. } => 4,
            Self::Document(_) => 5,
            Self::Io(_) => 7,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }
}
