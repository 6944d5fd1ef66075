//! Errors raised at the I/O boundaries of a recondition run.
use std::{fmt, io, path::PathBuf};
use thiserror::Error;

/// Which of the two input collections a problem relates to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Role {
    /// The mapped reads (`accepted_hits.bam`).
    Mapped,
    /// The unmapped reads (`unmapped.bam`).
    Unmapped,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Mapped => write!(f, "mapped"),
            Role::Unmapped => write!(f, "unmapped"),
        }
    }
}

/// Error type for recondition runs.  Corrections to records never fail; only reading the inputs
/// and writing the output do, or the run is interrupted by the user.
#[derive(Error, Debug)]
pub enum ReconditionError {
    /// An input BAM could not be opened.
    #[error("Cannot open {role} BAM file '{}'", .path.display())]
    InputAccess {
        role: Role,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An input BAM's header could not be read or parsed.
    #[error("Malformed header in {role} BAM file '{}'", .path.display())]
    MalformedHeader {
        role: Role,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A record in an input BAM could not be read.
    #[error("Error reading record from {role} BAM file '{}'", .path.display())]
    InputRecord {
        role: Role,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The output BAM could not be created, written or finalized.
    #[error("Error writing output BAM file '{}'", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The run was stopped by the user (see [`crate::interrupt::InterruptFlag`]).
    #[error("Interrupted by user")]
    Interrupted,
}

impl ReconditionError {
    /// The underlying I/O error, if any.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            ReconditionError::InputAccess { source, .. }
            | ReconditionError::MalformedHeader { source, .. }
            | ReconditionError::InputRecord { source, .. }
            | ReconditionError::OutputWrite { source, .. } => Some(source),
            ReconditionError::Interrupted => None,
        }
    }
}
