use thiserror::Error;

use super::assembler::AlignmentError;
use super::config::ConfigError;
use crate::core::io::pdb::PdbError;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Circle fit failed to converge within {iterations} iterations: {reason}")]
    FitConvergence {
        iterations: usize,
        reason: &'static str,
    },

    #[error("Degenerate geometry for subunit {index}: the {axis} axis has zero length")]
    GeometryDegeneracy { index: usize, axis: &'static str },

    #[error("Failed to align subunit {index}: {source}")]
    Alignment {
        index: usize,
        #[source]
        source: AlignmentError,
    },

    #[error("Failed to {action} structure file '{}': {source}", path.display())]
    StructureFile {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: PdbError,
    },

    #[error("Filesystem operation on '{}' failed: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
