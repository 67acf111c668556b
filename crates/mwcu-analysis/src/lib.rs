//! PHP Source Analyses
//!
//! Token-level checks over whole source trees: the class-name case
//! cross-checker, the long-function reporter and the syntax lint. All of
//! them run on the same round-trip token stream as the stylizer and walk
//! significant tokens with a [`TokenCursor`].

pub mod case_check;
pub mod cursor;
pub mod lint;
pub mod long_functions;
pub mod walk;

use std::path::{Path, PathBuf};

pub use case_check::{ClassMap, Mismatch, Resolution, UseSite, Verdict};
pub use cursor::TokenCursor;
pub use lint::Problem;
pub use long_functions::Event;

/// Failure to read or walk source files.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        source: ignore::Error,
    },
}

/// Read a source file. Invalid UTF-8 is replaced rather than rejected, as
/// legacy PHP files are often Latin-1.
pub fn read_source(path: &Path) -> Result<String, AnalysisError> {
    let bytes = std::fs::read(path).map_err(|source| AnalysisError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
