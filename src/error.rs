use std::io;

use thiserror::Error;

/// Errors produced by the diff and patch engines.
///
/// This collapses to the same coarse taxonomy the reference implementation
/// uses (allocation / I/O / corrupt patch), but keeps the kinds distinct in
/// the type system so callers can choose a diagnostic without re-deriving
/// what went wrong from an `io::ErrorKind`.
#[derive(Debug, Error)]
pub enum BsdiffError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to allocate suffix array workspace for {requested} entries")]
    Alloc { requested: usize },

    #[error("corrupt patch: {0}")]
    CorruptPatch(String),

    #[error("integer {0} cannot be encoded in sign-magnitude form")]
    IntegerOverflow(i64),
}

pub type Result<T> = std::result::Result<T, BsdiffError>;
