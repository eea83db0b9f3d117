//! Fatal generator errors.
//!
//! Recoverable conditions (malformed text, unresolved references) are not
//! errors; they are recorded in [`Diagnostics`](crate::diagnostics::Diagnostics).

use std::path::PathBuf;

use disenum_registry::RegistryError;
use thiserror::Error;

/// Conditions that abort a generation run.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Reading or assembling the registry failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A scope ran out of suffixes for one base name.
    #[error("no unique identifier for {name:?} after {attempts} attempts; the registry scope is anomalous")]
    UniquenessExhausted {
        /// Base identifier that kept colliding.
        name: String,
        /// Number of attempts made.
        attempts: usize,
    },

    /// The override table file could not be read.
    #[error("override table {} is not readable: {source}", path.display())]
    MissingOverrides {
        /// Requested path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The override table could not be parsed.
    #[error("invalid override table {origin}: {message}")]
    InvalidOverrides {
        /// File path or `<built-in>`.
        origin: String,
        /// Parser message.
        message: String,
    },

    /// An output artifact could not be written.
    #[error("failed to write {} for symbol {symbol}: {source}", path.display())]
    Io {
        /// Target path.
        path: PathBuf,
        /// Symbol being emitted.
        symbol: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The UID registry could not be serialized.
    #[error("failed to serialize the UID registry: {0}")]
    Serialize(#[from] serde_json::Error),
}
