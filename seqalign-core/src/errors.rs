//! Error type shared by every module of the crate.

use std::path::PathBuf;

use crate::types::Position;

/// Crate-wide result type, defaulting to [`AlignError`].
pub type Result<T, E = AlignError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum AlignError {
    /// A text, dictionary or index file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dictionary index file not found: {}", .0.display())]
    IndexNotFound(PathBuf),

    #[error("dictionary entry for {source_name} -> {target_name} not found in index file")]
    DictionaryNotFound {
        source_name: String,
        target_name: String,
    },

    /// A token was looked up in a dictionary built over a different source text.
    #[error("text of token '{token}' doesn't match the dictionary's source text '{expected}'")]
    TextMismatch { token: String, expected: String },

    /// Two hypotheses (or a hypothesis and a dictionary) don't belong to the same text pair.
    #[error("dictionaries don't match: {0}")]
    DictionaryMismatch(String),

    #[error("text lookup out of range: position {position}, length {length}")]
    OutOfRange { position: Position, length: usize },
}
