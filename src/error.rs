//! Error types shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by training, scanning and the abstraction collaborator.
#[derive(Debug, Error)]
pub enum Error {
    /// A file needed by the requested operation could not be accessed.
    #[error("file access failed: {path}: {source}")]
    FileAccess {
        /// Path that failed to open or read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The source-language parser rejected its input.
    #[error("parse error in {0}")]
    ParseFailure(String),

    /// A training corpus yielded no recognized records at the chosen level.
    #[error("invalid training data in {path}: no records recognized")]
    MalformedTrainingData {
        /// Path of the rejected corpus.
        path: PathBuf,
    },

    /// An id was expanded that the compacter never assigned.
    #[error("compacter: missing id {0}")]
    UnknownTokenId(u64),

    /// A syntax tree did not have the shape the abstraction rules require.
    #[error("unexpected syntax tree: {0}")]
    UnexpectedTree(String),

    /// The numeric language selector does not name a supported language.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(i32),

    /// Writing a report to a scan log failed.
    #[error("log write failed: {0}")]
    LogWrite(#[from] std::io::Error),
}

/// A specialized `Result` type for predscan operations.
pub type Result<T> = std::result::Result<T, Error>;
