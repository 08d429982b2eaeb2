use std::path::PathBuf;
use thiserror::Error;

/// Errors from reading or writing the on-disk tables.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A row could not be decoded into the expected columns.
    #[error("malformed table {path} at line {line}: {reason}")]
    MalformedTable {
        path: PathBuf,
        line: u64,
        reason: String,
    },
}

impl DataError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DataError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        DataError::Csv {
            path: path.into(),
            source,
        }
    }

    /// Classifies a row-level CSV error. Decoding failures become
    /// `MalformedTable` with the 1-based line number.
    pub(crate) fn from_row(path: impl Into<PathBuf>, source: csv::Error, fallback_line: u64) -> Self {
        let line = source.position().map_or(fallback_line, csv::Position::line);
        let reason = match source.kind() {
            csv::ErrorKind::Deserialize { err, .. } => Some(err.to_string()),
            csv::ErrorKind::UnequalLengths { expected_len, len, .. } => {
                Some(format!("expected {expected_len} fields, found {len}"))
            }
            _ => None,
        };

        match reason {
            Some(reason) => DataError::MalformedTable {
                path: path.into(),
                line,
                reason,
            },
            None => DataError::csv(path, source),
        }
    }
}
