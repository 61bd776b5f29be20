//! Error type shared by every loading and filtering operation.

use crate::arena::Side;
use std::io;
use thiserror::Error;

/// Errors that can occur while loading interval sets or applying range filters.
#[derive(Error, Debug)]
pub enum RangeError {
    #[error("Out of memory: {requested} bytes requested on the {side} side, {available} available")]
    OutOfMemory {
        side: Side,
        requested: usize,
        available: usize,
    },

    #[error("Line {line} of {role}: {message}")]
    Malformed {
        role: String,
        line: usize,
        message: String,
    },

    #[error("{0}")]
    Inconsistent(String),

    #[error("Failed to read {role}: {source}")]
    Read {
        role: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write output: {0}")]
    Output(#[source] io::Error),
}

impl RangeError {
    /// Build a `Malformed` error for a 1-based line of a file.
    pub fn malformed(role: &str, line: usize, message: impl Into<String>) -> Self {
        RangeError::Malformed {
            role: role.to_string(),
            line,
            message: message.into(),
        }
    }

    /// Build a `Read` error for a file role.
    pub fn read(role: &str, source: io::Error) -> Self {
        RangeError::Read {
            role: role.to_string(),
            source,
        }
    }

    /// Line number carried by a `Malformed` error.
    pub fn line(&self) -> Option<usize> {
        match self {
            RangeError::Malformed { line, .. } => Some(*line),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RangeError>;
