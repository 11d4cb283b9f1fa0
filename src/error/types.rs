//! Custom error types with exit codes

use thiserror::Error;

/// Main error type for steward operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StewardError {
    /// Parse Error - a configuration file is not valid YAML
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },

    /// Validation Error - merged configuration violates the schema or semantics
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// IO Error - file or directory operation failed
    #[error("IO error at {path}: {message}")]
    Io { path: String, message: String },

    /// Sync Error - repository synchronization failed
    #[error("Sync error for {repository}: {message}")]
    Sync {
        repository: String,
        message: String,
    },

    /// Ref Not Found Error - requested ref does not exist in the repository
    #[error("Ref '{reference}' not found in {repository}")]
    RefNotFound {
        repository: String,
        reference: String,
    },
}

impl StewardError {
    /// Get the appropriate exit code for this error type
    #[must_use]
    #[inline]
    pub const fn exit_code(&self) -> i32 {
        match *self {
            Self::Parse { .. } => 1,
            Self::Validation { .. } => 2,
            Self::Io { .. } => 3,
            Self::Sync { .. } => 4,
            Self::RefNotFound { .. } => 5,
        }
    }

    /// Create a parse error for a specific file
    #[inline]
    pub fn parse<F: Into<String>, S: Into<String>>(file: F, message: S) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    #[inline]
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an IO error for a specific path
    #[inline]
    pub fn io<P: Into<String>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Io {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a sync error for a specific repository
    #[inline]
    pub fn sync<R: Into<String>, S: Into<String>>(repository: R, message: S) -> Self {
        Self::Sync {
            repository: repository.into(),
            message: message.into(),
        }
    }

    /// Create a ref-not-found error
    #[inline]
    pub fn ref_not_found<R: Into<String>, S: Into<String>>(repository: R, reference: S) -> Self {
        Self::RefNotFound {
            repository: repository.into(),
            reference: reference.into(),
        }
    }
}
