// Error types

use std::fmt;

use thiserror::Error;

use crate::engine::NativeStatement;

/// Errors that can occur during parsing
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub location: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    pub fn with_location(message: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: Some(location.into()),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "Parse error at {}: {}", loc, self.message),
            None => write!(f, "Parse error: {}", self.message),
        }
    }
}

impl std::error::Error for ParseError {}

// Convert sqlparser errors to our ParseError
impl From<sqlparser::parser::ParserError> for ParseError {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        ParseError::new(err.to_string())
    }
}

impl From<sqlparser::tokenizer::TokenizerError> for ParseError {
    fn from(err: sqlparser::tokenizer::TokenizerError) -> Self {
        ParseError::with_location(
            err.message.clone(),
            format!("line {}, column {}", err.location.line, err.location.column),
        )
    }
}

/// Errors raised while translating or executing a MySQL statement
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Failed to parse the MySQL query: {0}")]
    Parse(#[from] ParseError),

    #[error("MySQL query not supported. Cause: {0}")]
    NotSupported(String),

    #[error("MySQL query syntax error. {0}")]
    InvalidInput(String),

    #[error("Table \"{0}\" not found in information schema")]
    UnknownTable(String),

    #[error("SQLite error: {source} (while executing: {sql})")]
    Native {
        sql: String,
        params: usize,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<sqlparser::parser::ParserError> for DriverError {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        DriverError::Parse(err.into())
    }
}

impl From<sqlparser::tokenizer::TokenizerError> for DriverError {
    fn from(err: sqlparser::tokenizer::TokenizerError) -> Self {
        DriverError::Parse(err.into())
    }
}

impl DriverError {
    pub fn not_supported(cause: impl Into<String>) -> Self {
        DriverError::NotSupported(cause.into())
    }

    /// True when the underlying SQLite error is a constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            DriverError::Native {
                source: rusqlite::Error::SqliteFailure(err, _),
                ..
            } => err.code == rusqlite::ErrorCode::ConstraintViolation,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;

/// Failure of a whole `Driver::query` call
///
/// Carries the MySQL text and every native statement that ran before the
/// failure, so callers can see how far the translation got.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct QueryError {
    pub query: String,
    pub native_statements: Vec<NativeStatement>,
    #[source]
    pub source: DriverError,
}

impl QueryError {
    pub fn kind(&self) -> &DriverError {
        &self.source
    }
}
