// SqlParser trait and the MySQL implementation

pub mod admin;
pub mod mysql;
pub mod prepass;

pub use mysql::MySqlParser;

use crate::ast::Statement;
use crate::error::Result;

/// Trait for parsing SQL text into the driver's statement model
pub trait SqlParser: Send + Sync {
    /// Parse SQL text; a text with several `;`-separated statements yields several
    fn parse(&self, sql: &str) -> Result<Vec<Statement>>;
}
