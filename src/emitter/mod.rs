// DdlEmitter trait and implementations

pub mod mysql;
pub mod sqlite;

pub use mysql::MySqlEmitter;
pub use sqlite::SqliteEmitter;

use crate::schema::StoredTable;

/// Renders a stored table as DDL statements in one dialect
pub trait DdlEmitter {
    /// CREATE TABLE first, followed by any supplementary statements
    fn emit(&self, table: &StoredTable) -> Vec<String>;
}
