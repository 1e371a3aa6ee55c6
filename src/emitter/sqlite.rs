// SQLite Emitter
//
// Physical DDL for a stored table. Column storage classes follow
// schema::types; MySQL-only details live in the information schema.

use tracing::debug;

use super::DdlEmitter;
use crate::codec::{quote_identifier, quote_string};
use crate::schema::rows::CURRENT_TIMESTAMP;
use crate::schema::types::{self, StorageClass};
use crate::schema::{ColumnRow, StoredTable};

/// Prefix reserved for objects the driver creates on its own
pub const RESERVED_PREFIX: &str = "_mysql_sqlite_";

/// Emitter for the physical SQLite table
#[derive(Debug, Clone, Default)]
pub struct SqliteEmitter<'a> {
    /// Create the table under another name (ALTER rebuilds); indexes and
    /// triggers still target the original name
    pub rename_to: Option<&'a str>,
    pub temporary: bool,
    pub if_not_exists: bool,
}

impl DdlEmitter for SqliteEmitter<'_> {
    fn emit(&self, table: &StoredTable) -> Vec<String> {
        let mut statements = vec![self.emit_create_table(table)];
        statements.extend(self.emit_indexes(table));
        statements.extend(self.emit_triggers(table));
        statements
    }
}

// CREATE TABLE
impl SqliteEmitter<'_> {
    fn emit_create_table(&self, table: &StoredTable) -> String {
        let primary = table.primary_key();
        let primary_columns: Vec<&str> = primary
            .as_ref()
            .map(|index| index.columns.iter().map(|c| c.column_name.as_str()).collect())
            .unwrap_or_default();
        let has_auto_increment = table.columns.iter().any(|c| c.is_auto_increment());

        let mut parts: Vec<String> = table
            .columns
            .iter()
            .map(|column| self.emit_column(column, &primary_columns))
            .collect();

        // AUTOINCREMENT already declares the key inline
        if !has_auto_increment && !primary_columns.is_empty() {
            let cols: Vec<String> = primary_columns.iter().map(|c| quote_identifier(c)).collect();
            parts.push(format!("  PRIMARY KEY ({})", cols.join(", ")));
        }

        let name = self.rename_to.unwrap_or(&table.table.name);
        format!(
            "CREATE {}TABLE {}{} (\n{}\n) STRICT",
            if self.temporary { "TEMPORARY " } else { "" },
            if self.if_not_exists { "IF NOT EXISTS " } else { "" },
            quote_identifier(name),
            parts.join(",\n")
        )
    }

    fn emit_column(&self, column: &ColumnRow, primary_columns: &[&str]) -> String {
        let storage = types::storage_class(&column.data_type);
        let single_key = primary_columns.len() == 1
            && primary_columns[0].eq_ignore_ascii_case(&column.name);

        // A lone INTEGER key would become a rowid alias; INT keeps it a plain column
        let type_name = if storage == StorageClass::Integer && single_key && !column.is_auto_increment() {
            "INT"
        } else {
            storage.as_str()
        };

        let mut parts = vec![format!("  {}", quote_identifier(&column.name)), type_name.to_string()];

        if storage == StorageClass::Text && !is_binary_collation(column.collation_name.as_deref()) {
            parts.push("COLLATE NOCASE".to_string());
        }

        if !column.nullable || column.is_auto_increment() {
            parts.push("NOT NULL".to_string());
        }

        if column.is_auto_increment() {
            parts.push("PRIMARY KEY AUTOINCREMENT".to_string());
        }

        if let Some(default) = &column.default {
            if !column.has_generated_default() {
                parts.push(format!("DEFAULT {}", quote_string(default)));
            } else if default.eq_ignore_ascii_case(CURRENT_TIMESTAMP) {
                parts.push(format!("DEFAULT {}", CURRENT_TIMESTAMP));
            } else {
                debug!(column = %column.name, default = %default, "expression default not emitted");
            }
        }

        parts.join(" ")
    }
}

// Indexes and triggers
impl SqliteEmitter<'_> {
    fn emit_indexes(&self, table: &StoredTable) -> Vec<String> {
        let name = &table.table.name;
        table
            .indexes()
            .into_iter()
            .filter(|index| !index.is_primary())
            .map(|index| {
                let cols: Vec<String> = index
                    .columns
                    .iter()
                    .map(|c| quote_identifier(&c.column_name))
                    .collect();
                format!(
                    "CREATE {}INDEX {} ON {} ({})",
                    if index.non_unique { "" } else { "UNIQUE " },
                    quote_identifier(&format!("{}__{}", name, index.name)),
                    quote_identifier(name),
                    cols.join(", ")
                )
            })
            .collect()
    }

    fn emit_triggers(&self, table: &StoredTable) -> Vec<String> {
        let name = &table.table.name;
        table
            .columns
            .iter()
            .filter(|column| column.has_on_update())
            .map(|column| {
                format!(
                    "CREATE {}TRIGGER {} AFTER UPDATE ON {} FOR EACH ROW BEGIN UPDATE {} SET {} = CURRENT_TIMESTAMP WHERE rowid = NEW.rowid; END",
                    if self.temporary { "TEMPORARY " } else { "" },
                    quote_identifier(&on_update_trigger_name(name, &column.name)),
                    quote_identifier(name),
                    quote_identifier(name),
                    quote_identifier(&column.name)
                )
            })
            .collect()
    }
}

pub fn on_update_trigger_name(table: &str, column: &str) -> String {
    format!("{}{}_{}_on_update", RESERVED_PREFIX, table, column)
}

/// `*_bin` and `binary` compare byte-wise; everything else is case-insensitive
pub fn is_binary_collation(collation: Option<&str>) -> bool {
    match collation {
        Some(collation) => {
            let collation = collation.to_lowercase();
            collation == "binary" || collation.ends_with("_bin")
        }
        None => false,
    }
}
