// MySQL Emitter
//
// Renders SHOW CREATE TABLE output from the information schema.

use super::DdlEmitter;
use crate::codec::{quote_identifier, quote_string};
use crate::schema::rows::CURRENT_TIMESTAMP;
use crate::schema::types;
use crate::schema::{ColumnRow, StatisticsRow, StoredIndex, StoredTable};

/// Emitter for MySQL DDL as SHOW CREATE TABLE prints it
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlEmitter;

impl DdlEmitter for MySqlEmitter {
    fn emit(&self, table: &StoredTable) -> Vec<String> {
        vec![self.emit_create_table(table)]
    }
}

// Emit helpers
impl MySqlEmitter {
    /// Emit CREATE TABLE statement
    fn emit_create_table(&self, table: &StoredTable) -> String {
        let mut sql = format!("CREATE TABLE {} (\n", quote_identifier(&table.table.name));

        // Emit columns
        let column_strs: Vec<String> = table
            .columns
            .iter()
            .map(|col| self.emit_column(col, &table.table.collation))
            .collect();

        // PRIMARY first, then unique keys, then the rest in creation order
        let mut indexes = table.indexes();
        indexes.sort_by_key(|index| match (index.is_primary(), index.non_unique) {
            (true, _) => 0,
            (false, false) => 1,
            (false, true) => 2,
        });
        let key_strs: Vec<String> = indexes.iter().map(|index| self.emit_key(index)).collect();

        let mut all_parts = column_strs;
        all_parts.extend(key_strs);

        sql.push_str(&all_parts.join(",\n"));
        sql.push_str("\n) ");
        sql.push_str(&self.emit_table_options(table));
        sql
    }

    /// Emit a column definition
    fn emit_column(&self, col: &ColumnRow, table_collation: &str) -> String {
        let mut parts = vec![format!("  {}", quote_identifier(&col.name)), col.column_type.clone()];

        if let Some(collation) = &col.collation_name {
            if !collation.eq_ignore_ascii_case(table_collation) {
                parts.push(format!(
                    "CHARACTER SET {} COLLATE {}",
                    types::charset_of(collation),
                    collation
                ));
            }
        }

        if !col.nullable {
            parts.push("NOT NULL".to_string());
        } else if col.data_type == "timestamp" {
            parts.push("NULL".to_string());
        }

        if col.is_auto_increment() {
            parts.push("AUTO_INCREMENT".to_string());
        }

        // DEFAULT value
        match &col.default {
            Some(default) if col.has_generated_default() => {
                if default.eq_ignore_ascii_case(CURRENT_TIMESTAMP) {
                    parts.push(format!("DEFAULT {}", CURRENT_TIMESTAMP));
                } else {
                    parts.push(format!("DEFAULT ({})", default));
                }
            }
            Some(default) => parts.push(format!("DEFAULT {}", quote_string(default))),
            None if col.nullable && !col.is_auto_increment() && !has_implicit_null_default(col) => {
                parts.push("DEFAULT NULL".to_string());
            }
            None => {}
        }

        // ON UPDATE CURRENT_TIMESTAMP
        if col.has_on_update() {
            parts.push("ON UPDATE CURRENT_TIMESTAMP".to_string());
        }

        if !col.comment.is_empty() {
            parts.push(format!("COMMENT {}", quote_string(&col.comment)));
        }

        parts.join(" ")
    }

    /// Emit an index as a KEY clause
    fn emit_key(&self, index: &StoredIndex<'_>) -> String {
        let cols: Vec<String> = index.columns.iter().map(|c| self.emit_key_part(c)).collect();
        let cols = cols.join(",");
        if index.is_primary() {
            return format!("  PRIMARY KEY ({})", cols);
        }
        let keyword = match (index.index_type, index.non_unique) {
            ("FULLTEXT", _) => "FULLTEXT KEY",
            ("SPATIAL", _) => "SPATIAL KEY",
            (_, false) => "UNIQUE KEY",
            (_, true) => "KEY",
        };
        format!("  {} {} ({})", keyword, quote_identifier(index.name), cols)
    }

    fn emit_key_part(&self, row: &StatisticsRow) -> String {
        match row.sub_part {
            Some(length) => format!("{}({})", quote_identifier(&row.column_name), length),
            None => quote_identifier(&row.column_name),
        }
    }

    fn emit_table_options(&self, table: &StoredTable) -> String {
        let collation = &table.table.collation;
        let mut options = vec![
            format!("ENGINE={}", table.table.engine),
            format!("DEFAULT CHARSET={}", types::charset_of(collation)),
            format!("COLLATE={}", collation),
        ];
        if !table.table.comment.is_empty() {
            options.push(format!("COMMENT={}", quote_string(&table.table.comment)));
        }
        options.join(" ")
    }
}

/// TEXT, BLOB, JSON and spatial columns never print DEFAULT NULL
fn has_implicit_null_default(col: &ColumnRow) -> bool {
    col.data_type.ends_with("text")
        || col.data_type.ends_with("blob")
        || col.data_type == "json"
        || types::storage_class(&col.data_type) == types::StorageClass::Text
            && !types::is_textual(&col.data_type)
            && !matches!(
                col.data_type.as_str(),
                "date" | "time" | "datetime" | "timestamp" | "year"
            )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        ColumnDefinition, DataType, DefaultValue, IndexColumn, IndexDefinition, IndexKind,
        TableDefinition, TableOptions,
    };

    fn emit(columns: Vec<ColumnDefinition>, indexes: Vec<IndexDefinition>, options: TableOptions) -> String {
        let table = StoredTable::from_definition(&TableDefinition {
            name: "t".into(),
            temporary: false,
            if_not_exists: false,
            columns,
            indexes,
            options,
            as_select: None,
        })
        .unwrap();
        MySqlEmitter.emit(&table).remove(0)
    }

    fn key(kind: IndexKind, name: Option<&str>, columns: &[(&str, Option<u32>)]) -> IndexDefinition {
        IndexDefinition {
            name: name.map(|n| n.to_string()),
            kind,
            columns: columns
                .iter()
                .map(|(c, sub_part)| IndexColumn { name: c.to_string(), sub_part: *sub_part })
                .collect(),
        }
    }

    #[test]
    fn test_emit_simple_create_table() {
        let mut id = ColumnDefinition::new("id", DataType::new("int"));
        id.not_null = true;
        id.auto_increment = true;
        let name = ColumnDefinition::new("name", DataType::new("varchar").with_args(&["20"]));

        let sql = emit(
            vec![id, name],
            vec![key(IndexKind::Primary, None, &[("id", None)])],
            TableOptions::default(),
        );
        assert_eq!(
            sql,
            "CREATE TABLE `t` (\n  `id` int NOT NULL AUTO_INCREMENT,\n  `name` varchar(20) DEFAULT NULL,\n  PRIMARY KEY (`id`)\n) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_general_ci"
        );
    }

    // ========== DEFAULT values ==========

    #[test]
    fn test_emit_default_string() {
        let mut status = ColumnDefinition::new("status", DataType::new("varchar").with_args(&["20"]));
        status.default = Some(DefaultValue::Literal("pending".into()));
        let sql = emit(vec![status], vec![], TableOptions::default());
        assert!(sql.contains("DEFAULT 'pending'"), "Expected DEFAULT 'pending' in: {}", sql);
    }

    #[test]
    fn test_emit_text_has_no_default_null() {
        let body = ColumnDefinition::new("body", DataType::new("longtext"));
        let sql = emit(vec![body], vec![], TableOptions::default());
        assert!(sql.contains("  `body` longtext\n"), "Got: {}", sql);
    }

    // ========== ON UPDATE CURRENT_TIMESTAMP ==========

    #[test]
    fn test_emit_on_update_current_timestamp() {
        let mut updated = ColumnDefinition::new("updated", DataType::new("timestamp"));
        updated.not_null = true;
        updated.default = Some(DefaultValue::CurrentTimestamp);
        updated.on_update_current_timestamp = true;
        let sql = emit(vec![updated], vec![], TableOptions::default());
        assert!(
            sql.contains("`updated` timestamp NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP"),
            "Got: {}",
            sql
        );
    }

    // ========== KEY (Index) ==========

    #[test]
    fn test_emit_keys_with_prefix_lengths() {
        let a = ColumnDefinition::new("a", DataType::new("varchar").with_args(&["255"]));
        let b = ColumnDefinition::new("b", DataType::new("int"));
        let sql = emit(
            vec![a, b],
            vec![
                key(IndexKind::Index, Some("ab"), &[("a", Some(191)), ("b", None)]),
                key(IndexKind::Unique, None, &[("b", None)]),
            ],
            TableOptions::default(),
        );
        assert!(
            sql.contains("  UNIQUE KEY `b` (`b`),\n  KEY `ab` (`a`(191),`b`)"),
            "Unique keys come before plain keys: {}",
            sql
        );
    }

    #[test]
    fn test_emit_table_options() {
        let options = TableOptions {
            engine: Some("MyISAM".into()),
            collation: Some("utf8mb4_unicode_ci".into()),
            comment: Some("posts".into()),
            ..Default::default()
        };
        let mut title = ColumnDefinition::new("title", DataType::new("varchar").with_args(&["10"]));
        title.collation = Some("latin1_bin".into());
        let sql = emit(vec![title], vec![], options);
        assert!(
            sql.ends_with(") ENGINE=MyISAM DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci COMMENT='posts'"),
            "Got: {}",
            sql
        );
        assert!(sql.contains("CHARACTER SET latin1 COLLATE latin1_bin"), "Got: {}", sql);
    }
}
