// CREATE, ALTER and DROP TABLE

use chrono::Utc;
use tracing::info;

use super::{Executor, StatementResult};
use crate::ast::{AlterAction, TableDefinition};
use crate::codec::quote_identifier;
use crate::emitter::sqlite::RESERVED_PREFIX;
use crate::emitter::{DdlEmitter, SqliteEmitter};
use crate::error::{DriverError, Result};
use crate::schema::StoredTable;

impl Executor<'_> {
    pub(super) fn execute_create_table(&mut self, def: &TableDefinition) -> Result<StatementResult> {
        if let Some(query) = &def.as_select {
            let select = self.translator().translate_query(query)?;
            let sql = format!(
                "CREATE {}TABLE {}{} AS {}",
                if def.temporary { "TEMPORARY " } else { "" },
                if def.if_not_exists { "IF NOT EXISTS " } else { "" },
                quote_identifier(&def.name),
                select
            );
            self.engine.execute(&sql, &[])?;
            return Ok(StatementResult::Affected(0));
        }

        if def.temporary {
            let stored = StoredTable::from_definition(def)?;
            let emitter = SqliteEmitter {
                temporary: true,
                if_not_exists: def.if_not_exists,
                ..Default::default()
            };
            for sql in emitter.emit(&stored) {
                self.engine.execute(&sql, &[])?;
            }
            return Ok(StatementResult::Affected(0));
        }

        if self.schema.table_exists(self.engine, &def.name)? {
            if def.if_not_exists {
                return Ok(StatementResult::Affected(0));
            }
            return Err(DriverError::InvalidInput(format!(
                "Table '{}' already exists",
                def.name
            )));
        }

        self.schema.record_create_table(self.engine, def)?;
        for sql in self.schema.build_create_table_statement(self.engine, &def.name, None)? {
            self.engine.execute(&sql, &[])?;
        }
        Ok(StatementResult::Affected(0))
    }

    /// SQLite cannot alter columns in place, so the table is rebuilt from
    /// the updated metadata and the surviving columns copied over.
    pub(super) fn execute_alter_table(
        &mut self,
        table: &str,
        actions: &[AlterAction],
    ) -> Result<StatementResult> {
        let old_columns = self.schema.column_names(self.engine, table)?;
        let stored = self.schema.record_alter_table(self.engine, table, actions)?;
        let copy = copy_columns(&old_columns, actions, &stored);
        let tmp = rebuild_table_name(table);
        info!(table, tmp = %tmp, columns = copy.len(), "rebuilding table");

        let foreign_keys = self.engine.query_value("PRAGMA foreign_keys", &[])?;
        let foreign_keys = foreign_keys.as_deref() == Some("1");
        self.engine.execute("PRAGMA foreign_keys = OFF", &[])?;

        let mut ddl = self
            .schema
            .build_create_table_statement(self.engine, table, Some(&tmp))?
            .into_iter();
        if let Some(create) = ddl.next() {
            self.engine.execute(&create, &[])?;
        }

        let targets: Vec<String> = copy.iter().map(|(_, new)| quote_identifier(new)).collect();
        let sources: Vec<String> = copy.iter().map(|(old, _)| quote_identifier(old)).collect();
        self.engine.execute(
            &format!(
                "INSERT INTO {} (rowid{}) SELECT rowid{} FROM {}",
                quote_identifier(&tmp),
                prefixed_list(&targets),
                prefixed_list(&sources),
                quote_identifier(table)
            ),
            &[],
        )?;
        self.engine
            .execute(&format!("DROP TABLE {}", quote_identifier(table)), &[])?;
        self.engine.execute(
            &format!(
                "ALTER TABLE {} RENAME TO {}",
                quote_identifier(&tmp),
                quote_identifier(table)
            ),
            &[],
        )?;

        // indexes and triggers
        for sql in ddl {
            self.engine.execute(&sql, &[])?;
        }

        if foreign_keys {
            self.engine.query("PRAGMA foreign_key_check", &[])?;
            self.engine.execute("PRAGMA foreign_keys = ON", &[])?;
        }
        Ok(StatementResult::Affected(0))
    }

    pub(super) fn execute_drop_table(
        &mut self,
        tables: &[String],
        if_exists: bool,
        temporary: bool,
    ) -> Result<StatementResult> {
        for table in tables {
            let sql = format!(
                "DROP TABLE {}{}{}",
                if if_exists { "IF EXISTS " } else { "" },
                if temporary { "\"temp\"." } else { "" },
                quote_identifier(table)
            );
            self.engine.execute(&sql, &[])?;
            if !temporary {
                self.schema.record_drop_table(self.engine, table)?;
            }
        }
        Ok(StatementResult::Affected(0))
    }
}

/// (old name, new name) of every column whose data survives the ALTER
fn copy_columns(
    old_columns: &[String],
    actions: &[AlterAction],
    altered: &StoredTable,
) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = old_columns
        .iter()
        .map(|name| (name.clone(), name.clone()))
        .collect();

    for action in actions {
        match action {
            AlterAction::DropColumn(name) => {
                pairs.retain(|(_, current)| !current.eq_ignore_ascii_case(name));
            }
            AlterAction::ChangeColumn { old_name, column } => {
                rename_pair(&mut pairs, old_name, &column.name);
            }
            AlterAction::RenameColumn { old_name, new_name } => {
                rename_pair(&mut pairs, old_name, new_name);
            }
            _ => {}
        }
    }

    pairs.retain(|(_, current)| altered.column(current).is_some());
    pairs
}

fn rename_pair(pairs: &mut [(String, String)], old_name: &str, new_name: &str) {
    if let Some(pair) = pairs
        .iter_mut()
        .find(|(_, current)| current.eq_ignore_ascii_case(old_name))
    {
        pair.1 = new_name.to_string();
    }
}

fn prefixed_list(items: &[String]) -> String {
    items.iter().map(|item| format!(", {}", item)).collect()
}

fn rebuild_table_name(table: &str) -> String {
    format!("{}tmp_{}_{:x}", RESERVED_PREFIX, table, Utc::now().timestamp_micros())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ColumnDefinition, DataType, TableOptions};

    fn table(columns: &[&str]) -> StoredTable {
        let def = TableDefinition {
            name: "t".to_string(),
            temporary: false,
            if_not_exists: false,
            columns: columns
                .iter()
                .map(|c| ColumnDefinition::new(*c, DataType::new("int")))
                .collect(),
            indexes: Vec::new(),
            options: TableOptions::default(),
            as_select: None,
        };
        StoredTable::from_definition(&def).unwrap()
    }

    fn names(columns: &[&str]) -> Vec<String> {
        columns.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_copy_columns_replays_drop_and_rename() {
        let altered = table(&["a", "c2", "d"]);
        let actions = vec![
            AlterAction::DropColumn("b".to_string()),
            AlterAction::RenameColumn {
                old_name: "c".to_string(),
                new_name: "c2".to_string(),
            },
            AlterAction::AddColumn(ColumnDefinition::new("d", DataType::new("int"))),
        ];

        let copy = copy_columns(&names(&["a", "b", "c"]), &actions, &altered);
        assert_eq!(
            copy,
            vec![
                ("a".to_string(), "a".to_string()),
                ("c".to_string(), "c2".to_string())
            ],
            "added column has no source and dropped column no target"
        );
    }

    #[test]
    fn test_copy_columns_follows_change() {
        let altered = table(&["id", "title"]);
        let actions = vec![AlterAction::ChangeColumn {
            old_name: "name".to_string(),
            column: ColumnDefinition::new("title", DataType::new("text")),
        }];

        let copy = copy_columns(&names(&["id", "name"]), &actions, &altered);
        assert_eq!(copy[1], ("name".to_string(), "title".to_string()));
    }

    #[test]
    fn test_rebuild_table_name_is_reserved() {
        let name = rebuild_table_name("posts");
        assert!(
            name.starts_with("_mysql_sqlite_tmp_posts_"),
            "unexpected rebuild name: {}",
            name
        );
    }
}
