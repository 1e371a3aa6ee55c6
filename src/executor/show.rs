// SHOW and DESCRIBE

use super::{Executor, StatementResult};
use crate::ast::{ShowFilter, ShowStatement};
use crate::engine::QueryRows;
use crate::error::Result;
use crate::schema::TableFilter;

const GRANTS_COLUMN: &str = "Grants for root@localhost";
const ROOT_GRANT: &str = "GRANT SELECT, INSERT, UPDATE, DELETE, CREATE, DROP, RELOAD, SHUTDOWN, PROCESS, FILE, REFERENCES, INDEX, ALTER, SHOW DATABASES, SUPER, CREATE TEMPORARY TABLES, LOCK TABLES, EXECUTE, REPLICATION SLAVE, REPLICATION CLIENT, CREATE VIEW, SHOW VIEW, CREATE ROUTINE, ALTER ROUTINE, CREATE USER, EVENT, TRIGGER, CREATE TABLESPACE, CREATE ROLE, DROP ROLE ON *.* TO `root`@`localhost` WITH GRANT OPTION";

impl Executor<'_> {
    pub(super) fn execute_show(&mut self, show: &ShowStatement) -> Result<StatementResult> {
        let rows = match show {
            ShowStatement::CreateTable { table } => {
                let mut rows = QueryRows::new(vec!["Table".to_string(), "Create Table".to_string()]);
                if let Some(sql) = self.schema.build_source_dialect_create_table(self.engine, table)? {
                    rows.rows.push(vec![Some(table.clone()), Some(sql)]);
                }
                rows
            }
            ShowStatement::Index { table } => self.schema.show_index(self.engine, table)?,
            ShowStatement::Tables {
                full,
                database,
                filter,
            } => {
                let database = database.as_deref().unwrap_or(self.schema.database());
                let filter = self.table_filter(filter.as_ref())?;
                self.schema
                    .list_tables(self.engine, database, *full, filter.as_ref())?
            }
            ShowStatement::TableStatus { database, filter } => {
                let database = database.as_deref().unwrap_or(self.schema.database());
                let filter = self.table_filter(filter.as_ref())?;
                self.schema
                    .table_status(self.engine, database, filter.as_ref())?
            }
            ShowStatement::Columns { table } => self.schema.describe(self.engine, table)?,
            ShowStatement::Grants => {
                let mut rows = QueryRows::new(vec![GRANTS_COLUMN.to_string()]);
                rows.rows.push(vec![Some(ROOT_GRANT.to_string())]);
                rows
            }
            ShowStatement::Variables => return Ok(StatementResult::Bool(true)),
        };
        Ok(StatementResult::rows(rows))
    }

    pub(super) fn execute_describe(&mut self, table: &str) -> Result<StatementResult> {
        let rows = self.schema.describe(self.engine, table)?;
        Ok(StatementResult::rows(rows))
    }

    fn table_filter(&self, filter: Option<&ShowFilter>) -> Result<Option<TableFilter>> {
        Ok(match filter {
            Some(ShowFilter::Like(pattern)) => Some(TableFilter::Like(pattern.clone())),
            Some(ShowFilter::Where(expr)) => {
                Some(TableFilter::Where(self.translator().translate_expr(expr)?))
            }
            None => None,
        })
    }
}
