// Statement executors
//
// One executor per statement family. Every statement other than transaction
// control runs inside its own transaction level, so a failure half way
// through a multi-statement translation leaves nothing behind.

mod ddl;
mod dml;
mod select;
mod show;
pub mod transaction;

pub use transaction::TransactionManager;

use tracing::{debug, warn};

use crate::ast::{Statement, TransactionCommand};
use crate::engine::{Engine, QueryRows};
use crate::error::{DriverError, Result};
use crate::schema::InformationSchema;
use crate::translator::{TranslationContext, Translator};

/// What a statement produced, before it is shaped for the caller
#[derive(Debug, Clone, PartialEq)]
pub enum StatementResult {
    Rows { rows: QueryRows, found_rows: u64 },
    Affected(u64),
    Bool(bool),
}

impl StatementResult {
    fn rows(rows: QueryRows) -> Self {
        let found_rows = rows.len() as u64;
        StatementResult::Rows { rows, found_rows }
    }

    /// FOUND_ROWS() for the next statement
    pub fn found_rows(&self) -> u64 {
        match self {
            StatementResult::Rows { found_rows, .. } => *found_rows,
            _ => 0,
        }
    }
}

pub struct Executor<'a> {
    engine: &'a mut Engine,
    schema: &'a InformationSchema,
    transactions: &'a mut TransactionManager,
    ctx: &'a TranslationContext,
}

impl<'a> Executor<'a> {
    pub fn new(
        engine: &'a mut Engine,
        schema: &'a InformationSchema,
        transactions: &'a mut TransactionManager,
        ctx: &'a TranslationContext,
    ) -> Self {
        Self {
            engine,
            schema,
            transactions,
            ctx,
        }
    }

    pub fn execute(&mut self, statement: &Statement) -> Result<StatementResult> {
        debug!(kind = statement.kind(), "executing statement");
        if let Statement::Transaction(command) = statement {
            return self.execute_transaction(*command);
        }

        self.transactions.begin(self.engine)?;
        match self.dispatch(statement) {
            Ok(result) => {
                self.transactions.commit(self.engine)?;
                Ok(result)
            }
            Err(err) => {
                if let Err(rollback_err) = self.transactions.rollback(self.engine) {
                    warn!(error = %rollback_err, "rollback after failed statement failed");
                }
                Err(err)
            }
        }
    }

    fn dispatch(&mut self, statement: &Statement) -> Result<StatementResult> {
        match statement {
            Statement::Select {
                query,
                calc_found_rows,
            } => self.execute_select(query, *calc_found_rows),
            Statement::Insert(insert) => self.execute_insert(insert),
            Statement::Update(update) => self.execute_update(update),
            Statement::Delete(delete) => self.execute_delete(delete),
            Statement::CreateTable(def) => self.execute_create_table(def),
            Statement::AlterTable { table, actions } => self.execute_alter_table(table, actions),
            Statement::DropTable {
                tables,
                if_exists,
                temporary,
            } => self.execute_drop_table(tables, *if_exists, *temporary),
            Statement::Show(show) => self.execute_show(show),
            Statement::Describe { table } => self.execute_describe(table),
            Statement::Set => Ok(StatementResult::Affected(0)),
            Statement::Use { database } => self.execute_use(database),
            Statement::Transaction(command) => self.execute_transaction(*command),
        }
    }

    fn execute_transaction(&mut self, command: TransactionCommand) -> Result<StatementResult> {
        match command {
            TransactionCommand::Begin => self.transactions.begin(self.engine)?,
            TransactionCommand::Commit => self.transactions.commit(self.engine)?,
            TransactionCommand::Rollback => self.transactions.rollback_all(self.engine)?,
        }
        Ok(StatementResult::Bool(true))
    }

    fn execute_use(&mut self, database: &str) -> Result<StatementResult> {
        if database.eq_ignore_ascii_case(self.schema.database()) {
            return Ok(StatementResult::Affected(0));
        }
        Err(DriverError::InvalidInput(format!("Unknown database '{}'", database)))
    }

    fn translator(&self) -> Translator<'a> {
        Translator::new(self.ctx)
    }

    /// Number of rows changed by the last DML statement
    fn changes(&mut self) -> Result<u64> {
        let value = self.engine.query_value("SELECT CHANGES()", &[])?;
        Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
    }
}
