// Driver façade
//
// Parses MySQL text, runs each statement through the executors and shapes
// the last result the way a MySQL client receives it.

use rusqlite::Connection;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::config::DriverConfig;
use crate::engine::{Engine, NativeStatement, QueryRows};
use crate::error::{DriverError, QueryError, Result};
use crate::executor::{Executor, StatementResult, TransactionManager};
use crate::parser::{MySqlParser, SqlParser};
use crate::schema::InformationSchema;
use crate::translator::TranslationContext;

/// How row keys are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Keys are column names
    #[default]
    Associative,
    /// Keys are column positions, starting at 0
    Numeric,
}

/// One result row; keys keep the select-list order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    values: Vec<(String, Option<String>)>,
}

impl Row {
    pub fn new(values: Vec<(String, Option<String>)>) -> Self {
        Self { values }
    }

    /// Value of the first column with this key; None for NULL or a missing column
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| name == key)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.iter().any(|(name, _)| name == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> &[(String, Option<String>)] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (key, value) in &self.values {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    Bool(bool),
    AffectedRows(u64),
    Rows(Vec<Row>),
}

impl QueryResult {
    pub fn rows(&self) -> &[Row] {
        match self {
            QueryResult::Rows(rows) => rows,
            _ => &[],
        }
    }

    pub fn affected_rows(&self) -> Option<u64> {
        match self {
            QueryResult::AffectedRows(n) => Some(*n),
            _ => None,
        }
    }

    fn from_statement(result: StatementResult, mode: FetchMode) -> Self {
        match result {
            StatementResult::Rows { rows, .. } => QueryResult::Rows(shape_rows(rows, mode)),
            StatementResult::Affected(n) => QueryResult::AffectedRows(n),
            StatementResult::Bool(b) => QueryResult::Bool(b),
        }
    }
}

fn shape_rows(rows: QueryRows, mode: FetchMode) -> Vec<Row> {
    let keys: Vec<String> = match mode {
        FetchMode::Associative => rows.columns,
        FetchMode::Numeric => (0..rows.columns.len()).map(|i| i.to_string()).collect(),
    };
    rows.rows
        .into_iter()
        .map(|values| Row::new(keys.iter().cloned().zip(values).collect()))
        .collect()
}

/// Result of one `Driver::query` call with the native statements it ran
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOutcome {
    pub result: QueryResult,
    native_statements: Vec<NativeStatement>,
}

impl QueryOutcome {
    pub fn native_statements(&self) -> &[NativeStatement] {
        &self.native_statements
    }

    pub fn into_result(self) -> QueryResult {
        self.result
    }
}

pub struct Driver {
    engine: Engine,
    parser: MySqlParser,
    schema: InformationSchema,
    transactions: TransactionManager,
    /// FOUND_ROWS() as seen by the next statement
    found_rows: u64,
}

impl Driver {
    pub fn open(config: &DriverConfig) -> Result<Self> {
        config.validate()?;
        let mut engine = Engine::open(config)?;
        let schema = InformationSchema::new(config.database.clone());
        schema.ensure_tables(&mut engine)?;
        engine.clear_log();

        Ok(Self {
            engine,
            parser: MySqlParser::new(),
            schema,
            transactions: TransactionManager::new(),
            found_rows: 0,
        })
    }

    pub fn open_in_memory(database: &str) -> Result<Self> {
        Self::open(&DriverConfig::in_memory(database))
    }

    /// Run one or more `;`-separated statements and return the last result.
    ///
    /// Each statement is atomic on its own: it commits (or releases its
    /// savepoint) before the next one starts. When a later statement fails,
    /// the earlier ones stay applied, along with the FOUND_ROWS value they set.
    pub fn query(&mut self, sql: &str) -> std::result::Result<QueryOutcome, QueryError> {
        self.query_with_mode(sql, FetchMode::Associative)
    }

    pub fn query_with_mode(
        &mut self,
        sql: &str,
        mode: FetchMode,
    ) -> std::result::Result<QueryOutcome, QueryError> {
        self.engine.clear_log();
        match self.run(sql) {
            Ok(result) => Ok(QueryOutcome {
                result: QueryResult::from_statement(result, mode),
                native_statements: self.engine.log().to_vec(),
            }),
            Err(source) => {
                debug!(error = %source, "query failed");
                Err(QueryError {
                    query: sql.to_string(),
                    native_statements: self.engine.log().to_vec(),
                    source,
                })
            }
        }
    }

    fn run(&mut self, sql: &str) -> Result<StatementResult> {
        let statements = self.parser.parse(sql)?;
        let mut last = None;
        for statement in &statements {
            let ctx = TranslationContext::new(self.schema.database(), self.found_rows);
            let result = Executor::new(
                &mut self.engine,
                &self.schema,
                &mut self.transactions,
                &ctx,
            )
            .execute(statement)?;
            self.found_rows = result.found_rows();
            last = Some(result);
        }
        last.ok_or_else(|| DriverError::InvalidInput("Query was empty".to_string()))
    }

    /// Native statements of the most recent call, successful or not
    pub fn last_native_statements(&self) -> &[NativeStatement] {
        self.engine.log()
    }

    pub fn insert_id(&self) -> i64 {
        self.engine.last_insert_rowid()
    }

    pub fn sqlite_version(&self) -> &'static str {
        rusqlite::version()
    }

    pub fn connection(&self) -> &Connection {
        self.engine.connection()
    }

    pub fn transaction_depth(&self) -> usize {
        self.transactions.depth()
    }

    pub fn found_rows(&self) -> u64 {
        self.found_rows
    }

    pub fn database(&self) -> &str {
        self.schema.database()
    }
}
