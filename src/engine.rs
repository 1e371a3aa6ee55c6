// SQLite connection wrapper
//
// Every native statement goes through here so it can be logged for the
// caller. Fetched values are stringified the way a MySQL client receives
// them, with NULL kept as None.

use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection, Row};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::DriverConfig;
use crate::error::{DriverError, Result};

/// Oldest SQLite with STRICT tables
const MIN_SQLITE_VERSION: i32 = 3_037_000;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// One statement sent to SQLite, as logged for the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeStatement {
    pub sql: String,
    #[serde(serialize_with = "serialize_params")]
    pub params: Vec<Value>,
}

fn serialize_params<S>(params: &[Value], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let rendered: Vec<Option<String>> = params.iter().map(|v| value_text(v.into())).collect();
    rendered.serialize(serializer)
}

/// Rows fetched from SQLite with stringified values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryRows {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub struct Engine {
    conn: Connection,
    log: Vec<NativeStatement>,
}

impl Engine {
    /// Open and configure a connection.
    ///
    /// The information schema tables are created by the caller once the
    /// engine exists.
    pub fn open(config: &DriverConfig) -> Result<Self> {
        let version = rusqlite::version_number();
        if version < MIN_SQLITE_VERSION {
            return Err(DriverError::Config(format!(
                "SQLite 3.37.0 or newer is required, found {}",
                rusqlite::version()
            )));
        }

        let conn = match &config.path {
            Some(path) => Connection::open(path),
            None => Connection::open_in_memory(),
        }
        .map_err(|source| native_error("open", 0, source))?;

        let mut engine = Self {
            conn,
            log: Vec::new(),
        };
        engine.execute("PRAGMA foreign_keys = ON", &[])?;
        engine
            .conn
            .busy_timeout(config.timeout)
            .map_err(|source| native_error("busy_timeout", 0, source))?;
        if let Some(mode) = config.journal_mode {
            engine.query(&format!("PRAGMA journal_mode = {}", mode.as_str()), &[])?;
        }
        register_functions(&engine.conn)?;
        engine.log.clear();

        info!(
            sqlite = rusqlite::version(),
            path = ?config.path,
            database = %config.database,
            "connection ready"
        );
        Ok(engine)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run a statement that returns no rows; yields the number of changed rows
    pub fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize> {
        self.record(sql, params);
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|source| native_error(sql, params.len(), source))?;
        stmt.execute(params_from_iter(params.iter()))
            .map_err(|source| native_error(sql, params.len(), source))
    }

    /// Run a statement and fetch every row as text
    pub fn query(&mut self, sql: &str, params: &[Value]) -> Result<QueryRows> {
        self.record(sql, params);
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|source| native_error(sql, params.len(), source))?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = columns.len();
        let mut result = QueryRows::new(columns);

        let mut rows = stmt
            .query(params_from_iter(params.iter()))
            .map_err(|source| native_error(sql, params.len(), source))?;
        while let Some(row) = rows
            .next()
            .map_err(|source| native_error(sql, params.len(), source))?
        {
            let mut values = Vec::with_capacity(width);
            for index in 0..width {
                let value = row
                    .get_ref(index)
                    .map_err(|source| native_error(sql, params.len(), source))?;
                values.push(value_text(value));
            }
            result.rows.push(values);
        }
        Ok(result)
    }

    /// Run a query and map each row with `f`
    pub fn query_map<T, F>(&mut self, sql: &str, params: &[Value], mut f: F) -> Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.record(sql, params);
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|source| native_error(sql, params.len(), source))?;
        let mapped = stmt
            .query_map(params_from_iter(params.iter()), |row| f(row))
            .map_err(|source| native_error(sql, params.len(), source))?;
        mapped
            .collect::<rusqlite::Result<Vec<T>>>()
            .map_err(|source| native_error(sql, params.len(), source))
    }

    /// First column of the first row, if any
    pub fn query_value(&mut self, sql: &str, params: &[Value]) -> Result<Option<String>> {
        let rows = self.query(sql, params)?;
        Ok(rows
            .rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .flatten())
    }

    pub fn last_insert_rowid(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    pub fn log(&self) -> &[NativeStatement] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn record(&mut self, sql: &str, params: &[Value]) {
        debug!(sql, params = params.len(), "native statement");
        self.log.push(NativeStatement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
    }
}

fn native_error(sql: &str, params: usize, source: rusqlite::Error) -> DriverError {
    DriverError::Native {
        sql: sql.to_string(),
        params,
        source,
    }
}

/// Stringify a fetched value the way SQLite's text conversion does
pub fn value_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(real_text(f)),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn real_text(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

// ========== User-defined functions ==========

fn register_functions(conn: &Connection) -> Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;
    conn.create_scalar_function("regexp", 2, flags, regexp)
        .map_err(|source| native_error("create_function regexp", 0, source))?;
    conn.create_scalar_function("_helper_like_to_glob_pattern", 1, flags, |ctx| {
        Ok(text_arg(ctx, 0)?.map(|pattern| like_to_glob(&pattern)))
    })
    .map_err(|source| native_error("create_function _helper_like_to_glob_pattern", 0, source))?;
    Ok(())
}

/// `subject REGEXP pattern`, called by SQLite as regexp(pattern, subject).
///
/// Matching is case-insensitive unless the pattern starts with a NUL byte,
/// which is how REGEXP BINARY is passed through.
fn regexp(ctx: &Context<'_>) -> rusqlite::Result<Option<bool>> {
    if matches!(ctx.get_raw(0), ValueRef::Null) || matches!(ctx.get_raw(1), ValueRef::Null) {
        return Ok(None);
    }
    let pattern: Arc<Regex> = ctx.get_or_create_aux(0, |raw| -> std::result::Result<_, BoxError> {
        let text = value_text(raw).unwrap_or_default();
        Ok(compile_pattern(&text)?)
    })?;
    let subject = text_arg(ctx, 1)?.unwrap_or_default();
    Ok(Some(pattern.is_match(&subject)))
}

fn compile_pattern(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    match pattern.strip_prefix('\0') {
        Some(case_sensitive) => Regex::new(case_sensitive),
        None => RegexBuilder::new(pattern).case_insensitive(true).build(),
    }
}

fn text_arg(ctx: &Context<'_>, index: usize) -> rusqlite::Result<Option<String>> {
    Ok(value_text(ctx.get_raw(index)))
}

/// Convert a LIKE pattern (with `\` escapes) to an equivalent GLOB pattern
pub fn like_to_glob(pattern: &str) -> String {
    let mut glob = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => push_glob_literal(&mut glob, escaped),
                None => glob.push('\\'),
            },
            '%' => glob.push('*'),
            '_' => glob.push('?'),
            other => push_glob_literal(&mut glob, other),
        }
    }
    glob
}

fn push_glob_literal(glob: &mut String, c: char) {
    match c {
        '*' | '?' | '[' => {
            glob.push('[');
            glob.push(c);
            glob.push(']');
        }
        _ => glob.push(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        Engine::open(&DriverConfig::default()).unwrap()
    }

    // ========== Statement log ==========

    #[test]
    fn test_statements_are_logged_with_params() {
        let mut engine = engine();
        engine.execute("CREATE TABLE t (a TEXT)", &[]).unwrap();
        engine
            .execute("INSERT INTO t VALUES (?)", &[Value::Text("x".into())])
            .unwrap();

        let log = engine.log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].sql, "INSERT INTO t VALUES (?)");
        assert_eq!(log[1].params, vec![Value::Text("x".into())]);
    }

    #[test]
    fn test_failed_statement_is_still_logged() {
        let mut engine = engine();
        match engine.execute("SELECT * FROM missing", &[]) {
            Err(DriverError::Native { sql, .. }) => assert_eq!(sql, "SELECT * FROM missing"),
            other => panic!("Expected Native error, got {:?}", other),
        }
        assert_eq!(engine.log().len(), 1, "Failed statement should be in the log");
    }

    // ========== Stringified rows ==========

    #[test]
    fn test_query_stringifies_values() {
        let mut engine = engine();
        let rows = engine
            .query("SELECT 1 AS i, 2.5 AS r, 3.0 AS w, 'a' AS t, NULL AS n", &[])
            .unwrap();
        assert_eq!(rows.columns, vec!["i", "r", "w", "t", "n"]);
        assert_eq!(
            rows.rows[0],
            vec![
                Some("1".to_string()),
                Some("2.5".to_string()),
                Some("3.0".to_string()),
                Some("a".to_string()),
                None
            ]
        );
    }

    #[test]
    fn test_query_value() {
        let mut engine = engine();
        assert_eq!(
            engine.query_value("SELECT 40 + 2", &[]).unwrap(),
            Some("42".to_string())
        );
        assert_eq!(engine.query_value("SELECT 1 WHERE 0", &[]).unwrap(), None);
    }

    // ========== UDFs ==========

    #[test]
    fn test_regexp_is_case_insensitive_by_default() {
        let mut engine = engine();
        let value = engine.query_value("SELECT 'Hello' REGEXP '^h'", &[]).unwrap();
        assert_eq!(value.as_deref(), Some("1"));
    }

    #[test]
    fn test_regexp_binary_is_case_sensitive() {
        let mut engine = engine();
        let value = engine
            .query_value("SELECT 'Hello' REGEXP CHAR(0) || '^h'", &[])
            .unwrap();
        assert_eq!(value.as_deref(), Some("0"));
    }

    #[test]
    fn test_regexp_null_propagates() {
        let mut engine = engine();
        let value = engine.query_value("SELECT NULL REGEXP 'a'", &[]).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_like_to_glob() {
        assert_eq!(like_to_glob("ab%"), "ab*");
        assert_eq!(like_to_glob("a_c"), "a?c");
        assert_eq!(like_to_glob("100\\%"), "100%");
        assert_eq!(like_to_glob("what?*"), "what[?][*]");
    }

    #[test]
    fn test_glob_helper_is_case_sensitive() {
        let mut engine = engine();
        let value = engine
            .query_value("SELECT 'Abc' GLOB _helper_like_to_glob_pattern('a%')", &[])
            .unwrap();
        assert_eq!(value.as_deref(), Some("0"));
        let value = engine
            .query_value("SELECT 'abc' GLOB _helper_like_to_glob_pattern('a%')", &[])
            .unwrap();
        assert_eq!(value.as_deref(), Some("1"));
    }
}
