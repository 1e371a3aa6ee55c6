// Information schema store
//
// Three SQLite tables mirror MySQL's information_schema TABLES, COLUMNS and
// STATISTICS. They are the source of truth for SHOW/DESCRIBE and for
// regenerating the physical table on ALTER.

pub mod rows;
pub mod types;

pub use rows::{ColumnRow, StatisticsRow, StoredIndex, StoredTable, TableRow};

use rusqlite::types::Value;
use tracing::debug;

use crate::ast::{AlterAction, TableDefinition};
use crate::codec::quote_identifier;
use crate::emitter::{DdlEmitter, MySqlEmitter, SqliteEmitter};
use crate::engine::{Engine, QueryRows};
use crate::error::{DriverError, Result};

pub const TABLES_TABLE: &str = "_mysql_information_schema_tables";
pub const COLUMNS_TABLE: &str = "_mysql_information_schema_columns";
pub const STATISTICS_TABLE: &str = "_mysql_information_schema_statistics";

const CREATE_TABLES_TABLE: &str = "CREATE TABLE IF NOT EXISTS _mysql_information_schema_tables (
  TABLE_CATALOG TEXT NOT NULL DEFAULT 'def',
  TABLE_SCHEMA TEXT NOT NULL,
  TABLE_NAME TEXT NOT NULL COLLATE NOCASE,
  TABLE_TYPE TEXT NOT NULL,
  ENGINE TEXT NOT NULL,
  VERSION INTEGER NOT NULL DEFAULT 10,
  ROW_FORMAT TEXT NOT NULL,
  TABLE_ROWS INTEGER NOT NULL DEFAULT 0,
  AVG_ROW_LENGTH INTEGER NOT NULL DEFAULT 0,
  DATA_LENGTH INTEGER NOT NULL DEFAULT 0,
  MAX_DATA_LENGTH INTEGER NOT NULL DEFAULT 0,
  INDEX_LENGTH INTEGER NOT NULL DEFAULT 0,
  DATA_FREE INTEGER NOT NULL DEFAULT 0,
  AUTO_INCREMENT INTEGER,
  CREATE_TIME TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
  UPDATE_TIME TEXT,
  CHECK_TIME TEXT,
  TABLE_COLLATION TEXT NOT NULL,
  CHECKSUM INTEGER,
  CREATE_OPTIONS TEXT NOT NULL DEFAULT '',
  TABLE_COMMENT TEXT NOT NULL DEFAULT '',
  PRIMARY KEY (TABLE_SCHEMA, TABLE_NAME)
) STRICT";

const CREATE_COLUMNS_TABLE: &str = "CREATE TABLE IF NOT EXISTS _mysql_information_schema_columns (
  TABLE_CATALOG TEXT NOT NULL DEFAULT 'def',
  TABLE_SCHEMA TEXT NOT NULL,
  TABLE_NAME TEXT NOT NULL COLLATE NOCASE,
  COLUMN_NAME TEXT NOT NULL COLLATE NOCASE,
  ORDINAL_POSITION INTEGER NOT NULL,
  COLUMN_DEFAULT TEXT,
  IS_NULLABLE TEXT NOT NULL,
  DATA_TYPE TEXT NOT NULL,
  CHARACTER_MAXIMUM_LENGTH INTEGER,
  CHARACTER_OCTET_LENGTH INTEGER,
  NUMERIC_PRECISION INTEGER,
  NUMERIC_SCALE INTEGER,
  DATETIME_PRECISION INTEGER,
  CHARACTER_SET_NAME TEXT,
  COLLATION_NAME TEXT,
  COLUMN_TYPE TEXT NOT NULL,
  COLUMN_KEY TEXT NOT NULL DEFAULT '',
  EXTRA TEXT NOT NULL DEFAULT '',
  PRIVILEGES TEXT NOT NULL,
  COLUMN_COMMENT TEXT NOT NULL DEFAULT '',
  GENERATION_EXPRESSION TEXT NOT NULL DEFAULT '',
  SRS_ID INTEGER,
  PRIMARY KEY (TABLE_SCHEMA, TABLE_NAME, COLUMN_NAME)
) STRICT";

const CREATE_STATISTICS_TABLE: &str = "CREATE TABLE IF NOT EXISTS _mysql_information_schema_statistics (
  TABLE_CATALOG TEXT NOT NULL DEFAULT 'def',
  TABLE_SCHEMA TEXT NOT NULL,
  TABLE_NAME TEXT NOT NULL COLLATE NOCASE,
  NON_UNIQUE INTEGER NOT NULL,
  INDEX_SCHEMA TEXT NOT NULL,
  INDEX_NAME TEXT NOT NULL COLLATE NOCASE,
  SEQ_IN_INDEX INTEGER NOT NULL,
  COLUMN_NAME TEXT COLLATE NOCASE,
  COLLATION TEXT,
  CARDINALITY INTEGER,
  SUB_PART INTEGER,
  PACKED TEXT,
  NULLABLE TEXT NOT NULL,
  INDEX_TYPE TEXT NOT NULL,
  COMMENT TEXT NOT NULL DEFAULT '',
  INDEX_COMMENT TEXT NOT NULL DEFAULT '',
  IS_VISIBLE TEXT NOT NULL DEFAULT 'YES',
  EXPRESSION TEXT,
  PRIMARY KEY (TABLE_SCHEMA, TABLE_NAME, INDEX_NAME, SEQ_IN_INDEX)
) STRICT";

/// Single aggregate pass: PRIMARY > UNIQUE (first position) > any index
/// (first position) > ''
const RECOMPUTE_KEYS: &str = "WITH key_info AS (
  SELECT
    column_name,
    MAX(index_name = 'PRIMARY') AS is_pri,
    MAX(non_unique = 0 AND seq_in_index = 1) AS is_uni,
    MAX(seq_in_index = 1) AS is_mul
  FROM _mysql_information_schema_statistics
  WHERE table_schema = ? AND table_name = ?
  GROUP BY column_name
)
UPDATE _mysql_information_schema_columns AS c
SET column_key = CASE
    WHEN key_info.is_pri THEN 'PRI'
    WHEN key_info.is_uni THEN 'UNI'
    WHEN key_info.is_mul THEN 'MUL'
    ELSE ''
  END,
  is_nullable = CASE WHEN key_info.is_pri THEN 'NO' ELSE c.is_nullable END
FROM key_info
WHERE c.table_schema = ?
  AND c.table_name = ?
  AND key_info.column_name = c.column_name";

/// LIKE pattern or an already-translated WHERE condition for SHOW
#[derive(Debug, Clone, PartialEq)]
pub enum TableFilter {
    Like(String),
    Where(String),
}

pub struct InformationSchema {
    database: String,
}

impl InformationSchema {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn ensure_tables(&self, engine: &mut Engine) -> Result<()> {
        for ddl in [CREATE_TABLES_TABLE, CREATE_COLUMNS_TABLE, CREATE_STATISTICS_TABLE] {
            engine.execute(ddl, &[])?;
        }
        Ok(())
    }

    pub fn table_exists(&self, engine: &mut Engine, table: &str) -> Result<bool> {
        let found = engine.query_value(
            "SELECT 1 FROM _mysql_information_schema_tables WHERE table_schema = ? AND table_name = ?",
            &[self.db(), text(table)],
        )?;
        Ok(found.is_some())
    }

    // ========== DDL recording ==========

    pub fn record_create_table(&self, engine: &mut Engine, def: &TableDefinition) -> Result<StoredTable> {
        let stored = StoredTable::from_definition(def)?;
        self.insert_table_row(engine, &stored.table)?;
        self.insert_rows(engine, &stored)?;
        self.recompute_keys(engine, &stored.table.name)?;
        debug!(table = %def.name, columns = stored.columns.len(), "recorded CREATE TABLE");
        Ok(stored)
    }

    pub fn record_alter_table(
        &self,
        engine: &mut Engine,
        table: &str,
        actions: &[AlterAction],
    ) -> Result<StoredTable> {
        let mut stored = self.load_table(engine, table)?;
        let mut unique_dropped = false;
        for action in actions {
            if let AlterAction::DropColumn(name) = action {
                unique_dropped |= stored.drops_unique_index(name);
            }
            stored.apply(action)?;
        }
        stored.compute_keys();
        // a UNIQUE index lost with its column leaves the remaining unique
        // columns unmarked; their indexes stay in the statistics
        if unique_dropped {
            stored.clear_unique_keys();
        }

        self.delete_rows(engine, table, false)?;
        self.insert_rows(engine, &stored)?;
        self.recompute_keys(engine, table)?;
        if unique_dropped {
            engine.execute(
                "UPDATE _mysql_information_schema_columns SET column_key = '' WHERE table_schema = ? AND table_name = ? AND column_key = 'UNI'",
                &[self.db(), text(table)],
            )?;
        }
        debug!(table, actions = actions.len(), "recorded ALTER TABLE");
        Ok(stored)
    }

    pub fn record_drop_table(&self, engine: &mut Engine, table: &str) -> Result<()> {
        self.delete_rows(engine, table, true)
    }

    fn insert_table_row(&self, engine: &mut Engine, table: &TableRow) -> Result<()> {
        engine.execute(
            "INSERT INTO _mysql_information_schema_tables (table_schema, table_name, table_type, engine, row_format, table_collation, table_comment, auto_increment) VALUES (?, ?, 'BASE TABLE', ?, ?, ?, ?, ?)",
            &[
                self.db(),
                text(&table.name),
                text(&table.engine),
                text(&table.row_format),
                text(&table.collation),
                text(&table.comment),
                Value::from(table.auto_increment),
            ],
        )?;
        Ok(())
    }

    fn insert_rows(&self, engine: &mut Engine, stored: &StoredTable) -> Result<()> {
        let table = &stored.table.name;
        for column in &stored.columns {
            engine.execute(
                "INSERT INTO _mysql_information_schema_columns (table_schema, table_name, column_name, ordinal_position, column_default, is_nullable, data_type, character_maximum_length, character_octet_length, numeric_precision, numeric_scale, datetime_precision, character_set_name, collation_name, column_type, column_key, extra, privileges, column_comment) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'select,insert,update,references', ?)",
                &[
                    self.db(),
                    text(table),
                    text(&column.name),
                    Value::Integer(column.ordinal_position),
                    Value::from(column.default.clone()),
                    text(column.is_nullable_text()),
                    text(&column.data_type),
                    Value::from(column.character_maximum_length),
                    Value::from(column.character_octet_length),
                    Value::from(column.numeric_precision),
                    Value::from(column.numeric_scale),
                    Value::from(column.datetime_precision),
                    Value::from(column.character_set_name.clone()),
                    Value::from(column.collation_name.clone()),
                    text(&column.column_type),
                    text(&column.column_key),
                    text(&column.extra),
                    text(&column.comment),
                ],
            )?;
        }

        for stat in &stored.statistics {
            let collation = if stat.index_type == "FULLTEXT" {
                Value::Null
            } else {
                text("A")
            };
            engine.execute(
                "INSERT INTO _mysql_information_schema_statistics (table_schema, table_name, non_unique, index_schema, index_name, seq_in_index, column_name, collation, cardinality, sub_part, nullable, index_type) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?)",
                &[
                    self.db(),
                    text(table),
                    Value::Integer(i64::from(stat.non_unique)),
                    self.db(),
                    text(&stat.index_name),
                    Value::Integer(stat.seq_in_index),
                    text(&stat.column_name),
                    collation,
                    Value::from(stat.sub_part),
                    text(if stat.nullable { "YES" } else { "" }),
                    text(&stat.index_type),
                ],
            )?;
        }
        Ok(())
    }

    fn delete_rows(&self, engine: &mut Engine, table: &str, with_table_row: bool) -> Result<()> {
        let mut targets = vec![COLUMNS_TABLE, STATISTICS_TABLE];
        if with_table_row {
            targets.insert(0, TABLES_TABLE);
        }
        for target in targets {
            engine.execute(
                &format!(
                    "DELETE FROM {} WHERE table_schema = ? AND table_name = ?",
                    target
                ),
                &[self.db(), text(table)],
            )?;
        }
        Ok(())
    }

    fn recompute_keys(&self, engine: &mut Engine, table: &str) -> Result<()> {
        engine.execute(
            "UPDATE _mysql_information_schema_columns SET column_key = '' WHERE table_schema = ? AND table_name = ?",
            &[self.db(), text(table)],
        )?;
        engine.execute(
            RECOMPUTE_KEYS,
            &[self.db(), text(table), self.db(), text(table)],
        )?;
        Ok(())
    }

    // ========== Typed accessors ==========

    pub fn load_table(&self, engine: &mut Engine, table: &str) -> Result<StoredTable> {
        let tables = engine.query_map(
            "SELECT table_name, engine, row_format, table_collation, table_comment, auto_increment FROM _mysql_information_schema_tables WHERE table_schema = ? AND table_name = ?",
            &[self.db(), text(table)],
            |row| {
                Ok(TableRow {
                    name: row.get(0)?,
                    engine: row.get(1)?,
                    row_format: row.get(2)?,
                    collation: row.get(3)?,
                    comment: row.get(4)?,
                    auto_increment: row.get(5)?,
                })
            },
        )?;
        let table_row = tables
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::UnknownTable(table.to_string()))?;

        let columns = engine.query_map(
            "SELECT column_name, ordinal_position, column_default, is_nullable, data_type, column_type, character_maximum_length, character_octet_length, numeric_precision, numeric_scale, datetime_precision, character_set_name, collation_name, column_key, extra, column_comment FROM _mysql_information_schema_columns WHERE table_schema = ? AND table_name = ? ORDER BY ordinal_position",
            &[self.db(), text(table)],
            |row| {
                let nullable: String = row.get(3)?;
                Ok(ColumnRow {
                    name: row.get(0)?,
                    ordinal_position: row.get(1)?,
                    default: row.get(2)?,
                    nullable: nullable == "YES",
                    data_type: row.get(4)?,
                    column_type: row.get(5)?,
                    character_maximum_length: row.get(6)?,
                    character_octet_length: row.get(7)?,
                    numeric_precision: row.get(8)?,
                    numeric_scale: row.get(9)?,
                    datetime_precision: row.get(10)?,
                    character_set_name: row.get(11)?,
                    collation_name: row.get(12)?,
                    column_key: row.get(13)?,
                    extra: row.get(14)?,
                    comment: row.get(15)?,
                })
            },
        )?;

        let statistics = engine.query_map(
            "SELECT non_unique, index_name, seq_in_index, column_name, sub_part, nullable, index_type FROM _mysql_information_schema_statistics WHERE table_schema = ? AND table_name = ? ORDER BY rowid",
            &[self.db(), text(table)],
            |row| {
                let non_unique: i64 = row.get(0)?;
                let nullable: String = row.get(5)?;
                Ok(StatisticsRow {
                    non_unique: non_unique != 0,
                    index_name: row.get(1)?,
                    seq_in_index: row.get(2)?,
                    column_name: row.get(3)?,
                    sub_part: row.get(4)?,
                    nullable: nullable == "YES",
                    index_type: row.get(6)?,
                })
            },
        )?;

        Ok(StoredTable {
            table: table_row,
            columns,
            statistics,
        })
    }

    pub fn column_names(&self, engine: &mut Engine, table: &str) -> Result<Vec<String>> {
        engine.query_map(
            "SELECT column_name FROM _mysql_information_schema_columns WHERE table_schema = ? AND table_name = ? ORDER BY ordinal_position",
            &[self.db(), text(table)],
            |row| row.get(0),
        )
    }

    /// Physical DDL: CREATE TABLE, then CREATE INDEX and CREATE TRIGGER statements
    pub fn build_create_table_statement(
        &self,
        engine: &mut Engine,
        table: &str,
        rename_to: Option<&str>,
    ) -> Result<Vec<String>> {
        let stored = self.load_table(engine, table)?;
        let emitter = SqliteEmitter {
            rename_to,
            ..Default::default()
        };
        Ok(emitter.emit(&stored))
    }

    /// SHOW CREATE TABLE text; None when the table is not recorded
    pub fn build_source_dialect_create_table(
        &self,
        engine: &mut Engine,
        table: &str,
    ) -> Result<Option<String>> {
        if !self.table_exists(engine, table)? {
            return Ok(None);
        }
        let stored = self.load_table(engine, table)?;
        Ok(MySqlEmitter.emit(&stored).into_iter().next())
    }

    pub fn list_tables(
        &self,
        engine: &mut Engine,
        database: &str,
        full: bool,
        filter: Option<&TableFilter>,
    ) -> Result<QueryRows> {
        let mut select = format!(
            "SELECT table_name AS {}",
            quote_identifier(&format!("Tables_in_{}", database))
        );
        if full {
            select.push_str(", table_type AS `Table_type`");
        }
        select.push_str(" FROM _mysql_information_schema_tables WHERE table_schema = ?");
        self.filtered_listing(engine, select, database, filter)
    }

    pub fn table_status(
        &self,
        engine: &mut Engine,
        database: &str,
        filter: Option<&TableFilter>,
    ) -> Result<QueryRows> {
        let select = "SELECT table_name AS `Name`, engine AS `Engine`, version AS `Version`, row_format AS `Row_format`, table_rows AS `Rows`, avg_row_length AS `Avg_row_length`, data_length AS `Data_length`, max_data_length AS `Max_data_length`, index_length AS `Index_length`, data_free AS `Data_free`, auto_increment AS `Auto_increment`, create_time AS `Create_time`, update_time AS `Update_time`, check_time AS `Check_time`, table_collation AS `Collation`, checksum AS `Checksum`, create_options AS `Create_options`, table_comment AS `Comment` FROM _mysql_information_schema_tables WHERE table_schema = ?".to_string();
        self.filtered_listing(engine, select, database, filter)
    }

    fn filtered_listing(
        &self,
        engine: &mut Engine,
        mut select: String,
        database: &str,
        filter: Option<&TableFilter>,
    ) -> Result<QueryRows> {
        let mut params = vec![text(database)];
        if let Some(TableFilter::Like(pattern)) = filter {
            select.push_str(" AND table_name LIKE ? ESCAPE '\\'");
            params.push(text(pattern));
        }
        select.push_str(" ORDER BY table_name");
        let sql = match filter {
            Some(TableFilter::Where(condition)) => {
                format!("SELECT * FROM ({}) WHERE {}", select, condition)
            }
            _ => select,
        };
        engine.query(&sql, &params)
    }

    pub fn describe(&self, engine: &mut Engine, table: &str) -> Result<QueryRows> {
        engine.query(
            "SELECT column_name AS `Field`, column_type AS `Type`, is_nullable AS `Null`, column_key AS `Key`, column_default AS `Default`, extra AS `Extra` FROM _mysql_information_schema_columns WHERE table_schema = ? AND table_name = ? ORDER BY ordinal_position",
            &[self.db(), text(table)],
        )
    }

    pub fn show_index(&self, engine: &mut Engine, table: &str) -> Result<QueryRows> {
        engine.query(
            "SELECT table_name AS `Table`, non_unique AS `Non_unique`, index_name AS `Key_name`, seq_in_index AS `Seq_in_index`, column_name AS `Column_name`, collation AS `Collation`, cardinality AS `Cardinality`, sub_part AS `Sub_part`, packed AS `Packed`, nullable AS `Null`, index_type AS `Index_type`, comment AS `Comment`, index_comment AS `Index_comment`, is_visible AS `Visible`, expression AS `Expression` FROM _mysql_information_schema_statistics WHERE table_schema = ? AND table_name = ? ORDER BY index_name = 'PRIMARY' DESC, index_type = 'FULLTEXT' ASC, seq_in_index",
            &[self.db(), text(table)],
        )
    }

    fn db(&self) -> Value {
        text(&self.database)
    }
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}
