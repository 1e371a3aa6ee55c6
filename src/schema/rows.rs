// Typed views of the information schema rows
//
// A StoredTable is the in-memory image of one table's TABLES, COLUMNS and
// STATISTICS rows. CREATE derives it from a definition, ALTER edits it, and
// both DDL emitters read from it.

use crate::ast::{
    AlterAction, ColumnDefinition, DefaultValue, IndexDefinition, IndexKind, TableDefinition,
};
use crate::error::{DriverError, Result};
use crate::schema::types::{self, DEFAULT_COLLATION};

pub const EXTRA_AUTO_INCREMENT: &str = "auto_increment";
pub const EXTRA_DEFAULT_GENERATED: &str = "DEFAULT_GENERATED";
pub const EXTRA_ON_UPDATE: &str = "on update CURRENT_TIMESTAMP";
pub const CURRENT_TIMESTAMP: &str = "CURRENT_TIMESTAMP";

pub const PRIMARY: &str = "PRIMARY";

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub name: String,
    pub engine: String,
    pub row_format: String,
    pub collation: String,
    pub comment: String,
    pub auto_increment: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRow {
    pub name: String,
    pub ordinal_position: i64,
    pub default: Option<String>,
    pub nullable: bool,
    pub data_type: String,
    pub column_type: String,
    pub character_maximum_length: Option<i64>,
    pub character_octet_length: Option<i64>,
    pub numeric_precision: Option<i64>,
    pub numeric_scale: Option<i64>,
    pub datetime_precision: Option<i64>,
    pub character_set_name: Option<String>,
    pub collation_name: Option<String>,
    pub column_key: String,
    pub extra: String,
    pub comment: String,
}

impl ColumnRow {
    /// Derive the COLUMNS row for a declared column
    pub fn from_definition(column: &ColumnDefinition, ordinal: i64, table_collation: &str) -> Self {
        let collation = match &column.collation {
            Some(collation) => Some(collation.as_str()),
            None if column.data_type.national => None,
            None => Some(table_collation),
        };
        let info = types::column_type_info(&column.data_type, collation);

        let (default, generated) = match &column.default {
            None | Some(DefaultValue::Null) => (None, false),
            Some(DefaultValue::Literal(value)) => (Some(value.clone()), false),
            Some(DefaultValue::CurrentTimestamp) => (Some(CURRENT_TIMESTAMP.to_string()), true),
            Some(DefaultValue::Expression(expr)) => (Some(expr.clone()), true),
        };

        Self {
            name: column.name.clone(),
            ordinal_position: ordinal,
            default,
            nullable: !column.not_null && !column.primary_key,
            data_type: info.data_type,
            column_type: info.column_type,
            character_maximum_length: info.character_maximum_length,
            character_octet_length: info.character_octet_length,
            numeric_precision: info.numeric_precision,
            numeric_scale: info.numeric_scale,
            datetime_precision: info.datetime_precision,
            character_set_name: info.character_set_name,
            collation_name: info.collation_name,
            column_key: String::new(),
            extra: compose_extra(
                column.auto_increment,
                generated,
                column.on_update_current_timestamp,
            ),
            comment: column.comment.clone().unwrap_or_default(),
        }
    }

    pub fn is_auto_increment(&self) -> bool {
        self.extra.contains(EXTRA_AUTO_INCREMENT)
    }

    /// DEFAULT is an expression (CURRENT_TIMESTAMP or a parenthesised one)
    pub fn has_generated_default(&self) -> bool {
        self.extra.contains(EXTRA_DEFAULT_GENERATED)
    }

    pub fn has_on_update(&self) -> bool {
        self.extra.contains(EXTRA_ON_UPDATE)
    }

    pub fn is_nullable_text(&self) -> &'static str {
        if self.nullable {
            "YES"
        } else {
            "NO"
        }
    }
}

/// EXTRA as MySQL prints it
fn compose_extra(auto_increment: bool, default_generated: bool, on_update: bool) -> String {
    let mut parts = Vec::new();
    if auto_increment {
        parts.push(EXTRA_AUTO_INCREMENT);
    }
    if default_generated {
        parts.push(EXTRA_DEFAULT_GENERATED);
    }
    if on_update {
        parts.push(EXTRA_ON_UPDATE);
    }
    parts.join(" ")
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsRow {
    pub non_unique: bool,
    pub index_name: String,
    pub seq_in_index: i64,
    pub column_name: String,
    pub sub_part: Option<i64>,
    pub nullable: bool,
    pub index_type: String,
}

/// Statistics rows of one index, ordered by seq_in_index
#[derive(Debug, Clone, PartialEq)]
pub struct StoredIndex<'a> {
    pub name: &'a str,
    pub non_unique: bool,
    pub index_type: &'a str,
    pub columns: Vec<&'a StatisticsRow>,
}

impl StoredIndex<'_> {
    pub fn is_primary(&self) -> bool {
        self.name.eq_ignore_ascii_case(PRIMARY)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredTable {
    pub table: TableRow,
    pub columns: Vec<ColumnRow>,
    pub statistics: Vec<StatisticsRow>,
}

impl StoredTable {
    /// Build the rows for a CREATE TABLE without touching the database
    pub fn from_definition(def: &TableDefinition) -> Result<Self> {
        let collation = def
            .options
            .collation
            .clone()
            .or_else(|| {
                def.options
                    .charset
                    .as_ref()
                    .map(|charset| format!("{}_general_ci", charset))
            })
            .unwrap_or_else(|| DEFAULT_COLLATION.to_string())
            .to_lowercase();

        let mut stored = StoredTable {
            table: TableRow {
                name: def.name.clone(),
                engine: def.options.engine.clone().unwrap_or_else(|| "InnoDB".to_string()),
                row_format: def
                    .options
                    .row_format
                    .clone()
                    .unwrap_or_else(|| "Dynamic".to_string()),
                collation,
                comment: def.options.comment.clone().unwrap_or_default(),
                auto_increment: def.options.auto_increment.map(|n| n as i64),
            },
            columns: Vec::with_capacity(def.columns.len()),
            statistics: Vec::new(),
        };

        for column in &def.columns {
            stored.add_column(column)?;
        }
        for index in &def.indexes {
            stored.add_index(index)?;
        }
        stored.compute_keys();
        Ok(stored)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnRow> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    fn column_position(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                DriverError::InvalidInput(format!("Unknown column '{}' in '{}'", name, self.table.name))
            })
    }

    /// Group statistics rows by index, keeping the order indexes were created in
    pub fn indexes(&self) -> Vec<StoredIndex<'_>> {
        let mut indexes: Vec<StoredIndex<'_>> = Vec::new();
        for row in &self.statistics {
            match indexes
                .iter_mut()
                .find(|index| index.name.eq_ignore_ascii_case(&row.index_name))
            {
                Some(index) => index.columns.push(row),
                None => indexes.push(StoredIndex {
                    name: &row.index_name,
                    non_unique: row.non_unique,
                    index_type: &row.index_type,
                    columns: vec![row],
                }),
            }
        }
        for index in &mut indexes {
            index.columns.sort_by_key(|row| row.seq_in_index);
        }
        indexes
    }

    pub fn primary_key(&self) -> Option<StoredIndex<'_>> {
        self.indexes().into_iter().find(|index| index.is_primary())
    }

    /// Recompute COLUMN_KEY: PRIMARY > UNIQUE (first position) > any index
    /// (first position) > ''
    pub fn compute_keys(&mut self) {
        for column in &mut self.columns {
            let rows: Vec<&StatisticsRow> = self
                .statistics
                .iter()
                .filter(|row| row.column_name.eq_ignore_ascii_case(&column.name))
                .collect();
            column.column_key = if rows.iter().any(|r| r.index_name.eq_ignore_ascii_case(PRIMARY)) {
                column.nullable = false;
                "PRI"
            } else if rows.iter().any(|r| !r.non_unique && r.seq_in_index == 1) {
                "UNI"
            } else if rows.iter().any(|r| r.seq_in_index == 1) {
                "MUL"
            } else {
                ""
            }
            .to_string();
        }
    }

    /// True when dropping the column removes a whole UNIQUE index
    pub fn drops_unique_index(&self, column: &str) -> bool {
        self.indexes().iter().any(|index| {
            !index.is_primary()
                && !index.non_unique
                && index
                    .columns
                    .iter()
                    .all(|row| row.column_name.eq_ignore_ascii_case(column))
        })
    }

    pub fn clear_unique_keys(&mut self) {
        for column in &mut self.columns {
            if column.column_key == "UNI" {
                column.column_key.clear();
            }
        }
    }

    // ========== Edits ==========

    pub fn apply(&mut self, action: &AlterAction) -> Result<()> {
        match action {
            AlterAction::AddColumn(column) => self.add_column(column),
            AlterAction::DropColumn(name) => self.drop_column(name),
            AlterAction::ChangeColumn { old_name, column } => self.change_column(old_name, column),
            AlterAction::ModifyColumn(column) => self.change_column(&column.name, column),
            AlterAction::RenameColumn { old_name, new_name } => {
                self.rename_column(old_name, new_name)
            }
            AlterAction::AddIndex(index) => self.add_index(index),
            AlterAction::DropIndex(name) => self.drop_index(name),
            AlterAction::DropPrimaryKey => self.drop_index(PRIMARY),
            AlterAction::SetDefault { column, default } => self.set_default(column, Some(default)),
            AlterAction::DropDefault(column) => self.set_default(column, None),
        }
    }

    fn add_column(&mut self, column: &ColumnDefinition) -> Result<()> {
        if self.column(&column.name).is_some() {
            return Err(DriverError::InvalidInput(format!(
                "Duplicate column name '{}'",
                column.name
            )));
        }
        let ordinal = self.columns.len() as i64 + 1;
        let row = ColumnRow::from_definition(column, ordinal, &self.table.collation);
        self.columns.push(row);
        Ok(())
    }

    fn drop_column(&mut self, name: &str) -> Result<()> {
        let position = self.columns.iter().position(|c| c.name.eq_ignore_ascii_case(name));
        let Some(position) = position else {
            return Err(cant_drop(name));
        };
        self.columns.remove(position);
        for (i, column) in self.columns.iter_mut().enumerate() {
            column.ordinal_position = i as i64 + 1;
        }

        self.statistics
            .retain(|row| !row.column_name.eq_ignore_ascii_case(name));
        self.renumber_statistics();
        Ok(())
    }

    /// Close gaps in seq_in_index left by removed columns
    fn renumber_statistics(&mut self) {
        let names: Vec<String> = self.indexes().iter().map(|i| i.name.to_string()).collect();
        for name in names {
            let mut rows: Vec<&mut StatisticsRow> = self
                .statistics
                .iter_mut()
                .filter(|row| row.index_name.eq_ignore_ascii_case(&name))
                .collect();
            rows.sort_by_key(|row| row.seq_in_index);
            for (i, row) in rows.into_iter().enumerate() {
                row.seq_in_index = i as i64 + 1;
            }
        }
    }

    fn change_column(&mut self, old_name: &str, column: &ColumnDefinition) -> Result<()> {
        let position = self.column_position(old_name)?;
        if !old_name.eq_ignore_ascii_case(&column.name) && self.column(&column.name).is_some() {
            return Err(DriverError::InvalidInput(format!(
                "Duplicate column name '{}'",
                column.name
            )));
        }
        let ordinal = self.columns[position].ordinal_position;
        let row = ColumnRow::from_definition(column, ordinal, &self.table.collation);
        let nullable = row.nullable;
        self.columns[position] = row;

        for stat in &mut self.statistics {
            if stat.column_name.eq_ignore_ascii_case(old_name) {
                stat.column_name = column.name.clone();
                stat.nullable = nullable && !stat.index_name.eq_ignore_ascii_case(PRIMARY);
            }
        }
        Ok(())
    }

    fn rename_column(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        let position = self.column_position(old_name)?;
        if !old_name.eq_ignore_ascii_case(new_name) && self.column(new_name).is_some() {
            return Err(DriverError::InvalidInput(format!(
                "Duplicate column name '{}'",
                new_name
            )));
        }
        self.columns[position].name = new_name.to_string();
        for stat in &mut self.statistics {
            if stat.column_name.eq_ignore_ascii_case(old_name) {
                stat.column_name = new_name.to_string();
            }
        }
        Ok(())
    }

    fn add_index(&mut self, index: &IndexDefinition) -> Result<()> {
        let name = self.resolve_index_name(index)?;
        let mut rows = Vec::with_capacity(index.columns.len());
        for (seq, index_column) in index.columns.iter().enumerate() {
            let column = self.column(&index_column.name).ok_or_else(|| {
                DriverError::InvalidInput(format!(
                    "Key column '{}' doesn't exist in table",
                    index_column.name
                ))
            })?;
            let primary = index.kind == IndexKind::Primary;
            rows.push(StatisticsRow {
                non_unique: !index.kind.is_unique(),
                index_name: name.clone(),
                seq_in_index: seq as i64 + 1,
                column_name: column.name.clone(),
                sub_part: index_column.sub_part.map(i64::from),
                nullable: column.nullable && !primary,
                index_type: index.kind.index_type().to_string(),
            });
        }

        if index.kind == IndexKind::Primary {
            for row in &rows {
                if let Some(column) = self
                    .columns
                    .iter_mut()
                    .find(|c| c.name.eq_ignore_ascii_case(&row.column_name))
                {
                    column.nullable = false;
                }
            }
        }
        self.statistics.extend(rows);
        Ok(())
    }

    /// PRIMARY for primary keys, else the given name, else the first
    /// column's name with a numeric suffix when taken
    fn resolve_index_name(&self, index: &IndexDefinition) -> Result<String> {
        let taken = |name: &str| {
            self.statistics
                .iter()
                .any(|row| row.index_name.eq_ignore_ascii_case(name))
        };

        if index.kind == IndexKind::Primary {
            if taken(PRIMARY) {
                return Err(DriverError::InvalidInput("Multiple primary key defined".into()));
            }
            return Ok(PRIMARY.to_string());
        }

        match &index.name {
            Some(name) if taken(name) || name.eq_ignore_ascii_case(PRIMARY) => Err(
                DriverError::InvalidInput(format!("Duplicate key name '{}'", name)),
            ),
            Some(name) => Ok(name.clone()),
            None => {
                let base = index
                    .columns
                    .first()
                    .map(|c| c.name.clone())
                    .ok_or_else(|| DriverError::InvalidInput("Index without columns".into()))?;
                if !taken(&base) {
                    return Ok(base);
                }
                let mut suffix = 2;
                while taken(&format!("{}_{}", base, suffix)) {
                    suffix += 1;
                }
                Ok(format!("{}_{}", base, suffix))
            }
        }
    }

    fn drop_index(&mut self, name: &str) -> Result<()> {
        let before = self.statistics.len();
        self.statistics
            .retain(|row| !row.index_name.eq_ignore_ascii_case(name));
        if self.statistics.len() == before {
            return Err(cant_drop(name));
        }
        Ok(())
    }

    fn set_default(&mut self, name: &str, default: Option<&DefaultValue>) -> Result<()> {
        let position = self.column_position(name)?;
        let column = &mut self.columns[position];
        let (value, generated) = match default {
            None | Some(DefaultValue::Null) => (None, false),
            Some(DefaultValue::Literal(value)) => (Some(value.clone()), false),
            Some(DefaultValue::CurrentTimestamp) => (Some(CURRENT_TIMESTAMP.to_string()), true),
            Some(DefaultValue::Expression(expr)) => (Some(expr.clone()), true),
        };
        column.extra = compose_extra(column.is_auto_increment(), generated, column.has_on_update());
        column.default = value;
        Ok(())
    }
}

fn cant_drop(name: &str) -> DriverError {
    DriverError::InvalidInput(format!(
        "Can't DROP '{}'; check that column/key exists",
        name
    ))
}
