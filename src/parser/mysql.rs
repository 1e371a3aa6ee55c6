// MySQL Parser

use std::collections::HashMap;

use sqlparser::ast as sp;
use sqlparser::dialect::MySqlDialect;
use sqlparser::keywords::Keyword;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::Token;

use super::prepass::{self, Prepared};
use super::{admin, SqlParser};
use crate::ast::{
    AlterAction, ColumnDefinition, DataType, DefaultValue, IndexColumn, IndexDefinition, IndexKind,
    Statement, TableDefinition, UpdateStatement,
};
use crate::codec;
use crate::error::{DriverError, Result};
use crate::schema::types;

/// Parser for the MySQL dialect
#[derive(Debug, Default)]
pub struct MySqlParser;

impl MySqlParser {
    pub fn new() -> Self {
        Self
    }
}

impl SqlParser for MySqlParser {
    fn parse(&self, sql: &str) -> Result<Vec<Statement>> {
        // Step 1: tokenize once, keeping escapes, and split on `;`
        let tokens = prepass::tokenize(sql)?;

        // Step 2: admin statements are read directly, the rest goes
        // through the prepass and sqlparser
        let mut results = Vec::new();
        for statement_tokens in prepass::split_statements(tokens) {
            results.push(self.parse_tokens(statement_tokens)?);
        }
        Ok(results)
    }
}

impl MySqlParser {
    fn parse_tokens(&self, tokens: Vec<Token>) -> Result<Statement> {
        if let Some(statement) = admin::parse_admin(&tokens)? {
            return Ok(statement);
        }

        let mut prepared = Prepared::prepare(tokens);
        let dialect = MySqlDialect {};
        let mut parser = Parser::new(&dialect).with_tokens(std::mem::take(&mut prepared.tokens));
        let statement = parser.parse_statement()?;
        let next = parser.peek_token().token;
        if next != Token::EOF {
            return Err(DriverError::InvalidInput(format!(
                "Unexpected '{}' after the end of the statement",
                next
            )));
        }

        self.convert_statement(statement, prepared)
    }
}

// Conversion helpers
impl MySqlParser {
    /// Convert sqlparser's Statement to ours
    fn convert_statement(&self, stmt: sp::Statement, prepared: Prepared) -> Result<Statement> {
        use sp::Statement as SpStatement;

        match stmt {
            SpStatement::Query(query) => Ok(Statement::Select {
                query,
                calc_found_rows: prepared.calc_found_rows,
            }),
            SpStatement::Insert(insert) => Ok(Statement::Insert(Box::new(insert))),
            SpStatement::Update {
                table,
                assignments,
                from,
                selection,
                ..
            } => {
                if from.is_some() || !table.joins.is_empty() {
                    return Err(DriverError::not_supported("UPDATE with multiple tables"));
                }
                let (order_by, limit) = self.parse_update_tail(prepared.update_tail)?;
                Ok(Statement::Update(UpdateStatement {
                    table,
                    assignments,
                    selection,
                    ignore: prepared.ignore,
                    order_by,
                    limit,
                }))
            }
            SpStatement::Delete(delete) => Ok(Statement::Delete(Box::new(delete))),
            SpStatement::CreateTable(create) => {
                self.convert_create_table(create, &prepared)
            }
            SpStatement::CreateIndex(create_index) => {
                self.convert_create_index(create_index, &prepared)
            }
            SpStatement::AlterTable {
                name, operations, ..
            } => self.convert_alter_table(object_name(&name), operations, &prepared),
            SpStatement::Drop {
                object_type: sp::ObjectType::Table,
                if_exists,
                names,
                ..
            } => Ok(Statement::DropTable {
                tables: names.iter().map(object_name).collect(),
                if_exists,
                temporary: prepared.temporary,
            }),
            other => {
                let text = other.to_string();
                let head: Vec<&str> = text.split_whitespace().take(2).collect();
                Err(DriverError::not_supported(format!(
                    "statement type: {}",
                    head.join(" ")
                )))
            }
        }
    }

    /// ORDER BY / LIMIT of an UPDATE, split off by the prepass
    fn parse_update_tail(
        &self,
        tail: Vec<Token>,
    ) -> Result<(Vec<sp::OrderByExpr>, Option<sp::Expr>)> {
        if tail.is_empty() {
            return Ok((Vec::new(), None));
        }
        let dialect = MySqlDialect {};
        let mut parser = Parser::new(&dialect).with_tokens(tail);

        let mut order_by = Vec::new();
        if parser.parse_keywords(&[Keyword::ORDER, Keyword::BY]) {
            order_by = parser.parse_comma_separated(Parser::parse_order_by_expr)?;
        }
        let limit = if parser.parse_keyword(Keyword::LIMIT) {
            Some(parser.parse_expr()?)
        } else {
            None
        };

        let next = parser.peek_token().token;
        if next != Token::EOF {
            return Err(DriverError::InvalidInput(format!(
                "Unexpected '{}' in UPDATE",
                next
            )));
        }
        Ok((order_by, limit))
    }

    /// Convert sqlparser's CreateTable to our TableDefinition
    fn convert_create_table(
        &self,
        create: sp::CreateTable,
        prepared: &Prepared,
    ) -> Result<Statement> {
        if create.like.is_some() {
            return Err(DriverError::not_supported("CREATE TABLE ... LIKE"));
        }

        // 1. Table name
        let name = object_name(&create.name);

        // 2. Columns
        let mut columns = Vec::new();
        for col_def in create.columns {
            columns.push(self.convert_column(col_def)?);
        }

        // 3. Indexes: inline PRIMARY KEY first, then table constraints in
        //    order, then inline UNIQUE
        let mut indexes: Vec<IndexDefinition> = columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| single_column_index(c, IndexKind::Primary))
            .collect();
        for constraint in create.constraints {
            if let Some(index) = self.convert_constraint(constraint, &prepared.sub_parts) {
                indexes.push(index);
            }
        }
        indexes.extend(
            columns
                .iter()
                .filter(|c| c.unique)
                .map(|c| single_column_index(c, IndexKind::Unique)),
        );

        Ok(Statement::CreateTable(TableDefinition {
            name,
            temporary: create.temporary,
            if_not_exists: create.if_not_exists,
            columns,
            indexes,
            options: prepared.table_options.clone(),
            as_select: create.query,
        }))
    }

    /// Convert a column definition
    fn convert_column(&self, col: sp::ColumnDef) -> Result<ColumnDefinition> {
        use sp::ColumnOption;

        // 1. Name and data type
        let data_type = self.convert_data_type(&col.data_type)?;
        let mut column = ColumnDefinition::new(col.name.value.clone(), data_type);
        column.collation = col.collation.as_ref().map(object_name);

        // SERIAL is an alias for BIGINT UNSIGNED NOT NULL AUTO_INCREMENT UNIQUE
        if column.data_type.name == "serial" {
            column.data_type = DataType::new("bigint");
            column.data_type.unsigned = true;
            column.not_null = true;
            column.auto_increment = true;
            column.unique = true;
        }

        // 2. Column options (NOT NULL, DEFAULT, etc.)
        for option in &col.options {
            match &option.option {
                ColumnOption::Null => column.not_null = false,
                ColumnOption::NotNull => column.not_null = true,
                ColumnOption::Default(expr) => {
                    column.default = Some(self.convert_default(expr));
                }
                ColumnOption::Unique { is_primary, .. } => {
                    if *is_primary {
                        column.primary_key = true;
                        column.not_null = true;
                    } else {
                        column.unique = true;
                    }
                }
                ColumnOption::OnUpdate(expr) => {
                    if is_current_timestamp(expr) {
                        column.on_update_current_timestamp = true;
                    }
                }
                ColumnOption::DialectSpecific(tokens) => {
                    if tokens.iter().any(|t| prepass::is_word(t, "AUTO_INCREMENT")) {
                        column.auto_increment = true;
                    }
                }
                ColumnOption::Comment(comment) => {
                    column.comment = Some(codec::unescape_string_content(comment, '\''));
                }
                other => {
                    let text = other.to_string();
                    if let Some(collation) = text.strip_prefix("COLLATE ") {
                        column.collation = Some(codec::unquote_identifier(collation));
                    }
                }
            }
        }

        if let Some(collation) = column.collation.as_mut() {
            *collation = collation.to_lowercase();
        }
        Ok(column)
    }

    /// Convert a sqlparser data type to its canonical MySQL form
    fn convert_data_type(&self, dt: &sp::DataType) -> Result<DataType> {
        let data_type = types::parse_type(&dt.to_string());
        if data_type.name != "serial" && !types::is_known_type(&data_type.name) {
            return Err(DriverError::not_supported(format!("data type: {}", dt)));
        }
        Ok(data_type)
    }

    /// Convert default value expression
    fn convert_default(&self, expr: &sp::Expr) -> DefaultValue {
        use sp::{Expr, UnaryOperator, Value};

        match expr {
            Expr::Value(Value::Null) => DefaultValue::Null,
            Expr::Value(Value::Boolean(b)) => DefaultValue::Literal(if *b { "1" } else { "0" }.into()),
            Expr::Value(Value::Number(n, _)) => DefaultValue::Literal(n.clone()),
            Expr::Value(Value::SingleQuotedString(s)) => {
                DefaultValue::Literal(codec::unescape_string_content(s, '\''))
            }
            Expr::Value(Value::DoubleQuotedString(s)) => {
                DefaultValue::Literal(codec::unescape_string_content(s, '"'))
            }
            Expr::UnaryOp {
                op: UnaryOperator::Minus,
                expr: inner,
            } => match inner.as_ref() {
                Expr::Value(Value::Number(n, _)) => DefaultValue::Literal(format!("-{}", n)),
                _ => DefaultValue::Expression(expr.to_string()),
            },
            // MySQL allows DEFAULT (expr) with parentheses
            Expr::Nested(inner) => self.convert_default(inner),
            _ if is_current_timestamp(expr) => DefaultValue::CurrentTimestamp,
            _ => DefaultValue::Expression(expr.to_string()),
        }
    }

    /// Convert a table constraint to an index.
    /// FOREIGN KEY and CHECK constraints are not kept.
    fn convert_constraint(
        &self,
        constraint: sp::TableConstraint,
        sub_parts: &HashMap<String, u32>,
    ) -> Option<IndexDefinition> {
        use sp::TableConstraint as SpConstraint;

        let (name, kind, columns) = match constraint {
            SpConstraint::PrimaryKey { columns, .. } => {
                (Some("PRIMARY".to_string()), IndexKind::Primary, columns)
            }
            SpConstraint::Unique {
                name,
                index_name,
                columns,
                ..
            } => (index_name.or(name).map(|n| n.value), IndexKind::Unique, columns),
            SpConstraint::Index { name, columns, .. } => {
                (name.map(|n| n.value), IndexKind::Index, columns)
            }
            SpConstraint::FulltextOrSpatial {
                fulltext,
                opt_index_name,
                columns,
                ..
            } => {
                let kind = if fulltext {
                    IndexKind::Fulltext
                } else {
                    IndexKind::Spatial
                };
                (opt_index_name.map(|n| n.value), kind, columns)
            }
            other => {
                tracing::debug!(constraint = %other, "ignoring table constraint");
                return None;
            }
        };

        Some(IndexDefinition {
            name,
            kind,
            columns: columns
                .into_iter()
                .map(|ident| index_column(ident.value, sub_parts))
                .collect(),
        })
    }

    /// CREATE [UNIQUE|FULLTEXT|SPATIAL] INDEX name ON t (...)
    fn convert_create_index(
        &self,
        create_index: sp::CreateIndex,
        prepared: &Prepared,
    ) -> Result<Statement> {
        let table = object_name(&create_index.table_name);
        let name = create_index
            .name
            .as_ref()
            .map(object_name)
            .ok_or_else(|| DriverError::InvalidInput("CREATE INDEX requires a name".into()))?;
        let kind = prepared.index_kind.unwrap_or(if create_index.unique {
            IndexKind::Unique
        } else {
            IndexKind::Index
        });

        let mut columns = Vec::new();
        for column in &create_index.columns {
            let column_name = match &column.expr {
                sp::Expr::Identifier(ident) => ident.value.clone(),
                sp::Expr::CompoundIdentifier(parts) => parts
                    .last()
                    .map(|p| p.value.clone())
                    .unwrap_or_default(),
                other => {
                    return Err(DriverError::not_supported(format!(
                        "index on expression: {}",
                        other
                    )))
                }
            };
            columns.push(index_column(column_name, &prepared.sub_parts));
        }

        Ok(Statement::AlterTable {
            table,
            actions: vec![AlterAction::AddIndex(IndexDefinition {
                name: Some(name),
                kind,
                columns,
            })],
        })
    }

    /// Convert ALTER TABLE statement
    fn convert_alter_table(
        &self,
        table: String,
        operations: Vec<sp::AlterTableOperation>,
        prepared: &Prepared,
    ) -> Result<Statement> {
        use sp::AlterTableOperation as SpAlterOp;

        let mut actions = Vec::new();

        for op in operations {
            match op {
                SpAlterOp::AddColumn { column_def, .. } => {
                    let column = self.convert_column(column_def)?;
                    let inline = inline_indexes(&column);
                    actions.push(AlterAction::AddColumn(column));
                    actions.extend(inline.into_iter().map(AlterAction::AddIndex));
                }
                SpAlterOp::AddConstraint(constraint) => {
                    if let Some(index) = self.convert_constraint(constraint, &prepared.sub_parts) {
                        actions.push(AlterAction::AddIndex(index));
                    }
                }
                SpAlterOp::DropConstraint { name, .. } => {
                    if name.value.eq_ignore_ascii_case("PRIMARY") {
                        actions.push(AlterAction::DropPrimaryKey);
                    } else {
                        actions.push(AlterAction::DropIndex(name.value));
                    }
                }
                SpAlterOp::DropPrimaryKey => actions.push(AlterAction::DropPrimaryKey),
                SpAlterOp::DropColumn { column_name, .. } => {
                    actions.push(AlterAction::DropColumn(column_name.value));
                }
                SpAlterOp::RenameColumn {
                    old_column_name,
                    new_column_name,
                } => {
                    actions.push(AlterAction::RenameColumn {
                        old_name: old_column_name.value,
                        new_name: new_column_name.value,
                    });
                }
                SpAlterOp::ChangeColumn {
                    old_name,
                    new_name,
                    data_type,
                    options,
                    ..
                } => {
                    let column = self.convert_column(column_def(new_name, data_type, options))?;
                    let inline = inline_indexes(&column);
                    actions.push(AlterAction::ChangeColumn {
                        old_name: old_name.value,
                        column,
                    });
                    actions.extend(inline.into_iter().map(AlterAction::AddIndex));
                }
                SpAlterOp::ModifyColumn {
                    col_name,
                    data_type,
                    options,
                    ..
                } => {
                    let column = self.convert_column(column_def(col_name, data_type, options))?;
                    let inline = inline_indexes(&column);
                    actions.push(AlterAction::ModifyColumn(column));
                    actions.extend(inline.into_iter().map(AlterAction::AddIndex));
                }
                SpAlterOp::AlterColumn { column_name, op } => match op {
                    sp::AlterColumnOperation::SetDefault { value } => {
                        actions.push(AlterAction::SetDefault {
                            column: column_name.value,
                            default: self.convert_default(&value),
                        });
                    }
                    sp::AlterColumnOperation::DropDefault => {
                        actions.push(AlterAction::DropDefault(column_name.value));
                    }
                    other => {
                        return Err(DriverError::not_supported(format!(
                            "ALTER TABLE operation: ALTER COLUMN {} {}",
                            column_name, other
                        )))
                    }
                },
                other => {
                    return Err(DriverError::not_supported(format!(
                        "ALTER TABLE operation: {}",
                        other
                    )));
                }
            }
        }

        Ok(Statement::AlterTable { table, actions })
    }
}

/// Last part of a possibly qualified name, unquoted
/// e.g., `db`.`users` → users
fn object_name(name: &sp::ObjectName) -> String {
    name.0
        .last()
        .map(|ident| ident.value.clone())
        .unwrap_or_default()
}

/// Wrap CHANGE/MODIFY parts into a ColumnDef so convert_column can be reused
fn column_def(
    name: sp::Ident,
    data_type: sp::DataType,
    options: Vec<sp::ColumnOption>,
) -> sp::ColumnDef {
    sp::ColumnDef {
        name,
        data_type,
        collation: None,
        options: options
            .into_iter()
            .map(|option| sp::ColumnOptionDef { name: None, option })
            .collect(),
    }
}

fn index_column(name: String, sub_parts: &HashMap<String, u32>) -> IndexColumn {
    let sub_part = sub_parts.get(&name.to_lowercase()).copied();
    IndexColumn { name, sub_part }
}

fn single_column_index(column: &ColumnDefinition, kind: IndexKind) -> IndexDefinition {
    let name = match kind {
        IndexKind::Primary => "PRIMARY".to_string(),
        _ => column.name.clone(),
    };
    IndexDefinition {
        name: Some(name),
        kind,
        columns: vec![IndexColumn {
            name: column.name.clone(),
            sub_part: None,
        }],
    }
}

/// Indexes declared inline on a column (PRIMARY KEY, UNIQUE)
fn inline_indexes(column: &ColumnDefinition) -> Vec<IndexDefinition> {
    let mut indexes = Vec::new();
    if column.primary_key {
        indexes.push(single_column_index(column, IndexKind::Primary));
    }
    if column.unique {
        indexes.push(single_column_index(column, IndexKind::Unique));
    }
    indexes
}

/// CURRENT_TIMESTAMP, NOW(), LOCALTIMESTAMP and friends
fn is_current_timestamp(expr: &sp::Expr) -> bool {
    let name = match expr {
        sp::Expr::Function(f) => object_name(&f.name),
        sp::Expr::Identifier(ident) => ident.value.clone(),
        sp::Expr::Nested(inner) => return is_current_timestamp(inner),
        _ => return false,
    };
    matches!(
        name.to_uppercase().as_str(),
        "CURRENT_TIMESTAMP" | "NOW" | "LOCALTIME" | "LOCALTIMESTAMP"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;

    fn parse_one(sql: &str) -> Statement {
        let parser = MySqlParser::new();
        let result = parser.parse(sql);
        assert!(result.is_ok(), "Failed to parse: {:?}", result.err());
        let mut statements = result.unwrap();
        assert_eq!(statements.len(), 1);
        statements.remove(0)
    }

    fn parse_table(sql: &str) -> TableDefinition {
        match parse_one(sql) {
            Statement::CreateTable(t) => t,
            other => panic!("Expected CreateTable, got {:?}", other),
        }
    }

    fn parse_alter(sql: &str) -> Vec<AlterAction> {
        match parse_one(sql) {
            Statement::AlterTable { actions, .. } => actions,
            other => panic!("Expected AlterTable, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_simple_create_table() {
        let table = parse_table("CREATE TABLE users (id INT);");
        assert_eq!(table.name, "users");
        assert_eq!(table.columns.len(), 1);
        assert_eq!(table.columns[0].name, "id");
        assert_eq!(table.columns[0].data_type.name, "int");
    }

    #[test]
    fn test_parse_multiple_statements() {
        let parser = MySqlParser::new();
        let statements = parser.parse("SELECT 1; SELECT 2").unwrap();
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_parse_table_with_not_null() {
        let table = parse_table("CREATE TABLE users (id INT NOT NULL, name TEXT NULL);");
        assert!(table.columns[0].not_null);
        assert!(!table.columns[1].not_null);
    }

    // ========== Types ==========

    #[test]
    fn test_parse_varchar_and_unsigned() {
        let table = parse_table("CREATE TABLE t (name VARCHAR(100), n BIGINT(20) UNSIGNED);");
        assert_eq!(table.columns[0].data_type, DataType::new("varchar").with_args(&["100"]));
        let n = &table.columns[1].data_type;
        assert_eq!(n.name, "bigint");
        assert!(n.unsigned, "Expected UNSIGNED to be kept");
    }

    #[test]
    fn test_parse_boolean_is_tinyint_1() {
        let table = parse_table("CREATE TABLE t (active BOOLEAN);");
        assert_eq!(table.columns[0].data_type, DataType::new("tinyint").with_args(&["1"]));
    }

    #[test]
    fn test_parse_float_precision_pair() {
        let table = parse_table("CREATE TABLE t (score FLOAT(7,4), amount DOUBLE(10,2));");
        assert_eq!(table.columns[0].data_type.name, "float");
        assert_eq!(table.columns[1].data_type.name, "double");
    }

    #[test]
    fn test_parse_serial() {
        let table = parse_table("CREATE TABLE t (id SERIAL);");
        let id = &table.columns[0];
        assert_eq!(id.data_type.name, "bigint");
        assert!(id.data_type.unsigned && id.not_null && id.auto_increment);
        assert_eq!(table.indexes.len(), 1, "SERIAL implies a UNIQUE index");
        assert_eq!(table.indexes[0].kind, IndexKind::Unique);
    }

    #[test]
    fn test_parse_unknown_type_is_not_supported() {
        let parser = MySqlParser::new();
        let err = parser.parse("CREATE TABLE t (a UUID)").unwrap_err();
        assert!(
            matches!(err, DriverError::NotSupported(_)),
            "Expected NotSupported, got {:?}",
            err
        );
    }

    // ========== DEFAULT values ==========

    #[test]
    fn test_parse_defaults() {
        let table = parse_table(
            "CREATE TABLE t (a VARCHAR(20) DEFAULT 'it''s', b INT DEFAULT -1, c TEXT DEFAULT NULL, d DATETIME DEFAULT CURRENT_TIMESTAMP)",
        );
        assert_eq!(table.columns[0].default, Some(DefaultValue::Literal("it's".into())));
        assert_eq!(table.columns[1].default, Some(DefaultValue::Literal("-1".into())));
        assert_eq!(table.columns[2].default, Some(DefaultValue::Null));
        assert_eq!(table.columns[3].default, Some(DefaultValue::CurrentTimestamp));
    }

    #[test]
    fn test_parse_on_update_current_timestamp() {
        let table = parse_table(
            "CREATE TABLE t (updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP);",
        );
        assert!(
            table.columns[0].on_update_current_timestamp,
            "Expected on_update_current_timestamp to be true"
        );
        assert_eq!(
            table.columns[0].default,
            Some(DefaultValue::CurrentTimestamp),
            "Should also have DEFAULT CURRENT_TIMESTAMP"
        );
    }

    #[test]
    fn test_parse_auto_increment_and_comment() {
        let table = parse_table("CREATE TABLE t (id INT AUTO_INCREMENT PRIMARY KEY COMMENT 'row id');");
        assert!(table.columns[0].auto_increment, "Expected auto_increment to be true");
        assert_eq!(table.columns[0].comment.as_deref(), Some("row id"));
        assert_eq!(table.indexes[0].name.as_deref(), Some("PRIMARY"));
    }

    // ========== Indexes ==========

    #[test]
    fn test_parse_wordpress_table() {
        let table = parse_table(
            "CREATE TABLE wp_postmeta (
                meta_id bigint(20) unsigned NOT NULL auto_increment,
                post_id bigint(20) unsigned NOT NULL default '0',
                meta_key varchar(255) default NULL,
                meta_value longtext,
                PRIMARY KEY  (meta_id),
                KEY post_id (post_id),
                KEY meta_key (meta_key(191))
            ) DEFAULT CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_520_ci;",
        );
        assert_eq!(table.columns.len(), 4);
        assert_eq!(table.indexes.len(), 3);
        assert_eq!(table.indexes[0].kind, IndexKind::Primary);
        assert_eq!(table.indexes[2].name.as_deref(), Some("meta_key"));
        assert_eq!(table.indexes[2].columns[0].sub_part, Some(191));
        assert_eq!(table.options.charset.as_deref(), Some("utf8mb4"));
        assert_eq!(
            table.options.collation.as_deref(),
            Some("utf8mb4_unicode_520_ci")
        );
    }

    #[test]
    fn test_parse_unique_and_fulltext_keys() {
        let table = parse_table(
            "CREATE TABLE t (email VARCHAR(100), body TEXT, UNIQUE KEY email (email), FULLTEXT KEY body (body));",
        );
        assert_eq!(table.indexes[0].kind, IndexKind::Unique);
        assert_eq!(table.indexes[0].name.as_deref(), Some("email"));
        assert_eq!(table.indexes[1].kind, IndexKind::Fulltext);
    }

    #[test]
    fn test_parse_foreign_key_is_ignored() {
        let table = parse_table(
            "CREATE TABLE orders (id INT, user_id INT, FOREIGN KEY (user_id) REFERENCES users(id));",
        );
        assert!(table.indexes.is_empty(), "Foreign keys are not kept");
    }

    #[test]
    fn test_parse_backtick_names() {
        let table = parse_table("CREATE TABLE `db`.`users` (`id` INT);");
        assert_eq!(table.name, "users", "Backticks should be stripped from table name");
        assert_eq!(table.columns[0].name, "id", "Backticks should be stripped from column name");
    }

    #[test]
    fn test_parse_create_table_as_select() {
        let table = parse_table("CREATE TABLE t2 SELECT * FROM t1");
        assert!(table.as_select.is_some(), "Expected the SELECT to be kept");
    }

    #[test]
    fn test_parse_create_index() {
        match parse_one("CREATE UNIQUE INDEX idx_name ON t (name(10))") {
            Statement::AlterTable { table, actions } => {
                assert_eq!(table, "t");
                match &actions[..] {
                    [AlterAction::AddIndex(index)] => {
                        assert_eq!(index.kind, IndexKind::Unique);
                        assert_eq!(index.columns[0].sub_part, Some(10));
                    }
                    _ => panic!("Expected a single AddIndex, got {:?}", actions),
                }
            }
            _ => panic!("Expected AlterTable"),
        }
    }

    // ========== ALTER TABLE ==========

    #[test]
    fn test_parse_alter_actions() {
        let actions = parse_alter(
            "ALTER TABLE t ADD COLUMN c INT NOT NULL, DROP COLUMN d, CHANGE e f VARCHAR(10), MODIFY g TEXT, ADD INDEX ix (c), DROP INDEX old",
        );
        assert_eq!(actions.len(), 6);
        assert!(matches!(&actions[0], AlterAction::AddColumn(c) if c.name == "c" && c.not_null));
        assert!(matches!(&actions[1], AlterAction::DropColumn(name) if name == "d"));
        assert!(
            matches!(&actions[2], AlterAction::ChangeColumn { old_name, column } if old_name == "e" && column.name == "f")
        );
        assert!(matches!(&actions[3], AlterAction::ModifyColumn(c) if c.name == "g"));
        assert!(matches!(&actions[4], AlterAction::AddIndex(i) if i.name.as_deref() == Some("ix")));
        assert!(matches!(&actions[5], AlterAction::DropIndex(name) if name == "old"));
    }

    #[test]
    fn test_parse_alter_add_unique_column() {
        let actions = parse_alter("ALTER TABLE t ADD COLUMN code CHAR(3) UNIQUE");
        assert_eq!(actions.len(), 2);
        assert!(matches!(&actions[1], AlterAction::AddIndex(i) if i.kind == IndexKind::Unique));
    }

    #[test]
    fn test_parse_alter_rename_table_is_not_supported() {
        let parser = MySqlParser::new();
        let err = parser.parse("ALTER TABLE t RENAME TO u").unwrap_err();
        assert!(matches!(err, DriverError::NotSupported(_)));
    }

    // ========== DML ==========

    #[test]
    fn test_parse_select_with_calc_found_rows() {
        match parse_one("SELECT SQL_CALC_FOUND_ROWS * FROM t LIMIT 1") {
            Statement::Select {
                calc_found_rows, ..
            } => assert!(calc_found_rows),
            _ => panic!("Expected Select"),
        }
    }

    #[test]
    fn test_parse_update_with_limit() {
        match parse_one("UPDATE IGNORE t SET a = 1 WHERE b = 2 ORDER BY c DESC LIMIT 5") {
            Statement::Update(update) => {
                assert!(update.ignore);
                assert_eq!(update.order_by.len(), 1);
                assert!(update.limit.is_some());
                assert!(update.selection.is_some());
            }
            _ => panic!("Expected Update"),
        }
    }

    #[test]
    fn test_parse_drop_table() {
        match parse_one("DROP TEMPORARY TABLE IF EXISTS a, b;") {
            Statement::DropTable {
                tables,
                if_exists,
                temporary,
            } => {
                assert_eq!(tables, vec!["a".to_string(), "b".to_string()]);
                assert!(if_exists);
                assert!(temporary);
            }
            _ => panic!("Expected DropTable statement"),
        }
    }

    #[test]
    fn test_parse_unsupported_statement() {
        let parser = MySqlParser::new();
        let err = parser.parse("CREATE VIEW v AS SELECT 1").unwrap_err();
        assert!(
            matches!(err, DriverError::NotSupported(_)),
            "Expected NotSupported, got {:?}",
            err
        );
    }
}
