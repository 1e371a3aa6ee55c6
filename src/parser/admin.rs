// Administrative statements
//
// SHOW, DESCRIBE, transaction control, SET and USE are small enough to read
// straight off the token stream, and sqlparser's models for them do not
// match MySQL closely enough to be worth converting.

use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::Token;

use super::prepass::{is_any_word, is_word};
use crate::ast::{AlterAction, ShowFilter, ShowStatement, Statement, TransactionCommand};
use crate::codec;
use crate::error::{DriverError, ParseError, Result};

/// Cursor over a statement's tokens
struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn eat(&mut self, word: &str) -> bool {
        if is_any_word(self.peek(), &[word]) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_any(&mut self, words: &[&str]) -> Option<String> {
        let token = self.peek()?;
        words.iter().find(|w| is_word(token, w)).map(|w| {
            self.pos += 1;
            w.to_string()
        })
    }

    /// A possibly qualified name; only the last part is kept
    fn object_name(&mut self) -> Option<String> {
        let mut name = match self.peek() {
            Some(Token::Word(w)) => w.value.clone(),
            _ => return None,
        };
        self.pos += 1;
        while matches!(self.peek(), Some(Token::Period)) {
            match self.tokens.get(self.pos + 1) {
                Some(Token::Word(w)) => {
                    name = w.value.clone();
                    self.pos += 2;
                }
                _ => break,
            }
        }
        Some(name)
    }

    fn rest(&self) -> Vec<Token> {
        self.tokens[self.pos.min(self.tokens.len())..].to_vec()
    }

    fn rest_text(&self) -> String {
        self.rest()
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn syntax_error(message: impl Into<String>) -> DriverError {
    DriverError::InvalidInput(message.into())
}

/// Parse an administrative statement; None when the tokens are not one
pub fn parse_admin(tokens: &[Token]) -> Result<Option<Statement>> {
    let mut cursor = Cursor::new(tokens);
    let first = match cursor.eat_any(&[
        "SHOW", "DESCRIBE", "DESC", "EXPLAIN", "BEGIN", "START", "COMMIT", "ROLLBACK", "SET",
        "USE", "DROP",
    ]) {
        Some(first) => first,
        None => return Ok(None),
    };

    let statement = match first.as_str() {
        "SHOW" => Statement::Show(parse_show(&mut cursor)?),
        "DESCRIBE" | "DESC" | "EXPLAIN" => {
            // EXPLAIN SELECT ... is a query plan request, not a table description
            if is_any_word(cursor.peek(), &["SELECT", "UPDATE", "DELETE", "INSERT", "REPLACE", "WITH"]) {
                return Err(DriverError::not_supported(format!(
                    "statement type: {} {}",
                    first,
                    cursor.rest_text()
                )));
            }
            let table = cursor
                .object_name()
                .ok_or_else(|| syntax_error(format!("Expected a table name after {}", first)))?;
            Statement::Describe { table }
        }
        "BEGIN" => {
            cursor.eat("WORK");
            Statement::Transaction(TransactionCommand::Begin)
        }
        "START" => {
            if !cursor.eat("TRANSACTION") {
                return Err(syntax_error("Expected TRANSACTION after START"));
            }
            Statement::Transaction(TransactionCommand::Begin)
        }
        "COMMIT" => {
            cursor.eat("WORK");
            Statement::Transaction(TransactionCommand::Commit)
        }
        "ROLLBACK" => {
            cursor.eat("WORK");
            if cursor.eat("TO") {
                return Err(DriverError::not_supported("statement type: ROLLBACK TO SAVEPOINT"));
            }
            Statement::Transaction(TransactionCommand::Rollback)
        }
        "SET" => Statement::Set,
        "USE" => {
            let database = cursor
                .object_name()
                .ok_or_else(|| syntax_error("Expected a database name after USE"))?;
            Statement::Use { database }
        }
        "DROP" => {
            // Only DROP INDEX x ON t is read here; DROP TABLE goes to sqlparser
            if !cursor.eat("INDEX") {
                return Ok(None);
            }
            let index = cursor
                .object_name()
                .ok_or_else(|| syntax_error("Expected an index name after DROP INDEX"))?;
            if !cursor.eat("ON") {
                return Err(syntax_error("Expected ON after DROP INDEX name"));
            }
            let table = cursor
                .object_name()
                .ok_or_else(|| syntax_error("Expected a table name after ON"))?;
            let action = if index.eq_ignore_ascii_case("PRIMARY") {
                AlterAction::DropPrimaryKey
            } else {
                AlterAction::DropIndex(index)
            };
            Statement::AlterTable {
                table,
                actions: vec![action],
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(statement))
}

fn parse_show(cursor: &mut Cursor<'_>) -> Result<ShowStatement> {
    let full = cursor.eat("FULL");
    cursor.eat_any(&["GLOBAL", "SESSION", "EXTENDED"]);

    let what = cursor
        .eat_any(&[
            "CREATE", "INDEX", "INDEXES", "KEYS", "TABLES", "TABLE", "GRANTS", "VARIABLES",
            "COLUMNS", "FIELDS",
        ])
        .ok_or_else(|| {
            DriverError::not_supported(format!("statement type: SHOW {}", cursor.rest_text()))
        })?;

    let show = match what.as_str() {
        "CREATE" => {
            if !cursor.eat("TABLE") {
                return Err(DriverError::not_supported(format!(
                    "statement type: SHOW CREATE {}",
                    cursor.rest_text()
                )));
            }
            let table = cursor
                .object_name()
                .ok_or_else(|| syntax_error("Expected a table name after SHOW CREATE TABLE"))?;
            ShowStatement::CreateTable { table }
        }
        "INDEX" | "INDEXES" | "KEYS" => {
            let table = from_clause(cursor)?
                .ok_or_else(|| syntax_error("Expected FROM after SHOW INDEX"))?;
            // An optional FROM db and WHERE are accepted and ignored
            from_clause(cursor)?;
            ShowStatement::Index { table }
        }
        "TABLES" => {
            let database = from_clause(cursor)?;
            let filter = filter_clause(cursor)?;
            ShowStatement::Tables {
                full,
                database,
                filter,
            }
        }
        "TABLE" => {
            if !cursor.eat("STATUS") {
                return Err(syntax_error("Expected STATUS after SHOW TABLE"));
            }
            let database = from_clause(cursor)?;
            let filter = filter_clause(cursor)?;
            ShowStatement::TableStatus { database, filter }
        }
        "COLUMNS" | "FIELDS" => {
            let table = from_clause(cursor)?
                .ok_or_else(|| syntax_error("Expected FROM after SHOW COLUMNS"))?;
            ShowStatement::Columns { table }
        }
        "GRANTS" => ShowStatement::Grants,
        _ => ShowStatement::Variables,
    };
    Ok(show)
}

/// [FROM|IN name]
fn from_clause(cursor: &mut Cursor<'_>) -> Result<Option<String>> {
    if cursor.eat_any(&["FROM", "IN"]).is_none() {
        return Ok(None);
    }
    cursor
        .object_name()
        .map(Some)
        .ok_or_else(|| syntax_error("Expected a name after FROM"))
}

/// [LIKE 'pattern' | WHERE expr]
fn filter_clause(cursor: &mut Cursor<'_>) -> Result<Option<ShowFilter>> {
    if cursor.eat("LIKE") {
        let pattern = match cursor.peek() {
            Some(Token::SingleQuotedString(raw)) => codec::unescape_string_content(raw, '\''),
            Some(Token::DoubleQuotedString(raw)) => codec::unescape_string_content(raw, '"'),
            _ => return Err(syntax_error("Expected a string after LIKE")),
        };
        cursor.pos += 1;
        return Ok(Some(ShowFilter::Like(pattern)));
    }
    if cursor.eat("WHERE") {
        let dialect = MySqlDialect {};
        let expr = Parser::new(&dialect)
            .with_tokens(cursor.rest())
            .parse_expr()
            .map_err(ParseError::from)?;
        cursor.pos = cursor.tokens.len();
        return Ok(Some(ShowFilter::Where(expr)));
    }
    if !cursor.at_end() {
        return Err(syntax_error(format!("Unexpected '{}'", cursor.rest_text())));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::prepass::tokenize;

    fn admin(sql: &str) -> Statement {
        parse_admin(&tokenize(sql).unwrap())
            .unwrap()
            .expect("Expected an administrative statement")
    }

    // ========== SHOW ==========

    #[test]
    fn test_show_create_table() {
        match admin("SHOW CREATE TABLE `db`.`users`") {
            Statement::Show(ShowStatement::CreateTable { table }) => assert_eq!(table, "users"),
            _ => panic!("Expected SHOW CREATE TABLE"),
        }
    }

    #[test]
    fn test_show_full_tables_like() {
        match admin("SHOW FULL TABLES FROM wp LIKE 'wp\\_%'") {
            Statement::Show(ShowStatement::Tables {
                full,
                database,
                filter,
            }) => {
                assert!(full);
                assert_eq!(database.as_deref(), Some("wp"));
                match filter {
                    Some(ShowFilter::Like(pattern)) => assert_eq!(pattern, "wp\\_%"),
                    _ => panic!("Expected LIKE filter"),
                }
            }
            _ => panic!("Expected SHOW TABLES"),
        }
    }

    #[test]
    fn test_show_table_status_where() {
        match admin("SHOW TABLE STATUS WHERE Name = 'x'") {
            Statement::Show(ShowStatement::TableStatus { filter, .. }) => {
                assert!(matches!(filter, Some(ShowFilter::Where(_))), "Expected WHERE filter");
            }
            _ => panic!("Expected SHOW TABLE STATUS"),
        }
    }

    #[test]
    fn test_show_index_variants() {
        for sql in ["SHOW INDEX FROM t", "SHOW KEYS IN t", "SHOW INDEXES FROM t FROM db"] {
            match admin(sql) {
                Statement::Show(ShowStatement::Index { table }) => assert_eq!(table, "t"),
                _ => panic!("Expected SHOW INDEX for {}", sql),
            }
        }
    }

    #[test]
    fn test_show_unknown_is_not_supported() {
        let err = parse_admin(&tokenize("SHOW PROCESSLIST").unwrap()).unwrap_err();
        assert!(matches!(err, DriverError::NotSupported(_)));
    }

    // ========== Others ==========

    #[test]
    fn test_describe() {
        for sql in ["DESCRIBE t", "DESC t", "EXPLAIN `t`"] {
            match admin(sql) {
                Statement::Describe { table } => assert_eq!(table, "t"),
                _ => panic!("Expected DESCRIBE for {}", sql),
            }
        }
    }

    #[test]
    fn test_transactions() {
        assert!(matches!(
            admin("START TRANSACTION"),
            Statement::Transaction(TransactionCommand::Begin)
        ));
        assert!(matches!(
            admin("BEGIN WORK"),
            Statement::Transaction(TransactionCommand::Begin)
        ));
        assert!(matches!(
            admin("COMMIT"),
            Statement::Transaction(TransactionCommand::Commit)
        ));
        assert!(matches!(
            admin("ROLLBACK"),
            Statement::Transaction(TransactionCommand::Rollback)
        ));
    }

    #[test]
    fn test_set_and_use() {
        assert!(matches!(admin("SET NAMES utf8mb4"), Statement::Set));
        match admin("USE wordpress") {
            Statement::Use { database } => assert_eq!(database, "wordpress"),
            _ => panic!("Expected USE"),
        }
    }

    #[test]
    fn test_drop_index_on_table() {
        match admin("DROP INDEX idx ON t") {
            Statement::AlterTable { table, actions } => {
                assert_eq!(table, "t");
                assert!(matches!(&actions[..], [AlterAction::DropIndex(name)] if name == "idx"));
            }
            _ => panic!("Expected ALTER TABLE"),
        }
    }

    #[test]
    fn test_drop_table_is_left_to_sqlparser() {
        assert!(parse_admin(&tokenize("DROP TABLE t").unwrap()).unwrap().is_none());
    }
}
