// Token-level preparation of MySQL statements
//
// sqlparser's MySQL dialect covers most of the grammar we need. The few
// constructs it rejects (or models differently) are rewritten here on the
// token stream, and whatever information the rewrite removes is kept on
// `Prepared` so the converter can put it back into the statement model.

use std::collections::HashMap;

use sqlparser::dialect::MySqlDialect;
use sqlparser::tokenizer::{Token, Tokenizer};

use crate::ast::{IndexKind, TableOptions};
use crate::codec;
use crate::error::ParseError;

/// Tokenize without unescaping so string literals keep their MySQL escapes.
/// Whitespace and comments are dropped; the parser skips them anyway.
pub fn tokenize(sql: &str) -> Result<Vec<Token>, ParseError> {
    let dialect = MySqlDialect {};
    let tokens = Tokenizer::new(&dialect, sql)
        .with_unescape(false)
        .tokenize()?;
    Ok(tokens
        .into_iter()
        .filter(|t| !matches!(t, Token::Whitespace(_) | Token::EOF))
        .collect())
}

/// Split a token stream into statements on top-level semicolons
pub fn split_statements(tokens: Vec<Token>) -> Vec<Vec<Token>> {
    let mut statements = Vec::new();
    let mut current = Vec::new();
    for token in tokens {
        match token {
            Token::SemiColon => {
                if !current.is_empty() {
                    statements.push(std::mem::take(&mut current));
                }
            }
            other => current.push(other),
        }
    }
    if !current.is_empty() {
        statements.push(current);
    }
    statements
}

/// Unquoted word match, case-insensitive
pub fn is_word(token: &Token, word: &str) -> bool {
    matches!(token, Token::Word(w) if w.quote_style.is_none() && w.value.eq_ignore_ascii_case(word))
}

pub fn is_any_word(token: Option<&Token>, words: &[&str]) -> bool {
    token.map_or(false, |t| words.iter().any(|w| is_word(t, w)))
}

/// Index of the parenthesis closing the one at `open`
pub fn matching_paren(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// End (exclusive) of a single operand starting at `start`:
/// a parenthesized group, a possibly qualified name or function call,
/// or a single literal token.
fn operand_end(tokens: &[Token], start: usize) -> Option<usize> {
    match tokens.get(start)? {
        Token::LParen => matching_paren(tokens, start).map(|close| close + 1),
        Token::Word(_) => {
            let mut end = start + 1;
            while matches!(tokens.get(end), Some(Token::Period))
                && matches!(tokens.get(end + 1), Some(Token::Word(_)))
            {
                end += 2;
            }
            if matches!(tokens.get(end), Some(Token::LParen)) {
                end = matching_paren(tokens, end)? + 1;
            }
            Some(end)
        }
        Token::RParen | Token::Comma | Token::SemiColon => None,
        _ => Some(start + 1),
    }
}

/// Token value of a literal or name, with string escapes resolved
fn token_text(token: &Token) -> Option<String> {
    match token {
        Token::Word(w) => Some(w.value.clone()),
        Token::Number(n, _) => Some(n.clone()),
        Token::SingleQuotedString(s) => Some(codec::unescape_string_content(s, '\'')),
        Token::DoubleQuotedString(s) => Some(codec::unescape_string_content(s, '"')),
        _ => None,
    }
}

const SELECT_MODIFIERS: &[&str] = &[
    "SQL_NO_CACHE",
    "SQL_CACHE",
    "SQL_BUFFER_RESULT",
    "SQL_SMALL_RESULT",
    "SQL_BIG_RESULT",
];

/// Other words allowed between SELECT and its select list
const SELECT_OPTIONS: &[&str] = &[
    "ALL",
    "DISTINCT",
    "DISTINCTROW",
    "HIGH_PRIORITY",
    "STRAIGHT_JOIN",
];

const KEY_LIST_WORDS: &[&str] = &["KEY", "INDEX", "UNIQUE", "PRIMARY", "FULLTEXT", "SPATIAL"];

const DML_WORDS: &[&str] = &["SELECT", "WITH", "INSERT", "REPLACE", "UPDATE", "DELETE"];

/// A statement's tokens after MySQL-only syntax has been rewritten
#[derive(Debug, Default)]
pub struct Prepared {
    pub tokens: Vec<Token>,
    pub calc_found_rows: bool,
    /// UPDATE IGNORE
    pub ignore: bool,
    /// DROP TEMPORARY TABLE
    pub temporary: bool,
    /// CREATE FULLTEXT|SPATIAL INDEX
    pub index_kind: Option<IndexKind>,
    /// Index prefix lengths by lowercase column name, e.g. KEY (name(20))
    pub sub_parts: HashMap<String, u32>,
    pub table_options: TableOptions,
    /// ORDER BY / LIMIT split off an UPDATE
    pub update_tail: Vec<Token>,
}

impl Prepared {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            ..Default::default()
        }
    }

    /// Run every rewrite that applies to this statement kind
    pub fn prepare(tokens: Vec<Token>) -> Self {
        let mut prepared = Prepared::new(tokens);
        let first = prepared.tokens.first().cloned();
        let is_dml = is_any_word(first.as_ref(), DML_WORDS);

        if is_dml {
            prepared.strip_select_modifiers();
            prepared.strip_index_hints();
            prepared.strip_share_mode_lock();
            prepared.rewrite_binary_operands();
        }

        match first {
            Some(ref t) if is_word(t, "UPDATE") => prepared.prepare_update(),
            Some(ref t) if is_word(t, "DELETE") => prepared.strip_delete_modifiers(),
            Some(ref t) if is_word(t, "ALTER") => prepared.prepare_alter(),
            Some(ref t) if is_word(t, "CREATE") => prepared.prepare_create(),
            Some(ref t) if is_word(t, "DROP") => prepared.prepare_drop(),
            _ => {}
        }
        prepared
    }

    fn position_of(&self, from: usize, word: &str) -> Option<usize> {
        (from..self.tokens.len()).find(|&i| is_word(&self.tokens[i], word))
    }

    fn remove_words(&mut self, words: &[&str]) -> bool {
        let before = self.tokens.len();
        self.tokens
            .retain(|t| !words.iter().any(|w| is_word(t, w)));
        before != self.tokens.len()
    }
}

// SELECT
impl Prepared {
    fn strip_select_modifiers(&mut self) {
        if let Some(position) = self.top_level_calc_found_rows() {
            self.tokens.remove(position);
            self.calc_found_rows = true;
        }
        self.remove_words(SELECT_MODIFIERS);
    }

    /// SQL_CALC_FOUND_ROWS among the modifiers of the outermost SELECT;
    /// elsewhere it is left for the parser to reject
    fn top_level_calc_found_rows(&self) -> Option<usize> {
        let mut depth = 0usize;
        let mut select = None;
        for (i, token) in self.tokens.iter().enumerate() {
            match token {
                Token::LParen => depth += 1,
                Token::RParen => depth = depth.saturating_sub(1),
                t if depth == 0 && is_word(t, "SELECT") => {
                    select = Some(i);
                    break;
                }
                _ => {}
            }
        }

        self.tokens
            .iter()
            .enumerate()
            .skip(select? + 1)
            .take_while(|(_, t)| {
                is_word(t, "SQL_CALC_FOUND_ROWS")
                    || is_any_word(Some(*t), SELECT_MODIFIERS)
                    || is_any_word(Some(*t), SELECT_OPTIONS)
            })
            .find(|(_, t)| is_word(t, "SQL_CALC_FOUND_ROWS"))
            .map(|(i, _)| i)
    }

    /// USE|FORCE|IGNORE INDEX|KEY [FOR JOIN|ORDER BY|GROUP BY] (...)
    fn strip_index_hints(&mut self) {
        let mut i = 0;
        while i + 1 < self.tokens.len() {
            let is_hint = is_any_word(self.tokens.get(i), &["USE", "FORCE", "IGNORE"])
                && is_any_word(self.tokens.get(i + 1), &["INDEX", "KEY"]);
            if !is_hint {
                i += 1;
                continue;
            }
            let mut j = i + 2;
            if is_any_word(self.tokens.get(j), &["FOR"]) {
                j += 1;
                if is_any_word(self.tokens.get(j), &["ORDER", "GROUP"]) {
                    j += 1;
                }
                j += 1;
            }
            if !matches!(self.tokens.get(j), Some(Token::LParen)) {
                i += 1;
                continue;
            }
            match matching_paren(&self.tokens, j) {
                Some(close) => {
                    self.tokens.drain(i..=close);
                }
                None => i += 1,
            }
        }
    }

    /// LOCK IN SHARE MODE has no SQLite counterpart
    fn strip_share_mode_lock(&mut self) {
        let len = self.tokens.len();
        if len >= 4
            && is_word(&self.tokens[len - 4], "LOCK")
            && is_word(&self.tokens[len - 3], "IN")
            && is_word(&self.tokens[len - 2], "SHARE")
            && is_word(&self.tokens[len - 1], "MODE")
        {
            self.tokens.truncate(len - 4);
        }
    }

    /// `x LIKE BINARY p` becomes `x LIKE CAST(p AS BINARY)`, which the
    /// translator recognizes; any other `BINARY x` becomes `x COLLATE binary`.
    fn rewrite_binary_operands(&mut self) {
        let mut i = 0;
        while i < self.tokens.len() {
            if !is_word(&self.tokens[i], "BINARY") {
                i += 1;
                continue;
            }
            let prev = i.checked_sub(1).and_then(|p| self.tokens.get(p)).cloned();
            // CAST(x AS BINARY), CONVERT(x USING binary)
            if is_any_word(prev.as_ref(), &["AS", "USING"]) {
                i += 1;
                continue;
            }
            // CONVERT(x, BINARY(16))
            if matches!(prev, Some(Token::Comma))
                && matches!(self.tokens.get(i + 1), Some(Token::LParen))
                && matches!(self.tokens.get(i + 2), Some(Token::Number(..)))
                && matches!(self.tokens.get(i + 3), Some(Token::RParen))
            {
                i += 1;
                continue;
            }
            let start = i + 1;
            let end = match operand_end(&self.tokens, start) {
                Some(end) => end,
                None => {
                    i += 1;
                    continue;
                }
            };
            let operand: Vec<Token> = self.tokens[start..end].to_vec();
            let is_pattern = is_any_word(prev.as_ref(), &["LIKE", "REGEXP", "RLIKE"]);
            let mut replacement = Vec::with_capacity(operand.len() + 4);
            if is_pattern {
                replacement.push(Token::make_keyword("CAST"));
                replacement.push(Token::LParen);
                replacement.extend(operand);
                replacement.push(Token::make_keyword("AS"));
                replacement.push(Token::make_keyword("BINARY"));
                replacement.push(Token::RParen);
            } else {
                replacement.extend(operand);
                replacement.push(Token::make_keyword("COLLATE"));
                replacement.push(Token::make_word("binary", None));
            }
            let advance = replacement.len();
            self.tokens.splice(i..end, replacement);
            i += advance;
        }
    }
}

// UPDATE / DELETE
impl Prepared {
    fn prepare_update(&mut self) {
        while self.tokens.len() > 1 {
            if is_word(&self.tokens[1], "LOW_PRIORITY") {
                self.tokens.remove(1);
            } else if is_word(&self.tokens[1], "IGNORE") {
                self.tokens.remove(1);
                self.ignore = true;
            } else {
                break;
            }
        }

        let set = match self.position_of(1, "SET") {
            Some(set) => set,
            None => return,
        };
        let mut depth = 0i32;
        for j in set + 1..self.tokens.len() {
            match &self.tokens[j] {
                Token::LParen => depth += 1,
                Token::RParen => depth -= 1,
                token if depth == 0 => {
                    let order_by = is_word(token, "ORDER")
                        && is_any_word(self.tokens.get(j + 1), &["BY"]);
                    if order_by || is_word(token, "LIMIT") {
                        self.update_tail = self.tokens.split_off(j);
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    fn strip_delete_modifiers(&mut self) {
        while self.tokens.len() > 1
            && is_any_word(self.tokens.get(1), &["LOW_PRIORITY", "QUICK", "IGNORE"])
        {
            self.tokens.remove(1);
        }
    }
}

// CREATE / ALTER / DROP
impl Prepared {
    fn prepare_alter(&mut self) {
        // DROP INDEX|KEY x → DROP CONSTRAINT x
        for i in 0..self.tokens.len().saturating_sub(1) {
            if is_word(&self.tokens[i], "DROP")
                && is_any_word(self.tokens.get(i + 1), &["INDEX", "KEY"])
            {
                self.tokens[i + 1] = Token::make_keyword("CONSTRAINT");
            }
        }
        self.strip_index_algorithm();
        self.strip_key_prefixes();
        self.strip_float_precision();
        self.remove_words(&["ZEROFILL"]);
    }

    fn prepare_create(&mut self) {
        if is_any_word(self.tokens.get(1), &["FULLTEXT", "SPATIAL"])
            && is_any_word(self.tokens.get(2), &["INDEX", "KEY"])
        {
            self.index_kind = Some(if is_word(&self.tokens[1], "FULLTEXT") {
                IndexKind::Fulltext
            } else {
                IndexKind::Spatial
            });
            self.tokens.remove(1);
        }

        let table_pos = match self.position_of(1, "TABLE") {
            Some(pos) if pos <= 2 => pos,
            _ => {
                // CREATE [UNIQUE] INDEX
                self.strip_index_algorithm();
                self.strip_key_prefixes();
                return;
            }
        };

        self.strip_index_algorithm();
        self.strip_key_prefixes();
        self.strip_float_precision();
        self.remove_words(&["ZEROFILL"]);
        self.strip_trailing_commas();
        self.extract_table_options(table_pos);
    }

    fn prepare_drop(&mut self) {
        if is_any_word(self.tokens.get(1), &["TEMPORARY"]) {
            self.tokens.remove(1);
            self.temporary = true;
        }
    }

    /// USING BTREE|HASH
    fn strip_index_algorithm(&mut self) {
        let mut i = 0;
        while i + 1 < self.tokens.len() {
            if is_word(&self.tokens[i], "USING")
                && is_any_word(self.tokens.get(i + 1), &["BTREE", "HASH"])
            {
                self.tokens.drain(i..i + 2);
            } else {
                i += 1;
            }
        }
    }

    /// Strip `col(20)` prefix lengths and ASC/DESC from key column lists,
    /// remembering the prefix lengths.
    fn strip_key_prefixes(&mut self) {
        let mut i = 0;
        while i < self.tokens.len() {
            if !is_any_word(self.tokens.get(i), KEY_LIST_WORDS)
                || (i > 0 && is_word(&self.tokens[i - 1], "DROP"))
            {
                i += 1;
                continue;
            }
            let mut j = i + 1;
            while matches!(self.tokens.get(j), Some(Token::Word(_)) | Some(Token::Period)) {
                j += 1;
            }
            if !matches!(self.tokens.get(j), Some(Token::LParen)) {
                i = j.max(i + 1);
                continue;
            }
            let close = match matching_paren(&self.tokens, j) {
                Some(close) => close,
                None => return,
            };
            let inner = self.tokens[j + 1..close].to_vec();
            let mut cleaned = Vec::with_capacity(inner.len());
            let mut k = 0;
            while k < inner.len() {
                if let Token::Word(w) = &inner[k] {
                    let sub_part = match (inner.get(k + 1), inner.get(k + 2), inner.get(k + 3)) {
                        (Some(Token::LParen), Some(Token::Number(n, _)), Some(Token::RParen)) => {
                            n.parse::<u32>().ok()
                        }
                        _ => None,
                    };
                    if let Some(length) = sub_part {
                        self.sub_parts.insert(w.value.to_lowercase(), length);
                        cleaned.push(inner[k].clone());
                        k += 4;
                        continue;
                    }
                    let is_direction = w.quote_style.is_none()
                        && (w.value.eq_ignore_ascii_case("ASC") || w.value.eq_ignore_ascii_case("DESC"));
                    if is_direction && !cleaned.is_empty() {
                        k += 1;
                        continue;
                    }
                }
                cleaned.push(inner[k].clone());
                k += 1;
            }
            let new_close = j + 1 + cleaned.len();
            self.tokens.splice(j + 1..close, cleaned);
            i = new_close + 1;
        }
    }

    /// FLOAT(M,D) / DOUBLE(M,D) / REAL(M,D): the parser accepts a single
    /// precision only, so the pair is dropped.
    fn strip_float_precision(&mut self) {
        let mut i = 0;
        while i < self.tokens.len() {
            let is_float = is_any_word(self.tokens.get(i), &["FLOAT", "DOUBLE", "REAL", "PRECISION"]);
            let has_pair = matches!(
                (
                    self.tokens.get(i + 1),
                    self.tokens.get(i + 2),
                    self.tokens.get(i + 3),
                    self.tokens.get(i + 4),
                    self.tokens.get(i + 5),
                ),
                (
                    Some(Token::LParen),
                    Some(Token::Number(..)),
                    Some(Token::Comma),
                    Some(Token::Number(..)),
                    Some(Token::RParen)
                )
            );
            if is_float && has_pair {
                self.tokens.drain(i + 1..i + 6);
            }
            i += 1;
        }
    }

    /// `(a INT, b INT,)` is accepted by MySQL
    fn strip_trailing_commas(&mut self) {
        let mut i = 0;
        while i + 1 < self.tokens.len() {
            if matches!(self.tokens[i], Token::Comma) && matches!(self.tokens[i + 1], Token::RParen) {
                self.tokens.remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// Parse and remove ENGINE=..., DEFAULT CHARSET=..., etc. after the
    /// column list, and make the AS of CREATE TABLE ... SELECT explicit.
    fn extract_table_options(&mut self, table_pos: usize) {
        // CREATE [TEMPORARY] TABLE [IF NOT EXISTS] name
        let mut pos = table_pos + 1;
        if is_any_word(self.tokens.get(pos), &["IF"]) {
            pos += 3;
        }
        pos += 1;
        while matches!(self.tokens.get(pos), Some(Token::Period)) {
            pos += 2;
        }

        let options_start = if matches!(self.tokens.get(pos), Some(Token::LParen))
            && !is_any_word(self.tokens.get(pos + 1), &["SELECT", "WITH"])
        {
            match matching_paren(&self.tokens, pos) {
                Some(close) => close + 1,
                None => return,
            }
        } else {
            pos
        };

        let mut options = TableOptions::default();
        let mut k = options_start;
        loop {
            while matches!(self.tokens.get(k), Some(Token::Comma)) {
                k += 1;
            }
            let token = match self.tokens.get(k) {
                Some(token) => token.clone(),
                None => break,
            };
            if !matches!(token, Token::Word(_))
                || is_any_word(Some(&token), &["SELECT", "AS", "WITH", "IGNORE", "REPLACE", "LIKE"])
            {
                break;
            }
            if is_word(&token, "DEFAULT") {
                k += 1;
                continue;
            }
            let mut name = token_text(&token).unwrap_or_default().to_uppercase();
            k += 1;
            if name == "CHARACTER" && is_any_word(self.tokens.get(k), &["SET"]) {
                name = "CHARSET".to_string();
                k += 1;
            }
            if matches!(self.tokens.get(k), Some(Token::Eq)) {
                k += 1;
            }
            let value = self.tokens.get(k).and_then(token_text).unwrap_or_default();
            k += 1;
            match name.as_str() {
                "ENGINE" | "TYPE" => options.engine = Some(value),
                "CHARSET" => options.charset = Some(value.to_lowercase()),
                "COLLATE" => options.collation = Some(value.to_lowercase()),
                "COMMENT" => options.comment = Some(value),
                "ROW_FORMAT" => options.row_format = Some(value.to_uppercase()),
                "AUTO_INCREMENT" => options.auto_increment = value.parse().ok(),
                _ => {}
            }
        }
        self.tokens.drain(options_start..k.min(self.tokens.len()));
        self.table_options = options;

        // IGNORE|REPLACE before the SELECT only affect duplicate handling
        if is_any_word(self.tokens.get(options_start), &["IGNORE", "REPLACE"]) {
            self.tokens.remove(options_start);
        }
        let needs_as = is_any_word(self.tokens.get(options_start), &["SELECT", "WITH"])
            || (matches!(self.tokens.get(options_start), Some(Token::LParen))
                && is_any_word(self.tokens.get(options_start + 1), &["SELECT", "WITH"]));
        if needs_as {
            self.tokens.insert(options_start, Token::make_keyword("AS"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepare(sql: &str) -> Prepared {
        Prepared::prepare(tokenize(sql).unwrap())
    }

    fn render(tokens: &[Token]) -> String {
        tokens
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_split_statements() {
        let tokens = tokenize("SELECT 1; SELECT 2;;").unwrap();
        let statements = split_statements(tokens);
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_calc_found_rows_is_stripped() {
        let prepared = prepare("SELECT SQL_CALC_FOUND_ROWS * FROM t LIMIT 1");
        assert!(prepared.calc_found_rows);
        assert_eq!(render(&prepared.tokens), "SELECT * FROM t LIMIT 1");
    }

    #[test]
    fn test_calc_found_rows_after_other_modifiers() {
        let prepared = prepare("SELECT DISTINCT SQL_CALC_FOUND_ROWS a FROM t LIMIT 1");
        assert!(prepared.calc_found_rows);
        assert_eq!(render(&prepared.tokens), "SELECT DISTINCT a FROM t LIMIT 1");
    }

    #[test]
    fn test_calc_found_rows_only_on_outer_select() {
        let prepared = prepare("SELECT * FROM (SELECT SQL_CALC_FOUND_ROWS a FROM t) AS x");
        assert!(!prepared.calc_found_rows, "a subquery modifier must not count");
        assert!(
            prepared.tokens.iter().any(|t| is_word(t, "SQL_CALC_FOUND_ROWS")),
            "modifier inside the subquery is left in place"
        );

        let prepared = prepare("WITH c AS (SELECT a FROM t) SELECT SQL_CALC_FOUND_ROWS a FROM c LIMIT 1");
        assert!(prepared.calc_found_rows);
        assert_eq!(
            render(&prepared.tokens),
            "WITH c AS ( SELECT a FROM t ) SELECT a FROM c LIMIT 1"
        );
    }

    #[test]
    fn test_like_binary_becomes_cast() {
        let prepared = prepare("SELECT * FROM t WHERE a LIKE BINARY 'x%'");
        assert_eq!(
            render(&prepared.tokens),
            "SELECT * FROM t WHERE a LIKE CAST ( 'x%' AS BINARY )"
        );
    }

    #[test]
    fn test_binary_operand_becomes_collate() {
        let prepared = prepare("SELECT * FROM t WHERE BINARY a = 'x'");
        assert_eq!(
            render(&prepared.tokens),
            "SELECT * FROM t WHERE a COLLATE binary = 'x'"
        );
    }

    #[test]
    fn test_cast_as_binary_is_untouched() {
        let prepared = prepare("SELECT CAST(a AS BINARY) FROM t");
        assert_eq!(render(&prepared.tokens), "SELECT CAST ( a AS BINARY ) FROM t");
    }

    #[test]
    fn test_update_ignore_and_tail() {
        let prepared = prepare("UPDATE IGNORE t SET a = 1 WHERE b IN (SELECT c FROM d LIMIT 1) ORDER BY a LIMIT 2");
        assert!(prepared.ignore);
        assert_eq!(
            render(&prepared.tokens),
            "UPDATE t SET a = 1 WHERE b IN ( SELECT c FROM d LIMIT 1 )"
        );
        assert_eq!(render(&prepared.update_tail), "ORDER BY a LIMIT 2");
    }

    #[test]
    fn test_key_prefix_lengths_are_recorded() {
        let prepared = prepare(
            "CREATE TABLE t (meta_key varchar(255), KEY meta_key (meta_key(191)), KEY b (meta_key DESC))",
        );
        assert_eq!(prepared.sub_parts.get("meta_key"), Some(&191));
        assert_eq!(
            render(&prepared.tokens),
            "CREATE TABLE t ( meta_key varchar ( 255 ) , KEY meta_key ( meta_key ) , KEY b ( meta_key ) )"
        );
    }

    #[test]
    fn test_table_options_are_extracted() {
        let prepared = prepare(
            "CREATE TABLE t (id INT,) ENGINE=MyISAM DEFAULT CHARSET=utf8mb4 COLLATE utf8mb4_unicode_ci AUTO_INCREMENT=5",
        );
        assert_eq!(render(&prepared.tokens), "CREATE TABLE t ( id INT )");
        assert_eq!(prepared.table_options.engine.as_deref(), Some("MyISAM"));
        assert_eq!(prepared.table_options.charset.as_deref(), Some("utf8mb4"));
        assert_eq!(
            prepared.table_options.collation.as_deref(),
            Some("utf8mb4_unicode_ci")
        );
        assert_eq!(prepared.table_options.auto_increment, Some(5));
    }

    #[test]
    fn test_create_table_select_gets_as() {
        let prepared = prepare("CREATE TABLE t1 SELECT * FROM t2");
        assert_eq!(render(&prepared.tokens), "CREATE TABLE t1 AS SELECT * FROM t2");
    }

    #[test]
    fn test_alter_drop_index() {
        let prepared = prepare("ALTER TABLE t DROP INDEX idx, DROP KEY other");
        assert_eq!(
            render(&prepared.tokens),
            "ALTER TABLE t DROP CONSTRAINT idx , DROP CONSTRAINT other"
        );
    }

    #[test]
    fn test_drop_temporary_table() {
        let prepared = prepare("DROP TEMPORARY TABLE IF EXISTS t");
        assert!(prepared.temporary);
        assert_eq!(render(&prepared.tokens), "DROP TABLE IF EXISTS t");
    }

    #[test]
    fn test_index_hints_are_removed() {
        let prepared = prepare("SELECT * FROM t USE INDEX (idx) WHERE a = 1");
        assert_eq!(render(&prepared.tokens), "SELECT * FROM t WHERE a = 1");
    }
}
