// Expressions, operators and literals

use sqlparser::ast as sp;
use sqlparser::ast::{BinaryOperator, Expr, UnaryOperator, Value};

use super::{not_supported, quote_ident, Translator};
use crate::codec::{quote_string, translate_string_literal};
use crate::emitter::sqlite::is_binary_collation;
use crate::error::Result;
use crate::schema::types;

impl Translator<'_> {
    pub fn translate_expr(&self, expr: &Expr) -> Result<String> {
        match expr {
            Expr::Identifier(ident) => Ok(self.translate_identifier(ident)),
            Expr::CompoundIdentifier(parts) => match parts.first() {
                Some(first) if is_system_variable(first) => Ok("NULL".to_string()),
                _ => Ok(parts.iter().map(quote_ident).collect::<Vec<_>>().join(".")),
            },
            Expr::Value(value) => self.translate_value(value),
            Expr::IntroducedString { value, .. } => self.translate_value(value),
            Expr::TypedString { value, .. } => Ok(translate_string_literal(value, '\'')),
            Expr::Nested(inner) => Ok(format!("({})", self.translate_expr(inner)?)),
            Expr::Tuple(items) => Ok(format!("({})", self.translate_expr_list(items)?)),

            Expr::BinaryOp { left, op, right } => self.translate_binary_op(left, op, right),
            Expr::UnaryOp { op, expr } => {
                let operand = self.translate_expr(expr)?;
                match op {
                    UnaryOperator::Not => Ok(format!("NOT {}", operand)),
                    UnaryOperator::Minus => Ok(format!("-{}", operand)),
                    UnaryOperator::Plus => Ok(format!("+{}", operand)),
                    UnaryOperator::PGBitwiseNot => Ok(format!("~{}", operand)),
                    other => Err(not_supported(format!("unary operator {}", other))),
                }
            }

            Expr::IsNull(e) => Ok(format!("{} IS NULL", self.translate_expr(e)?)),
            Expr::IsNotNull(e) => Ok(format!("{} IS NOT NULL", self.translate_expr(e)?)),
            Expr::IsTrue(e) => Ok(format!("{} IS TRUE", self.translate_expr(e)?)),
            Expr::IsNotTrue(e) => Ok(format!("{} IS NOT TRUE", self.translate_expr(e)?)),
            Expr::IsFalse(e) => Ok(format!("{} IS FALSE", self.translate_expr(e)?)),
            Expr::IsNotFalse(e) => Ok(format!("{} IS NOT FALSE", self.translate_expr(e)?)),
            Expr::IsDistinctFrom(a, b) => Ok(format!(
                "{} IS NOT {}",
                self.translate_expr(a)?,
                self.translate_expr(b)?
            )),
            Expr::IsNotDistinctFrom(a, b) => Ok(format!(
                "{} IS {}",
                self.translate_expr(a)?,
                self.translate_expr(b)?
            )),

            Expr::InList {
                expr,
                list,
                negated,
            } => Ok(format!(
                "{} {}IN ({})",
                self.translate_expr(expr)?,
                not(*negated),
                self.translate_expr_list(list)?
            )),
            Expr::InSubquery {
                expr,
                subquery,
                negated,
            } => Ok(format!(
                "{} {}IN ({})",
                self.translate_expr(expr)?,
                not(*negated),
                self.translate_query(subquery)?
            )),
            Expr::Between {
                expr,
                negated,
                low,
                high,
            } => Ok(format!(
                "{} {}BETWEEN {} AND {}",
                self.translate_expr(expr)?,
                not(*negated),
                self.translate_expr(low)?,
                self.translate_expr(high)?
            )),

            Expr::Like {
                negated,
                expr,
                pattern,
                escape_char,
                ..
            }
            | Expr::ILike {
                negated,
                expr,
                pattern,
                escape_char,
                ..
            } => {
                let subject = self.translate_expr(expr)?;
                if let Some(binary) = binary_operand(pattern) {
                    return Ok(format!(
                        "{} {}GLOB _helper_like_to_glob_pattern({})",
                        subject,
                        not(*negated),
                        self.translate_expr(binary)?
                    ));
                }
                let escape = escape_char
                    .as_ref()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "\\".to_string());
                Ok(format!(
                    "{} {}LIKE {} ESCAPE {}",
                    subject,
                    not(*negated),
                    self.translate_expr(pattern)?,
                    quote_string(&escape)
                ))
            }
            Expr::RLike {
                negated,
                expr,
                pattern,
                ..
            } => {
                let subject = self.translate_expr(expr)?;
                let pattern = match binary_operand(pattern) {
                    Some(binary) => format!("CHAR(0) || {}", self.translate_expr(binary)?),
                    None => self.translate_expr(pattern)?,
                };
                Ok(format!("{} {}REGEXP {}", subject, not(*negated), pattern))
            }

            Expr::Cast {
                expr, data_type, ..
            } => self.translate_cast(expr, data_type),
            Expr::Convert {
                expr,
                data_type: Some(data_type),
                ..
            } => self.translate_cast(expr, data_type),
            // CONVERT(x USING charset)
            Expr::Convert { expr, .. } => self.translate_expr(expr),
            Expr::Collate { expr, collation } => {
                let name = collation.to_string();
                let target = if is_binary_collation(Some(name.trim_matches('`'))) {
                    "BINARY"
                } else {
                    "NOCASE"
                };
                Ok(format!("{} COLLATE {}", self.translate_expr(expr)?, target))
            }

            Expr::Case {
                operand,
                conditions,
                results,
                else_result,
            } => {
                let mut sql = String::from("CASE");
                if let Some(operand) = operand {
                    sql.push_str(&format!(" {}", self.translate_expr(operand)?));
                }
                for (condition, result) in conditions.iter().zip(results) {
                    sql.push_str(&format!(
                        " WHEN {} THEN {}",
                        self.translate_expr(condition)?,
                        self.translate_expr(result)?
                    ));
                }
                if let Some(else_result) = else_result {
                    sql.push_str(&format!(" ELSE {}", self.translate_expr(else_result)?));
                }
                sql.push_str(" END");
                Ok(sql)
            }

            Expr::Exists { subquery, negated } => Ok(format!(
                "{}EXISTS ({})",
                not(*negated),
                self.translate_query(subquery)?
            )),
            Expr::Subquery(query) => Ok(format!("({})", self.translate_query(query)?)),

            Expr::Function(function) => self.translate_function(function),

            Expr::Substring {
                expr,
                substring_from,
                substring_for,
                ..
            } => {
                let mut args = vec![self.translate_expr(expr)?];
                args.push(match substring_from {
                    Some(from) => self.translate_expr(from)?,
                    None => "1".to_string(),
                });
                if let Some(length) = substring_for {
                    args.push(self.translate_expr(length)?);
                }
                Ok(format!("SUBSTR({})", args.join(", ")))
            }
            Expr::Trim {
                expr,
                trim_where,
                trim_what,
                ..
            } => {
                let function = match trim_where {
                    Some(sp::TrimWhereField::Leading) => "LTRIM",
                    Some(sp::TrimWhereField::Trailing) => "RTRIM",
                    _ => "TRIM",
                };
                let mut args = vec![self.translate_expr(expr)?];
                if let Some(what) = trim_what {
                    args.push(self.translate_expr(what)?);
                }
                Ok(format!("{}({})", function, args.join(", ")))
            }
            Expr::Position { expr, r#in } => Ok(format!(
                "INSTR({}, {})",
                self.translate_expr(r#in)?,
                self.translate_expr(expr)?
            )),
            Expr::Extract { field, expr, .. } => {
                let format = strftime_field(&field.to_string())
                    .ok_or_else(|| not_supported(format!("EXTRACT({})", field)))?;
                Ok(format!(
                    "CAST(STRFTIME('{}', {}) AS INTEGER)",
                    format,
                    self.translate_expr(expr)?
                ))
            }
            Expr::Ceil { expr, .. } => {
                let x = self.translate_expr(expr)?;
                Ok(format!(
                    "(CAST({x} AS INTEGER) + ({x} > CAST({x} AS INTEGER)))",
                    x = x
                ))
            }
            Expr::Floor { expr, .. } => {
                let x = self.translate_expr(expr)?;
                Ok(format!(
                    "(CAST({x} AS INTEGER) - ({x} < CAST({x} AS INTEGER)))",
                    x = x
                ))
            }
            Expr::Interval(_) => Err(not_supported("INTERVAL outside date arithmetic")),
            other => Err(not_supported(format!("expression {}", other))),
        }
    }

    pub fn translate_expr_list(&self, exprs: &[Expr]) -> Result<String> {
        let items: Result<Vec<String>> = exprs.iter().map(|e| self.translate_expr(e)).collect();
        Ok(items?.join(", "))
    }

    fn translate_identifier(&self, ident: &sp::Ident) -> String {
        // System variables have no SQLite counterpart
        if is_system_variable(ident) {
            return "NULL".to_string();
        }
        quote_ident(ident)
    }

    pub fn translate_value(&self, value: &Value) -> Result<String> {
        match value {
            Value::Number(n, _) => Ok(n.to_string()),
            Value::SingleQuotedString(s) | Value::NationalStringLiteral(s) => {
                Ok(translate_string_literal(s, '\''))
            }
            Value::DoubleQuotedString(s) => Ok(translate_string_literal(s, '"')),
            Value::HexStringLiteral(hex) => Ok(format!("X'{}'", hex)),
            Value::Boolean(true) => Ok("1".to_string()),
            Value::Boolean(false) => Ok("0".to_string()),
            Value::Null => Ok("NULL".to_string()),
            Value::Placeholder(p) => Ok(p.clone()),
            other => Err(not_supported(format!("literal {}", other))),
        }
    }

    fn translate_cast(&self, expr: &Expr, data_type: &sp::DataType) -> Result<String> {
        let target = types::cast_target(&types::parse_type(&data_type.to_string()));
        Ok(format!("CAST({} AS {})", self.translate_expr(expr)?, target))
    }

    fn translate_binary_op(&self, left: &Expr, op: &BinaryOperator, right: &Expr) -> Result<String> {
        // date ± INTERVAL n UNIT
        if matches!(op, BinaryOperator::Plus | BinaryOperator::Minus) {
            let sign = if *op == BinaryOperator::Plus { '+' } else { '-' };
            if let Expr::Interval(interval) = right {
                return self.translate_date_add(left, interval, sign);
            }
            if let (Expr::Interval(interval), '+') = (left, sign) {
                return self.translate_date_add(right, interval, sign);
            }
        }

        let l = self.translate_expr(left)?;
        let r = self.translate_expr(right)?;
        let symbol = match op {
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Gt => ">",
            BinaryOperator::Lt => "<",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::Eq => "=",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::Spaceship => "IS",
            BinaryOperator::And => "AND",
            // || means OR unless PIPES_AS_CONCAT is set
            BinaryOperator::Or | BinaryOperator::StringConcat => "OR",
            BinaryOperator::BitwiseOr => "|",
            BinaryOperator::BitwiseAnd => "&",
            BinaryOperator::PGBitwiseShiftLeft => "<<",
            BinaryOperator::PGBitwiseShiftRight => ">>",
            BinaryOperator::MyIntegerDivide => {
                return Ok(format!("CAST({} / {} AS INTEGER)", l, r));
            }
            BinaryOperator::Xor => {
                return Ok(format!("(({}) != 0) != (({}) != 0)", l, r));
            }
            BinaryOperator::BitwiseXor => {
                return Ok(format!("((({l}) | ({r})) - (({l}) & ({r})))", l = l, r = r));
            }
            other => return Err(not_supported(format!("operator {}", other))),
        };
        Ok(format!("{} {} {}", l, symbol, r))
    }

    /// DATETIME(d, '±' || n || ' UNIT')
    pub(super) fn translate_date_add(
        &self,
        date: &Expr,
        interval: &sp::Interval,
        sign: char,
    ) -> Result<String> {
        let unit = interval
            .leading_field
            .as_ref()
            .map(|field| field.to_string().to_uppercase())
            .unwrap_or_else(|| "DAY".to_string());
        let value = self.translate_expr(&interval.value)?;
        let (amount, unit) = match unit.as_str() {
            "WEEK" => (format!("({} * 7)", value), "DAY"),
            "QUARTER" => (format!("({} * 3)", value), "MONTH"),
            "YEAR" | "MONTH" | "DAY" | "HOUR" | "MINUTE" | "SECOND" => (value, unit.as_str()),
            other => return Err(not_supported(format!("INTERVAL unit {}", other))),
        };
        Ok(format!(
            "DATETIME({}, '{}' || {} || ' {}')",
            self.translate_expr(date)?,
            sign,
            amount,
            unit
        ))
    }
}

fn is_system_variable(ident: &sp::Ident) -> bool {
    ident.quote_style.is_none() && ident.value.starts_with("@@")
}

fn not(negated: bool) -> &'static str {
    if negated {
        "NOT "
    } else {
        ""
    }
}

/// The operand of a `LIKE BINARY` / `REGEXP BINARY`, which the prepass
/// rewrites to CAST(p AS BINARY)
fn binary_operand(pattern: &Expr) -> Option<&Expr> {
    match pattern {
        Expr::Cast {
            expr, data_type, ..
        } if types::parse_type(&data_type.to_string()).name == "binary" => Some(expr),
        _ => None,
    }
}

/// STRFTIME specifier for a date part, as used by EXTRACT and YEAR()/MONTH()...
pub(super) fn strftime_field(field: &str) -> Option<&'static str> {
    match field.to_uppercase().as_str() {
        "YEAR" => Some("%Y"),
        "MONTH" => Some("%m"),
        "DAY" => Some("%d"),
        "HOUR" => Some("%H"),
        "MINUTE" => Some("%M"),
        "SECOND" => Some("%S"),
        "WEEK" => Some("%W"),
        "DOY" | "DAYOFYEAR" => Some("%j"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::{MySqlParser, SqlParser};
    use crate::ast::Statement;
    use crate::translator::{TranslationContext, Translator};

    /// Translate the single select item of `SELECT <expr>`
    fn translate(expr: &str) -> String {
        let sql = format!("SELECT {}", expr);
        let statement = MySqlParser::new().parse(&sql).unwrap().remove(0);
        let ctx = TranslationContext::new("wp", 7);
        match statement {
            Statement::Select { query, .. } => {
                let translated = Translator::new(&ctx).translate_query(&query).unwrap();
                translated
                    .strip_prefix("SELECT ")
                    .unwrap_or(&translated)
                    .to_string()
            }
            _ => panic!("Expected Select statement"),
        }
    }

    // ========== Literals ==========

    #[test]
    fn test_string_literals() {
        assert_eq!(translate("'it\\'s'"), "'it''s'");
        assert_eq!(translate("\"double\""), "'double'");
        assert_eq!(translate("'a\\0b'"), "('a' || CHAR(0) || 'b')");
    }

    #[test]
    fn test_invalid_datetime_literal() {
        assert_eq!(translate("'2020-02-30 10:00:00'"), "'0000-00-00 00:00:00'");
        assert_eq!(translate("'2020-02-03T10:00:00Z'"), "'2020-02-03 10:00:00'");
    }

    #[test]
    fn test_system_variable_is_null() {
        assert_eq!(translate("@@session.sql_mode"), "NULL");
    }

    // ========== Operators ==========

    #[test]
    fn test_pipes_are_logical_or() {
        assert_eq!(translate("a || b"), "`a` OR `b`");
    }

    #[test]
    fn test_null_safe_equality() {
        assert_eq!(translate("a <=> NULL"), "`a` IS NULL");
    }

    #[test]
    fn test_integer_division() {
        assert_eq!(translate("7 DIV 2"), "CAST(7 / 2 AS INTEGER)");
    }

    #[test]
    fn test_like_gets_escape_clause() {
        assert_eq!(translate("a LIKE 'x%'"), "`a` LIKE 'x%' ESCAPE '\\'");
        assert_eq!(translate("a NOT LIKE 'x\\_y'"), "`a` NOT LIKE 'x\\_y' ESCAPE '\\'");
    }

    #[test]
    fn test_like_binary_uses_glob() {
        assert_eq!(
            translate("a LIKE BINARY 'X%'"),
            "`a` GLOB _helper_like_to_glob_pattern('X%')"
        );
    }

    #[test]
    fn test_regexp_binary() {
        assert_eq!(translate("a REGEXP '^x'"), "`a` REGEXP '^x'");
        assert_eq!(translate("a RLIKE BINARY '^x'"), "`a` REGEXP CHAR(0) || '^x'");
    }

    #[test]
    fn test_binary_operand_collates() {
        assert_eq!(translate("BINARY a = 'X'"), "`a` COLLATE BINARY = 'X'");
    }

    #[test]
    fn test_cast_targets() {
        assert_eq!(translate("CAST(a AS BINARY)"), "CAST(`a` AS BLOB)");
        assert_eq!(translate("CAST(a AS DECIMAL(10,2))"), "CAST(`a` AS REAL)");
        assert_eq!(translate("CONVERT(a, CHAR)"), "CAST(`a` AS TEXT)");
    }

    // ========== Date arithmetic ==========

    #[test]
    fn test_interval_arithmetic() {
        assert_eq!(
            translate("d + INTERVAL 1 DAY"),
            "DATETIME(`d`, '+' || 1 || ' DAY')"
        );
        assert_eq!(
            translate("d - INTERVAL 2 WEEK"),
            "DATETIME(`d`, '-' || (2 * 7) || ' DAY')"
        );
    }

    #[test]
    fn test_case_expression() {
        assert_eq!(
            translate("CASE WHEN a > 1 THEN 'x' ELSE 'y' END"),
            "CASE WHEN `a` > 1 THEN 'x' ELSE 'y' END"
        );
    }
}
