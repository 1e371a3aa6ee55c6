// Function calls
//
// MySQL builtins without a SQLite equivalent are rewritten here; everything
// else passes through by name with translated arguments.

use sqlparser::ast as sp;
use sqlparser::ast::{
    DuplicateTreatment, Expr, FunctionArg, FunctionArgExpr, FunctionArgumentClause,
    FunctionArguments, Value,
};

use super::expr::strftime_field;
use super::{not_supported, table_name, Translator};
use crate::codec::{quote_identifier, quote_string, unescape_string_content};
use crate::error::Result;

impl Translator<'_> {
    pub fn translate_function(&self, function: &sp::Function) -> Result<String> {
        let name = table_name(&function.name).to_uppercase();
        let list = match &function.args {
            FunctionArguments::None => None,
            FunctionArguments::List(list) => Some(list),
            FunctionArguments::Subquery(_) => {
                return Err(not_supported(format!("subquery argument of {}", name)))
            }
        };

        if name == "GROUP_CONCAT" {
            return match list {
                Some(list) => self.translate_group_concat(list),
                None => Err(not_supported("GROUP_CONCAT without arguments")),
            };
        }

        let args: Vec<&FunctionArg> = list.map(|l| l.args.iter().collect()).unwrap_or_default();
        let distinct = list
            .map(|l| matches!(l.duplicate_treatment, Some(DuplicateTreatment::Distinct)))
            .unwrap_or(false);

        let mapped = match name.as_str() {
            "NOW" | "CURRENT_TIMESTAMP" | "LOCALTIME" | "LOCALTIMESTAMP" | "SYSDATE"
            | "UTC_TIMESTAMP" => Some("CURRENT_TIMESTAMP".to_string()),
            "CURDATE" | "CURRENT_DATE" | "UTC_DATE" => Some("CURRENT_DATE".to_string()),
            "CURTIME" | "CURRENT_TIME" | "UTC_TIME" => Some("CURRENT_TIME".to_string()),

            "DATE_ADD" | "ADDDATE" | "DATE_SUB" | "SUBDATE" => {
                let sign = if name.ends_with("ADD") { '+' } else { '-' };
                let [date, amount] = exact_args::<2>(&name, &args)?;
                Some(match amount {
                    Expr::Interval(interval) => self.translate_date_add(date, interval, sign)?,
                    days => format!(
                        "DATETIME({}, '{}' || {} || ' DAY')",
                        self.translate_expr(date)?,
                        sign,
                        self.translate_expr(days)?
                    ),
                })
            }
            "DATE_FORMAT" => {
                let [date, format] = exact_args::<2>(&name, &args)?;
                Some(self.translate_date_format(date, format)?)
            }
            "YEAR" | "MONTH" | "MONTHNUM" | "DAY" | "DAYOFMONTH" | "HOUR" | "MINUTE" | "SECOND"
            | "WEEK" | "DAYOFYEAR" => {
                let part = match name.as_str() {
                    "MONTHNUM" => "MONTH",
                    "DAYOFMONTH" => "DAY",
                    other => other,
                };
                let date = first_arg(&name, &args)?;
                Some(format!(
                    "CAST(STRFTIME('{}', {}) AS INTEGER)",
                    strftime_field(part).unwrap_or("%d"),
                    self.translate_expr(date)?
                ))
            }
            "WEEKDAY" => {
                let [date] = exact_args::<1>(&name, &args)?;
                Some(format!(
                    "((CAST(STRFTIME('%w', {}) AS INTEGER) + 6) % 7)",
                    self.translate_expr(date)?
                ))
            }
            "DAYOFWEEK" => {
                let [date] = exact_args::<1>(&name, &args)?;
                Some(format!(
                    "(CAST(STRFTIME('%w', {}) AS INTEGER) + 1)",
                    self.translate_expr(date)?
                ))
            }
            "UNIX_TIMESTAMP" => Some(match expr_args(&name, &args)?.first() {
                Some(date) => format!(
                    "CAST(STRFTIME('%s', {}) AS INTEGER)",
                    self.translate_expr(date)?
                ),
                None => "CAST(STRFTIME('%s', 'now') AS INTEGER)".to_string(),
            }),
            "FROM_UNIXTIME" => {
                let seconds = first_arg(&name, &args)?;
                Some(format!(
                    "DATETIME({}, 'unixepoch')",
                    self.translate_expr(seconds)?
                ))
            }

            "CONCAT" => {
                let parts: Result<Vec<String>> = expr_args(&name, &args)?
                    .into_iter()
                    .map(|e| self.translate_expr(e))
                    .collect();
                Some(format!("({})", parts?.join(" || ")))
            }
            "CHAR_LENGTH" | "CHARACTER_LENGTH" => {
                let [s] = exact_args::<1>(&name, &args)?;
                Some(format!("LENGTH({})", self.translate_expr(s)?))
            }
            "LEFT" => {
                let [s, n] = exact_args::<2>(&name, &args)?;
                Some(format!(
                    "SUBSTRING({}, 1, {})",
                    self.translate_expr(s)?,
                    self.translate_expr(n)?
                ))
            }
            "RIGHT" => {
                let [s, n] = exact_args::<2>(&name, &args)?;
                Some(format!(
                    "SUBSTR({}, -({}))",
                    self.translate_expr(s)?,
                    self.translate_expr(n)?
                ))
            }
            "LCASE" => Some(format!("LOWER({})", self.translate_args(&args)?)),
            "UCASE" => Some(format!("UPPER({})", self.translate_args(&args)?)),
            "MID" | "SUBSTR" | "SUBSTRING" => {
                Some(format!("SUBSTR({})", self.translate_args(&args)?))
            }
            "LOCATE" => Some(self.translate_locate(&name, &args)?),

            "IF" => Some(format!("IIF({})", self.translate_args(&args)?)),
            "ISNULL" => {
                let [x] = exact_args::<1>(&name, &args)?;
                Some(format!("({} IS NULL)", self.translate_expr(x)?))
            }
            "FIELD" => {
                let exprs = expr_args(&name, &args)?;
                let (needle, haystack) = exprs
                    .split_first()
                    .ok_or_else(|| not_supported("FIELD without arguments"))?;
                let mut sql = format!("CASE {}", self.translate_expr(needle)?);
                for (i, candidate) in haystack.iter().enumerate() {
                    sql.push_str(&format!(
                        " WHEN {} THEN {}",
                        self.translate_expr(candidate)?,
                        i + 1
                    ));
                }
                sql.push_str(" ELSE 0 END");
                Some(sql)
            }
            "RAND" => Some("RANDOM()".to_string()),
            "DATABASE" | "SCHEMA" => Some(quote_string(&self.context().database)),
            "FOUND_ROWS" => Some(format!("(SELECT {})", self.context().found_rows)),
            "LAST_INSERT_ID" => Some("LAST_INSERT_ROWID()".to_string()),
            "VALUES" => {
                let [column] = exact_args::<1>(&name, &args)?;
                Some(format!("`excluded`.{}", self.translate_expr(column)?))
            }
            "GREATEST" => Some(format!("MAX({})", self.translate_args(&args)?)),
            "LEAST" => Some(format!("MIN({})", self.translate_args(&args)?)),
            _ => None,
        };

        let mut sql = match mapped {
            Some(sql) => sql,
            None => format!(
                "{}({}{})",
                name,
                if distinct { "DISTINCT " } else { "" },
                self.translate_args(&args)?
            ),
        };
        if let Some(over) = &function.over {
            sql.push_str(&format!(" OVER {}", over));
        }
        Ok(sql)
    }

    fn translate_args(&self, args: &[&FunctionArg]) -> Result<String> {
        let rendered: Result<Vec<String>> = args
            .iter()
            .map(|arg| match arg {
                FunctionArg::Unnamed(FunctionArgExpr::Expr(e)) => self.translate_expr(e),
                FunctionArg::Unnamed(FunctionArgExpr::Wildcard) => Ok("*".to_string()),
                FunctionArg::Unnamed(FunctionArgExpr::QualifiedWildcard(prefix)) => {
                    Ok(format!("{}.*", quote_identifier(&table_name(prefix))))
                }
                other => Err(not_supported(format!("function argument {}", other))),
            })
            .collect();
        Ok(rendered?.join(", "))
    }

    /// LOCATE(substr, str[, pos])
    fn translate_locate(&self, name: &str, args: &[&FunctionArg]) -> Result<String> {
        let exprs = expr_args(name, args)?;
        match exprs.as_slice() {
            [needle, haystack] => Ok(format!(
                "INSTR({}, {})",
                self.translate_expr(haystack)?,
                self.translate_expr(needle)?
            )),
            [needle, haystack, start] => {
                let needle = self.translate_expr(needle)?;
                let haystack = self.translate_expr(haystack)?;
                let start = self.translate_expr(start)?;
                let found = format!("INSTR(SUBSTR({}, {}), {})", haystack, start, needle);
                Ok(format!(
                    "(CASE WHEN {found} > 0 THEN {found} + {start} - 1 ELSE 0 END)",
                    found = found,
                    start = start
                ))
            }
            _ => Err(not_supported("LOCATE with this number of arguments")),
        }
    }

    fn translate_date_format(&self, date: &Expr, format: &Expr) -> Result<String> {
        let format = match format {
            Expr::Value(Value::SingleQuotedString(s)) => unescape_string_content(s, '\''),
            Expr::Value(Value::DoubleQuotedString(s)) => unescape_string_content(s, '"'),
            _ => return Err(not_supported("DATE_FORMAT with a non-literal format")),
        };
        let mapped = mysql_to_strftime(&format)?;
        let sql = format!(
            "STRFTIME({}, {})",
            quote_string(&mapped),
            self.translate_expr(date)?
        );
        // Decimal hour.minute is used numerically
        if format == "%H.%i" {
            return Ok(format!("CAST({} AS FLOAT)", sql));
        }
        Ok(sql)
    }

    fn translate_group_concat(&self, list: &sp::FunctionArgumentList) -> Result<String> {
        let distinct = matches!(list.duplicate_treatment, Some(DuplicateTreatment::Distinct));
        let args: Vec<&FunctionArg> = list.args.iter().collect();
        let values: Result<Vec<String>> = expr_args("GROUP_CONCAT", &args)?
            .into_iter()
            .map(|e| self.translate_expr(e))
            .collect();
        let value = values?.join(" || ");

        let mut separator = "','".to_string();
        let mut order_by = String::new();
        for clause in &list.clauses {
            match clause {
                FunctionArgumentClause::Separator(sep) => separator = self.translate_value(sep)?,
                FunctionArgumentClause::OrderBy(exprs) => {
                    order_by = format!(" ORDER BY {}", self.translate_order_by(exprs)?);
                }
                other => return Err(not_supported(format!("GROUP_CONCAT clause {}", other))),
            }
        }

        if !distinct {
            return Ok(format!("GROUP_CONCAT({}, {}{})", value, separator, order_by));
        }
        // DISTINCT aggregates take a single argument in SQLite
        let grouped = format!("GROUP_CONCAT(DISTINCT {}{})", value, order_by);
        if separator == "','" {
            Ok(grouped)
        } else {
            Ok(format!("REPLACE({}, ',', {})", grouped, separator))
        }
    }
}

fn expr_args<'a>(name: &str, args: &[&'a FunctionArg]) -> Result<Vec<&'a Expr>> {
    args.iter()
        .map(|&arg| match arg {
            FunctionArg::Unnamed(FunctionArgExpr::Expr(e)) => Ok(e),
            other => Err(not_supported(format!("argument {} of {}", other, name))),
        })
        .collect()
}

fn first_arg<'a>(name: &str, args: &[&'a FunctionArg]) -> Result<&'a Expr> {
    expr_args(name, args)?
        .into_iter()
        .next()
        .ok_or_else(|| not_supported(format!("{} without arguments", name)))
}

fn exact_args<'a, const N: usize>(name: &str, args: &[&'a FunctionArg]) -> Result<[&'a Expr; N]> {
    let exprs = expr_args(name, args)?;
    let count = exprs.len();
    exprs
        .try_into()
        .map_err(|_| not_supported(format!("{} with {} arguments", name, count)))
}

/// Map DATE_FORMAT specifiers onto STRFTIME ones
fn mysql_to_strftime(format: &str) -> Result<String> {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let Some(spec) = chars.next() else {
            out.push('%');
            break;
        };
        let mapped = match spec {
            'Y' => "%Y",
            'X' | 'x' => "%G",
            'm' | 'c' => "%m",
            'd' => "%d",
            'e' => "%e",
            'H' => "%H",
            'k' => "%k",
            'h' | 'I' => "%I",
            'l' => "%l",
            'i' => "%M",
            'S' | 's' => "%S",
            'p' => "%p",
            'j' => "%j",
            'T' => "%H:%M:%S",
            'r' => "%I:%M:%S %p",
            'U' => "%U",
            'u' => "%W",
            'V' | 'v' => "%V",
            'w' => "%w",
            '%' => "%%",
            other => {
                return Err(not_supported(format!("DATE_FORMAT specifier %{}", other)));
            }
        };
        out.push_str(mapped);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::mysql_to_strftime;
    use crate::ast::Statement;
    use crate::error::DriverError;
    use crate::parser::{MySqlParser, SqlParser};
    use crate::translator::{TranslationContext, Translator};

    fn try_translate(expr: &str) -> crate::error::Result<String> {
        let sql = format!("SELECT {}", expr);
        let statement = MySqlParser::new().parse(&sql).unwrap().remove(0);
        let ctx = TranslationContext::new("wp", 4);
        match statement {
            Statement::Select { query, .. } => {
                let translated = Translator::new(&ctx).translate_query(&query)?;
                Ok(translated.strip_prefix("SELECT ").unwrap_or(&translated).to_string())
            }
            _ => panic!("Expected Select statement"),
        }
    }

    fn translate(expr: &str) -> String {
        try_translate(expr).unwrap()
    }

    // ========== Date and time ==========

    #[test]
    fn test_now_variants() {
        assert_eq!(translate("NOW()"), "CURRENT_TIMESTAMP");
        assert_eq!(translate("CURDATE()"), "CURRENT_DATE");
    }

    #[test]
    fn test_date_add_and_sub() {
        assert_eq!(
            translate("DATE_ADD(d, INTERVAL 3 MONTH)"),
            "DATETIME(`d`, '+' || 3 || ' MONTH')"
        );
        assert_eq!(
            translate("DATE_SUB(NOW(), INTERVAL 1 WEEK)"),
            "DATETIME(CURRENT_TIMESTAMP, '-' || (1 * 7) || ' DAY')"
        );
    }

    #[test]
    fn test_date_format() {
        assert_eq!(
            translate("DATE_FORMAT(d, '%Y-%m-%d %H:%i:%s')"),
            "STRFTIME('%Y-%m-%d %H:%M:%S', `d`)"
        );
        assert_eq!(
            translate("DATE_FORMAT(d, '%H.%i')"),
            "CAST(STRFTIME('%H.%M', `d`) AS FLOAT)"
        );
    }

    #[test]
    fn test_date_format_unknown_specifier() {
        match try_translate("DATE_FORMAT(d, '%W')") {
            Err(DriverError::NotSupported(cause)) => assert!(cause.contains("%W"), "Got: {}", cause),
            other => panic!("Expected NotSupported, got {:?}", other),
        }
    }

    #[test]
    fn test_date_parts() {
        assert_eq!(translate("YEAR(d)"), "CAST(STRFTIME('%Y', `d`) AS INTEGER)");
        assert_eq!(translate("DAYOFMONTH(d)"), "CAST(STRFTIME('%d', `d`) AS INTEGER)");
        assert_eq!(
            translate("WEEKDAY(d)"),
            "((CAST(STRFTIME('%w', `d`) AS INTEGER) + 6) % 7)"
        );
    }

    #[test]
    fn test_unix_time() {
        assert_eq!(
            translate("UNIX_TIMESTAMP()"),
            "CAST(STRFTIME('%s', 'now') AS INTEGER)"
        );
        assert_eq!(translate("FROM_UNIXTIME(0)"), "DATETIME(0, 'unixepoch')");
    }

    // ========== Strings ==========

    #[test]
    fn test_concat_and_lengths() {
        assert_eq!(translate("CONCAT(a, '-', b)"), "(`a` || '-' || `b`)");
        assert_eq!(translate("CHAR_LENGTH(a)"), "LENGTH(`a`)");
        assert_eq!(translate("LEFT(a, 3)"), "SUBSTRING(`a`, 1, 3)");
        assert_eq!(translate("UCASE(a)"), "UPPER(`a`)");
    }

    #[test]
    fn test_locate() {
        assert_eq!(translate("LOCATE('x', a)"), "INSTR(`a`, 'x')");
    }

    // ========== Conditionals and misc ==========

    #[test]
    fn test_if_and_isnull() {
        assert_eq!(translate("IF(a, 1, 2)"), "IIF(`a`, 1, 2)");
        assert_eq!(translate("ISNULL(a)"), "(`a` IS NULL)");
    }

    #[test]
    fn test_field() {
        assert_eq!(
            translate("FIELD(a, 'x', 'y')"),
            "CASE `a` WHEN 'x' THEN 1 WHEN 'y' THEN 2 ELSE 0 END"
        );
    }

    #[test]
    fn test_context_functions() {
        assert_eq!(translate("DATABASE()"), "'wp'");
        assert_eq!(translate("FOUND_ROWS() AS n"), "(SELECT 4) AS `n`");
        assert_eq!(translate("RAND()"), "RANDOM()");
    }

    #[test]
    fn test_found_rows_is_aliased() {
        assert_eq!(translate("FOUND_ROWS()"), "(SELECT 4) AS `FOUND_ROWS()`");
    }

    #[test]
    fn test_aggregates_pass_through() {
        assert_eq!(translate("COUNT(*)"), "COUNT(*)");
        assert_eq!(translate("COUNT(DISTINCT a)"), "COUNT(DISTINCT `a`)");
    }

    #[test]
    fn test_group_concat() {
        assert_eq!(
            translate("GROUP_CONCAT(a ORDER BY a DESC SEPARATOR ';')"),
            "GROUP_CONCAT(`a`, ';' ORDER BY `a` DESC)"
        );
        assert_eq!(translate("GROUP_CONCAT(DISTINCT a)"), "GROUP_CONCAT(DISTINCT `a`)");
    }

    #[test]
    fn test_strftime_mapping() {
        assert_eq!(mysql_to_strftime("%T %%").unwrap(), "%H:%M:%S %%");
    }
}
