// Queries: SELECT, set operations, FROM/JOIN, ORDER BY and LIMIT

use sqlparser::ast as sp;
use sqlparser::ast::{Expr, GroupByExpr, JoinConstraint, JoinOperator, SelectItem, SetExpr, TableFactor};

use super::{not_supported, quote_ident, table_name, Translator};
use crate::codec::{quote_identifier, unquote_identifier};
use crate::error::Result;

/// information_schema views backed by the metadata tables
const INFORMATION_SCHEMA_VIEWS: &[&str] = &["tables", "columns", "statistics"];

impl Translator<'_> {
    pub fn translate_query(&self, query: &sp::Query) -> Result<String> {
        let mut sql = String::new();

        if let Some(with) = &query.with {
            sql.push_str("WITH ");
            if with.recursive {
                sql.push_str("RECURSIVE ");
            }
            let ctes: Result<Vec<String>> = with
                .cte_tables
                .iter()
                .map(|cte| Ok(format!("{} AS ({})", cte.alias, self.translate_query(&cte.query)?)))
                .collect();
            sql.push_str(&ctes?.join(", "));
            sql.push(' ');
        }

        sql.push_str(&self.translate_set_expr(&query.body)?);

        if let Some(order_by) = &query.order_by {
            if !order_by.exprs.is_empty() {
                sql.push_str(" ORDER BY ");
                sql.push_str(&self.translate_order_by(&order_by.exprs)?);
            }
        }

        // LIMIT offset, count arrives as limit + offset
        match (&query.limit, &query.offset) {
            (Some(limit), offset) => {
                sql.push_str(&format!(" LIMIT {}", self.translate_expr(limit)?));
                if let Some(offset) = offset {
                    sql.push_str(&format!(" OFFSET {}", self.translate_expr(&offset.value)?));
                }
            }
            (None, Some(offset)) => {
                sql.push_str(&format!(" LIMIT -1 OFFSET {}", self.translate_expr(&offset.value)?));
            }
            (None, None) => {}
        }

        if query.fetch.is_some() {
            return Err(not_supported("FETCH clause"));
        }
        // FOR UPDATE / LOCK IN SHARE MODE have no effect on a single connection
        Ok(sql)
    }

    pub fn translate_set_expr(&self, body: &SetExpr) -> Result<String> {
        match body {
            SetExpr::Select(select) => self.translate_select(select),
            SetExpr::Query(query) => Ok(format!("SELECT * FROM ({})", self.translate_query(query)?)),
            SetExpr::SetOperation {
                op,
                set_quantifier,
                left,
                right,
            } => {
                let quantifier = match set_quantifier {
                    sp::SetQuantifier::All => " ALL",
                    _ => "",
                };
                Ok(format!(
                    "{} {}{} {}",
                    self.translate_compound_member(left)?,
                    op,
                    quantifier,
                    self.translate_compound_member(right)?
                ))
            }
            SetExpr::Values(values) => {
                let rows: Result<Vec<String>> = values
                    .rows
                    .iter()
                    .map(|row| Ok(format!("({})", self.translate_expr_list(row)?)))
                    .collect();
                Ok(format!("VALUES {}", rows?.join(", ")))
            }
            other => Err(not_supported(format!("query body {}", other))),
        }
    }

    /// SQLite does not accept parenthesised members of a compound select
    fn translate_compound_member(&self, body: &SetExpr) -> Result<String> {
        match body {
            SetExpr::Query(query)
                if query.order_by.is_none()
                    && query.limit.is_none()
                    && query.offset.is_none()
                    && query.with.is_none() =>
            {
                self.translate_set_expr(&query.body)
            }
            other => self.translate_set_expr(other),
        }
    }

    fn translate_select(&self, select: &sp::Select) -> Result<String> {
        let mut sql = String::from("SELECT ");
        match &select.distinct {
            Some(sp::Distinct::Distinct) => sql.push_str("DISTINCT "),
            Some(sp::Distinct::On(_)) => return Err(not_supported("DISTINCT ON")),
            None => {}
        }

        let items: Result<Vec<String>> = select
            .projection
            .iter()
            .map(|item| self.translate_select_item(item))
            .collect();
        sql.push_str(&items?.join(", "));

        let from: Vec<&sp::TableWithJoins> = select
            .from
            .iter()
            .filter(|twj| !is_dual(twj))
            .collect();
        if !from.is_empty() {
            let tables: Result<Vec<String>> =
                from.iter().map(|twj| self.translate_table_with_joins(twj)).collect();
            sql.push_str(" FROM ");
            sql.push_str(&tables?.join(", "));
        }

        if let Some(selection) = &select.selection {
            sql.push_str(&format!(" WHERE {}", self.translate_expr(selection)?));
        }

        let mut has_group_by = false;
        match &select.group_by {
            GroupByExpr::Expressions(exprs, modifiers) => {
                if !modifiers.is_empty() {
                    return Err(not_supported("GROUP BY modifiers"));
                }
                if !exprs.is_empty() {
                    has_group_by = true;
                    sql.push_str(&format!(" GROUP BY {}", self.translate_expr_list(exprs)?));
                }
            }
            GroupByExpr::All(_) => return Err(not_supported("GROUP BY ALL")),
        }

        if let Some(having) = &select.having {
            // SQLite requires GROUP BY before HAVING. Grouping by the first
            // item fails when that item is an aggregate.
            if !has_group_by {
                sql.push_str(" GROUP BY 1");
            }
            sql.push_str(&format!(" HAVING {}", self.translate_expr(having)?));
        }

        Ok(sql)
    }

    fn translate_select_item(&self, item: &SelectItem) -> Result<String> {
        match item {
            SelectItem::UnnamedExpr(expr) => {
                let sql = self.translate_expr(expr)?;
                if is_found_rows_call(expr) {
                    return Ok(format!("{} AS {}", sql, quote_identifier("FOUND_ROWS()")));
                }
                Ok(sql)
            }
            SelectItem::ExprWithAlias { expr, alias } => {
                Ok(format!("{} AS {}", self.translate_expr(expr)?, quote_ident(alias)))
            }
            SelectItem::Wildcard(_) => Ok("*".to_string()),
            SelectItem::QualifiedWildcard(prefix, _) => {
                Ok(format!("{}.*", quote_display_path(&prefix.to_string())))
            }
        }
    }

    pub fn translate_table_with_joins(&self, twj: &sp::TableWithJoins) -> Result<String> {
        let mut sql = self.translate_table_factor(&twj.relation)?;
        for join in &twj.joins {
            sql.push_str(&self.translate_join(join)?);
        }
        Ok(sql)
    }

    fn translate_join(&self, join: &sp::Join) -> Result<String> {
        let relation = self.translate_table_factor(&join.relation)?;
        let (keyword, constraint) = match &join.join_operator {
            JoinOperator::Inner(c) => ("JOIN", Some(c)),
            JoinOperator::LeftOuter(c) => ("LEFT JOIN", Some(c)),
            JoinOperator::RightOuter(c) => ("RIGHT JOIN", Some(c)),
            JoinOperator::FullOuter(c) => ("FULL OUTER JOIN", Some(c)),
            JoinOperator::CrossJoin => ("CROSS JOIN", None),
            other => return Err(not_supported(format!("join {:?}", other))),
        };

        let (natural, condition) = match constraint {
            Some(JoinConstraint::On(expr)) => ("", format!(" ON {}", self.translate_expr(expr)?)),
            Some(JoinConstraint::Using(columns)) => {
                let cols: Vec<String> = columns
                    .iter()
                    .map(|c| quote_identifier(&unquote_identifier(&c.to_string())))
                    .collect();
                ("", format!(" USING ({})", cols.join(", ")))
            }
            Some(JoinConstraint::Natural) => ("NATURAL ", String::new()),
            Some(JoinConstraint::None) | None => ("", String::new()),
        };
        Ok(format!(" {}{} {}{}", natural, keyword, relation, condition))
    }

    pub fn translate_table_factor(&self, factor: &TableFactor) -> Result<String> {
        match factor {
            TableFactor::Table { name, alias, .. } => {
                let alias = alias.as_ref().map(|a| quote_ident(&a.name));
                let (table, implicit_alias) = self.translate_table_reference(name);
                Ok(match (alias, implicit_alias) {
                    (Some(alias), _) | (None, Some(alias)) => format!("{} AS {}", table, alias),
                    (None, None) => table,
                })
            }
            TableFactor::Derived {
                subquery, alias, ..
            } => {
                let mut sql = format!("({})", self.translate_query(subquery)?);
                if let Some(alias) = alias {
                    sql.push_str(&format!(" AS {}", quote_ident(&alias.name)));
                }
                Ok(sql)
            }
            TableFactor::NestedJoin {
                table_with_joins,
                alias,
            } => {
                let mut sql = format!("({})", self.translate_table_with_joins(table_with_joins)?);
                if let Some(alias) = alias {
                    sql.push_str(&format!(" AS {}", quote_ident(&alias.name)));
                }
                Ok(sql)
            }
            other => Err(not_supported(format!("table factor {}", other))),
        }
    }

    /// Quoted table name, plus the alias needed when it is rewritten
    fn translate_table_reference(&self, name: &sp::ObjectName) -> (String, Option<String>) {
        let table = table_name(name);
        if let [schema, _] = name.0.as_slice() {
            let view = table.to_lowercase();
            if schema.value.eq_ignore_ascii_case("information_schema")
                && INFORMATION_SCHEMA_VIEWS.contains(&view.as_str())
            {
                return (
                    format!("_mysql_information_schema_{}", view),
                    Some(quote_identifier(&table)),
                );
            }
        }
        (quote_identifier(&table), None)
    }

    pub fn translate_order_by(&self, exprs: &[sp::OrderByExpr]) -> Result<String> {
        let items: Result<Vec<String>> = exprs
            .iter()
            .map(|item| {
                let mut sql = self.translate_expr(&item.expr)?;
                match item.asc {
                    Some(true) => sql.push_str(" ASC"),
                    Some(false) => sql.push_str(" DESC"),
                    None => {}
                }
                match item.nulls_first {
                    Some(true) => sql.push_str(" NULLS FIRST"),
                    Some(false) => sql.push_str(" NULLS LAST"),
                    None => {}
                }
                Ok(sql)
            })
            .collect();
        Ok(items?.join(", "))
    }
}

fn is_dual(twj: &sp::TableWithJoins) -> bool {
    match &twj.relation {
        TableFactor::Table { name, alias: None, .. } if twj.joins.is_empty() => {
            matches!(name.0.as_slice(), [ident] if ident.quote_style.is_none() && ident.value.eq_ignore_ascii_case("dual"))
        }
        _ => false,
    }
}

fn is_found_rows_call(expr: &Expr) -> bool {
    matches!(expr, Expr::Function(f) if table_name(&f.name).eq_ignore_ascii_case("FOUND_ROWS"))
}

/// Re-quote a dotted name as rendered by the parser, e.g. `t`.x → `t`.`x`
fn quote_display_path(path: &str) -> String {
    path.split('.')
        .map(|part| quote_identifier(&unquote_identifier(part)))
        .collect::<Vec<_>>()
        .join(".")
}
