// SELECT and SQL_CALC_FOUND_ROWS

use sqlparser::ast as sp;
use sqlparser::ast::SetExpr;

use super::{Executor, StatementResult};
use crate::error::Result;

impl Executor<'_> {
    pub(super) fn execute_select(
        &mut self,
        query: &sp::Query,
        calc_found_rows: bool,
    ) -> Result<StatementResult> {
        let translator = self.translator();

        let counted = if calc_found_rows {
            let mut unlimited = query.clone();
            strip_limit(&mut unlimited);
            let sql = format!(
                "SELECT COUNT(*) AS cnt FROM ({})",
                translator.translate_query(&unlimited)?
            );
            let count = self.engine.query_value(&sql, &[])?;
            Some(count.and_then(|c| c.parse().ok()).unwrap_or(0))
        } else {
            None
        };

        let sql = translator.translate_query(query)?;
        let rows = self.engine.query(&sql, &[])?;
        Ok(match counted {
            Some(found_rows) => StatementResult::Rows { rows, found_rows },
            None => StatementResult::rows(rows),
        })
    }
}

/// Drop LIMIT/OFFSET from the query expression that carries them
fn strip_limit(query: &mut sp::Query) {
    if query.limit.is_some() || query.offset.is_some() {
        query.limit = None;
        query.offset = None;
        return;
    }
    if let SetExpr::Query(inner) = query.body.as_mut() {
        strip_limit(inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Statement;
    use crate::parser::{MySqlParser, SqlParser};

    fn query(sql: &str) -> Box<sp::Query> {
        match MySqlParser::new().parse(sql).unwrap().remove(0) {
            Statement::Select { query, .. } => query,
            other => panic!("Expected Select, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_strip_limit_on_outer_query() {
        let mut q = query("SELECT a FROM t ORDER BY a LIMIT 5 OFFSET 10");
        strip_limit(&mut q);
        assert!(q.limit.is_none() && q.offset.is_none());
        assert!(q.order_by.is_some(), "ORDER BY should be kept");
    }

    #[test]
    fn test_strip_limit_descends_into_parentheses() {
        let mut q = query("(SELECT a FROM t LIMIT 1)");
        strip_limit(&mut q);
        match q.body.as_ref() {
            SetExpr::Query(inner) => assert!(inner.limit.is_none(), "inner LIMIT should be gone"),
            other => panic!("Expected parenthesised query, got {:?}", other),
        }
    }
}
