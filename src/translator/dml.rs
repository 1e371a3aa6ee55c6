// INSERT, UPDATE and DELETE

use std::collections::HashMap;

use sqlparser::ast as sp;
use sqlparser::ast::{AssignmentTarget, FromTable, OnInsert, SetExpr, TableFactor};

use super::{not_supported, quote_ident, table_name, Translator};
use crate::ast::UpdateStatement;
use crate::codec::quote_identifier;
use crate::error::Result;

/// How a DELETE is carried out
#[derive(Debug, Clone, PartialEq)]
pub enum DeletePlan {
    /// One native DELETE
    Single(String),
    /// Select the target rowids first, then delete table by table
    Multi(MultiDelete),
}

/// `DELETE a, b FROM a JOIN b ...`
///
/// Column `i` of `select` holds the rowids to delete from `tables[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiDelete {
    pub select: String,
    pub tables: Vec<String>,
}

impl MultiDelete {
    pub fn delete_statement(&self, index: usize, rowids: &[String]) -> Option<String> {
        let table = self.tables.get(index)?;
        if rowids.is_empty() {
            return None;
        }
        Some(format!(
            "DELETE FROM {} WHERE rowid IN ({})",
            quote_identifier(table),
            rowids.join(", ")
        ))
    }
}

impl Translator<'_> {
    pub fn translate_insert(&self, insert: &sp::Insert) -> Result<String> {
        if insert.returning.is_some() {
            return Err(not_supported("INSERT ... RETURNING"));
        }

        let mut sql = if insert.replace_into {
            String::from("REPLACE INTO ")
        } else if insert.ignore {
            String::from("INSERT OR IGNORE INTO ")
        } else {
            String::from("INSERT INTO ")
        };
        sql.push_str(&quote_identifier(&table_name(&insert.table_name)));

        if !insert.columns.is_empty() {
            let columns: Vec<String> = insert.columns.iter().map(quote_ident).collect();
            sql.push_str(&format!(" ({})", columns.join(", ")));
        }

        let upsert = match &insert.on {
            Some(OnInsert::DuplicateKeyUpdate(assignments)) => Some(assignments),
            Some(other) => return Err(not_supported(format!("insert clause {}", other))),
            None => None,
        };

        match &insert.source {
            Some(source) => {
                let body = self.translate_query(source)?;
                // INSERT ... SELECT ... ON CONFLICT is ambiguous in SQLite without a WHERE
                if upsert.is_some() && !matches!(source.body.as_ref(), SetExpr::Values(_)) {
                    sql.push_str(&format!(" SELECT * FROM ({}) WHERE true", body));
                } else {
                    sql.push(' ');
                    sql.push_str(&body);
                }
            }
            None => sql.push_str(" DEFAULT VALUES"),
        }

        if let Some(assignments) = upsert {
            sql.push_str(" ON CONFLICT DO UPDATE SET ");
            sql.push_str(&self.translate_assignments(assignments)?);
        }
        Ok(sql)
    }

    pub fn translate_update(&self, update: &UpdateStatement) -> Result<String> {
        if !update.table.joins.is_empty() {
            return Err(not_supported("UPDATE with JOIN"));
        }
        let target = self.translate_table_factor(&update.table.relation)?;

        let mut sql = String::from("UPDATE ");
        if update.ignore {
            sql.push_str("OR IGNORE ");
        }
        sql.push_str(&target);
        sql.push_str(" SET ");
        sql.push_str(&self.translate_assignments(&update.assignments)?);
        sql.push_str(&self.translate_row_filter(
            &target,
            update.selection.as_ref(),
            &update.order_by,
            update.limit.as_ref(),
        )?);
        Ok(sql)
    }

    pub fn translate_delete(&self, delete: &sp::Delete) -> Result<DeletePlan> {
        if delete.returning.is_some() {
            return Err(not_supported("DELETE ... RETURNING"));
        }
        let from = match &delete.from {
            FromTable::WithFromKeyword(from) | FromTable::WithoutKeyword(from) => from,
        };

        // DELETE FROM a, b USING a JOIN b ...
        if let Some(using) = &delete.using {
            let targets: Vec<String> = from.iter().map(|twj| relation_name(&twj.relation)).collect();
            return self.translate_multi_delete(delete, &targets, using);
        }
        // DELETE a, b FROM a JOIN b ...
        if !delete.tables.is_empty() {
            let targets: Vec<String> = delete.tables.iter().map(table_name).collect();
            return self.translate_multi_delete(delete, &targets, from);
        }

        let [table] = from.as_slice() else {
            return Err(not_supported("DELETE from several tables without targets"));
        };
        if !table.joins.is_empty() {
            return Err(not_supported("DELETE with JOIN and no target tables"));
        }
        let target = self.translate_table_factor(&table.relation)?;
        let mut sql = format!("DELETE FROM {}", target);
        sql.push_str(&self.translate_row_filter(
            &target,
            delete.selection.as_ref(),
            &delete.order_by,
            delete.limit.as_ref(),
        )?);
        Ok(DeletePlan::Single(sql))
    }

    fn translate_multi_delete(
        &self,
        delete: &sp::Delete,
        targets: &[String],
        from: &[sp::TableWithJoins],
    ) -> Result<DeletePlan> {
        if !delete.order_by.is_empty() || delete.limit.is_some() {
            return Err(not_supported("ORDER BY or LIMIT in a multi-table DELETE"));
        }

        let mut aliases = HashMap::new();
        for twj in from {
            collect_aliases(&twj.relation, &mut aliases);
            for join in &twj.joins {
                collect_aliases(&join.relation, &mut aliases);
            }
        }

        let mut tables = Vec::with_capacity(targets.len());
        let mut columns = Vec::with_capacity(targets.len());
        for target in targets {
            let key = target.to_lowercase();
            let table = aliases.get(&key).cloned().unwrap_or_else(|| target.clone());
            columns.push(format!(
                "{}.rowid AS {}",
                quote_identifier(target),
                quote_identifier(&format!("{}_rowid", target))
            ));
            tables.push(table);
        }

        let from: Result<Vec<String>> =
            from.iter().map(|twj| self.translate_table_with_joins(twj)).collect();
        let mut select = format!("SELECT {} FROM {}", columns.join(", "), from?.join(", "));
        if let Some(selection) = &delete.selection {
            select.push_str(&format!(" WHERE {}", self.translate_expr(selection)?));
        }
        Ok(DeletePlan::Multi(MultiDelete { select, tables }))
    }

    /// WHERE clause of UPDATE/DELETE; ORDER BY and LIMIT go through a rowid subquery
    fn translate_row_filter(
        &self,
        target: &str,
        selection: Option<&sp::Expr>,
        order_by: &[sp::OrderByExpr],
        limit: Option<&sp::Expr>,
    ) -> Result<String> {
        let where_clause = match selection {
            Some(expr) => format!(" WHERE {}", self.translate_expr(expr)?),
            None => String::new(),
        };
        if order_by.is_empty() && limit.is_none() {
            return Ok(where_clause);
        }

        let mut subquery = format!("SELECT rowid FROM {}{}", target, where_clause);
        if !order_by.is_empty() {
            subquery.push_str(&format!(" ORDER BY {}", self.translate_order_by(order_by)?));
        }
        if let Some(limit) = limit {
            subquery.push_str(&format!(" LIMIT {}", self.translate_expr(limit)?));
        }
        Ok(format!(" WHERE rowid IN ( {} )", subquery))
    }

    fn translate_assignments(&self, assignments: &[sp::Assignment]) -> Result<String> {
        let items: Result<Vec<String>> = assignments
            .iter()
            .map(|assignment| {
                let column = match &assignment.target {
                    AssignmentTarget::ColumnName(name) => quote_identifier(&table_name(name)),
                    AssignmentTarget::Tuple(_) => {
                        return Err(not_supported("tuple assignment"));
                    }
                };
                Ok(format!("{} = {}", column, self.translate_expr(&assignment.value)?))
            })
            .collect();
        Ok(items?.join(", "))
    }
}

fn relation_name(factor: &TableFactor) -> String {
    match factor {
        TableFactor::Table { name, .. } => table_name(name),
        other => other.to_string(),
    }
}

fn collect_aliases(factor: &TableFactor, aliases: &mut HashMap<String, String>) {
    match factor {
        TableFactor::Table { name, alias, .. } => {
            let table = table_name(name);
            if let Some(alias) = alias {
                aliases.insert(alias.name.value.to_lowercase(), table.clone());
            }
            aliases.insert(table.to_lowercase(), table);
        }
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => {
            collect_aliases(&table_with_joins.relation, aliases);
            for join in &table_with_joins.joins {
                collect_aliases(&join.relation, aliases);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Statement;
    use crate::error::DriverError;
    use crate::parser::{MySqlParser, SqlParser};
    use crate::translator::TranslationContext;

    fn parse(sql: &str) -> Statement {
        MySqlParser::new().parse(sql).unwrap().remove(0)
    }

    fn translate(sql: &str) -> Result<String> {
        let ctx = TranslationContext::new("wp", 0);
        let translator = Translator::new(&ctx);
        match parse(sql) {
            Statement::Insert(insert) => translator.translate_insert(&insert),
            Statement::Update(update) => translator.translate_update(&update),
            Statement::Delete(delete) => match translator.translate_delete(&delete)? {
                DeletePlan::Single(sql) => Ok(sql),
                DeletePlan::Multi(plan) => Ok(plan.select),
            },
            other => panic!("Expected DML statement, got {:?}", other.kind()),
        }
    }

    // ========== INSERT ==========

    #[test]
    fn test_insert_values() {
        assert_eq!(
            translate("INSERT INTO t (a, b) VALUES (1, 'x'), (2, 'y')").unwrap(),
            "INSERT INTO `t` (`a`, `b`) VALUES (1, 'x'), (2, 'y')"
        );
    }

    #[test]
    fn test_insert_ignore_and_replace() {
        assert_eq!(
            translate("INSERT IGNORE INTO t (a) VALUES (1)").unwrap(),
            "INSERT OR IGNORE INTO `t` (`a`) VALUES (1)"
        );
        assert_eq!(
            translate("REPLACE INTO t (a) VALUES (1)").unwrap(),
            "REPLACE INTO `t` (`a`) VALUES (1)"
        );
    }

    #[test]
    fn test_insert_on_duplicate_key_update() {
        assert_eq!(
            translate("INSERT INTO t (id, v) VALUES (1, 2) ON DUPLICATE KEY UPDATE v = VALUES(v)").unwrap(),
            "INSERT INTO `t` (`id`, `v`) VALUES (1, 2) ON CONFLICT DO UPDATE SET `v` = `excluded`.`v`"
        );
    }

    #[test]
    fn test_insert_select_with_upsert() {
        assert_eq!(
            translate("INSERT INTO t (id) SELECT id FROM u ON DUPLICATE KEY UPDATE id = id").unwrap(),
            "INSERT INTO `t` (`id`) SELECT * FROM (SELECT `id` FROM `u`) WHERE true ON CONFLICT DO UPDATE SET `id` = `id`"
        );
    }

    // ========== UPDATE ==========

    #[test]
    fn test_update() {
        assert_eq!(
            translate("UPDATE IGNORE t SET a = a + 1, b = 'x' WHERE id = 3").unwrap(),
            "UPDATE OR IGNORE `t` SET `a` = `a` + 1, `b` = 'x' WHERE `id` = 3"
        );
    }

    #[test]
    fn test_update_with_order_and_limit() {
        assert_eq!(
            translate("UPDATE t SET a = 1 WHERE b = 2 ORDER BY id DESC LIMIT 3").unwrap(),
            "UPDATE `t` SET `a` = 1 WHERE rowid IN ( SELECT rowid FROM `t` WHERE `b` = 2 ORDER BY `id` DESC LIMIT 3 )"
        );
    }

    #[test]
    fn test_update_with_join_is_not_supported() {
        match MySqlParser::new().parse("UPDATE t JOIN u ON t.id = u.id SET t.a = u.a") {
            Err(DriverError::NotSupported(cause)) => {
                assert!(cause.contains("multiple tables"), "cause should name the join: {}", cause)
            }
            other => panic!("Expected NotSupported, got {:?}", other),
        }
    }

    // ========== DELETE ==========

    #[test]
    fn test_delete_single_table() {
        assert_eq!(
            translate("DELETE FROM t WHERE id = 1").unwrap(),
            "DELETE FROM `t` WHERE `id` = 1"
        );
        assert_eq!(
            translate("DELETE FROM t ORDER BY id LIMIT 2").unwrap(),
            "DELETE FROM `t` WHERE rowid IN ( SELECT rowid FROM `t` ORDER BY `id` LIMIT 2 )"
        );
    }

    #[test]
    fn test_multi_table_delete_plan() {
        let ctx = TranslationContext::new("wp", 0);
        let statement = parse("DELETE a, b FROM posts a JOIN meta b ON b.post_id = a.id WHERE a.id = 5");
        let Statement::Delete(delete) = statement else {
            panic!("Expected Delete statement");
        };
        match Translator::new(&ctx).translate_delete(&delete).unwrap() {
            DeletePlan::Multi(plan) => {
                assert_eq!(plan.tables, vec!["posts".to_string(), "meta".to_string()]);
                assert_eq!(
                    plan.select,
                    "SELECT `a`.rowid AS `a_rowid`, `b`.rowid AS `b_rowid` FROM `posts` AS `a` \
                     JOIN `meta` AS `b` ON `b`.`post_id` = `a`.`id` WHERE `a`.`id` = 5"
                );
                assert_eq!(
                    plan.delete_statement(1, &["7".to_string(), "9".to_string()]).as_deref(),
                    Some("DELETE FROM `meta` WHERE rowid IN (7, 9)")
                );
                assert_eq!(plan.delete_statement(0, &[]), None, "no rowids means no statement");
            }
            other => panic!("Expected Multi plan, got {:?}", other),
        }
    }
}
