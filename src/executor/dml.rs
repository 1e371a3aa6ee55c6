// INSERT, UPDATE and DELETE

use std::collections::BTreeSet;

use sqlparser::ast as sp;

use super::{Executor, StatementResult};
use crate::ast::UpdateStatement;
use crate::error::Result;
use crate::translator::{DeletePlan, MultiDelete};

impl Executor<'_> {
    pub(super) fn execute_insert(&mut self, insert: &sp::Insert) -> Result<StatementResult> {
        let sql = self.translator().translate_insert(insert)?;
        self.engine.execute(&sql, &[])?;
        Ok(StatementResult::Affected(self.changes()?))
    }

    pub(super) fn execute_update(&mut self, update: &UpdateStatement) -> Result<StatementResult> {
        let sql = self.translator().translate_update(update)?;
        self.engine.execute(&sql, &[])?;
        Ok(StatementResult::Affected(self.changes()?))
    }

    pub(super) fn execute_delete(&mut self, delete: &sp::Delete) -> Result<StatementResult> {
        match self.translator().translate_delete(delete)? {
            DeletePlan::Single(sql) => {
                self.engine.execute(&sql, &[])?;
                Ok(StatementResult::Affected(self.changes()?))
            }
            DeletePlan::Multi(plan) => self.execute_multi_delete(&plan),
        }
    }

    fn execute_multi_delete(&mut self, plan: &MultiDelete) -> Result<StatementResult> {
        let selected = self.engine.query(&plan.select, &[])?;

        let mut affected = 0;
        for index in 0..plan.tables.len() {
            // LEFT JOINs yield NULL rowids; a row may also match several times
            let rowids: BTreeSet<i64> = selected
                .rows
                .iter()
                .filter_map(|row| row.get(index).cloned().flatten())
                .filter_map(|rowid| rowid.parse().ok())
                .collect();
            let rowids: Vec<String> = rowids.iter().map(i64::to_string).collect();
            if let Some(sql) = plan.delete_statement(index, &rowids) {
                self.engine.execute(&sql, &[])?;
                affected += self.changes()?;
            }
        }
        Ok(StatementResult::Affected(affected))
    }
}
