// Transaction depth tracking
//
// Depth 0 uses native BEGIN/COMMIT/ROLLBACK; deeper levels use savepoints
// named LEVEL{n}, where n is the depth before the level was opened.

use tracing::debug;

use crate::engine::Engine;
use crate::error::Result;

#[derive(Debug, Default)]
pub struct TransactionManager {
    depth: usize,
}

impl TransactionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn begin(&mut self, engine: &mut Engine) -> Result<()> {
        let sql = if self.depth == 0 {
            "BEGIN".to_string()
        } else {
            format!("SAVEPOINT LEVEL{}", self.depth)
        };
        engine.execute(&sql, &[])?;
        self.depth += 1;
        debug!(depth = self.depth, "transaction level opened");
        Ok(())
    }

    /// COMMIT outside a transaction is accepted and does nothing
    pub fn commit(&mut self, engine: &mut Engine) -> Result<()> {
        if self.depth == 0 {
            return Ok(());
        }
        self.depth -= 1;
        let sql = if self.depth == 0 {
            "COMMIT".to_string()
        } else {
            format!("RELEASE SAVEPOINT LEVEL{}", self.depth)
        };
        engine.execute(&sql, &[])?;
        Ok(())
    }

    /// Roll back the innermost level only
    pub fn rollback(&mut self, engine: &mut Engine) -> Result<()> {
        if self.depth == 0 {
            return Ok(());
        }
        self.depth -= 1;
        let sql = if self.depth == 0 {
            "ROLLBACK".to_string()
        } else {
            format!("ROLLBACK TO SAVEPOINT LEVEL{}", self.depth)
        };
        engine.execute(&sql, &[])?;
        Ok(())
    }

    /// Discard the whole transaction, whatever the depth
    pub fn rollback_all(&mut self, engine: &mut Engine) -> Result<()> {
        if self.depth == 0 {
            return Ok(());
        }
        self.depth = 0;
        engine.execute("ROLLBACK", &[])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriverConfig;

    fn engine() -> Engine {
        Engine::open(&DriverConfig::in_memory("wp")).unwrap()
    }

    fn logged(engine: &Engine) -> Vec<String> {
        engine.log().iter().map(|s| s.sql.clone()).collect()
    }

    #[test]
    fn test_nested_levels_use_savepoints() {
        let mut engine = engine();
        let mut tx = TransactionManager::new();

        tx.begin(&mut engine).unwrap();
        tx.begin(&mut engine).unwrap();
        assert_eq!(tx.depth(), 2);
        tx.rollback(&mut engine).unwrap();
        tx.commit(&mut engine).unwrap();
        assert_eq!(tx.depth(), 0);

        assert_eq!(
            logged(&engine),
            vec!["BEGIN", "SAVEPOINT LEVEL1", "ROLLBACK TO SAVEPOINT LEVEL1", "COMMIT"]
        );
    }

    #[test]
    fn test_rollback_all_resets_depth() {
        let mut engine = engine();
        let mut tx = TransactionManager::new();

        tx.begin(&mut engine).unwrap();
        tx.begin(&mut engine).unwrap();
        tx.begin(&mut engine).unwrap();
        tx.rollback_all(&mut engine).unwrap();

        assert_eq!(tx.depth(), 0, "full discard should leave no open level");
        assert_eq!(logged(&engine).last().map(String::as_str), Some("ROLLBACK"));
    }

    #[test]
    fn test_commit_without_transaction_is_noop() {
        let mut engine = engine();
        let mut tx = TransactionManager::new();

        tx.commit(&mut engine).unwrap();
        tx.rollback(&mut engine).unwrap();
        assert!(engine.log().is_empty(), "nothing should reach SQLite");
    }
}
