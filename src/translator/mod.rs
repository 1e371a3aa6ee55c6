// MySQL to SQLite translator
//
// A recursive walk over the sqlparser AST that produces SQLite text. Every
// node either has a rule here or yields NotSupported naming the construct.

mod dml;
mod expr;
mod functions;
mod query;

pub use dml::{DeletePlan, MultiDelete};

use sqlparser::ast as sp;

use crate::codec::quote_identifier;
use crate::error::{DriverError, Result};

/// Per-call state visible to translation
#[derive(Debug, Clone, Default)]
pub struct TranslationContext {
    pub database: String,
    /// FOUND_ROWS() of the previous call
    pub found_rows: u64,
}

impl TranslationContext {
    pub fn new(database: impl Into<String>, found_rows: u64) -> Self {
        Self {
            database: database.into(),
            found_rows,
        }
    }
}

pub struct Translator<'a> {
    ctx: &'a TranslationContext,
}

impl<'a> Translator<'a> {
    pub fn new(ctx: &'a TranslationContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &TranslationContext {
        self.ctx
    }
}

/// Unqualified table name (the last part of `db.table`)
pub fn table_name(name: &sp::ObjectName) -> String {
    name.0
        .last()
        .map(|ident| ident.value.clone())
        .unwrap_or_default()
}

pub fn quote_ident(ident: &sp::Ident) -> String {
    quote_identifier(&ident.value)
}

pub(crate) fn not_supported(construct: impl std::fmt::Display) -> DriverError {
    DriverError::not_supported(construct.to_string())
}
