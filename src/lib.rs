// Public API exports

pub mod ast;
pub mod codec;
pub mod config;
pub mod driver;
pub mod emitter;
pub mod engine;
pub mod error;
pub mod executor;
pub mod parser;
pub mod schema;
pub mod translator;

pub use config::{DriverConfig, JournalMode};
pub use driver::{Driver, FetchMode, QueryOutcome, QueryResult, Row};
pub use error::{DriverError, QueryError};
