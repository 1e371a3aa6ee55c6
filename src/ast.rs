// Parsed statement model
//
// DML keeps sqlparser's nodes (the translator walks them directly); DDL and
// admin statements are converted into the neutral types below so that the
// information schema store never depends on parser internals.

use sqlparser::ast as sp;

/// One parsed MySQL statement
#[derive(Debug, Clone)]
pub enum Statement {
    Select {
        query: Box<sp::Query>,
        calc_found_rows: bool,
    },
    Insert(Box<sp::Insert>),
    Update(UpdateStatement),
    Delete(Box<sp::Delete>),
    CreateTable(TableDefinition),
    AlterTable {
        table: String,
        actions: Vec<AlterAction>,
    },
    DropTable {
        tables: Vec<String>,
        if_exists: bool,
        temporary: bool,
    },
    Show(ShowStatement),
    Describe {
        table: String,
    },
    Transaction(TransactionCommand),
    Set,
    Use {
        database: String,
    },
}

impl Statement {
    /// Short label used in logs and error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::Select { .. } => "SELECT",
            Statement::Insert(insert) if insert.replace_into => "REPLACE",
            Statement::Insert(_) => "INSERT",
            Statement::Update(_) => "UPDATE",
            Statement::Delete(_) => "DELETE",
            Statement::CreateTable(_) => "CREATE TABLE",
            Statement::AlterTable { .. } => "ALTER TABLE",
            Statement::DropTable { .. } => "DROP TABLE",
            Statement::Show(_) => "SHOW",
            Statement::Describe { .. } => "DESCRIBE",
            Statement::Transaction(_) => "TRANSACTION",
            Statement::Set => "SET",
            Statement::Use { .. } => "USE",
        }
    }
}

/// UPDATE with the MySQL-only clauses the parser does not model
#[derive(Debug, Clone)]
pub struct UpdateStatement {
    pub table: sp::TableWithJoins,
    pub assignments: Vec<sp::Assignment>,
    pub selection: Option<sp::Expr>,
    pub ignore: bool,
    pub order_by: Vec<sp::OrderByExpr>,
    pub limit: Option<sp::Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionCommand {
    Begin,
    Commit,
    Rollback,
}

// ========== DDL ==========

/// A MySQL column type as written, normalized to lowercase
/// e.g., INT(11) UNSIGNED → name "int", args ["11"], unsigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataType {
    pub name: String,
    pub args: Vec<String>,
    pub unsigned: bool,
    pub zerofill: bool,
    /// NATIONAL/N-prefixed character types use utf8 (3 bytes per char)
    pub national: bool,
}

impl DataType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            unsigned: false,
            zerofill: false,
            national: false,
        }
    }

    pub fn with_args(mut self, args: &[&str]) -> Self {
        self.args = args.iter().map(|a| a.to_string()).collect();
        self
    }
}

/// Column default as declared
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Null,
    /// Literal value with MySQL escapes already resolved
    Literal(String),
    CurrentTimestamp,
    Expression(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    pub not_null: bool,
    pub default: Option<DefaultValue>,
    pub auto_increment: bool,
    pub on_update_current_timestamp: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub comment: Option<String>,
    pub collation: Option<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            not_null: false,
            default: None,
            auto_increment: false,
            on_update_current_timestamp: false,
            primary_key: false,
            unique: false,
            comment: None,
            collation: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Primary,
    Unique,
    Index,
    Fulltext,
    Spatial,
}

impl IndexKind {
    pub fn is_unique(self) -> bool {
        matches!(self, IndexKind::Primary | IndexKind::Unique)
    }

    pub fn index_type(self) -> &'static str {
        match self {
            IndexKind::Fulltext => "FULLTEXT",
            IndexKind::Spatial => "SPATIAL",
            _ => "BTREE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumn {
    pub name: String,
    /// Prefix length, e.g. KEY (name(20))
    pub sub_part: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    /// None for unnamed indexes; the store derives a name from the first column
    pub name: Option<String>,
    pub kind: IndexKind,
    pub columns: Vec<IndexColumn>,
}

/// Table options that follow the column list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableOptions {
    pub engine: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub comment: Option<String>,
    pub row_format: Option<String>,
    pub auto_increment: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct TableDefinition {
    pub name: String,
    pub temporary: bool,
    pub if_not_exists: bool,
    pub columns: Vec<ColumnDefinition>,
    pub indexes: Vec<IndexDefinition>,
    pub options: TableOptions,
    /// CREATE TABLE ... [AS] SELECT
    pub as_select: Option<Box<sp::Query>>,
}

#[derive(Debug, Clone)]
pub enum AlterAction {
    AddColumn(ColumnDefinition),
    DropColumn(String),
    /// CHANGE [COLUMN] old new type ...
    ChangeColumn {
        old_name: String,
        column: ColumnDefinition,
    },
    ModifyColumn(ColumnDefinition),
    RenameColumn {
        old_name: String,
        new_name: String,
    },
    AddIndex(IndexDefinition),
    DropIndex(String),
    DropPrimaryKey,
    SetDefault {
        column: String,
        default: DefaultValue,
    },
    DropDefault(String),
}

// ========== SHOW ==========

/// LIKE 'pattern' or WHERE expr after SHOW TABLES / TABLE STATUS
#[derive(Debug, Clone)]
pub enum ShowFilter {
    /// Pattern with MySQL escapes resolved (wildcard escapes kept)
    Like(String),
    Where(sp::Expr),
}

#[derive(Debug, Clone)]
pub enum ShowStatement {
    CreateTable {
        table: String,
    },
    Index {
        table: String,
    },
    Tables {
        full: bool,
        database: Option<String>,
        filter: Option<ShowFilter>,
    },
    TableStatus {
        database: Option<String>,
        filter: Option<ShowFilter>,
    },
    Columns {
        table: String,
    },
    Grants,
    Variables,
}
