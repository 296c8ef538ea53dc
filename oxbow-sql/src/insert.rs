use serde::{Deserialize, Serialize};

use crate::{Column, Expr, SelectStatement, Table};

/// The source of the rows being inserted.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum InsertData {
    /// `INSERT INTO t VALUES (...), (...)`
    Values(Vec<Vec<Expr>>),
    /// `INSERT INTO t SELECT ...`
    Select(Box<SelectStatement>),
}

/// A bound `INSERT` statement.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct InsertStatement {
    pub table: Table,
    /// The explicit target column list, if one was written.
    pub fields: Option<Vec<Column>>,
    pub data: InsertData,
}
