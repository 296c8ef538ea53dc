use serde::{Deserialize, Serialize};

use crate::{Column, Expr, Table};

/// A bound `UPDATE` statement.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct UpdateStatement {
    pub table: Table,
    /// The `SET` clauses, in statement order.
    pub fields: Vec<(Column, Expr)>,
    pub where_clause: Option<Expr>,
}
