use serde::{Deserialize, Serialize};

use crate::{Expr, Table};

/// A bound `DELETE` statement.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct DeleteStatement {
    pub table: Table,
    pub where_clause: Option<Expr>,
}
