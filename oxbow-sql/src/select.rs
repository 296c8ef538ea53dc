use serde::{Deserialize, Serialize};

use crate::{Expr, FieldDefinitionExpr, OrderClause, TableExpr};

/// `GROUP BY <columns> [HAVING <condition>]`.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct GroupByClause {
    pub columns: Vec<Expr>,
    pub having: Option<Expr>,
}

/// `LIMIT <limit> [OFFSET <offset>]`.
///
/// A `limit` of `-1` is the parser's sentinel for "no limit"; such a clause
/// produces no operator.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct LimitClause {
    pub limit: i64,
    pub offset: u64,
}

/// A bound `SELECT` statement.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct SelectStatement {
    /// The `FROM` clause; `None` for a scalar `SELECT`.
    pub table: Option<TableExpr>,
    pub distinct: bool,
    pub fields: Vec<FieldDefinitionExpr>,
    pub where_clause: Option<Expr>,
    pub group_by: Option<GroupByClause>,
    pub order: Option<OrderClause>,
    pub limit: Option<LimitClause>,
    /// Scope-nesting level assigned by the binder: 0 for a top-level
    /// statement, increasing by one per nested sub-select.
    pub depth: usize,
}
