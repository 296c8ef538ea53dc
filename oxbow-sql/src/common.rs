use serde::{Deserialize, Serialize};

use crate::Expr;

/// One item of a `SELECT` list.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum FieldDefinitionExpr {
    /// `*`
    All,
    /// `table.*`
    AllInTable(String),
    /// An arbitrary expression, with the alias it was given, if any.
    Expr { expr: Expr, alias: Option<String> },
}

/// Constructs a [`FieldDefinitionExpr::Expr`] without an alias
impl From<Expr> for FieldDefinitionExpr {
    fn from(expr: Expr) -> Self {
        FieldDefinitionExpr::Expr { expr, alias: None }
    }
}
