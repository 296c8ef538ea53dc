use std::fmt;
use std::iter;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{Column, Literal, SelectStatement};

/// Binary infix operators.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum BinaryOperator {
    And,
    Or,
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    /// True for the comparison operators the planner pairs with scalar
    /// subqueries: `=`, `<`, `<=`, `>`, `>=`.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::Greater
                | BinaryOperator::GreaterOrEqual
                | BinaryOperator::Less
                | BinaryOperator::LessOrEqual
        )
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let op = match *self {
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterOrEqual => ">=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessOrEqual => "<=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
        };
        write!(f, "{}", op)
    }
}

/// Function call expressions.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum FunctionExpr {
    /// `AVG` aggregation. The boolean argument is `true` if `DISTINCT`
    Avg { expr: Box<Expr>, distinct: bool },

    /// `COUNT` aggregation
    Count { expr: Box<Expr>, distinct: bool },

    /// `COUNT(*)` aggregation
    CountStar,

    /// `SUM` aggregation
    Sum { expr: Box<Expr>, distinct: bool },

    /// `MAX` aggregation
    Max(Box<Expr>),

    /// `MIN` aggregation
    Min(Box<Expr>),

    /// Generic function call expression
    Call { name: String, arguments: Vec<Expr> },
}

impl FunctionExpr {
    /// Returns an iterator over all the direct arguments passed to the given
    /// function call expression
    pub fn arguments(&self) -> Box<dyn Iterator<Item = &Expr> + '_> {
        match self {
            FunctionExpr::Avg { expr: arg, .. }
            | FunctionExpr::Count { expr: arg, .. }
            | FunctionExpr::Sum { expr: arg, .. }
            | FunctionExpr::Max(arg)
            | FunctionExpr::Min(arg) => Box::new(iter::once(arg.as_ref())),
            FunctionExpr::CountStar => Box::new(iter::empty()),
            FunctionExpr::Call { arguments, .. } => Box::new(arguments.iter()),
        }
    }

    /// Like [`arguments`](Self::arguments), but yielding mutable references.
    pub fn arguments_mut(&mut self) -> Box<dyn Iterator<Item = &mut Expr> + '_> {
        match self {
            FunctionExpr::Avg { expr: arg, .. }
            | FunctionExpr::Count { expr: arg, .. }
            | FunctionExpr::Sum { expr: arg, .. }
            | FunctionExpr::Max(arg)
            | FunctionExpr::Min(arg) => Box::new(iter::once(arg.as_mut())),
            FunctionExpr::CountStar => Box::new(iter::empty()),
            FunctionExpr::Call { arguments, .. } => Box::new(arguments.iter_mut()),
        }
    }
}

impl fmt::Display for FunctionExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FunctionExpr::Avg { expr, distinct } => {
                write!(f, "avg({}{})", if *distinct { "distinct " } else { "" }, expr)
            }
            FunctionExpr::Count { expr, distinct } => {
                write!(f, "count({}{})", if *distinct { "distinct " } else { "" }, expr)
            }
            FunctionExpr::CountStar => write!(f, "count(*)"),
            FunctionExpr::Sum { expr, distinct } => {
                write!(f, "sum({}{})", if *distinct { "distinct " } else { "" }, expr)
            }
            FunctionExpr::Max(expr) => write!(f, "max({})", expr),
            FunctionExpr::Min(expr) => write!(f, "min({})", expr),
            FunctionExpr::Call { name, arguments } => {
                write!(f, "{}({})", name, arguments.iter().join(", "))
            }
        }
    }
}

/// The right-hand side of an `IN` predicate.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum InValue {
    Subquery(Box<SelectStatement>),
    List(Vec<Expr>),
}

/// A bound SQL expression.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A literal value
    Literal(Literal),

    /// A reference to a column
    Column(Column),

    /// `lhs op rhs`
    BinaryOp {
        lhs: Box<Expr>,
        op: BinaryOperator,
        rhs: Box<Expr>,
    },

    /// `lhs IN rhs`
    In { lhs: Box<Expr>, rhs: InValue },

    /// `EXISTS (SELECT ...)`
    Exists(Box<SelectStatement>),

    /// `expr IS NOT NULL`
    IsNotNull(Box<Expr>),

    /// A function call
    Call(FunctionExpr),

    /// A row sub-select used as a value
    Subquery(Box<SelectStatement>),
}

impl Expr {
    /// True if this expression node itself is a row sub-select.
    pub fn is_subquery(&self) -> bool {
        matches!(self, Expr::Subquery(_))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Literal(literal) => write!(f, "{}", literal),
            Expr::Column(column) => write!(f, "{}", column),
            Expr::BinaryOp { lhs, op, rhs } => write!(f, "({} {} {})", lhs, op, rhs),
            Expr::In {
                lhs,
                rhs: InValue::List(exprs),
            } => write!(f, "{} IN ({})", lhs, exprs.iter().join(", ")),
            Expr::In {
                lhs,
                rhs: InValue::Subquery(_),
            } => write!(f, "{} IN (<subquery>)", lhs),
            Expr::Exists(_) => write!(f, "EXISTS (<subquery>)"),
            Expr::IsNotNull(expr) => write!(f, "({} IS NOT NULL)", expr),
            Expr::Call(function) => write!(f, "{}", function),
            Expr::Subquery(_) => write!(f, "(<subquery>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn display_comparison() {
        let expr = Expr::BinaryOp {
            lhs: Box::new(Expr::Column("warehouse.w_id".into())),
            op: BinaryOperator::Equal,
            rhs: Box::new(Expr::Literal(1.into())),
        };
        assert_eq!(expr.to_string(), "(warehouse.w_id = 1)");
    }

    #[test]
    fn display_aggregate_call() {
        let expr = Expr::Call(FunctionExpr::Count {
            expr: Box::new(Expr::Column("t.a".into())),
            distinct: true,
        });
        assert_eq!(expr.to_string(), "count(distinct t.a)");
    }
}
