//! Utility functions for analyzing bound expression trees.
//!
//! All of the walks here stop at sub-select boundaries: a sub-select is a
//! separate scope, and its aggregates and column references belong to that
//! scope, not to the expression that embeds it.

use crate::{Column, Expr, FunctionExpr, InValue};

/// Returns true if the given function is an aggregate.
pub fn is_aggregate(function: &FunctionExpr) -> bool {
    match function {
        FunctionExpr::Avg { .. }
        | FunctionExpr::Count { .. }
        | FunctionExpr::CountStar
        | FunctionExpr::Sum { .. }
        | FunctionExpr::Max(..)
        | FunctionExpr::Min(..) => true,
        // For now, assume all "generic" function calls are not aggregates
        FunctionExpr::Call { .. } => false,
    }
}

/// Returns true if `expr` is or contains an aggregate function.
pub fn contains_aggregate(expr: &Expr) -> bool {
    match expr {
        Expr::Call(f) => is_aggregate(f) || f.arguments().any(contains_aggregate),
        Expr::BinaryOp { lhs, rhs, .. } => contains_aggregate(lhs) || contains_aggregate(rhs),
        Expr::IsNotNull(expr) => contains_aggregate(expr),
        Expr::In { lhs, rhs } => {
            contains_aggregate(lhs)
                || match rhs {
                    InValue::List(exprs) => exprs.iter().any(contains_aggregate),
                    InValue::Subquery(_) => false,
                }
        }
        Expr::Literal(_) | Expr::Column(_) | Expr::Exists(_) | Expr::Subquery(_) => false,
    }
}

/// Returns true if any expression node reachable from `expr` is a row
/// sub-select (including `EXISTS` and `IN (SELECT ...)` operands).
pub fn contains_subquery(expr: &Expr) -> bool {
    match expr {
        Expr::Subquery(_) | Expr::Exists(_) => true,
        Expr::In {
            rhs: InValue::Subquery(_),
            ..
        } => true,
        Expr::In {
            lhs,
            rhs: InValue::List(exprs),
        } => contains_subquery(lhs) || exprs.iter().any(contains_subquery),
        Expr::BinaryOp { lhs, rhs, .. } => contains_subquery(lhs) || contains_subquery(rhs),
        Expr::IsNotNull(expr) => contains_subquery(expr),
        Expr::Call(f) => f.arguments().any(contains_subquery),
        Expr::Literal(_) | Expr::Column(_) => false,
    }
}

/// Collects every column referenced by `expr`, in pre-order.
pub fn referred_columns(expr: &Expr) -> Vec<&Column> {
    let mut columns = Vec::new();
    collect_columns(expr, &mut columns);
    columns
}

fn collect_columns<'a>(expr: &'a Expr, out: &mut Vec<&'a Column>) {
    match expr {
        Expr::Column(column) => out.push(column),
        Expr::BinaryOp { lhs, rhs, .. } => {
            collect_columns(lhs, out);
            collect_columns(rhs, out);
        }
        Expr::IsNotNull(expr) => collect_columns(expr, out),
        Expr::In { lhs, rhs } => {
            collect_columns(lhs, out);
            if let InValue::List(exprs) = rhs {
                for expr in exprs {
                    collect_columns(expr, out);
                }
            }
        }
        Expr::Call(f) => {
            for argument in f.arguments() {
                collect_columns(argument, out);
            }
        }
        Expr::Literal(_) | Expr::Exists(_) | Expr::Subquery(_) => {}
    }
}

/// The scope depth of `expr`: the minimum binder-assigned depth over every
/// column it references, or `None` when it references no columns.
///
/// A predicate inside a sub-select is correlated exactly when its depth is
/// smaller than the sub-select's own depth; column-free predicates are never
/// correlated.
pub fn correlation_depth(expr: &Expr) -> Option<usize> {
    referred_columns(expr).iter().map(|c| c.depth).min()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{BinaryOperator, SelectStatement};

    fn col(name: &str) -> Expr {
        Expr::Column(name.into())
    }

    fn eq(lhs: Expr, rhs: Expr) -> Expr {
        Expr::BinaryOp {
            lhs: Box::new(lhs),
            op: BinaryOperator::Equal,
            rhs: Box::new(rhs),
        }
    }

    #[test]
    fn aggregate_nested_in_arithmetic() {
        let expr = Expr::BinaryOp {
            lhs: Box::new(Expr::Call(FunctionExpr::Sum {
                expr: Box::new(col("t.a")),
                distinct: false,
            })),
            op: BinaryOperator::Add,
            rhs: Box::new(Expr::Literal(1.into())),
        };
        assert!(contains_aggregate(&expr));
    }

    #[test]
    fn aggregate_in_subquery_is_not_ours() {
        let sub = SelectStatement {
            fields: vec![Expr::Call(FunctionExpr::CountStar).into()],
            depth: 1,
            ..Default::default()
        };
        let expr = eq(col("t.a"), Expr::Subquery(Box::new(sub)));
        assert!(!contains_aggregate(&expr));
        assert!(contains_subquery(&expr));
    }

    #[test]
    fn exists_counts_as_subquery() {
        let expr = Expr::Exists(Box::new(SelectStatement::default()));
        assert!(contains_subquery(&expr));
    }

    #[test]
    fn referred_columns_stop_at_subquery() {
        let sub = SelectStatement {
            fields: vec![col("u.b").into()],
            depth: 1,
            ..Default::default()
        };
        let expr = eq(col("t.a"), Expr::Subquery(Box::new(sub)));
        let names: Vec<_> = referred_columns(&expr)
            .into_iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(names, vec!["t.a"]);
    }

    #[test]
    fn correlation_depth_is_minimum() {
        let expr = eq(
            Expr::Column(Column::from("u.x").at_depth(1)),
            Expr::Column(Column::from("t.x").at_depth(0)),
        );
        assert_eq!(correlation_depth(&expr), Some(0));
        assert_eq!(correlation_depth(&Expr::Literal(1.into())), None);
    }
}
