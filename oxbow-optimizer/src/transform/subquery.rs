//! Rewriting of subquery predicates into mark- and single-join subtrees.
//!
//! Supported shapes are rewritten without decorrelation: the sub-select is
//! lowered as-is and spliced in as the second child of a join whose first
//! child is the plan built so far. The predicate keeps a residual form over
//! the sub-select's projected column (`IN` becomes an equality, `EXISTS`
//! becomes `IS NOT NULL`, scalar comparisons keep their operator).

use std::mem;

use oxbow_errors::{OxbowError, OxbowResult};
use oxbow_sql::analysis::{contains_subquery, correlation_depth};
use oxbow_sql::{
    BinaryOperator, Expr, FieldDefinitionExpr, InValue, Literal, SelectStatement,
};
use tracing::trace;

use super::{requires_aggregation, SqlToLogicalConverter};
use crate::logical::{LogicalOperator, OperatorExpression};
use crate::predicate::split_conjuncts;

/// Which join realizes a rewritten sub-select.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum SubqueryJoin {
    /// Existence semantics: outer rows gain a mark column.
    Mark,
    /// Scalar semantics: the inner side yields at most one row per outer
    /// row (enforced downstream).
    Single,
}

impl<'a> SqlToLogicalConverter<'a> {
    /// Walks `expr`, replacing supported subquery predicates with residual
    /// predicates over join subtrees appended to `plan`.
    ///
    /// Children are visited after the local rewrite, matching the original
    /// evaluation order; rewritten residuals contain no sub-selects, so
    /// revisiting them is harmless. Sub-selects that survive (inside
    /// operands the rewrite does not touch) are separate scopes and are not
    /// descended into.
    pub(super) fn rewrite_subqueries(
        &mut self,
        expr: &mut Expr,
        mut plan: OperatorExpression,
    ) -> OxbowResult<OperatorExpression> {
        plan = self.rewrite_node(expr, plan)?;
        match expr {
            Expr::BinaryOp { lhs, rhs, .. } => {
                plan = self.rewrite_subqueries(lhs, plan)?;
                self.rewrite_subqueries(rhs, plan)
            }
            Expr::In { lhs, rhs } => {
                plan = self.rewrite_subqueries(lhs, plan)?;
                if let InValue::List(exprs) = rhs {
                    for item in exprs {
                        plan = self.rewrite_subqueries(item, plan)?;
                    }
                }
                Ok(plan)
            }
            Expr::IsNotNull(inner) => self.rewrite_subqueries(inner, plan),
            Expr::Call(function) => {
                for argument in function.arguments_mut() {
                    plan = self.rewrite_subqueries(argument, plan)?;
                }
                Ok(plan)
            }
            Expr::Literal(_) | Expr::Column(_) | Expr::Exists(_) | Expr::Subquery(_) => Ok(plan),
        }
    }

    /// Attempts the local rewrite of one expression node.
    fn rewrite_node(
        &mut self,
        expr: &mut Expr,
        plan: OperatorExpression,
    ) -> OxbowResult<OperatorExpression> {
        match expr {
            Expr::In {
                lhs,
                rhs: InValue::Subquery(select),
            } => {
                // `a IN (SELECT ...)` becomes `a = <projected>` over a mark
                // join.
                let (plan, projected) = self.unnest_subquery(select, plan, SubqueryJoin::Mark)?;
                let lhs = mem::replace(lhs, Box::new(Expr::Literal(Literal::Null)));
                *expr = Expr::BinaryOp {
                    lhs,
                    op: BinaryOperator::Equal,
                    rhs: Box::new(projected),
                };
                Ok(plan)
            }
            Expr::BinaryOp { lhs, op, rhs } if op.is_comparison() => {
                if lhs.is_subquery() && rhs.is_subquery() {
                    return Err(OxbowError::ScalarSubqueryComparison);
                }
                // The comparison operator survives; only the sub-select side
                // is replaced by its projected column. Left side first.
                if let Expr::Subquery(select) = lhs.as_mut() {
                    let (plan, projected) =
                        self.unnest_subquery(select, plan, SubqueryJoin::Single)?;
                    **lhs = projected;
                    Ok(plan)
                } else if let Expr::Subquery(select) = rhs.as_mut() {
                    let (plan, projected) =
                        self.unnest_subquery(select, plan, SubqueryJoin::Single)?;
                    **rhs = projected;
                    Ok(plan)
                } else {
                    Ok(plan)
                }
            }
            Expr::Exists(select) => {
                // `EXISTS (SELECT ...)` becomes `<projected> IS NOT NULL`
                // over a mark join.
                let (plan, projected) = self.unnest_subquery(select, plan, SubqueryJoin::Mark)?;
                *expr = Expr::IsNotNull(Box::new(projected));
                Ok(plan)
            }
            _ => Ok(plan),
        }
    }

    /// Lowers a predicate sub-select and splices it into the plan under a
    /// new join whose first child is the plan built so far. Returns the
    /// extended plan and the sub-select's single projected expression.
    fn unnest_subquery(
        &mut self,
        select: &SelectStatement,
        outer: OperatorExpression,
        join: SubqueryJoin,
    ) -> OxbowResult<(OperatorExpression, Expr)> {
        if !is_supported_sub_select(select)? {
            return Err(OxbowError::UnsupportedSubSelect);
        }
        if select.fields.len() != 1 {
            return Err(OxbowError::SubSelectArity);
        }
        let projected = match &select.fields[0] {
            FieldDefinitionExpr::Expr { expr, .. } => expr.clone(),
            // The binder expands stars, so a surviving `*` has no usable
            // single column
            FieldDefinitionExpr::All | FieldDefinitionExpr::AllInTable(_) => {
                return Err(OxbowError::SubSelectArity)
            }
        };
        let inner = self.plan_select(select)?;
        let operator = match join {
            SubqueryJoin::Mark => LogicalOperator::MarkJoin,
            SubqueryJoin::Single => LogicalOperator::SingleJoin,
        };
        trace!(kind = ?join, "unnested predicate sub-select");
        Ok((
            OperatorExpression::new(operator, vec![outer, inner]),
            projected,
        ))
    }
}

/// Whether a single conjunct has a shape the planner can lower.
///
/// Conjuncts without sub-selects always do. With a sub-select, only the
/// rewritable forms are allowed: `IN` with a sub-select right-hand side,
/// `EXISTS`, or one of the five comparisons with exactly one sub-select side
/// whose other side is entirely sub-select-free.
pub(crate) fn is_supported_conjunctive_predicate(expr: &Expr) -> bool {
    if !contains_subquery(expr) {
        return true;
    }
    match expr {
        Expr::In {
            lhs,
            rhs: InValue::Subquery(_),
        } => !lhs.is_subquery(),
        Expr::Exists(_) => true,
        Expr::BinaryOp { lhs, op, rhs } if op.is_comparison() => {
            (lhs.is_subquery() && !contains_subquery(rhs))
                || (rhs.is_subquery() && !contains_subquery(lhs))
        }
        _ => false,
    }
}

/// Whether a predicate sub-select can be unnested.
///
/// Sub-selects without aggregation always can. With aggregation, every
/// correlated conjunct of the WHERE clause must be an equality between a
/// bare outer-scope column and an expression entirely at the sub-select's
/// own depth.
pub(crate) fn is_supported_sub_select(select: &SelectStatement) -> OxbowResult<bool> {
    if !requires_aggregation(select)? {
        return Ok(true);
    }
    for conjunct in split_conjuncts(select.where_clause.as_ref()) {
        let correlated =
            matches!(correlation_depth(conjunct), Some(depth) if depth < select.depth);
        if !correlated {
            continue;
        }
        let admissible = match conjunct {
            Expr::BinaryOp {
                lhs,
                op: BinaryOperator::Equal,
                rhs,
            } => {
                outer_column_against_inner(lhs, rhs, select.depth)
                    || outer_column_against_inner(rhs, lhs, select.depth)
            }
            _ => false,
        };
        if !admissible {
            return Ok(false);
        }
    }
    Ok(true)
}

/// True when `outer` is a bare column from an enclosing scope and `inner`
/// references only the sub-select's own scope.
fn outer_column_against_inner(outer: &Expr, inner: &Expr, depth: usize) -> bool {
    matches!(outer, Expr::Column(column) if column.depth < depth)
        && correlation_depth(inner) == Some(depth)
}

#[cfg(test)]
mod tests {
    use oxbow_sql::{Column, FunctionExpr};

    use super::*;

    fn col(name: &str) -> Expr {
        Expr::Column(name.into())
    }

    fn col_at(name: &str, depth: usize) -> Expr {
        Expr::Column(Column::from(name).at_depth(depth))
    }

    fn cmp(lhs: Expr, op: BinaryOperator, rhs: Expr) -> Expr {
        Expr::BinaryOp {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        }
    }

    fn subquery(fields: Vec<Expr>) -> Expr {
        Expr::Subquery(Box::new(SelectStatement {
            fields: fields.into_iter().map(Into::into).collect(),
            depth: 1,
            ..Default::default()
        }))
    }

    #[test]
    fn subquery_free_conjuncts_are_supported() {
        let expr = cmp(col("t.a"), BinaryOperator::Equal, Expr::Literal(1.into()));
        assert!(is_supported_conjunctive_predicate(&expr));
    }

    #[test]
    fn in_subquery_is_supported() {
        let expr = Expr::In {
            lhs: Box::new(col("t.a")),
            rhs: InValue::Subquery(Box::new(SelectStatement::default())),
        };
        assert!(is_supported_conjunctive_predicate(&expr));
    }

    #[test]
    fn comparison_with_one_subquery_side_is_supported() {
        let expr = cmp(
            col("t.a"),
            BinaryOperator::Less,
            subquery(vec![col("u.b")]),
        );
        assert!(is_supported_conjunctive_predicate(&expr));
    }

    #[test]
    fn subquery_under_arithmetic_is_not_supported() {
        // The sub-select is buried under a `+`, not a direct operand
        let expr = cmp(
            col("t.a"),
            BinaryOperator::Equal,
            cmp(
                Expr::Literal(1.into()),
                BinaryOperator::Add,
                subquery(vec![col("u.b")]),
            ),
        );
        assert!(!is_supported_conjunctive_predicate(&expr));
    }

    #[test]
    fn non_comparison_with_subquery_is_not_supported() {
        let expr = cmp(
            col("t.a"),
            BinaryOperator::NotEqual,
            subquery(vec![col("u.b")]),
        );
        assert!(!is_supported_conjunctive_predicate(&expr));
    }

    fn aggregated_sub_select(where_clause: Expr) -> SelectStatement {
        SelectStatement {
            fields: vec![Expr::Call(FunctionExpr::CountStar).into()],
            where_clause: Some(where_clause),
            depth: 1,
            ..Default::default()
        }
    }

    #[test]
    fn unaggregated_sub_select_is_always_supported() {
        let select = SelectStatement {
            fields: vec![col("u.b").into()],
            where_clause: Some(cmp(
                col_at("u.x", 1),
                BinaryOperator::Greater,
                col_at("t.x", 0),
            )),
            depth: 1,
            ..Default::default()
        };
        assert_eq!(is_supported_sub_select(&select), Ok(true));
    }

    #[test]
    fn correlated_equality_on_outer_column_is_admissible() {
        let select = aggregated_sub_select(cmp(
            col_at("t.x", 0),
            BinaryOperator::Equal,
            col_at("u.x", 1),
        ));
        assert_eq!(is_supported_sub_select(&select), Ok(true));
    }

    #[test]
    fn correlated_non_equality_is_inadmissible() {
        let select = aggregated_sub_select(cmp(
            col_at("t.x", 0),
            BinaryOperator::Greater,
            col_at("u.x", 1),
        ));
        assert_eq!(is_supported_sub_select(&select), Ok(false));
    }

    #[test]
    fn correlated_equality_without_bare_column_is_inadmissible() {
        // outer side is an arithmetic expression, not a bare column
        let select = aggregated_sub_select(cmp(
            cmp(col_at("t.x", 0), BinaryOperator::Add, Expr::Literal(1.into())),
            BinaryOperator::Equal,
            col_at("u.x", 1),
        ));
        assert_eq!(is_supported_sub_select(&select), Ok(false));
    }

    #[test]
    fn uncorrelated_conjuncts_are_ignored() {
        let select = aggregated_sub_select(cmp(
            col_at("u.x", 1),
            BinaryOperator::Greater,
            Expr::Literal(10.into()),
        ));
        assert_eq!(is_supported_sub_select(&select), Ok(true));
    }

    #[test]
    fn aggregation_mix_inside_sub_select_propagates() {
        let select = SelectStatement {
            fields: vec![Expr::Call(FunctionExpr::CountStar).into(), col("u.b").into()],
            depth: 1,
            ..Default::default()
        };
        assert_eq!(
            is_supported_sub_select(&select),
            Err(OxbowError::AggregationMix)
        );
    }
}
