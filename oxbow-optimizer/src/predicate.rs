//! Conjunct splitting and predicate annotation.

use std::collections::HashSet;

use oxbow_sql::analysis::referred_columns;
use oxbow_sql::{BinaryOperator, Expr};
use serde::{Deserialize, Serialize};

/// A conjunct paired with the set of table aliases it references.
///
/// The alias set drives predicate placement in later rewrite phases: a
/// predicate can only be evaluated at or above the operators that produce
/// all of its aliases.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedExpr {
    pub expr: Expr,
    pub table_aliases: HashSet<String>,
}

impl AnnotatedExpr {
    pub fn new(expr: Expr) -> Self {
        let table_aliases = table_alias_set(&expr);
        AnnotatedExpr {
            expr,
            table_aliases,
        }
    }
}

/// Splits `expr` into its top-level conjuncts: nodes reachable from the root
/// through `AND` only. No conjunct in the result has an `AND` root. A `None`
/// input yields no conjuncts.
pub fn split_conjuncts(expr: Option<&Expr>) -> Vec<&Expr> {
    let mut conjuncts = Vec::new();
    if let Some(expr) = expr {
        collect_conjuncts(expr, &mut conjuncts);
    }
    conjuncts
}

fn collect_conjuncts<'a>(expr: &'a Expr, out: &mut Vec<&'a Expr>) {
    match expr {
        Expr::BinaryOp {
            lhs,
            op: BinaryOperator::And,
            rhs,
        } => {
            collect_conjuncts(lhs, out);
            collect_conjuncts(rhs, out);
        }
        _ => out.push(expr),
    }
}

/// The distinct table aliases referenced by qualified columns in `expr`.
/// Sub-select bodies belong to their own scope and do not contribute.
pub fn table_alias_set(expr: &Expr) -> HashSet<String> {
    referred_columns(expr)
        .into_iter()
        .filter_map(|column| column.table.clone())
        .collect()
}

/// Splits `expr` on `AND` and appends each conjunct to `out`, annotated with
/// its alias set.
pub fn extract_predicates(expr: &Expr, out: &mut Vec<AnnotatedExpr>) {
    for conjunct in split_conjuncts(Some(expr)) {
        out.push(AnnotatedExpr::new(conjunct.clone()));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

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

    fn and(lhs: Expr, rhs: Expr) -> Expr {
        Expr::BinaryOp {
            lhs: Box::new(lhs),
            op: BinaryOperator::And,
            rhs: Box::new(rhs),
        }
    }

    #[test]
    fn splits_nested_conjunctions() {
        let a = eq(col("t.a"), Expr::Literal(1.into()));
        let b = eq(col("t.b"), Expr::Literal(2.into()));
        let c = eq(col("u.c"), Expr::Literal(3.into()));
        let expr = and(and(a.clone(), b.clone()), c.clone());

        let conjuncts = split_conjuncts(Some(&expr));
        assert_eq!(conjuncts, vec![&a, &b, &c]);
        assert_eq!(split_conjuncts(None), Vec::<&Expr>::new());
    }

    #[test]
    fn non_conjunction_is_a_single_conjunct() {
        let expr = eq(col("t.a"), col("u.b"));
        assert_eq!(split_conjuncts(Some(&expr)), vec![&expr]);
    }

    #[test]
    fn alias_set_collects_qualified_tables() {
        let expr = and(
            eq(col("t.a"), col("u.b")),
            eq(col("t.c"), Expr::Literal(1.into())),
        );
        let aliases = table_alias_set(&expr);
        assert_eq!(
            aliases,
            HashSet::from(["t".to_owned(), "u".to_owned()])
        );
    }

    #[test]
    fn unqualified_columns_contribute_no_alias() {
        let expr = eq(col("a"), Expr::Literal(1.into()));
        assert!(table_alias_set(&expr).is_empty());
    }

    #[test]
    fn annotation_matches_alias_walk() {
        let expr = and(
            eq(col("t.a"), Expr::Literal(1.into())),
            eq(col("u.b"), col("v.c")),
        );
        let mut annotated = Vec::new();
        extract_predicates(&expr, &mut annotated);

        assert_eq!(annotated.len(), 2);
        for predicate in &annotated {
            assert_eq!(predicate.table_aliases, table_alias_set(&predicate.expr));
        }
        assert_eq!(
            annotated[1].table_aliases,
            HashSet::from(["u".to_owned(), "v".to_owned()])
        );
    }

    #[test]
    fn reassembling_conjuncts_splits_identically() {
        let a = eq(col("t.a"), Expr::Literal(1.into()));
        let b = eq(col("t.b"), Expr::Literal(2.into()));
        let c = eq(col("t.c"), Expr::Literal(3.into()));
        let original = and(a, and(b, c));

        let conjuncts: Vec<Expr> = split_conjuncts(Some(&original))
            .into_iter()
            .cloned()
            .collect();
        let reassembled = conjuncts
            .clone()
            .into_iter()
            .reduce(and)
            .unwrap();

        let resplit: Vec<Expr> = split_conjuncts(Some(&reassembled))
            .into_iter()
            .cloned()
            .collect();
        assert_eq!(resplit, conjuncts);
    }
}
