//! Logical operators and the operator tree the planner produces.

use std::collections::HashMap;
use std::fmt;

use itertools::Itertools;
use oxbow_catalog::{ColumnOid, DatabaseOid, NamespaceOid, TableOid};
use oxbow_sql::{Column, Expr, ExternalFile, OrderType};
use serde::{Deserialize, Serialize};
use vec1::Vec1;

use crate::predicate::AnnotatedExpr;

/// A relational operator with defined semantics but no physical
/// implementation chosen yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LogicalOperator {
    /// A base-table scan.
    ///
    /// `predicates` is non-empty only for the `FOR UPDATE` scans backing
    /// UPDATE/DELETE, which carry their WHERE conjuncts directly. A `Get`
    /// with no table is the sourceless scan behind a scalar SELECT.
    Get {
        database: DatabaseOid,
        namespace: NamespaceOid,
        table: Option<TableOid>,
        predicates: Vec<AnnotatedExpr>,
        alias: String,
        for_update: bool,
    },

    /// A sub-select in a FROM clause, exposing its select list under
    /// lowercased column names.
    QueryDerivedGet {
        alias: String,
        alias_to_expr: HashMap<String, Expr>,
    },

    /// A scan over an external file (`COPY ... FROM`).
    ExternalFileGet { file: ExternalFile },

    /// Filters rows by a conjunction of annotated predicates.
    Filter { predicates: Vec1<AnnotatedExpr> },

    /// Cross product; predicates arrive later via the enclosing Filter.
    InnerJoin,

    LeftJoin { condition: Option<Expr> },

    RightJoin { condition: Option<Expr> },

    OuterJoin { condition: Option<Expr> },

    SemiJoin { condition: Option<Expr> },

    /// Existence join: outer rows gain a mark column that the residual
    /// predicate of a rewritten `IN`/`EXISTS` references.
    MarkJoin,

    /// Scalar-subquery join: the inner side must produce at most one row per
    /// outer row (enforced downstream).
    SingleJoin,

    /// Aggregation, optionally grouped. An empty column list is a plain
    /// (whole-input) aggregation.
    AggregateAndGroupBy { columns: Vec<Expr> },

    Distinct,

    /// Row-count limiting with optional sort. `sort_exprs` and
    /// `sort_directions` correspond positionally.
    Limit {
        offset: u64,
        limit: u64,
        sort_exprs: Vec<Expr>,
        sort_directions: Vec<OrderType>,
    },

    /// `INSERT ... VALUES`, with the target column oids resolved and the
    /// value rows validated against the schema.
    Insert {
        database: DatabaseOid,
        namespace: NamespaceOid,
        table: TableOid,
        columns: Vec<ColumnOid>,
        values: Vec<Vec<Expr>>,
    },

    /// `INSERT ... SELECT` (and the load half of `COPY ... FROM`).
    InsertSelect {
        database: DatabaseOid,
        namespace: NamespaceOid,
        table: TableOid,
    },

    /// `UPDATE`, fed by a `FOR UPDATE` scan.
    Update {
        database: DatabaseOid,
        namespace: NamespaceOid,
        alias: String,
        table: TableOid,
        assignments: Vec<(Column, Expr)>,
    },

    /// `DELETE`, fed by a `FOR UPDATE` scan.
    Delete {
        database: DatabaseOid,
        namespace: NamespaceOid,
        table: TableOid,
    },

    /// The unload half of `COPY ... TO`.
    ExportExternalFile { file: ExternalFile },
}

impl LogicalOperator {
    /// The sourceless scan backing a scalar SELECT.
    pub fn dummy_get() -> Self {
        LogicalOperator::Get {
            database: DatabaseOid::default(),
            namespace: NamespaceOid::default(),
            table: None,
            predicates: vec![],
            alias: String::new(),
            for_update: false,
        }
    }

    /// How many children an [`OperatorExpression`] holding this operator
    /// must have.
    pub fn expected_children(&self) -> usize {
        match self {
            LogicalOperator::Get { .. }
            | LogicalOperator::ExternalFileGet { .. }
            | LogicalOperator::Insert { .. } => 0,
            LogicalOperator::QueryDerivedGet { .. }
            | LogicalOperator::Filter { .. }
            | LogicalOperator::AggregateAndGroupBy { .. }
            | LogicalOperator::Distinct
            | LogicalOperator::Limit { .. }
            | LogicalOperator::InsertSelect { .. }
            | LogicalOperator::Update { .. }
            | LogicalOperator::Delete { .. }
            | LogicalOperator::ExportExternalFile { .. } => 1,
            LogicalOperator::InnerJoin
            | LogicalOperator::LeftJoin { .. }
            | LogicalOperator::RightJoin { .. }
            | LogicalOperator::OuterJoin { .. }
            | LogicalOperator::SemiJoin { .. }
            | LogicalOperator::MarkJoin
            | LogicalOperator::SingleJoin => 2,
        }
    }

    /// A short human-readable description of this operator, for plan dumps.
    pub fn description(&self) -> String {
        match self {
            LogicalOperator::Get {
                table: None, ..
            } => "Get()".to_owned(),
            LogicalOperator::Get {
                alias,
                predicates,
                for_update,
                ..
            } => {
                let mut description = format!("Get({})", alias);
                if !predicates.is_empty() {
                    description.push_str(&format!(
                        " [{}]",
                        predicates.iter().map(|p| p.expr.to_string()).join(" AND ")
                    ));
                }
                if *for_update {
                    description.push_str(" FOR UPDATE");
                }
                description
            }
            LogicalOperator::QueryDerivedGet { alias, .. } => {
                format!("QueryDerivedGet({})", alias)
            }
            LogicalOperator::ExternalFileGet { file } => {
                format!("ExternalFileGet({})", file.path)
            }
            LogicalOperator::Filter { predicates } => format!(
                "Filter({})",
                predicates.iter().map(|p| p.expr.to_string()).join(" AND ")
            ),
            LogicalOperator::InnerJoin => "InnerJoin".to_owned(),
            LogicalOperator::LeftJoin { .. } => "LeftJoin".to_owned(),
            LogicalOperator::RightJoin { .. } => "RightJoin".to_owned(),
            LogicalOperator::OuterJoin { .. } => "OuterJoin".to_owned(),
            LogicalOperator::SemiJoin { .. } => "SemiJoin".to_owned(),
            LogicalOperator::MarkJoin => "MarkJoin".to_owned(),
            LogicalOperator::SingleJoin => "SingleJoin".to_owned(),
            LogicalOperator::AggregateAndGroupBy { columns } if columns.is_empty() => {
                "Aggregate".to_owned()
            }
            LogicalOperator::AggregateAndGroupBy { columns } => format!(
                "AggregateAndGroupBy({})",
                columns.iter().map(ToString::to_string).join(", ")
            ),
            LogicalOperator::Distinct => "Distinct".to_owned(),
            LogicalOperator::Limit { offset, limit, .. } => {
                format!("Limit({}, {})", offset, limit)
            }
            LogicalOperator::Insert { .. } => "Insert".to_owned(),
            LogicalOperator::InsertSelect { .. } => "InsertSelect".to_owned(),
            LogicalOperator::Update { alias, .. } => format!("Update({})", alias),
            LogicalOperator::Delete { .. } => "Delete".to_owned(),
            LogicalOperator::ExportExternalFile { file } => {
                format!("ExportExternalFile({})", file.path)
            }
        }
    }
}

/// A node of the logical plan: an operator plus its ordered children.
///
/// The planner owns the tree it builds outright; expressions inside operator
/// payloads are owned clones of the statement's AST, so a plan outlives the
/// statement it was lowered from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperatorExpression {
    pub operator: LogicalOperator,
    pub children: Vec<OperatorExpression>,
}

impl OperatorExpression {
    pub fn new(operator: LogicalOperator, children: Vec<OperatorExpression>) -> Self {
        OperatorExpression { operator, children }
    }

    /// A node with no children.
    pub fn leaf(operator: LogicalOperator) -> Self {
        OperatorExpression {
            operator,
            children: vec![],
        }
    }

    /// True when every node in the tree has exactly the child count its
    /// operator requires.
    pub fn is_well_formed(&self) -> bool {
        self.children.len() == self.operator.expected_children()
            && self.children.iter().all(OperatorExpression::is_well_formed)
    }
}

impl fmt::Display for OperatorExpression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

impl OperatorExpression {
    fn fmt_indented(&self, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
        write!(
            f,
            "{:indent$}{}",
            "",
            self.operator.description(),
            indent = depth * 2
        )?;
        for child in &self.children {
            writeln!(f)?;
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use vec1::vec1;

    use super::*;

    fn get(alias: &str) -> OperatorExpression {
        OperatorExpression::leaf(LogicalOperator::Get {
            database: DatabaseOid(1),
            namespace: NamespaceOid(1),
            table: Some(TableOid(7)),
            predicates: vec![],
            alias: alias.into(),
            for_update: false,
        })
    }

    #[test]
    fn arity_checks() {
        let join = OperatorExpression::new(LogicalOperator::InnerJoin, vec![get("a"), get("b")]);
        assert!(join.is_well_formed());

        let broken = OperatorExpression::new(LogicalOperator::InnerJoin, vec![get("a")]);
        assert!(!broken.is_well_formed());
    }

    #[test]
    fn display_indents_children() {
        let filter = OperatorExpression::new(
            LogicalOperator::Filter {
                predicates: vec1![AnnotatedExpr::new(Expr::Column("t.a".into()))],
            },
            vec![get("t")],
        );
        assert_eq!(filter.to_string(), "Filter(t.a)\n  Get(t)");
    }
}
