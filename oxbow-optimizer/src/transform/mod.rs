//! Lowering of bound SQL statements into logical operator trees.
//!
//! The converter recurses over the statement, building the plan bottom-up.
//! Each SELECT scope owns a predicate accumulator: WHERE conjuncts and
//! inner-join ON conjuncts land there and are wrapped into one `Filter` when
//! the scope closes. The accumulator is saved and restored around nested
//! sub-selects so an inner scope never leaks predicates into its enclosing
//! one.

use std::collections::HashMap;
use std::mem;

use oxbow_catalog::{Catalog, DatabaseOid, NamespaceOid, TableOid};
use oxbow_errors::{internal, OxbowError, OxbowResult};
use oxbow_sql::analysis::contains_aggregate;
use oxbow_sql::{
    Expr, FieldDefinitionExpr, JoinClause, JoinOperator, SelectStatement, SqlStatement, Table,
    TableExpr,
};
use tracing::trace;
use vec1::Vec1;

use crate::logical::{LogicalOperator, OperatorExpression};
use crate::predicate::{extract_predicates, split_conjuncts, AnnotatedExpr};

mod dml;
mod subquery;

/// Lowers bound statements into logical operator trees.
///
/// A converter processes one statement at a time; callers needing
/// concurrency use one converter per thread. The catalog is only read.
pub struct SqlToLogicalConverter<'a> {
    catalog: &'a dyn Catalog,
    /// Conjuncts collected for the SELECT scope currently being lowered.
    predicates: Vec<AnnotatedExpr>,
}

impl<'a> SqlToLogicalConverter<'a> {
    pub fn new(catalog: &'a dyn Catalog) -> Self {
        SqlToLogicalConverter {
            catalog,
            predicates: Vec::new(),
        }
    }

    /// Lowers `statement` to a logical operator tree.
    ///
    /// Returns `None` for statement kinds that are accepted but produce no
    /// plan (DDL, transaction control, prepared-statement bookkeeping). The
    /// input is never mutated; expressions inside the returned plan are
    /// owned clones, so lowering the same statement twice yields equal
    /// trees.
    pub fn plan_statement(
        &mut self,
        statement: &SqlStatement,
    ) -> OxbowResult<Option<OperatorExpression>> {
        self.predicates.clear();
        match statement {
            SqlStatement::Select(select) => self.plan_select(select).map(Some),
            SqlStatement::Insert(insert) => self.plan_insert(insert).map(Some),
            SqlStatement::Update(update) => self.plan_update(update).map(Some),
            SqlStatement::Delete(delete) => self.plan_delete(delete).map(Some),
            SqlStatement::Copy(copy) => self.plan_copy(copy).map(Some),
            SqlStatement::CreateTable(_)
            | SqlStatement::CreateFunction(_)
            | SqlStatement::Drop(_)
            | SqlStatement::Prepare(_)
            | SqlStatement::Execute(_)
            | SqlStatement::Transaction(_)
            | SqlStatement::Analyze(_) => Ok(None),
        }
    }

    /// Lowers one SELECT scope, preserving the enclosing scope's collected
    /// predicates across the recursion.
    fn plan_select(&mut self, select: &SelectStatement) -> OxbowResult<OperatorExpression> {
        let outer_predicates = mem::take(&mut self.predicates);
        let result = self.plan_select_scope(select);
        self.predicates = outer_predicates;
        result
    }

    fn plan_select_scope(&mut self, select: &SelectStatement) -> OxbowResult<OperatorExpression> {
        let mut plan = match &select.table {
            Some(table) => self.plan_table_expr(table)?,
            // A scalar SELECT reads from nothing
            None => OperatorExpression::leaf(LogicalOperator::dummy_get()),
        };

        if let Some(condition) = &select.where_clause {
            let mut collected = mem::take(&mut self.predicates);
            plan = self.collect_predicates(condition, plan, &mut collected)?;
            self.predicates = collected;
        }

        // Wraps the WHERE conjuncts and any inner-join ON conjuncts pushed
        // down during FROM lowering; empty accumulators produce no Filter.
        if let Ok(predicates) = Vec1::try_from_vec(mem::take(&mut self.predicates)) {
            plan = OperatorExpression::new(LogicalOperator::Filter { predicates }, vec![plan]);
        }

        if requires_aggregation(select)? {
            match &select.group_by {
                None => {
                    plan = OperatorExpression::new(
                        LogicalOperator::AggregateAndGroupBy { columns: vec![] },
                        vec![plan],
                    );
                }
                Some(group_by) => {
                    plan = OperatorExpression::new(
                        LogicalOperator::AggregateAndGroupBy {
                            columns: group_by.columns.clone(),
                        },
                        vec![plan],
                    );
                    let mut having = Vec::new();
                    if let Some(condition) = &group_by.having {
                        plan = self.collect_predicates(condition, plan, &mut having)?;
                    }
                    if let Ok(predicates) = Vec1::try_from_vec(having) {
                        plan = OperatorExpression::new(
                            LogicalOperator::Filter { predicates },
                            vec![plan],
                        );
                    }
                }
            }
        }

        if select.distinct {
            plan = OperatorExpression::new(LogicalOperator::Distinct, vec![plan]);
        }

        if let Some(limit) = &select.limit {
            if limit.limit != -1 {
                let (sort_exprs, sort_directions) = match &select.order {
                    Some(order) => order.columns.iter().cloned().unzip(),
                    None => (Vec::new(), Vec::new()),
                };
                plan = OperatorExpression::new(
                    LogicalOperator::Limit {
                        offset: limit.offset,
                        limit: limit.limit as u64,
                        sort_exprs,
                        sort_directions,
                    },
                    vec![plan],
                );
            }
        }

        Ok(plan)
    }

    fn plan_table_expr(&mut self, table: &TableExpr) -> OxbowResult<OperatorExpression> {
        match table {
            TableExpr::Derived { statement, alias } => {
                let alias = alias.to_lowercase();
                let alias_to_expr = select_element_map(&statement.fields)?;
                let child = self.plan_select(statement)?;
                trace!(%alias, "lowered derived table");
                Ok(OperatorExpression::new(
                    LogicalOperator::QueryDerivedGet {
                        alias,
                        alias_to_expr,
                    },
                    vec![child],
                ))
            }
            TableExpr::Join(join) => self.plan_join(join),
            TableExpr::List(items) => match items.as_slice() {
                [] => internal!("empty table reference list"),
                [single] => self.plan_table_expr(single),
                [first, rest @ ..] => {
                    // Left-deep chain of cross products; the WHERE clause
                    // supplies the join predicates later.
                    let mut plan = self.plan_table_expr(first)?;
                    for item in rest {
                        let right = self.plan_table_expr(item)?;
                        plan =
                            OperatorExpression::new(LogicalOperator::InnerJoin, vec![plan, right]);
                    }
                    Ok(plan)
                }
            },
            TableExpr::Table(table) => self.plan_base_table(table),
        }
    }

    fn plan_base_table(&self, table: &Table) -> OxbowResult<OperatorExpression> {
        let (database, namespace, table_oid) = self.resolve_table(table)?;
        Ok(OperatorExpression::leaf(LogicalOperator::Get {
            database,
            namespace,
            table: Some(table_oid),
            predicates: vec![],
            alias: table.scan_alias(),
            for_update: false,
        }))
    }

    fn resolve_table(
        &self,
        table: &Table,
    ) -> OxbowResult<(DatabaseOid, NamespaceOid, TableOid)> {
        let database = self
            .catalog
            .database_oid(table.database.as_deref())
            .ok_or_else(|| {
                OxbowError::DatabaseNotFound(table.database.clone().unwrap_or_default())
            })?;
        let namespace = self.catalog.default_namespace();
        let table_oid = self
            .catalog
            .table_oid(&table.name)
            .ok_or_else(|| OxbowError::TableNotFound(table.name.clone()))?;
        Ok((database, namespace, table_oid))
    }

    fn plan_join(&mut self, join: &JoinClause) -> OxbowResult<OperatorExpression> {
        let left = self.plan_table_expr(&join.left)?;
        let mut right = self.plan_table_expr(&join.right)?;

        let operator = match join.operator {
            JoinOperator::Inner => {
                // The ON condition joins the WHERE conjuncts and surfaces in
                // the enclosing scope's Filter.
                if let Some(condition) = &join.constraint {
                    let mut collected = mem::take(&mut self.predicates);
                    right = self.collect_predicates(condition, right, &mut collected)?;
                    self.predicates = collected;
                }
                LogicalOperator::InnerJoin
            }
            JoinOperator::Outer => LogicalOperator::OuterJoin {
                condition: join.constraint.clone(),
            },
            JoinOperator::Left => LogicalOperator::LeftJoin {
                condition: join.constraint.clone(),
            },
            JoinOperator::Right => LogicalOperator::RightJoin {
                condition: join.constraint.clone(),
            },
            JoinOperator::Semi => LogicalOperator::SemiJoin {
                condition: join.constraint.clone(),
            },
            JoinOperator::Cross | JoinOperator::Straight => {
                return Err(OxbowError::InvalidJoinType)
            }
        };

        Ok(OperatorExpression::new(operator, vec![left, right]))
    }

    /// Checks every top-level conjunct of `expr` for a supported shape, runs
    /// the subquery rewriter over a working copy (which may extend `plan`
    /// with join subtrees), and appends the rewritten conjuncts to `out`.
    fn collect_predicates(
        &mut self,
        expr: &Expr,
        plan: OperatorExpression,
        out: &mut Vec<AnnotatedExpr>,
    ) -> OxbowResult<OperatorExpression> {
        for conjunct in split_conjuncts(Some(expr)) {
            if !subquery::is_supported_conjunctive_predicate(conjunct) {
                return Err(OxbowError::UnsupportedPredicate);
            }
        }
        // The rewrite replaces sub-selects with their projected columns, so
        // alias sets are extracted only afterwards.
        let mut rewritten = expr.clone();
        let plan = self.rewrite_subqueries(&mut rewritten, plan)?;
        extract_predicates(&rewritten, out);
        Ok(plan)
    }
}

/// Whether lowering `select` must produce an aggregation operator.
///
/// GROUP BY forces one. Otherwise a select list made entirely of aggregates
/// is a plain aggregation, a list containing none needs no aggregation, and
/// a mix without GROUP BY is an error.
pub fn requires_aggregation(select: &SelectStatement) -> OxbowResult<bool> {
    if select.group_by.is_some() {
        return Ok(true);
    }
    let mut has_aggregates = false;
    let mut has_plain = false;
    for field in &select.fields {
        match field {
            FieldDefinitionExpr::Expr { expr, .. } if contains_aggregate(expr) => {
                has_aggregates = true
            }
            FieldDefinitionExpr::Expr { .. }
            | FieldDefinitionExpr::All
            | FieldDefinitionExpr::AllInTable(_) => has_plain = true,
        }
    }
    if has_aggregates && has_plain {
        return Err(OxbowError::AggregationMix);
    }
    Ok(has_aggregates)
}

/// Maps each named select-list item of a derived table to its expression,
/// keyed by lowercased name: the explicit alias when one was written, else
/// the column's own name. Unnamed expressions are unaddressable and skipped;
/// duplicate names are an error.
pub fn select_element_map(
    fields: &[FieldDefinitionExpr],
) -> OxbowResult<HashMap<String, Expr>> {
    let mut map = HashMap::new();
    for field in fields {
        let (expr, alias) = match field {
            FieldDefinitionExpr::Expr { expr, alias } => (expr, alias.as_ref()),
            FieldDefinitionExpr::All | FieldDefinitionExpr::AllInTable(_) => continue,
        };
        let name = match (alias, expr) {
            (Some(alias), _) => alias.to_lowercase(),
            (None, Expr::Column(column)) => column.name.to_lowercase(),
            (None, _) => continue,
        };
        if map.insert(name.clone(), expr.clone()).is_some() {
            return Err(OxbowError::DuplicateDerivedColumn { column: name });
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use oxbow_sql::{BinaryOperator, FunctionExpr, GroupByClause};
    use pretty_assertions::assert_eq;

    use super::*;

    fn col(name: &str) -> Expr {
        Expr::Column(name.into())
    }

    fn count_star() -> Expr {
        Expr::Call(FunctionExpr::CountStar)
    }

    #[test]
    fn group_by_always_aggregates() {
        let select = SelectStatement {
            fields: vec![col("t.a").into()],
            group_by: Some(GroupByClause {
                columns: vec![col("t.a")],
                having: None,
            }),
            ..Default::default()
        };
        assert_eq!(requires_aggregation(&select), Ok(true));
    }

    #[test]
    fn all_aggregates_aggregate() {
        let select = SelectStatement {
            fields: vec![count_star().into()],
            ..Default::default()
        };
        assert_eq!(requires_aggregation(&select), Ok(true));
    }

    #[test]
    fn plain_select_does_not_aggregate() {
        let select = SelectStatement {
            fields: vec![col("t.a").into(), FieldDefinitionExpr::All],
            ..Default::default()
        };
        assert_eq!(requires_aggregation(&select), Ok(false));
    }

    #[test]
    fn mixed_select_without_group_by_errors() {
        let select = SelectStatement {
            fields: vec![count_star().into(), col("t.a").into()],
            ..Default::default()
        };
        assert_eq!(
            requires_aggregation(&select),
            Err(OxbowError::AggregationMix)
        );
    }

    #[test]
    fn aggregate_below_arithmetic_still_counts() {
        let sum = Expr::BinaryOp {
            lhs: Box::new(Expr::Call(FunctionExpr::Sum {
                expr: Box::new(col("t.a")),
                distinct: false,
            })),
            op: BinaryOperator::Add,
            rhs: Box::new(Expr::Literal(1.into())),
        };
        let select = SelectStatement {
            fields: vec![sum.into()],
            ..Default::default()
        };
        assert_eq!(requires_aggregation(&select), Ok(true));
    }

    #[test]
    fn element_map_prefers_alias_and_lowercases() {
        let fields = vec![
            FieldDefinitionExpr::Expr {
                expr: col("t.a"),
                alias: Some("First".into()),
            },
            col("t.B").into(),
            count_star().into(),
        ];
        let map = select_element_map(&fields).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["first"], col("t.a"));
        assert_eq!(map["b"], col("t.B"));
    }

    #[test]
    fn element_map_rejects_duplicates() {
        let fields = vec![
            FieldDefinitionExpr::Expr {
                expr: col("t.a"),
                alias: Some("x".into()),
            },
            FieldDefinitionExpr::Expr {
                expr: col("t.b"),
                alias: Some("X".into()),
            },
        ];
        assert_eq!(
            select_element_map(&fields),
            Err(OxbowError::DuplicateDerivedColumn { column: "x".into() })
        );
    }
}
