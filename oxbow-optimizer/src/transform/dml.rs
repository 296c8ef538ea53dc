//! Lowering of data-modification statements.
//!
//! INSERT is where the planner does real schema enforcement: row widths,
//! unknown target columns, and NOT NULL columns that were neither supplied
//! nor defaulted are all rejected here, before any plan leaves the
//! optimizer. UPDATE and DELETE lower to a mutation operator over a
//! `FOR UPDATE` scan that carries the WHERE conjuncts directly.

use std::collections::HashSet;

use oxbow_catalog::{DatabaseOid, NamespaceOid, TableOid};
use oxbow_errors::{internal, OxbowError, OxbowResult};
use oxbow_sql::{
    CopyDirection, CopyStatement, CopyTarget, DeleteStatement, Expr, InsertData, InsertStatement,
    Table, UpdateStatement,
};
use tracing::debug;

use super::SqlToLogicalConverter;
use crate::logical::{LogicalOperator, OperatorExpression};
use crate::predicate::extract_predicates;

impl<'a> SqlToLogicalConverter<'a> {
    pub(super) fn plan_insert(
        &mut self,
        insert: &InsertStatement,
    ) -> OxbowResult<OperatorExpression> {
        let (database, namespace, table) = self.resolve_table(&insert.table)?;

        let rows = match &insert.data {
            InsertData::Select(select) => {
                let child = self.plan_select(select)?;
                return Ok(OperatorExpression::new(
                    LogicalOperator::InsertSelect {
                        database,
                        namespace,
                        table,
                    },
                    vec![child],
                ));
            }
            InsertData::Values(rows) => rows,
        };

        let schema = self
            .catalog
            .schema(table)
            .ok_or_else(|| OxbowError::TableNotFound(insert.table.name.clone()))?;

        let columns = match &insert.fields {
            // INSERT INTO t VALUES (...): values bind to columns in schema
            // order. Trailing columns may be omitted when they are nullable
            // or defaulted; the executor decides default-vs-NULL.
            None => {
                for row in rows {
                    if row.len() > schema.columns().len() {
                        return Err(OxbowError::InsertTooManyExpressions);
                    }
                    for column in &schema.columns()[row.len()..] {
                        if !column.nullable() && column.default().is_none() {
                            return Err(OxbowError::NotNullViolation {
                                column: column.name().to_owned(),
                            });
                        }
                    }
                }
                schema.columns().iter().map(|c| c.oid()).collect()
            }
            // INSERT INTO t (a, b) VALUES (...): every row must match the
            // column list exactly, every named column must exist, and every
            // unmentioned column must be nullable or defaulted.
            Some(fields) => {
                for row in rows {
                    if row.len() > fields.len() {
                        return Err(OxbowError::InsertTooManyExpressions);
                    }
                    if row.len() < fields.len() {
                        return Err(OxbowError::InsertTooFewExpressions);
                    }
                }

                let mut specified = HashSet::new();
                for field in fields {
                    let column =
                        schema
                            .column(&field.name)
                            .ok_or_else(|| OxbowError::NoSuchColumn {
                                column: field.name.clone(),
                                table: insert.table.name.clone(),
                            })?;
                    specified.insert(column.oid());
                }

                for column in schema.columns() {
                    if !specified.contains(&column.oid())
                        && !column.nullable()
                        && column.default().is_none()
                    {
                        return Err(OxbowError::NotNullViolation {
                            column: column.name().to_owned(),
                        });
                    }
                }

                schema
                    .columns()
                    .iter()
                    .map(|c| c.oid())
                    .filter(|oid| specified.contains(oid))
                    .collect()
            }
        };

        debug!(
            table = %insert.table.name,
            rows = rows.len(),
            "validated INSERT against schema"
        );

        Ok(OperatorExpression::leaf(LogicalOperator::Insert {
            database,
            namespace,
            table,
            columns,
            values: rows.clone(),
        }))
    }

    pub(super) fn plan_update(
        &mut self,
        update: &UpdateStatement,
    ) -> OxbowResult<OperatorExpression> {
        let (database, namespace, table) = self.resolve_table(&update.table)?;
        let scan = Self::dml_table_scan(
            database,
            namespace,
            table,
            &update.table,
            update.where_clause.as_ref(),
        );
        Ok(OperatorExpression::new(
            LogicalOperator::Update {
                database,
                namespace,
                alias: update.table.scan_alias(),
                table,
                assignments: update.fields.clone(),
            },
            vec![scan],
        ))
    }

    pub(super) fn plan_delete(
        &mut self,
        delete: &DeleteStatement,
    ) -> OxbowResult<OperatorExpression> {
        let (database, namespace, table) = self.resolve_table(&delete.table)?;
        let scan = Self::dml_table_scan(
            database,
            namespace,
            table,
            &delete.table,
            delete.where_clause.as_ref(),
        );
        Ok(OperatorExpression::new(
            LogicalOperator::Delete {
                database,
                namespace,
                table,
            },
            vec![scan],
        ))
    }

    /// The `FOR UPDATE` scan feeding an UPDATE or DELETE. WHERE conjuncts
    /// ride on the scan itself; sub-selects are not rewritten here.
    fn dml_table_scan(
        database: DatabaseOid,
        namespace: NamespaceOid,
        table_oid: TableOid,
        table: &Table,
        condition: Option<&Expr>,
    ) -> OperatorExpression {
        let mut predicates = Vec::new();
        if let Some(condition) = condition {
            extract_predicates(condition, &mut predicates);
        }
        OperatorExpression::leaf(LogicalOperator::Get {
            database,
            namespace,
            table: Some(table_oid),
            predicates,
            alias: table.scan_alias(),
            for_update: true,
        })
    }

    pub(super) fn plan_copy(&mut self, copy: &CopyStatement) -> OxbowResult<OperatorExpression> {
        match copy.direction {
            // Reading a file into a table: an external-file scan under an
            // insert-from-select.
            CopyDirection::FromFile => {
                let table = match &copy.target {
                    CopyTarget::Table(table) => table,
                    CopyTarget::Select(_) => internal!("COPY FROM requires a table target"),
                };
                let (database, namespace, table) = self.resolve_table(table)?;
                let source = OperatorExpression::leaf(LogicalOperator::ExternalFileGet {
                    file: copy.file.clone(),
                });
                Ok(OperatorExpression::new(
                    LogicalOperator::InsertSelect {
                        database,
                        namespace,
                        table,
                    },
                    vec![source],
                ))
            }
            CopyDirection::ToFile => {
                let source = match &copy.target {
                    CopyTarget::Select(select) => self.plan_select(select)?,
                    CopyTarget::Table(table) => self.plan_base_table(table)?,
                };
                Ok(OperatorExpression::new(
                    LogicalOperator::ExportExternalFile {
                        file: copy.file.clone(),
                    },
                    vec![source],
                ))
            }
        }
    }
}
