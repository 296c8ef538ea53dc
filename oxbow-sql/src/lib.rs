//! AST types for bound SQL statements.
//!
//! This crate models the output of the parser/binder pipeline: statements
//! whose table and column references have been resolved and whose scope
//! depths have been assigned. The optimizer consumes these types; nothing
//! here parses SQL text.

use serde::{Deserialize, Serialize};

pub use self::analyze::AnalyzeStatement;
pub use self::column::Column;
pub use self::common::FieldDefinitionExpr;
pub use self::copy::{CopyDirection, CopyStatement, CopyTarget, ExternalFile, FileFormat};
pub use self::create::{CreateFunctionStatement, CreateTableStatement};
pub use self::delete::DeleteStatement;
pub use self::drop::DropStatement;
pub use self::expression::{BinaryOperator, Expr, FunctionExpr, InValue};
pub use self::insert::{InsertData, InsertStatement};
pub use self::literal::{Double, Literal};
pub use self::order::{OrderClause, OrderType};
pub use self::prepare::{ExecuteStatement, PrepareStatement};
pub use self::select::{GroupByClause, LimitClause, SelectStatement};
pub use self::table::{JoinClause, JoinOperator, Table, TableExpr};
pub use self::transaction::TransactionStatement;
pub use self::update::UpdateStatement;

pub mod analysis;
mod analyze;
mod column;
mod common;
mod copy;
mod create;
mod delete;
mod drop;
mod expression;
mod insert;
mod literal;
mod order;
mod prepare;
mod select;
mod table;
mod transaction;
mod update;

/// A bound SQL statement of any kind.
///
/// Only the first five variants carry plannable semantics; the remainder are
/// accepted by the optimizer and produce no operator output.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[allow(clippy::large_enum_variant)]
pub enum SqlStatement {
    Select(SelectStatement),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    Copy(CopyStatement),
    CreateTable(CreateTableStatement),
    CreateFunction(CreateFunctionStatement),
    Drop(DropStatement),
    Prepare(PrepareStatement),
    Execute(ExecuteStatement),
    Transaction(TransactionStatement),
    Analyze(AnalyzeStatement),
}
