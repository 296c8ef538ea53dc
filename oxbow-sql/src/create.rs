use serde::{Deserialize, Serialize};

use crate::Table;

/// `CREATE TABLE`. DDL is resolved by the catalog layer; the optimizer
/// accepts it and produces no plan.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct CreateTableStatement {
    pub table: Table,
}

/// `CREATE FUNCTION`. Accepted without producing a plan.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct CreateFunctionStatement {
    pub name: String,
}
