use serde::{Deserialize, Serialize};

use crate::{Literal, SqlStatement};

/// `PREPARE <name> AS <statement>`. Accepted without producing a plan.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct PrepareStatement {
    pub name: String,
    pub statement: Box<SqlStatement>,
}

/// `EXECUTE <name> (<parameters>)`. Accepted without producing a plan.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct ExecuteStatement {
    pub name: String,
    pub parameters: Vec<Literal>,
}
