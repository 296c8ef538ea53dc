use serde::{Deserialize, Serialize};

/// `DROP TABLE` / `DROP INDEX`. Accepted without producing a plan.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct DropStatement {
    pub name: String,
}
