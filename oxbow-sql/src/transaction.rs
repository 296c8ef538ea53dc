use serde::{Deserialize, Serialize};

/// Transaction control statements. Accepted without producing a plan.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum TransactionStatement {
    Begin,
    Commit,
    Rollback,
}
