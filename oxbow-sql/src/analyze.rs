use serde::{Deserialize, Serialize};

use crate::Table;

/// `ANALYZE [<table>]`. Accepted without producing a plan.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeStatement {
    pub table: Option<Table>,
}
