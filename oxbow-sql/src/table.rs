use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Expr, SelectStatement};

/// A named table reference.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub alias: Option<String>,
    /// Database the table lives in; `None` means the session's database.
    pub database: Option<String>,
}

impl Table {
    /// The alias under which this table's columns are visible, lowercased
    /// the way the binder normalizes identifiers.
    pub fn scan_alias(&self) -> String {
        self.alias.as_deref().unwrap_or(&self.name).to_lowercase()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(ref database) = self.database {
            write!(f, "{}.", database)?;
        }
        write!(f, "{}", self.name)?;
        if let Some(ref alias) = self.alias {
            write!(f, " AS {}", alias)?;
        }
        Ok(())
    }
}

impl From<&str> for Table {
    fn from(name: &str) -> Self {
        Table {
            name: name.into(),
            alias: None,
            database: None,
        }
    }
}

/// Kinds of join the parser can produce.
///
/// The logical planner only lowers the first five; the rest survive here so
/// it has an invalid-join-type error path to exercise.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum JoinOperator {
    Inner,
    Left,
    Right,
    Outer,
    Semi,
    Cross,
    Straight,
}

/// An explicit `JOIN` between two table expressions.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct JoinClause {
    pub left: TableExpr,
    pub operator: JoinOperator,
    pub right: TableExpr,
    pub constraint: Option<Expr>,
}

/// Anything that can appear in a `FROM` clause.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum TableExpr {
    /// A single base table.
    Table(Table),
    /// A sub-select used as a derived table, with its mandatory alias.
    Derived {
        statement: Box<SelectStatement>,
        alias: String,
    },
    /// An explicit join.
    Join(Box<JoinClause>),
    /// A comma-separated (and implicitly joined) sequence of references.
    List(Vec<TableExpr>),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn scan_alias_lowercases() {
        assert_eq!(Table::from("WAREHOUSE").scan_alias(), "warehouse");
        let aliased = Table {
            name: "WAREHOUSE".into(),
            alias: Some("W1".into()),
            database: None,
        };
        assert_eq!(aliased.scan_alias(), "w1");
    }
}
