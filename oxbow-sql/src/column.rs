use std::fmt;

use serde::{Deserialize, Serialize};

/// A (possibly qualified) column reference.
///
/// The binder qualifies every column it successfully resolves, so `table` is
/// only `None` for columns that never went through binding. `depth` is the
/// scope-nesting level the binder assigned to the column's defining scope: 0
/// for the outermost SELECT, increasing by one per nested sub-select. The
/// optimizer compares column depths against a sub-select's depth to detect
/// correlated predicates.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub table: Option<String>,
    pub depth: usize,
}

impl Column {
    /// Returns this column with its binder depth set to `depth`.
    pub fn at_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(ref table) = self.table {
            write!(f, "{}.{}", table, self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl From<&str> for Column {
    fn from(c: &str) -> Column {
        match c.split_once('.') {
            Some((table, name)) => Column {
                name: name.into(),
                table: Some(table.into()),
                depth: 0,
            },
            None => Column {
                name: c.into(),
                table: None,
                depth: 0,
            },
        }
    }
}

impl From<String> for Column {
    fn from(c: String) -> Column {
        Column::from(c.as_str())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn from_str_qualified() {
        let column = Column::from("warehouse.w_id");
        assert_eq!(column.name, "w_id");
        assert_eq!(column.table.as_deref(), Some("warehouse"));
        assert_eq!(column.depth, 0);
    }

    #[test]
    fn from_str_bare() {
        let column = Column::from("w_id");
        assert_eq!(column.name, "w_id");
        assert_eq!(column.table, None);
    }

    #[test]
    fn display_round_trip() {
        assert_eq!(Column::from("t.a").to_string(), "t.a");
        assert_eq!(Column::from("a").to_string(), "a");
    }
}
