//! Catalog access for the oxbow query optimizer.
//!
//! The planner resolves table and column names through the [`Catalog`]
//! trait; [`SimpleCatalog`] is the in-memory implementation used by tests
//! and embedded deployments. All name lookups are case-insensitive, matching
//! how the binder normalizes identifiers.

use std::collections::HashMap;

use derive_more::{Display, From};
use oxbow_sql::Expr;
use serde::{Deserialize, Serialize};

macro_rules! oid_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, Default, Display, Eq, From, Hash, Ord, PartialEq, PartialOrd,
            Serialize, Deserialize,
        )]
        pub struct $name(pub u32);
    };
}

oid_type!(
    /// Identifier of a database.
    DatabaseOid
);
oid_type!(
    /// Identifier of a namespace within a database.
    NamespaceOid
);
oid_type!(
    /// Identifier of a table.
    TableOid
);
oid_type!(
    /// Identifier of a column within a table.
    ColumnOid
);

/// One column of a table schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaColumn {
    oid: ColumnOid,
    name: String,
    nullable: bool,
    default: Option<Expr>,
}

impl SchemaColumn {
    /// A nullable column with no default.
    pub fn new(oid: ColumnOid, name: impl Into<String>) -> Self {
        SchemaColumn {
            oid,
            name: name.into(),
            nullable: true,
            default: None,
        }
    }

    /// Marks the column `NOT NULL`.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Attaches a default-value expression.
    pub fn with_default(mut self, default: Expr) -> Self {
        self.default = Some(default);
        self
    }

    pub fn oid(&self) -> ColumnOid {
        self.oid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    /// The stored default-value expression, if the column has one.
    pub fn default(&self) -> Option<&Expr> {
        self.default.as_ref()
    }
}

/// The ordered column layout of one table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    columns: Vec<SchemaColumn>,
}

impl TableSchema {
    pub fn new(columns: Vec<SchemaColumn>) -> Self {
        TableSchema { columns }
    }

    /// The columns in definition order.
    pub fn columns(&self) -> &[SchemaColumn] {
        &self.columns
    }

    /// Looks a column up by name, case-insensitively.
    pub fn column(&self, name: &str) -> Option<&SchemaColumn> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// Read access to schema metadata, as consumed by the planner.
///
/// Implementations must be internally consistent: every oid returned by
/// [`table_oid`](Catalog::table_oid) must resolve through
/// [`schema`](Catalog::schema).
pub trait Catalog {
    /// Resolves a database name; `None` means the session's database.
    fn database_oid(&self, name: Option<&str>) -> Option<DatabaseOid>;

    /// The namespace new scans resolve into.
    fn default_namespace(&self) -> NamespaceOid;

    /// Resolves a table name in the default namespace.
    fn table_oid(&self, name: &str) -> Option<TableOid>;

    /// The schema of the given table.
    fn schema(&self, table: TableOid) -> Option<&TableSchema>;
}

/// An in-memory, single-database catalog.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimpleCatalog {
    database_name: String,
    database: DatabaseOid,
    namespace: NamespaceOid,
    tables: HashMap<String, TableOid>,
    schemas: HashMap<TableOid, TableSchema>,
    next_table: u32,
}

impl SimpleCatalog {
    pub fn new(database_name: impl Into<String>) -> Self {
        SimpleCatalog {
            database_name: database_name.into().to_lowercase(),
            database: DatabaseOid(1),
            namespace: NamespaceOid(1),
            tables: HashMap::new(),
            schemas: HashMap::new(),
            next_table: 1000,
        }
    }

    /// Registers a table and returns its assigned oid.
    pub fn add_table(&mut self, name: impl Into<String>, schema: TableSchema) -> TableOid {
        self.next_table += 1;
        let oid = TableOid(self.next_table);
        self.tables.insert(name.into().to_lowercase(), oid);
        self.schemas.insert(oid, schema);
        oid
    }
}

impl Catalog for SimpleCatalog {
    fn database_oid(&self, name: Option<&str>) -> Option<DatabaseOid> {
        match name {
            None => Some(self.database),
            Some(name) if name.eq_ignore_ascii_case(&self.database_name) => Some(self.database),
            Some(_) => None,
        }
    }

    fn default_namespace(&self) -> NamespaceOid {
        self.namespace
    }

    fn table_oid(&self, name: &str) -> Option<TableOid> {
        self.tables.get(&name.to_lowercase()).copied()
    }

    fn schema(&self, table: TableOid) -> Option<&TableSchema> {
        self.schemas.get(&table)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn warehouse_schema() -> TableSchema {
        TableSchema::new(vec![
            SchemaColumn::new(ColumnOid(1), "w_id").not_null(),
            SchemaColumn::new(ColumnOid(2), "w_name"),
        ])
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let mut catalog = SimpleCatalog::new("tpcc");
        let oid = catalog.add_table("WAREHOUSE", warehouse_schema());
        assert_eq!(catalog.table_oid("warehouse"), Some(oid));
        assert_eq!(catalog.table_oid("Warehouse"), Some(oid));
        assert_eq!(catalog.table_oid("district"), None);

        let schema = catalog.schema(oid).unwrap();
        assert_eq!(schema.column("W_ID").unwrap().oid(), ColumnOid(1));
        assert!(schema.column("w_missing").is_none());
    }

    #[test]
    fn database_resolution() {
        let catalog = SimpleCatalog::new("TPCC");
        assert_eq!(catalog.database_oid(None), Some(DatabaseOid(1)));
        assert_eq!(catalog.database_oid(Some("tpcc")), Some(DatabaseOid(1)));
        assert_eq!(catalog.database_oid(Some("other")), None);
    }
}
