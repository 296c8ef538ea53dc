use serde::{Deserialize, Serialize};

use crate::{SelectStatement, Table};

/// External file formats `COPY` can read and write.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum FileFormat {
    Csv,
    Binary,
}

/// The external-file half of a `COPY` statement.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct ExternalFile {
    pub format: FileFormat,
    pub path: String,
    pub delimiter: char,
    pub quote: char,
    pub escape: char,
}

impl Default for ExternalFile {
    fn default() -> Self {
        ExternalFile {
            format: FileFormat::Csv,
            path: String::new(),
            delimiter: ',',
            quote: '"',
            escape: '"',
        }
    }
}

/// What a `COPY` statement reads from or writes to on the database side.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum CopyTarget {
    Table(Table),
    Select(Box<SelectStatement>),
}

/// Direction of the transfer, from the database's point of view.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum CopyDirection {
    /// `COPY t FROM 'file'`: load the file into the target table.
    FromFile,
    /// `COPY t TO 'file'` / `COPY (SELECT ...) TO 'file'`.
    ToFile,
}

/// A bound `COPY` statement.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct CopyStatement {
    pub target: CopyTarget,
    pub direction: CopyDirection,
    pub file: ExternalFile,
}
