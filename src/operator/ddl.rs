use std::fmt::{Display, Formatter};

use crate::error::{OptResult, OptimizerError};
use crate::operator::DisplayFields;

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum DataType {
    Int,
    Float,
    Char(u32),
    Varchar(u32),
}

impl DataType {
    /// Parse a column type such as `int` or `varchar(20)`.
    pub fn parse(raw: &str) -> OptResult<DataType> {
        let raw = raw.trim();
        let lower = raw.to_lowercase();
        if lower == "int" || lower == "integer" {
            return Ok(DataType::Int);
        }
        if lower == "float" {
            return Ok(DataType::Float);
        }
        for (prefix, sized) in [
            ("char", DataType::Char as fn(u32) -> DataType),
            ("varchar", DataType::Varchar as fn(u32) -> DataType),
        ] {
            if let Some(rest) = lower.strip_prefix(prefix) {
                let rest = rest.trim();
                if let Some(n) = rest
                    .strip_prefix('(')
                    .and_then(|r| r.strip_suffix(')'))
                    .and_then(|n| n.trim().parse::<u32>().ok())
                {
                    return Ok(sized(n));
                }
            }
        }
        Err(OptimizerError::InvalidColumnDefinition(raw.to_string()).into())
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Int => write!(f, "int"),
            DataType::Float => write!(f, "float"),
            DataType::Char(n) => write!(f, "char({n})"),
            DataType::Varchar(n) => write!(f, "varchar({n})"),
        }
    }
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct ForeignKey {
    pub column: String,
    pub ref_table: String,
    pub ref_column: String,
}

/// CREATE TABLE leaf carrying the parsed definition list.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct CreateTable {
    table: String,
    columns: Vec<ColumnDef>,
    primary_key: Vec<String>,
    foreign_keys: Vec<ForeignKey>,
}

impl CreateTable {
    pub fn new<S: Into<String>>(
        table: S,
        columns: Vec<ColumnDef>,
        primary_key: Vec<String>,
        foreign_keys: Vec<ForeignKey>,
    ) -> Self {
        Self {
            table: table.into(),
            columns,
            primary_key,
            foreign_keys,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }
}

impl DisplayFields for CreateTable {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("");
        s.field("table", &self.table);
        s.field("columns", &self.columns.len());
        if !self.primary_key.is_empty() {
            s.field("primary_key", &self.primary_key);
        }
        s.finish()
    }
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct DropTable {
    table: String,
    cascade: bool,
}

impl DropTable {
    pub fn new<S: Into<String>>(table: S, cascade: bool) -> Self {
        Self {
            table: table.into(),
            cascade,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn cascade(&self) -> bool {
        self.cascade
    }
}

impl DisplayFields for DropTable {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("");
        s.field("table", &self.table);
        if self.cascade {
            s.field("cascade", &true);
        }
        s.finish()
    }
}

/// Transaction boundary markers. Opaque to rewriting and costing.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum TransactionKind {
    Begin,
    Commit,
    Rollback,
}

impl DisplayFields for TransactionKind {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, " {{ {self:?} }}")
    }
}
