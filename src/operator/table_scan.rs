use std::fmt::Formatter;

use crate::error::{OptResult, OptimizerError};
use crate::operator::DisplayFields;

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct TableScan {
    table_name: String,
    alias: Option<String>,
}

impl TableScan {
    pub fn new<S: Into<String>>(table_name: S) -> Self {
        Self {
            table_name: table_name.into(),
            alias: None,
        }
    }

    pub fn with_alias<S: Into<String>, A: Into<String>>(table_name: S, alias: A) -> Self {
        Self {
            table_name: table_name.into(),
            alias: Some(alias.into()),
        }
    }

    /// Parse a FROM-clause table reference: `t`, `t x` or `t AS x`.
    pub fn parse(raw: &str) -> OptResult<TableScan> {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        match tokens.as_slice() {
            [name] => Ok(TableScan::new(*name)),
            [name, alias] => Ok(TableScan::with_alias(*name, *alias)),
            [name, kw, alias] if kw.eq_ignore_ascii_case("as") => {
                Ok(TableScan::with_alias(*name, *alias))
            }
            _ => Err(OptimizerError::InvalidTableReference(raw.to_string()).into()),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The name the rest of the query refers to this scan by: the alias when
    /// present, the table name otherwise.
    pub fn binding_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table_name)
    }
}

impl DisplayFields for TableScan {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("");
        s.field("table_name", &self.table_name);
        if let Some(alias) = &self.alias {
            s.field("alias", alias);
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_reference() {
        let scan = TableScan::parse("students").unwrap();
        assert_eq!(scan.binding_name(), "students");

        let scan = TableScan::parse("students s").unwrap();
        assert_eq!(scan.table_name(), "students");
        assert_eq!(scan.binding_name(), "s");

        let scan = TableScan::parse("students AS s").unwrap();
        assert_eq!(scan.alias(), Some("s"));

        assert!(TableScan::parse("a b c d").is_err());
    }
}
