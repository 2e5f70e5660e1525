use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::error::{OptResult, OptimizerError};
use crate::operator::DisplayFields;

/// One `SET column = expression` assignment of an UPDATE. The expression is
/// carried verbatim; evaluation belongs to the executor.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct SetClause {
    pub column: String,
    pub expression: String,
}

impl SetClause {
    pub fn parse(raw: &str) -> OptResult<SetClause> {
        let (column, expression) = raw
            .split_once('=')
            .ok_or_else(|| OptimizerError::InvalidSetClause(raw.to_string()))?;
        let column = column.trim();
        let expression = expression.trim();
        if column.is_empty() || expression.is_empty() {
            return Err(OptimizerError::InvalidSetClause(raw.to_string()).into());
        }
        Ok(SetClause {
            column: column.to_string(),
            expression: expression.to_string(),
        })
    }
}

impl Display for SetClause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.column, self.expression)
    }
}

/// UPDATE marker above the (optionally filtered) target scan.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Update {
    assignments: Vec<SetClause>,
}

impl Update {
    pub fn new<I: IntoIterator<Item = SetClause>>(assignments: I) -> Self {
        Self {
            assignments: assignments.into_iter().collect(),
        }
    }

    pub fn assignments(&self) -> &[SetClause] {
        &self.assignments
    }
}

impl DisplayFields for Update {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            " {{ set: [{}] }}",
            self.assignments.iter().map(|a| a.to_string()).join(", ")
        )
    }
}

/// DELETE marker above the (optionally filtered) target scan.
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct Delete {}

impl Delete {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplayFields for Delete {
    fn display(&self, _f: &mut Formatter<'_>) -> std::fmt::Result {
        Ok(())
    }
}

/// INSERT leaf. Values are carried verbatim.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Insert {
    table: String,
    columns: Vec<String>,
    values: Vec<String>,
}

impl Insert {
    pub fn new<S: Into<String>>(table: S, columns: Vec<String>, values: Vec<String>) -> Self {
        Self {
            table: table.into(),
            columns,
            values,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl DisplayFields for Insert {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("");
        s.field("table", &self.table);
        if !self.columns.is_empty() {
            s.field("columns", &self.columns);
        }
        s.field("values", &self.values);
        s.finish()
    }
}
