use std::fmt::Formatter;

use itertools::Itertools;

use crate::error::OptResult;
use crate::expr::ColumnRef;
use crate::operator::DisplayFields;

/// Column projection, preserving the requested order.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Projection {
    columns: Vec<ColumnRef>,
}

impl Projection {
    pub fn new<I: IntoIterator<Item = ColumnRef>>(columns: I) -> Self {
        Self {
            columns: columns.into_iter().collect(),
        }
    }

    /// Parse a comma separated select list, e.g. `s.name, s.gpa`.
    pub fn parse(raw: &str) -> OptResult<Projection> {
        Ok(Projection::new(
            raw.split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(ColumnRef::parse),
        ))
    }

    pub fn columns(&self) -> &[ColumnRef] {
        &self.columns
    }
}

impl DisplayFields for Projection {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            " {{ columns: [{}] }}",
            self.columns.iter().map(|c| c.to_string()).join(", ")
        )
    }
}
