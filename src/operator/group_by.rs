use std::fmt::Formatter;

use itertools::Itertools;

use crate::error::OptResult;
use crate::expr::ColumnRef;
use crate::operator::DisplayFields;

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct GroupBy {
    columns: Vec<ColumnRef>,
}

impl GroupBy {
    pub fn new<I: IntoIterator<Item = ColumnRef>>(columns: I) -> Self {
        Self {
            columns: columns.into_iter().collect(),
        }
    }

    pub fn parse(raw: &str) -> OptResult<GroupBy> {
        Ok(GroupBy::new(
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

impl DisplayFields for GroupBy {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            " {{ columns: [{}] }}",
            self.columns.iter().map(|c| c.to_string()).join(", ")
        )
    }
}
