use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::error::OptResult;
use crate::expr::ColumnRef;
use crate::operator::DisplayFields;

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct SortKey {
    pub column: ColumnRef,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(column: ColumnRef) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub fn desc(column: ColumnRef) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

impl Display for SortKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}",
            self.column,
            if self.descending { "DESC" } else { "ASC" }
        )
    }
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Sort {
    keys: Vec<SortKey>,
}

impl Sort {
    pub fn new<I: IntoIterator<Item = SortKey>>(keys: I) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// Parse an ORDER BY list, e.g. `s.gpa DESC, s.name`.
    pub fn parse(raw: &str) -> OptResult<Sort> {
        let keys = raw
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| {
                let mut descending = false;
                let mut column = item;
                for (suffix, desc) in [(" DESC", true), (" ASC", false)] {
                    if item.to_ascii_uppercase().ends_with(suffix) {
                        column = item[..item.len() - suffix.len()].trim();
                        descending = desc;
                        break;
                    }
                }
                SortKey {
                    column: ColumnRef::parse(column),
                    descending,
                }
            })
            .collect();
        Ok(Sort { keys })
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }
}

impl DisplayFields for Sort {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            " {{ keys: [{}] }}",
            self.keys.iter().map(|k| k.to_string()).join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_order_by() {
        let sort = Sort::parse("s.gpa DESC, s.name").unwrap();
        assert_eq!(sort.keys().len(), 2);
        assert!(sort.keys()[0].descending);
        assert!(!sort.keys()[1].descending);
        assert_eq!(sort.keys()[1].column, ColumnRef::new("s", "name"));
    }
}
