use std::fmt::Formatter;

use crate::operator::DisplayFields;

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Limit {
    limit: u64,
}

impl Limit {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl DisplayFields for Limit {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("").field("limit", &self.limit).finish()
    }
}
