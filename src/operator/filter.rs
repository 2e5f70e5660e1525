use std::fmt::Formatter;

use crate::expr::Predicate;
use crate::operator::DisplayFields;

/// Selection over a single input.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    predicate: Predicate,
}

impl Filter {
    pub fn new(predicate: Predicate) -> Self {
        Self { predicate }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn into_predicate(self) -> Predicate {
        self.predicate
    }
}

impl DisplayFields for Filter {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, " {{ predicate: {} }}", self.predicate)
    }
}
