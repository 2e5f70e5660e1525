use std::fmt::Formatter;

use crate::expr::Predicate;
use crate::operator::DisplayFields;

/// How a two-input join combines its sides.
#[derive(Clone, Debug, PartialEq)]
pub enum JoinSpec {
    /// Unconditioned cross product.
    Cartesian,
    /// Equality on all commonly named attributes.
    Natural,
    /// Explicit join predicate.
    Theta(Predicate),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Join {
    spec: JoinSpec,
}

impl Join {
    pub fn new(spec: JoinSpec) -> Self {
        Self { spec }
    }

    pub fn cartesian() -> Self {
        Self::new(JoinSpec::Cartesian)
    }

    pub fn natural() -> Self {
        Self::new(JoinSpec::Natural)
    }

    pub fn theta(predicate: Predicate) -> Self {
        Self::new(JoinSpec::Theta(predicate))
    }

    pub fn spec(&self) -> &JoinSpec {
        &self.spec
    }

    pub fn is_cartesian(&self) -> bool {
        matches!(self.spec, JoinSpec::Cartesian)
    }

    pub fn is_natural(&self) -> bool {
        matches!(self.spec, JoinSpec::Natural)
    }

    pub fn is_theta(&self) -> bool {
        matches!(self.spec, JoinSpec::Theta(_))
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        match &self.spec {
            JoinSpec::Theta(p) => Some(p),
            _ => None,
        }
    }

    /// Fold an extra predicate into the join condition. The incoming predicate
    /// lands first in the conjunction.
    pub fn with_merged_predicate(&self, predicate: Predicate) -> Join {
        match &self.spec {
            JoinSpec::Theta(existing) => {
                Join::theta(Predicate::and(predicate, existing.clone()))
            }
            _ => Join::theta(predicate),
        }
    }
}

impl DisplayFields for Join {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.spec {
            JoinSpec::Cartesian => write!(f, " {{ cartesian }}"),
            JoinSpec::Natural => write!(f, " {{ natural }}"),
            JoinSpec::Theta(p) => write!(f, " {{ theta: {p} }}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_predicate() {
        let join = Join::theta(Predicate::parse("a.id = b.id").unwrap());
        let merged =
            join.with_merged_predicate(Predicate::parse("a.x = 1").unwrap());
        let pred = merged.predicate().unwrap();
        assert_eq!(pred.conjuncts().map(<[_]>::len), Some(2));
        assert_eq!(format!("{pred}"), "a.x = 1 AND a.id = b.id");
    }

    #[test]
    fn test_merge_into_cartesian_promotes_to_theta() {
        let join = Join::cartesian();
        let merged =
            join.with_merged_predicate(Predicate::parse("a.id = b.id").unwrap());
        assert!(merged.is_theta());
    }
}
