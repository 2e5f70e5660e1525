//! Rewrite rules.
//!
//! A rule defines an equivalence-preserving transformation of a plan subtree.
//! Rules only see the node they are applied to (plus its subtree); iteration
//! order, fixed-point detection and cycle guarding belong to
//! [`HepOptimizer`](crate::heuristic::HepOptimizer). A rule that does not
//! match returns `Ok(None)` so unrecognized shapes pass through unchanged.
//!
//! The default catalog performs the classic algebraic rewrites: folding
//! selections into cartesian products, merging and pushing selections through
//! joins, pushing projections below joins while keeping join attributes
//! alive, collapsing redundant projection chains, and join
//! commutation/association so the join-order enumerator starts from a
//! canonical shape.

mod selection;
pub use selection::*;
mod projection;
pub use projection::*;
mod join;
pub use join::*;

use std::fmt::{Debug, Formatter};

use enum_dispatch::enum_dispatch;
use enumset::EnumSetType;
use strum_macros::AsRefStr;

use crate::error::OptResult;
use crate::plan::PlanNodeRef;

/// A rule should only focus on providing an equivalent transformation of the
/// node it is handed.
#[enum_dispatch(RuleImpl)]
pub trait Rule {
    /// Try to rewrite `node`. `None` means the rule does not apply; a returned
    /// node is spliced into the parent in the original's place.
    fn apply(&self, node: &PlanNodeRef) -> OptResult<Option<PlanNodeRef>>;

    /// Used to identify each rule, e.g. when disabling a subset.
    fn rule_id(&self) -> RuleId;
}

#[enum_dispatch]
#[derive(Clone, AsRefStr)]
pub enum RuleImpl {
    FoldCartesianSelectionRule,
    MergeSelectionIntoJoinRule,
    DecomposeConjunctiveSelectionRule,
    SplitSelectionOverJoinRule,
    PushSelectionThroughJoinRule,
    PushProjectionThroughJoinRule,
    PushProjectionWithJoinAttrsRule,
    EliminateRedundantProjectionsRule,
    CommuteSelectionsRule,
    AssociateNaturalJoinRule,
    AssociateThetaJoinRule,
    CanonicalJoinOrderRule,
}

#[derive(EnumSetType, Debug)]
pub enum RuleId {
    FoldCartesianSelection,
    MergeSelectionIntoJoin,
    DecomposeConjunctiveSelection,
    SplitSelectionOverJoin,
    PushSelectionThroughJoin,
    PushProjectionThroughJoin,
    PushProjectionWithJoinAttrs,
    EliminateRedundantProjections,
    CommuteSelections,
    AssociateNaturalJoin,
    AssociateThetaJoin,
    CanonicalJoinOrder,
}

impl Debug for RuleImpl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.as_ref())
    }
}

lazy_static! {
    static ref DEFAULT_RULES: Vec<RuleImpl> = vec![
        FoldCartesianSelectionRule::new().into(),
        MergeSelectionIntoJoinRule::new().into(),
        DecomposeConjunctiveSelectionRule::new().into(),
        SplitSelectionOverJoinRule::new().into(),
        PushSelectionThroughJoinRule::new().into(),
        PushProjectionThroughJoinRule::new().into(),
        PushProjectionWithJoinAttrsRule::new().into(),
        EliminateRedundantProjectionsRule::new().into(),
        CommuteSelectionsRule::new().into(),
        AssociateNaturalJoinRule::new().into(),
        AssociateThetaJoinRule::new().into(),
        CanonicalJoinOrderRule::new().into(),
    ];
}

/// The full catalog in application order.
pub fn default_rules() -> &'static [RuleImpl] {
    &DEFAULT_RULES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_debug() {
        let rule = RuleImpl::from(FoldCartesianSelectionRule::new());
        assert_eq!(format!("{rule:?}"), "\"FoldCartesianSelectionRule\"");
    }

    #[test]
    fn test_default_catalog_order() {
        let ids: Vec<RuleId> = default_rules().iter().map(|r| r.rule_id()).collect();
        assert_eq!(ids.len(), 12);
        assert_eq!(ids[0], RuleId::FoldCartesianSelection);
        assert_eq!(ids[11], RuleId::CanonicalJoinOrder);
    }
}
