//! Join shape rewrites: associativity rotations and canonical child order.

use crate::error::OptResult;
use crate::operator::Join;
use crate::plan::{tables_under, PlanNode, PlanNodeRef};
use crate::rules::{Rule, RuleId};

/// Rotates nested natural joins: (A ⋈ B) ⋈ C ↔ A ⋈ (B ⋈ C).
#[derive(Clone, Default)]
pub struct AssociateNaturalJoinRule {}

impl AssociateNaturalJoinRule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Rule for AssociateNaturalJoinRule {
    fn apply(&self, node: &PlanNodeRef) -> OptResult<Option<PlanNodeRef>> {
        let Some(join) = node.operator().as_join() else {
            return Ok(None);
        };
        if !join.is_natural() {
            return Ok(None);
        }
        let [left, right] = node.inputs() else {
            return Ok(None);
        };

        if left
            .operator()
            .as_join()
            .is_some_and(|inner| inner.is_natural())
        {
            let a = left.inputs()[0].clone();
            let b = left.inputs()[1].clone();
            let c = right.clone();
            return Ok(Some(PlanNode::binary(
                Join::natural().into(),
                a,
                PlanNode::binary(Join::natural().into(), b, c),
            )));
        }
        if right
            .operator()
            .as_join()
            .is_some_and(|inner| inner.is_natural())
        {
            let a = left.clone();
            let b = right.inputs()[0].clone();
            let c = right.inputs()[1].clone();
            return Ok(Some(PlanNode::binary(
                Join::natural().into(),
                PlanNode::binary(Join::natural().into(), a, b),
                c,
            )));
        }
        Ok(None)
    }

    fn rule_id(&self) -> RuleId {
        RuleId::AssociateNaturalJoin
    }
}

/// Rotates nested theta joins: (A ⋈θ1 B) ⋈θ2 C becomes A ⋈θ1 (B ⋈θ2 C) and
/// back. A rotation only fires when the predicate moving down still sees all
/// tables it mentions at its new pairing, otherwise the tree would stop
/// being evaluable.
#[derive(Clone, Default)]
pub struct AssociateThetaJoinRule {}

impl AssociateThetaJoinRule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Rule for AssociateThetaJoinRule {
    fn apply(&self, node: &PlanNodeRef) -> OptResult<Option<PlanNodeRef>> {
        let Some(join) = node.operator().as_join() else {
            return Ok(None);
        };
        if !join.is_theta() {
            return Ok(None);
        }
        let [left, right] = node.inputs() else {
            return Ok(None);
        };

        if let Some(inner) = left.operator().as_join() {
            // (A ⋈θ1 B) ⋈θ2 C becomes A ⋈θ1 (B ⋈θ2 C); θ2 must be
            // evaluable over B and C alone.
            if inner.is_theta() && predicate_evaluable(join, &left.inputs()[1], right) {
                let a = left.inputs()[0].clone();
                let b = left.inputs()[1].clone();
                let c = right.clone();
                return Ok(Some(PlanNode::binary(
                    left.operator().clone(),
                    a,
                    PlanNode::binary(node.operator().clone(), b, c),
                )));
            }
        }
        if let Some(inner) = right.operator().as_join() {
            // A ⋈θ1 (B ⋈θ2 C) becomes (A ⋈θ1 B) ⋈θ2 C; θ1 must be
            // evaluable over A and B alone.
            if inner.is_theta() && predicate_evaluable(join, left, &right.inputs()[0]) {
                let a = left.clone();
                let b = right.inputs()[0].clone();
                let c = right.inputs()[1].clone();
                return Ok(Some(PlanNode::binary(
                    right.operator().clone(),
                    PlanNode::binary(node.operator().clone(), a, b),
                    c,
                )));
            }
        }
        Ok(None)
    }

    fn rule_id(&self) -> RuleId {
        RuleId::AssociateThetaJoin
    }
}

fn predicate_evaluable(join: &Join, left: &PlanNodeRef, right: &PlanNodeRef) -> bool {
    let Some(predicate) = join.predicate() else {
        return true;
    };
    let mut visible = tables_under(left);
    visible.extend(tables_under(right));
    predicate.tables().iter().all(|t| visible.contains(*t))
}

/// Orders join children by their smallest lowercased table name so equivalent
/// trees converge on one spelling.
#[derive(Clone, Default)]
pub struct CanonicalJoinOrderRule {}

impl CanonicalJoinOrderRule {
    pub fn new() -> Self {
        Self::default()
    }
}

fn order_key(node: &PlanNodeRef) -> String {
    tables_under(node)
        .into_iter()
        .map(|t| t.to_lowercase())
        .min()
        .unwrap_or_else(|| node.operator().as_ref().to_lowercase())
}

impl Rule for CanonicalJoinOrderRule {
    fn apply(&self, node: &PlanNodeRef) -> OptResult<Option<PlanNodeRef>> {
        if node.operator().as_join().is_none() {
            return Ok(None);
        }
        let [left, right] = node.inputs() else {
            return Ok(None);
        };
        if order_key(left) > order_key(right) {
            return Ok(Some(PlanNode::binary(
                node.operator().clone(),
                right.clone(),
                left.clone(),
            )));
        }
        Ok(None)
    }

    fn rule_id(&self) -> RuleId {
        RuleId::CanonicalJoinOrder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Predicate;
    use crate::operator::JoinSpec;
    use crate::plan::PlanBuilder;

    #[test]
    fn test_associate_natural_left_nested() {
        let plan = PlanBuilder::scan("a")
            .join(JoinSpec::Natural, PlanBuilder::scan("b"))
            .join(JoinSpec::Natural, PlanBuilder::scan("c"))
            .build();
        let result = AssociateNaturalJoinRule::new()
            .apply(&plan.root())
            .unwrap()
            .unwrap();
        // (a ⋈ b) ⋈ c became a ⋈ (b ⋈ c).
        assert!(result.inputs()[0].operator().as_scan().is_some());
        let inner = &result.inputs()[1];
        assert!(inner.operator().as_join().is_some());
        assert_eq!(
            crate::plan::Plan::new(result.clone()).tables(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_associate_theta_keeps_predicates_with_pairings() {
        let theta_ab = Predicate::parse("a.id = b.id").unwrap();
        let theta_c = Predicate::parse("b.x = c.x").unwrap();
        let plan = PlanBuilder::scan("a")
            .join(JoinSpec::Theta(theta_ab), PlanBuilder::scan("b"))
            .join(JoinSpec::Theta(theta_c), PlanBuilder::scan("c"))
            .build();
        let result = AssociateThetaJoinRule::new()
            .apply(&plan.root())
            .unwrap()
            .unwrap();
        // The b-c predicate travels down with c; the a-b predicate stays at
        // the join that still sees a.
        let outer = result.operator().as_join().unwrap();
        assert_eq!(format!("{}", outer.predicate().unwrap()), "a.id = b.id");
        let inner = result.inputs()[1].operator().as_join().unwrap();
        assert_eq!(format!("{}", inner.predicate().unwrap()), "b.x = c.x");
    }

    #[test]
    fn test_associate_theta_refuses_unevaluable_rotation() {
        // Rotating would strand a.id = c.id at a join that cannot see a.
        let theta_ab = Predicate::parse("a.id = b.id").unwrap();
        let theta_ac = Predicate::parse("a.id = c.id").unwrap();
        let plan = PlanBuilder::scan("a")
            .join(JoinSpec::Theta(theta_ab), PlanBuilder::scan("b"))
            .join(JoinSpec::Theta(theta_ac), PlanBuilder::scan("c"))
            .build();
        assert!(AssociateThetaJoinRule::new()
            .apply(&plan.root())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_canonical_join_order_swaps() {
        let plan = PlanBuilder::scan("zeta")
            .join(JoinSpec::Natural, PlanBuilder::scan("alpha"))
            .build();
        let result = CanonicalJoinOrderRule::new()
            .apply(&plan.root())
            .unwrap()
            .unwrap();
        let left_scan = result.inputs()[0].operator().as_scan().unwrap();
        assert_eq!(left_scan.binding_name(), "alpha");
        // Already ordered trees are left alone.
        assert!(CanonicalJoinOrderRule::new()
            .apply(&result)
            .unwrap()
            .is_none());
    }
}
