//! Selection rewrites: folding into joins, conjunct decomposition, pushdown
//! and commutation.

use std::collections::HashSet;

use crate::error::OptResult;
use crate::expr::Predicate;
use crate::operator::{Filter, Join};
use crate::plan::{tables_under, PlanNode, PlanNodeRef};
use crate::rules::{Rule, RuleId};

fn filter_over_join(node: &PlanNodeRef) -> Option<(&Filter, &PlanNodeRef, &Join)> {
    let filter = node.operator().as_filter()?;
    let input = node.inputs().first()?;
    let join = input.operator().as_join()?;
    if input.inputs().len() != 2 {
        return None;
    }
    Some((filter, input, join))
}

/// σ(pred)(A × B) becomes A ⋈(pred) B.
#[derive(Clone, Default)]
pub struct FoldCartesianSelectionRule {}

impl FoldCartesianSelectionRule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Rule for FoldCartesianSelectionRule {
    fn apply(&self, node: &PlanNodeRef) -> OptResult<Option<PlanNodeRef>> {
        let Some((filter, input, join)) = filter_over_join(node) else {
            return Ok(None);
        };
        if !join.is_cartesian() {
            return Ok(None);
        }
        Ok(Some(PlanNode::binary(
            Join::theta(filter.predicate().clone()).into(),
            input.inputs()[0].clone(),
            input.inputs()[1].clone(),
        )))
    }

    fn rule_id(&self) -> RuleId {
        RuleId::FoldCartesianSelection
    }
}

/// σ(pred)(A ⋈(θ) B) becomes A ⋈(pred AND θ) B.
#[derive(Clone, Default)]
pub struct MergeSelectionIntoJoinRule {}

impl MergeSelectionIntoJoinRule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Rule for MergeSelectionIntoJoinRule {
    fn apply(&self, node: &PlanNodeRef) -> OptResult<Option<PlanNodeRef>> {
        let Some((filter, input, join)) = filter_over_join(node) else {
            return Ok(None);
        };
        if !join.is_theta() {
            return Ok(None);
        }
        Ok(Some(PlanNode::binary(
            join.with_merged_predicate(filter.predicate().clone()).into(),
            input.inputs()[0].clone(),
            input.inputs()[1].clone(),
        )))
    }

    fn rule_id(&self) -> RuleId {
        RuleId::MergeSelectionIntoJoin
    }
}

/// σ(c1 AND c2 AND ...)(E) becomes σ(c1)(σ(c2)(...(E))), first conjunct
/// outermost.
#[derive(Clone, Default)]
pub struct DecomposeConjunctiveSelectionRule {}

impl DecomposeConjunctiveSelectionRule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Rule for DecomposeConjunctiveSelectionRule {
    fn apply(&self, node: &PlanNodeRef) -> OptResult<Option<PlanNodeRef>> {
        let Some(filter) = node.operator().as_filter() else {
            return Ok(None);
        };
        let Some(input) = node.inputs().first() else {
            return Ok(None);
        };
        let Some(conjuncts) = filter.predicate().conjuncts() else {
            return Ok(None);
        };
        if conjuncts.len() < 2 {
            return Ok(None);
        }
        let mut current = input.clone();
        for conjunct in conjuncts.iter().rev() {
            current = PlanNode::unary(Filter::new(conjunct.clone()).into(), current);
        }
        Ok(Some(current))
    }

    fn rule_id(&self) -> RuleId {
        RuleId::DecomposeConjunctiveSelection
    }
}

/// Splits a conjunctive selection above a join into per-side selections,
/// keeping conjuncts that span both sides (or mention neither) above the
/// join.
#[derive(Clone, Default)]
pub struct SplitSelectionOverJoinRule {}

impl SplitSelectionOverJoinRule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Rule for SplitSelectionOverJoinRule {
    fn apply(&self, node: &PlanNodeRef) -> OptResult<Option<PlanNodeRef>> {
        let Some((filter, input, _join)) = filter_over_join(node) else {
            return Ok(None);
        };
        let Some(conjuncts) = filter.predicate().conjuncts() else {
            return Ok(None);
        };
        let left = &input.inputs()[0];
        let right = &input.inputs()[1];
        let left_tables = tables_under(left);
        let right_tables = tables_under(right);

        let mut lefts = Vec::new();
        let mut rights = Vec::new();
        let mut mixed = Vec::new();
        for conjunct in conjuncts {
            match side_of(conjunct, &left_tables, &right_tables) {
                Side::Left => lefts.push(conjunct.clone()),
                Side::Right => rights.push(conjunct.clone()),
                Side::Mixed => mixed.push(conjunct.clone()),
            }
        }
        if lefts.is_empty() && rights.is_empty() {
            return Ok(None);
        }

        let mut new_left = left.clone();
        if let Some(pred) = Predicate::and_all(lefts) {
            new_left = PlanNode::unary(Filter::new(pred).into(), new_left);
        }
        let mut new_right = right.clone();
        if let Some(pred) = Predicate::and_all(rights) {
            new_right = PlanNode::unary(Filter::new(pred).into(), new_right);
        }
        let new_join =
            PlanNode::binary(input.operator().clone(), new_left, new_right);

        Ok(Some(match Predicate::and_all(mixed) {
            Some(pred) => PlanNode::unary(Filter::new(pred).into(), new_join),
            None => new_join,
        }))
    }

    fn rule_id(&self) -> RuleId {
        RuleId::SplitSelectionOverJoin
    }
}

/// Pushes a single (non-conjunctive) selection below a join when every table
/// it mentions lives on exactly one side.
#[derive(Clone, Default)]
pub struct PushSelectionThroughJoinRule {}

impl PushSelectionThroughJoinRule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Rule for PushSelectionThroughJoinRule {
    fn apply(&self, node: &PlanNodeRef) -> OptResult<Option<PlanNodeRef>> {
        let Some((filter, input, _join)) = filter_over_join(node) else {
            return Ok(None);
        };
        if filter.predicate().conjuncts().is_some() {
            return Ok(None);
        }
        let left = &input.inputs()[0];
        let right = &input.inputs()[1];
        let side = side_of(
            filter.predicate(),
            &tables_under(left),
            &tables_under(right),
        );

        let filter_op = Filter::new(filter.predicate().clone());
        let (new_left, new_right) = match side {
            Side::Left => (PlanNode::unary(filter_op.into(), left.clone()), right.clone()),
            Side::Right => (left.clone(), PlanNode::unary(filter_op.into(), right.clone())),
            Side::Mixed => return Ok(None),
        };
        Ok(Some(PlanNode::binary(
            input.operator().clone(),
            new_left,
            new_right,
        )))
    }

    fn rule_id(&self) -> RuleId {
        RuleId::PushSelectionThroughJoin
    }
}

/// σ1(σ2(E)) becomes σ2(σ1(E)).
#[derive(Clone, Default)]
pub struct CommuteSelectionsRule {}

impl CommuteSelectionsRule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Rule for CommuteSelectionsRule {
    fn apply(&self, node: &PlanNodeRef) -> OptResult<Option<PlanNodeRef>> {
        let Some(outer) = node.operator().as_filter() else {
            return Ok(None);
        };
        let Some(input) = node.inputs().first() else {
            return Ok(None);
        };
        let Some(inner) = input.operator().as_filter() else {
            return Ok(None);
        };
        let Some(grandchild) = input.inputs().first() else {
            return Ok(None);
        };
        Ok(Some(PlanNode::unary(
            Filter::new(inner.predicate().clone()).into(),
            PlanNode::unary(
                Filter::new(outer.predicate().clone()).into(),
                grandchild.clone(),
            ),
        )))
    }

    fn rule_id(&self) -> RuleId {
        RuleId::CommuteSelections
    }
}

enum Side {
    Left,
    Right,
    Mixed,
}

/// Which join side owns every table the predicate mentions. Predicates that
/// mention no table, both sides, or unknown tables count as mixed.
fn side_of(pred: &Predicate, left: &HashSet<String>, right: &HashSet<String>) -> Side {
    let tables = pred.tables();
    if tables.is_empty() {
        return Side::Mixed;
    }
    let all_left = tables.iter().all(|t| left.contains(*t));
    let all_right = tables.iter().all(|t| right.contains(*t));
    match (all_left, all_right) {
        (true, false) => Side::Left,
        (false, true) => Side::Right,
        _ => Side::Mixed,
    }
}
