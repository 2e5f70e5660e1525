//! Projection rewrites: pushdown below joins and collapse of redundant
//! projection chains.

use std::collections::HashSet;

use crate::error::OptResult;
use crate::expr::ColumnRef;
use crate::operator::Projection;
use crate::plan::{tables_under, PlanNode, PlanNodeRef};
use crate::rules::{Rule, RuleId};

fn projection_over_join(
    node: &PlanNodeRef,
) -> Option<(&Projection, &PlanNodeRef, &crate::operator::Join)> {
    let projection = node.operator().as_projection()?;
    let input = node.inputs().first()?;
    let join = input.operator().as_join()?;
    if input.inputs().len() != 2 {
        return None;
    }
    Some((projection, input, join))
}

fn columns_on_side(columns: &[ColumnRef], side: &HashSet<String>) -> Vec<ColumnRef> {
    columns
        .iter()
        .filter(|c| c.table.as_deref().is_some_and(|t| side.contains(t)))
        .cloned()
        .collect()
}

/// Wrap `child` in a projection of `columns`, unless it already is exactly
/// that projection. The guard is what makes repeated sweeps converge.
fn wrap_projection(child: &PlanNodeRef, columns: &[ColumnRef]) -> Option<PlanNodeRef> {
    if let Some(existing) = child.operator().as_projection() {
        if existing.columns() == columns {
            return None;
        }
    }
    Some(PlanNode::unary(
        Projection::new(columns.iter().cloned()).into(),
        child.clone(),
    ))
}

/// Pushes a projection below a natural or cartesian join when the requested
/// columns split across both sides. The outer projection is dropped only when
/// every requested column is covered by a projected side.
#[derive(Clone, Default)]
pub struct PushProjectionThroughJoinRule {}

impl PushProjectionThroughJoinRule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Rule for PushProjectionThroughJoinRule {
    fn apply(&self, node: &PlanNodeRef) -> OptResult<Option<PlanNodeRef>> {
        let Some((projection, input, join)) = projection_over_join(node) else {
            return Ok(None);
        };
        if join.is_theta() {
            return Ok(None);
        }
        let left = &input.inputs()[0];
        let right = &input.inputs()[1];
        let left_columns = columns_on_side(projection.columns(), &tables_under(left));
        let right_columns = columns_on_side(projection.columns(), &tables_under(right));
        if left_columns.is_empty() || right_columns.is_empty() {
            return Ok(None);
        }

        let new_left = wrap_projection(left, &left_columns);
        let new_right = wrap_projection(right, &right_columns);
        if new_left.is_none() && new_right.is_none() {
            return Ok(None);
        }
        let new_join = PlanNode::binary(
            input.operator().clone(),
            new_left.unwrap_or_else(|| left.clone()),
            new_right.unwrap_or_else(|| right.clone()),
        );

        let covered =
            left_columns.len() + right_columns.len() == projection.columns().len();
        Ok(Some(if covered {
            new_join
        } else {
            PlanNode::unary(
                Projection::new(projection.columns().iter().cloned()).into(),
                new_join,
            )
        }))
    }

    fn rule_id(&self) -> RuleId {
        RuleId::PushProjectionThroughJoin
    }
}

/// Pushes a projection below a theta join, extending each side's column list
/// with the join attributes it owes the predicate. The outer projection stays
/// so the final column list is unchanged.
#[derive(Clone, Default)]
pub struct PushProjectionWithJoinAttrsRule {}

impl PushProjectionWithJoinAttrsRule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Rule for PushProjectionWithJoinAttrsRule {
    fn apply(&self, node: &PlanNodeRef) -> OptResult<Option<PlanNodeRef>> {
        let Some((projection, input, join)) = projection_over_join(node) else {
            return Ok(None);
        };
        let Some(predicate) = join.predicate() else {
            return Ok(None);
        };
        let left = &input.inputs()[0];
        let right = &input.inputs()[1];
        let left_tables = tables_under(left);
        let right_tables = tables_under(right);

        let desired = |side: &HashSet<String>| {
            let mut columns = columns_on_side(projection.columns(), side);
            for attr in predicate.attributes() {
                let owned = attr.table.as_deref().is_some_and(|t| side.contains(t));
                if owned && !columns.contains(attr) {
                    columns.push(attr.clone());
                }
            }
            columns
        };
        let left_columns = desired(&left_tables);
        let right_columns = desired(&right_tables);
        if left_columns.is_empty() && right_columns.is_empty() {
            return Ok(None);
        }

        let new_left = if left_columns.is_empty() {
            None
        } else {
            wrap_projection(left, &left_columns)
        };
        let new_right = if right_columns.is_empty() {
            None
        } else {
            wrap_projection(right, &right_columns)
        };
        if new_left.is_none() && new_right.is_none() {
            return Ok(None);
        }

        let new_join = PlanNode::binary(
            input.operator().clone(),
            new_left.unwrap_or_else(|| left.clone()),
            new_right.unwrap_or_else(|| right.clone()),
        );
        Ok(Some(PlanNode::unary(
            Projection::new(projection.columns().iter().cloned()).into(),
            new_join,
        )))
    }

    fn rule_id(&self) -> RuleId {
        RuleId::PushProjectionWithJoinAttrs
    }
}

/// π_a(π_b(...π_z(E))) becomes π_a(E). The outermost list decides the output,
/// inner lists built by pushdown are supersets of it.
#[derive(Clone, Default)]
pub struct EliminateRedundantProjectionsRule {}

impl EliminateRedundantProjectionsRule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Rule for EliminateRedundantProjectionsRule {
    fn apply(&self, node: &PlanNodeRef) -> OptResult<Option<PlanNodeRef>> {
        if node.operator().as_projection().is_none() {
            return Ok(None);
        }
        let Some(input) = node.inputs().first() else {
            return Ok(None);
        };
        if input.operator().as_projection().is_none() {
            return Ok(None);
        }

        let mut innermost = input;
        while innermost.operator().as_projection().is_some() {
            match innermost.inputs().first() {
                Some(next) => innermost = next,
                None => return Ok(None),
            }
        }
        Ok(Some(PlanNode::unary(
            node.operator().clone(),
            innermost.clone(),
        )))
    }

    fn rule_id(&self) -> RuleId {
        RuleId::EliminateRedundantProjections
    }
}
