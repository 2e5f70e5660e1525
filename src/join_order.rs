//! Bounded join order enumeration.
//!
//! After rule rewriting, the join region of a plan is a tree of joins over
//! single-table units (a scan, possibly under pushed-down filters and
//! projections). This pass samples a bounded number of left-deep orderings of
//! those units, reattaches every join conjunct to the first join that sees
//! all its tables, scores each candidate with the cost model and keeps the
//! cheapest. The original plan is the baseline, so reordering never makes a
//! plan more expensive.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::debug;

use crate::cost::CostModel;
use crate::error::OptResult;
use crate::expr::Predicate;
use crate::operator::{Join, JoinSpec};
use crate::plan::{tables_under, Plan, PlanNode, PlanNodeRef};
use crate::stat::StatisticsProvider;

/// Default cap on sampled orderings. Permutations grow factorially; past a
/// handful of tables exhaustive enumeration stops paying for itself.
pub const DEFAULT_MAX_ORDERINGS: usize = 8;

pub struct JoinOrderPlanner {
    max_orderings: usize,
}

impl Default for JoinOrderPlanner {
    fn default() -> Self {
        Self {
            max_orderings: DEFAULT_MAX_ORDERINGS,
        }
    }
}

impl JoinOrderPlanner {
    pub fn new(max_orderings: usize) -> Self {
        Self { max_orderings }
    }

    /// Search for a cheaper join order. Returns the input plan unchanged when
    /// it has no join region this pass understands (fewer than two tables,
    /// multi-table units, duplicate binding names, or a natural join whose
    /// implicit predicate a rebuilt tree would lose).
    pub fn reorder(
        &self,
        plan: &Plan,
        provider: &dyn StatisticsProvider,
    ) -> OptResult<Plan> {
        let root = plan.root();
        let Some(join_root) = topmost_join(&root) else {
            return Ok(plan.clone());
        };

        let mut units = Vec::new();
        collect_units(&join_root, &mut units);
        if units.len() < 2 {
            return Ok(plan.clone());
        }

        // Every unit must cover exactly one binding name, each name one unit.
        let mut unit_by_name: HashMap<String, PlanNodeRef> = HashMap::new();
        let mut names = Vec::new();
        for unit in &units {
            let tables = tables_under(unit);
            if tables.len() != 1 {
                return Ok(plan.clone());
            }
            let name = tables.into_iter().next().unwrap_or_default();
            if unit_by_name.insert(name.clone(), unit.clone()).is_some() {
                return Ok(plan.clone());
            }
            names.push(name);
        }

        let Some(pool) = collect_predicates(&join_root) else {
            return Ok(plan.clone());
        };
        let model = CostModel::new(provider);

        let mut best_plan = plan.clone();
        let mut best_cost = model.estimate(plan)?.cost;
        debug!("join order baseline cost {best_cost:?}");

        for ordering in permutations_capped(&names, self.max_orderings) {
            let Some(candidate_join) = build_left_deep(&ordering, &unit_by_name, &pool)
            else {
                continue;
            };
            let candidate_root = replace_subtree(&root, &join_root, candidate_join);
            let candidate = Plan::new(candidate_root);
            let cost = model.estimate(&candidate)?.cost;
            debug!("join order {ordering:?} costs {cost:?}");
            if cost < best_cost {
                best_cost = cost;
                best_plan = candidate;
            }
        }
        Ok(best_plan)
    }
}

/// Descend through the unary chain above the FROM subtree to the topmost
/// join, if any.
fn topmost_join(root: &PlanNodeRef) -> Option<PlanNodeRef> {
    let mut node = root.clone();
    loop {
        if node.operator().as_join().is_some() {
            return Some(node);
        }
        match node.inputs() {
            [input] => node = input.clone(),
            _ => return None,
        }
    }
}

/// Non-join subtrees hanging off the join region, left to right.
fn collect_units(node: &PlanNodeRef, units: &mut Vec<PlanNodeRef>) {
    if node.operator().as_join().is_some() && node.inputs().len() == 2 {
        for input in node.inputs() {
            collect_units(input, units);
        }
    } else {
        units.push(node.clone());
    }
}

/// A join conjunct waiting to be reattached, with the binding names it needs
/// in scope.
struct RegionPredicate {
    predicate: Predicate,
    tables: HashSet<String>,
}

/// Split every theta predicate of the join region into its distinct
/// conjuncts. Returns `None` when the region contains a natural join, whose
/// implicit equality this pass cannot reattach.
fn collect_predicates(join_root: &PlanNodeRef) -> Option<Vec<RegionPredicate>> {
    let mut pool: Vec<RegionPredicate> = Vec::new();
    let mut stack = vec![join_root.clone()];
    while let Some(node) = stack.pop() {
        let Some(join) = node.operator().as_join() else {
            continue;
        };
        if join.is_natural() {
            return None;
        }
        if let Some(predicate) = join.predicate() {
            let parts: Vec<Predicate> = match predicate.conjuncts() {
                Some(parts) => parts.to_vec(),
                None => vec![predicate.clone()],
            };
            for part in parts {
                if pool.iter().any(|r| r.predicate == part) {
                    continue;
                }
                let tables = part.tables().into_iter().map(str::to_string).collect();
                pool.push(RegionPredicate {
                    predicate: part,
                    tables,
                });
            }
        }
        stack.extend(node.inputs().iter().cloned());
    }
    Some(pool)
}

/// Left-deep tree over `ordering`. Each pooled conjunct attaches to the first
/// join that has all its tables in scope; joins left with nothing to attach
/// fall back to a cartesian join. Returns `None` when some conjunct never
/// finds a home.
fn build_left_deep(
    ordering: &[String],
    unit_by_name: &HashMap<String, PlanNodeRef>,
    pool: &[RegionPredicate],
) -> Option<PlanNodeRef> {
    let mut iter = ordering.iter();
    let first_name = iter.next()?;
    let mut accumulated = unit_by_name.get(first_name)?.clone();
    let mut placed: HashSet<&str> = HashSet::from([first_name.as_str()]);
    let mut attached = vec![false; pool.len()];

    for name in iter {
        let unit = unit_by_name.get(name)?;
        placed.insert(name.as_str());
        let mut predicates: Vec<Predicate> = Vec::new();
        for (i, region) in pool.iter().enumerate() {
            if attached[i] {
                continue;
            }
            if region.tables.iter().all(|t| placed.contains(t.as_str())) {
                attached[i] = true;
                predicates.push(region.predicate.clone());
            }
        }
        let spec = match Predicate::and_all(predicates) {
            Some(predicate) => JoinSpec::Theta(predicate),
            None => JoinSpec::Cartesian,
        };
        accumulated = PlanNode::binary(Join::new(spec).into(), accumulated, unit.clone());
    }
    attached.into_iter().all(|a| a).then_some(accumulated)
}

/// Rebuild the unary chain above `target`, splicing in `replacement`.
fn replace_subtree(
    node: &PlanNodeRef,
    target: &PlanNodeRef,
    replacement: PlanNodeRef,
) -> PlanNodeRef {
    if Arc::ptr_eq(node, target) {
        return replacement;
    }
    let new_inputs: Vec<PlanNodeRef> = node
        .inputs()
        .iter()
        .map(|input| replace_subtree(input, target, replacement.clone()))
        .collect();
    Arc::new(PlanNode::new(node.operator().clone(), new_inputs))
}

/// At most `cap` permutations in backtracking order, the identity first.
fn permutations_capped(items: &[String], cap: usize) -> Vec<Vec<String>> {
    let mut results = Vec::new();
    let mut current = Vec::with_capacity(items.len());
    let mut used = vec![false; items.len()];
    backtrack(items, cap, &mut used, &mut current, &mut results);
    results
}

fn backtrack(
    items: &[String],
    cap: usize,
    used: &mut [bool],
    current: &mut Vec<String>,
    results: &mut Vec<Vec<String>>,
) {
    if results.len() >= cap {
        return;
    }
    if current.len() == items.len() {
        results.push(current.clone());
        return;
    }
    for i in 0..items.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        current.push(items[i].clone());
        backtrack(items, cap, used, current, results);
        current.pop();
        used[i] = false;
    }
}
