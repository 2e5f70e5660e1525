//! Heuristic rewrite driver.
//!
//! Applies a batch of rewrite rules to a plan until some condition is met:
//! a fixed point (the sweep changed nothing), a repeated structural signature
//! (the catalog contains rules that cycle, e.g. selection commutation), or
//! the iteration cap. The approach is the classic HEP driver popularized by
//! [apache calcite](https://github.com/apache/calcite)'s HepPlanner, reduced
//! to bottom-up matching over an immutable tree.

use std::collections::HashSet;
use std::sync::Arc;

use enumset::EnumSet;
use log::{debug, trace};
use smallvec::SmallVec;

use crate::error::OptResult;
use crate::plan::{node_signature, Plan, PlanNode, PlanNodeRef};
use crate::rules::{default_rules, Rule, RuleId, RuleImpl};

/// Default sweep cap. High enough that realistic plans reach a fixed point or
/// a signature repeat long before hitting it.
pub const DEFAULT_MAX_ITER_TIMES: usize = 80;

pub struct HepOptimizer {
    max_iter_times: usize,
    rules: Vec<RuleImpl>,
    disabled: EnumSet<RuleId>,
}

impl Default for HepOptimizer {
    fn default() -> Self {
        Self {
            max_iter_times: DEFAULT_MAX_ITER_TIMES,
            rules: default_rules().to_vec(),
            disabled: EnumSet::empty(),
        }
    }
}

impl HepOptimizer {
    pub fn new(max_iter_times: usize, rules: Vec<RuleImpl>) -> Self {
        Self {
            max_iter_times,
            rules,
            disabled: EnumSet::empty(),
        }
    }

    /// Keep the catalog but skip the given rules.
    pub fn with_disabled(mut self, disabled: EnumSet<RuleId>) -> Self {
        self.disabled = disabled;
        self
    }

    /// Rewrite `plan` to a fixed point. The input is untouched; the result
    /// shares unchanged subtrees with it.
    pub fn optimize(&self, plan: &Plan) -> OptResult<Plan> {
        let mut root = plan.root();
        let mut seen_signatures = HashSet::new();

        for iteration in 0..self.max_iter_times {
            if !seen_signatures.insert(node_signature(&root)) {
                debug!("signature repeated after {iteration} sweeps, stopping");
                break;
            }
            let next = self.rewrite_node(&root)?;
            if Arc::ptr_eq(&next, &root) {
                debug!("fixed point after {iteration} sweeps");
                break;
            }
            root = next;
        }
        Ok(Plan::new(root))
    }

    /// Bottom-up sweep: children first, then the first matching rule rewrites
    /// this node. At most one rule fires per node per sweep.
    fn rewrite_node(&self, node: &PlanNodeRef) -> OptResult<PlanNodeRef> {
        let mut new_inputs = SmallVec::<[PlanNodeRef; 2]>::new();
        let mut changed = false;
        for input in node.inputs() {
            let rewritten = self.rewrite_node(input)?;
            if !Arc::ptr_eq(&rewritten, input) {
                changed = true;
            }
            new_inputs.push(rewritten);
        }
        let current = if changed {
            Arc::new(PlanNode::new(node.operator().clone(), new_inputs))
        } else {
            node.clone()
        };

        for rule in &self.rules {
            if self.disabled.contains(rule.rule_id()) {
                continue;
            }
            if let Some(replacement) = rule.apply(&current)? {
                trace!("rule {rule:?} fired on {}", current.operator());
                return Ok(replacement);
            }
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Predicate;
    use crate::operator::JoinSpec;
    use crate::plan::PlanBuilder;

    fn optimize(plan: &Plan) -> Plan {
        HepOptimizer::default().optimize(plan).unwrap()
    }

    #[test]
    fn test_selection_merges_into_theta_join() {
        let plan = PlanBuilder::scan("a")
            .join(
                JoinSpec::Theta(Predicate::parse("a.id = b.id").unwrap()),
                PlanBuilder::scan("b"),
            )
            .filter(Predicate::parse("a.x = 1").unwrap())
            .build();
        let optimized = optimize(&plan);
        let root = optimized.root();
        let join = root.operator().as_join().unwrap();
        let shown = format!("{}", join.predicate().unwrap());
        assert!(shown.contains("a.x = 1"));
        assert!(shown.contains("a.id = b.id"));
    }

    #[test]
    fn test_cartesian_folds_into_theta_join() {
        let plan = PlanBuilder::scan("a")
            .join(JoinSpec::Cartesian, PlanBuilder::scan("b"))
            .filter(Predicate::parse("a.id = b.id").unwrap())
            .build();
        let optimized = optimize(&plan);
        let root = optimized.root();
        let join = root.operator().as_join().unwrap();
        assert!(join.is_theta());
    }

    #[test]
    fn test_natural_join_pushdown_reaches_both_sides() {
        let plan = PlanBuilder::scan("a")
            .join(JoinSpec::Natural, PlanBuilder::scan("b"))
            .filter(Predicate::parse("a.x = 1 AND b.y = 2").unwrap())
            .build();
        let optimized = optimize(&plan);
        let root = optimized.root();
        let join_node = root;
        assert!(join_node.operator().as_join().is_some());
        for side in join_node.inputs() {
            let filter = side.operator().as_filter().unwrap();
            assert!(side.inputs()[0].operator().as_scan().is_some());
            let shown = format!("{}", filter.predicate());
            assert!(shown == "a.x = 1" || shown == "b.y = 2");
        }
    }

    #[test]
    fn test_tables_preserved() {
        let plan = PlanBuilder::scan("c")
            .join(JoinSpec::Natural, PlanBuilder::scan("a"))
            .join(JoinSpec::Natural, PlanBuilder::scan("b"))
            .filter(Predicate::parse("a.x = 1").unwrap())
            .build();
        let optimized = optimize(&plan);
        let mut before = plan.tables();
        let mut after = optimized.tables();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn test_cycling_rules_terminate() {
        // Two stacked selections commute forever; the signature guard stops
        // the loop.
        let plan = PlanBuilder::scan("a")
            .filter(Predicate::parse("a.x = 1").unwrap())
            .filter(Predicate::parse("a.y = 2").unwrap())
            .build();
        let optimized = optimize(&plan);
        assert_eq!(optimized.bfs_iterator().count(), 3);
    }

    #[test]
    fn test_optimize_is_idempotent() {
        let plan = PlanBuilder::scan("a")
            .join(JoinSpec::Natural, PlanBuilder::scan("b"))
            .filter(Predicate::parse("a.x = 1 AND b.y = 2").unwrap())
            .build();
        let once = optimize(&plan);
        let twice = optimize(&once);
        assert_eq!(once.signature(), twice.signature());
    }

    #[test]
    fn test_disabled_rules_are_skipped() {
        let plan = PlanBuilder::scan("a")
            .join(JoinSpec::Cartesian, PlanBuilder::scan("b"))
            .filter(Predicate::parse("a.id = b.id").unwrap())
            .build();
        let optimizer = HepOptimizer::default()
            .with_disabled(EnumSet::only(RuleId::FoldCartesianSelection));
        let optimized = optimizer.optimize(&plan).unwrap();
        let root = optimized.root();
        // Folding disabled: the selection stays above the cartesian join.
        assert!(root.operator().as_filter().is_some());
    }
}
