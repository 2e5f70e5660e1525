//! Top-level optimization entry points.

use std::sync::Arc;

use crate::error::OptResult;
use crate::heuristic::HepOptimizer;
use crate::join_order::JoinOrderPlanner;
use crate::plan::Plan;
use crate::stat::{MemoryStatisticsProvider, StatisticsProvider};

/// Shared state an optimization run needs. The statistics provider is
/// injected here instead of living in a global, so independent runs can carry
/// independent catalogs.
#[derive(Clone)]
pub struct OptimizerContext {
    stats: Arc<dyn StatisticsProvider + Send + Sync>,
}

impl OptimizerContext {
    pub fn new(stats: Arc<dyn StatisticsProvider + Send + Sync>) -> Self {
        Self { stats }
    }

    pub fn stats(&self) -> &dyn StatisticsProvider {
        self.stats.as_ref()
    }
}

impl Default for OptimizerContext {
    fn default() -> Self {
        Self::new(Arc::new(MemoryStatisticsProvider::new()))
    }
}

/// Optimize a plan: rewrite to a fixed point, then search join orders. The
/// input plan is never mutated.
pub fn optimize(plan: &Plan, context: &OptimizerContext) -> OptResult<Plan> {
    let rewritten = HepOptimizer::default().optimize(plan)?;
    JoinOrderPlanner::default().reorder(&rewritten, context.stats())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Predicate;
    use crate::operator::JoinSpec;
    use crate::plan::PlanBuilder;

    #[test]
    fn test_optimize_runs_both_stages() {
        let context = OptimizerContext::default();
        let plan = PlanBuilder::scan("a")
            .join(JoinSpec::Cartesian, PlanBuilder::scan("b"))
            .filter(Predicate::parse("a.id = b.id").unwrap())
            .build();
        let optimized = optimize(&plan, &context).unwrap();
        let root = optimized.root();
        let join = root.operator().as_join().unwrap();
        assert!(join.is_theta());
        // Input untouched.
        assert!(plan.root().operator().as_filter().is_some());
    }
}
