//! Selectivity estimation for filter predicates.

use std::collections::HashMap;

use crate::cost::CostModel;
use crate::error::{OptResult, OptimizerError};
use crate::expr::{CompareOp, Condition, LogicalOp, Predicate};

impl CostModel<'_> {
    /// Fraction of input rows expected to satisfy `predicate`, given the
    /// distinct counts known for the input. Always in `(0, 1]`.
    pub(crate) fn selectivity(
        &self,
        predicate: &Predicate,
        distinct_values: &HashMap<String, u64>,
    ) -> OptResult<f64> {
        match predicate {
            Predicate::Comparison(condition) => {
                Ok(self.condition_selectivity(condition, distinct_values))
            }
            Predicate::Logical(logical) => {
                if logical.children.len() < 2 {
                    return Err(OptimizerError::DegenerateLogicalExpr.into());
                }
                let mut child_selectivities = Vec::with_capacity(logical.children.len());
                for child in &logical.children {
                    child_selectivities.push(self.selectivity(child, distinct_values)?);
                }
                Ok(match logical.op {
                    LogicalOp::And => child_selectivities.into_iter().product(),
                    LogicalOp::Or => {
                        1.0 - child_selectivities
                            .into_iter()
                            .map(|s| 1.0 - s)
                            .product::<f64>()
                    }
                })
            }
        }
    }

    fn condition_selectivity(
        &self,
        condition: &Condition,
        distinct_values: &HashMap<String, u64>,
    ) -> f64 {
        let config = self.config();
        let distinct = distinct_values
            .get(&condition.attr.column)
            .copied()
            .filter(|v| *v > 0);
        match condition.op {
            CompareOp::Eq => distinct
                .map(|v| 1.0 / v as f64)
                .unwrap_or(config.equality_fallback),
            CompareOp::NotEq => distinct
                .map(|v| 1.0 - 1.0 / v as f64)
                .unwrap_or(config.inequality_fallback),
            CompareOp::Gt | CompareOp::GtEq | CompareOp::Lt | CompareOp::LtEq => {
                config.range_selectivity
            }
            CompareOp::Like => config.like_selectivity,
            CompareOp::In => distinct
                .map(|v| (config.in_list_size as f64 / v as f64).min(1.0))
                .unwrap_or(config.in_fallback),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stat::MemoryStatisticsProvider;
    use maplit::hashmap;

    fn model_fixture() -> MemoryStatisticsProvider {
        MemoryStatisticsProvider::new()
    }

    fn estimate(predicate: &str, distinct: HashMap<String, u64>) -> f64 {
        let provider = model_fixture();
        let model = CostModel::new(&provider);
        model
            .selectivity(&Predicate::parse(predicate).unwrap(), &distinct)
            .unwrap()
    }

    #[test]
    fn test_equality_selectivity() {
        let distinct = hashmap! {"genre".to_string() => 50};
        assert_eq!(estimate("genre = 'drama'", distinct), 1.0 / 50.0);
        assert_eq!(estimate("genre = 'drama'", HashMap::new()), 0.1);
    }

    #[test]
    fn test_inequality_and_range() {
        let distinct = hashmap! {"stars".to_string() => 5};
        assert_eq!(estimate("stars <> 3", distinct.clone()), 1.0 - 0.2);
        assert_eq!(estimate("stars <> 3", HashMap::new()), 0.9);
        assert_eq!(estimate("stars > 3", distinct), 0.5);
    }

    #[test]
    fn test_like_and_in() {
        assert_eq!(estimate("name LIKE 'Mar%'", HashMap::new()), 0.2);
        let distinct = hashmap! {"grade".to_string() => 4};
        // IN caps at 1: assumed 5 list elements over 4 distinct values.
        assert_eq!(estimate("grade IN ('A', 'B')", distinct), 1.0);
        let distinct = hashmap! {"grade".to_string() => 50};
        assert_eq!(estimate("grade IN ('A', 'B')", distinct), 5.0 / 50.0);
    }

    #[test]
    fn test_and_multiplies_or_complements() {
        let distinct = hashmap! {"a".to_string() => 10, "b".to_string() => 10};
        let and = estimate("a = 1 AND b = 2", distinct.clone());
        assert!((and - 0.01).abs() < 1e-12);
        let or = estimate("a = 1 OR b = 2", distinct);
        assert!((or - (1.0 - 0.9 * 0.9)).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_logical_expr_is_hard_error() {
        use crate::expr::LogicalExpr;
        let provider = model_fixture();
        let model = CostModel::new(&provider);
        let degenerate = Predicate::Logical(LogicalExpr {
            op: LogicalOp::And,
            children: vec![Predicate::parse("a = 1").unwrap()],
        });
        assert!(model.selectivity(&degenerate, &HashMap::new()).is_err());
    }
}
