//! Block I/O cost model.
//!
//! Estimates the transfer cost of a plan in block reads/writes, the classic
//! textbook model: scans pay their block count, joins pick a method from the
//! index metadata available on the join attributes, sorts pay external merge
//! passes past the buffer budget. Estimation is bottom-up and memoized per
//! top-level call, keyed by node identity.

mod selectivity;

use std::collections::HashMap;

use derive_more::{Add, AddAssign, Sub, SubAssign, Sum};
use log::trace;
use prettytable::Table;

use crate::error::OptResult;
use crate::operator::{GroupBy, Join, Limit, Operator, Projection, Sort, TableScan};
use crate::plan::{Plan, PlanNodeRef};
use crate::stat::{Index, Statistics, StatisticsProvider};

pub const INF: Cost = Cost(f64::INFINITY);

#[derive(
    Copy, Clone, Debug, PartialOrd, PartialEq, Add, Sub, Sum, AddAssign, SubAssign,
)]
pub struct Cost(f64);

impl From<f64> for Cost {
    fn from(c: f64) -> Self {
        Cost(c)
    }
}

impl Cost {
    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Tunable constants of the cost model. The selectivity numbers are the usual
/// placeholders used when no histogram data exists.
#[derive(Clone, Debug)]
pub struct CostConfig {
    /// Buffer blocks available to sorting.
    pub memory_buffer_blocks: u64,
    /// Assumed element count of an `IN` list.
    pub in_list_size: u64,
    pub range_selectivity: f64,
    pub like_selectivity: f64,
    /// Equality selectivity when distinct counts are unknown.
    pub equality_fallback: f64,
    pub inequality_fallback: f64,
    pub in_fallback: f64,
    /// Join selectivity when neither side carries distinct counts.
    pub join_fallback_selectivity: f64,
    /// Distinct count assumed for a side with no distinct data during join
    /// cardinality estimation.
    pub default_distinct: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            memory_buffer_blocks: 100,
            in_list_size: 5,
            range_selectivity: 0.5,
            like_selectivity: 0.2,
            equality_fallback: 0.1,
            inequality_fallback: 0.9,
            in_fallback: 0.15,
            join_fallback_selectivity: 0.1,
            default_distinct: 100.0,
        }
    }
}

/// Estimate of one subtree: accumulated cost plus the derived statistics the
/// parent needs to keep estimating.
#[derive(Clone, Debug, PartialEq)]
pub struct CostEstimate {
    pub cost: Cost,
    pub row_count: u64,
    pub block_count: u64,
    pub blocking_factor: u64,
    pub distinct_values: HashMap<String, u64>,
    pub indexes: HashMap<String, Index>,
}

impl CostEstimate {
    /// Zero-cost record for operators that produce no relational output.
    fn neutral() -> Self {
        Self {
            cost: Cost(0.0),
            row_count: 0,
            block_count: 0,
            blocking_factor: 1,
            distinct_values: HashMap::new(),
            indexes: HashMap::new(),
        }
    }

    fn from_statistics(stats: Statistics) -> Self {
        Self {
            cost: Cost(stats.block_count as f64),
            row_count: stats.row_count,
            block_count: stats.block_count,
            blocking_factor: stats.blocking_factor.max(1),
            distinct_values: stats.distinct_values,
            indexes: stats.indexes,
        }
    }
}

/// Join algorithm picked from the index metadata of the join attributes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum JoinMethod {
    Hash,
    IndexNestedLoopBTree,
    IndexNestedLoopHash,
    NestedLoop,
}

pub struct CostModel<'a> {
    provider: &'a dyn StatisticsProvider,
    config: CostConfig,
}

impl<'a> CostModel<'a> {
    pub fn new(provider: &'a dyn StatisticsProvider) -> Self {
        Self {
            provider,
            config: CostConfig::default(),
        }
    }

    pub fn with_config(provider: &'a dyn StatisticsProvider, config: CostConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &CostConfig {
        &self.config
    }

    /// Estimate the whole plan. The memo cache lives for this call only, so
    /// estimates never leak across differently-shaped trees.
    pub fn estimate(&self, plan: &Plan) -> OptResult<CostEstimate> {
        let mut cache = HashMap::new();
        self.compute(&plan.root(), &mut cache)
    }

    fn compute(
        &self,
        node: &PlanNodeRef,
        cache: &mut HashMap<usize, CostEstimate>,
    ) -> OptResult<CostEstimate> {
        let key = PlanNodeRef::as_ptr(node) as usize;
        if let Some(hit) = cache.get(&key) {
            return Ok(hit.clone());
        }

        let estimate = match node.operator() {
            Operator::Scan(scan) => self.scan_estimate(scan),
            Operator::Filter(filter) => match node.inputs().first() {
                Some(input) => {
                    let input = self.compute(input, cache)?;
                    self.filter_estimate(filter, input)?
                }
                None => CostEstimate::neutral(),
            },
            Operator::Projection(projection) => match node.inputs().first() {
                Some(input) => {
                    let input = self.compute(input, cache)?;
                    self.projection_estimate(projection, input)
                }
                None => CostEstimate::neutral(),
            },
            Operator::Join(join) => match node.inputs() {
                [left, right] => {
                    let left = self.compute(left, cache)?;
                    let right = self.compute(right, cache)?;
                    self.join_estimate(join, left, right)
                }
                _ => CostEstimate::neutral(),
            },
            Operator::Sort(sort) => match node.inputs().first() {
                Some(input) => {
                    let input = self.compute(input, cache)?;
                    self.sort_estimate(sort, input)
                }
                None => CostEstimate::neutral(),
            },
            Operator::GroupBy(group_by) => match node.inputs().first() {
                Some(input) => {
                    let input = self.compute(input, cache)?;
                    self.group_estimate(group_by, input)
                }
                None => CostEstimate::neutral(),
            },
            Operator::Limit(limit) => match node.inputs().first() {
                Some(input) => {
                    let input = self.compute(input, cache)?;
                    self.limit_estimate(limit, input)
                }
                None => CostEstimate::neutral(),
            },
            // DML wraps a SELECT-shaped subtree whose cost carries over.
            Operator::Update(_) | Operator::Delete(_) => match node.inputs().first() {
                Some(input) => self.compute(input, cache)?,
                None => CostEstimate::neutral(),
            },
            Operator::Insert(_)
            | Operator::CreateTable(_)
            | Operator::DropTable(_)
            | Operator::Transaction(_) => CostEstimate::neutral(),
        };

        cache.insert(key, estimate.clone());
        Ok(estimate)
    }

    fn scan_estimate(&self, scan: &TableScan) -> CostEstimate {
        CostEstimate::from_statistics(self.provider.lookup(scan.table_name()))
    }

    fn filter_estimate(
        &self,
        filter: &crate::operator::Filter,
        input: CostEstimate,
    ) -> OptResult<CostEstimate> {
        let selectivity =
            self.selectivity(filter.predicate(), &input.distinct_values)?;
        let row_count = ((input.row_count as f64 * selectivity).round() as u64).max(1);
        let block_count = blocks_for(row_count, input.blocking_factor, input.block_count);
        let distinct_values = narrow_distinct(input.distinct_values, row_count);
        Ok(CostEstimate {
            cost: input.cost,
            row_count,
            block_count,
            blocking_factor: input.blocking_factor,
            distinct_values,
            // Selection output is not the indexed base relation anymore.
            indexes: HashMap::new(),
        })
    }

    fn projection_estimate(
        &self,
        projection: &Projection,
        input: CostEstimate,
    ) -> CostEstimate {
        let kept: Vec<&str> = projection
            .columns()
            .iter()
            .map(|c| c.column.as_str())
            .collect();
        let distinct_values = input
            .distinct_values
            .into_iter()
            .filter(|(name, _)| kept.contains(&name.as_str()))
            .collect();
        CostEstimate {
            distinct_values,
            indexes: HashMap::new(),
            ..input
        }
    }

    fn join_estimate(
        &self,
        join: &Join,
        left: CostEstimate,
        right: CostEstimate,
    ) -> CostEstimate {
        let (method, io) = self.join_method(join, &left, &right);
        trace!("join method {method:?}, transfer {io}");

        let rl = left.row_count as f64;
        let rr = right.row_count as f64;
        let row_count = if left.distinct_values.is_empty()
            && right.distinct_values.is_empty()
        {
            (rl * rr * self.config.join_fallback_selectivity).round() as u64
        } else {
            let avg = |values: &HashMap<String, u64>| {
                if values.is_empty() {
                    self.config.default_distinct
                } else {
                    values.values().sum::<u64>() as f64 / values.len() as f64
                }
            };
            let denominator = avg(&left.distinct_values)
                .max(avg(&right.distinct_values))
                .max(1.0);
            (rl * rr / denominator).round() as u64
        }
        .max(1);

        let blocking_factor =
            ((left.blocking_factor + right.blocking_factor) / 2).max(1);
        let block_count = blocks_for(row_count, blocking_factor, 0);

        let mut distinct_values = narrow_distinct(left.distinct_values, row_count);
        for (name, count) in narrow_distinct(right.distinct_values, row_count) {
            distinct_values
                .entry(name)
                .and_modify(|existing| *existing = (*existing).min(count))
                .or_insert(count);
        }
        let mut indexes = HashMap::new();
        for (name, index) in left.indexes.into_iter().chain(right.indexes) {
            if distinct_values.contains_key(&name) {
                indexes.entry(name).or_insert(index);
            }
        }

        CostEstimate {
            cost: left.cost + right.cost + Cost(io),
            row_count,
            block_count,
            blocking_factor,
            distinct_values,
            indexes,
        }
    }

    /// Pick the join algorithm and its block transfer count. `bl`/`rl` are
    /// the left (outer) side, per the usual index-nested-loop orientation.
    fn join_method(
        &self,
        join: &Join,
        left: &CostEstimate,
        right: &CostEstimate,
    ) -> (JoinMethod, f64) {
        let bl = left.block_count as f64;
        let rl = left.row_count as f64;
        let br = right.block_count as f64;

        let (left_index, right_index) = self.join_indexes(join, left, right);
        match (left_index, right_index) {
            (Some(Index::Hash { .. }), Some(Index::Hash { .. })) => {
                (JoinMethod::Hash, 3.0 * (bl + br))
            }
            (_, Some(Index::BTree { depth })) => (
                JoinMethod::IndexNestedLoopBTree,
                bl + rl * (*depth as f64 + 1.0),
            ),
            (_, Some(Index::Hash { buckets })) => (
                JoinMethod::IndexNestedLoopHash,
                bl + rl * (br / (*buckets).max(1) as f64),
            ),
            _ => (JoinMethod::NestedLoop, bl + rl * br),
        }
    }

    /// Resolve the per-side index descriptors for the join attributes. Only
    /// column-to-column equality conditions in the theta predicate qualify;
    /// sides are told apart by which estimate knows the column.
    fn join_indexes<'e>(
        &self,
        join: &Join,
        left: &'e CostEstimate,
        right: &'e CostEstimate,
    ) -> (Option<&'e Index>, Option<&'e Index>) {
        let Some(predicate) = join.predicate() else {
            return (None, None);
        };

        let mut first_resolved = None;
        for (a, b) in equality_column_pairs(predicate) {
            let left_knows = |c: &str| {
                left.distinct_values.contains_key(c) || left.indexes.contains_key(c)
            };
            let right_knows = |c: &str| {
                right.distinct_values.contains_key(c) || right.indexes.contains_key(c)
            };
            let (left_col, right_col) = if left_knows(a) && right_knows(b) {
                (a, b)
            } else if left_knows(b) && right_knows(a) {
                (b, a)
            } else {
                (a, b)
            };
            let pair = (left.indexes.get(left_col), right.indexes.get(right_col));
            if pair.0.is_some() || pair.1.is_some() {
                return pair;
            }
            first_resolved.get_or_insert(pair);
        }
        first_resolved.unwrap_or((None, None))
    }

    fn sort_estimate(&self, _sort: &Sort, input: CostEstimate) -> CostEstimate {
        let b = input.block_count;
        // Merging needs at least three buffer blocks: two runs in, one out.
        let m = self.config.memory_buffer_blocks.max(3);
        let io = if b <= m {
            b as f64
        } else {
            let runs = (b as f64 / m as f64).ceil();
            let passes = (runs.ln() / ((m - 1) as f64).ln()).ceil().max(1.0);
            2.0 * b as f64 * (1.0 + passes)
        };
        CostEstimate {
            cost: input.cost + Cost(io),
            ..input
        }
    }

    fn group_estimate(&self, _group_by: &GroupBy, input: CostEstimate) -> CostEstimate {
        let row_count = if input.distinct_values.is_empty() {
            (input.row_count as f64 * 0.1) as u64
        } else {
            let sum: u64 = input.distinct_values.values().sum();
            sum / input.distinct_values.len() as u64
        }
        .max(1);
        let block_count = blocks_for(row_count, input.blocking_factor, input.block_count);
        let distinct_values = narrow_distinct(input.distinct_values, row_count);
        CostEstimate {
            // One pass over the input to build the hash groups.
            cost: input.cost + Cost(input.block_count as f64),
            row_count,
            block_count,
            blocking_factor: input.blocking_factor,
            distinct_values,
            indexes: HashMap::new(),
        }
    }

    fn limit_estimate(&self, limit: &Limit, input: CostEstimate) -> CostEstimate {
        let row_count = limit.limit().min(input.row_count);
        let ratio = if input.row_count > 0 {
            (row_count as f64 / input.row_count as f64).min(1.0)
        } else {
            1.0
        };
        let block_count = ((input.block_count as f64 * ratio) as u64).max(1);
        CostEstimate {
            cost: Cost(input.cost.value() * ratio),
            row_count,
            block_count,
            ..input
        }
    }

    /// Per-operator cost breakdown as a printable table, pre-order with
    /// indentation showing nesting.
    pub fn breakdown(&self, plan: &Plan) -> OptResult<Table> {
        let mut cache = HashMap::new();
        self.compute(&plan.root(), &mut cache)?;

        let mut table = Table::new();
        table.set_titles(row!["operator", "cost", "rows", "blocks"]);
        breakdown_rows(&plan.root(), &cache, &mut table, 0);
        Ok(table)
    }
}

fn breakdown_rows(
    node: &PlanNodeRef,
    cache: &HashMap<usize, CostEstimate>,
    table: &mut Table,
    depth: usize,
) {
    let label = format!(
        "{:indent$}{}",
        "",
        node.operator().as_ref(),
        indent = depth * 2
    );
    if let Some(estimate) = cache.get(&(PlanNodeRef::as_ptr(node) as usize)) {
        table.add_row(row![
            label,
            format!("{:.1}", estimate.cost.value()),
            estimate.row_count,
            estimate.block_count
        ]);
    }
    for input in node.inputs() {
        breakdown_rows(input, cache, table, depth + 1);
    }
}

/// Total estimated block I/O cost of a plan.
pub fn get_cost(plan: &Plan, provider: &dyn StatisticsProvider) -> OptResult<Cost> {
    Ok(CostModel::new(provider).estimate(plan)?.cost)
}

fn blocks_for(row_count: u64, blocking_factor: u64, fallback: u64) -> u64 {
    if blocking_factor == 0 {
        return fallback.max(1);
    }
    (row_count.div_ceil(blocking_factor)).max(1)
}

fn narrow_distinct(
    distinct_values: HashMap<String, u64>,
    row_count: u64,
) -> HashMap<String, u64> {
    distinct_values
        .into_iter()
        .map(|(name, count)| (name, count.min(row_count)))
        .collect()
}

/// All `column = column` conditions in the predicate, at any nesting depth,
/// as bare column name pairs.
fn equality_column_pairs(predicate: &crate::expr::Predicate) -> Vec<(&str, &str)> {
    use crate::expr::{CompareOp, Operand, Predicate};
    match predicate {
        Predicate::Comparison(c) => {
            if c.op == CompareOp::Eq {
                if let Operand::Column(rhs) = &c.value {
                    return vec![(c.attr.column.as_str(), rhs.column.as_str())];
                }
            }
            vec![]
        }
        Predicate::Logical(l) => l
            .children
            .iter()
            .flat_map(equality_column_pairs)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Predicate;
    use crate::operator::JoinSpec;
    use crate::plan::PlanBuilder;
    use crate::stat::MemoryStatisticsProvider;
    use maplit::hashmap;

    fn table(
        rows: u64,
        blocks: u64,
        distinct: HashMap<String, u64>,
        indexes: HashMap<String, Index>,
    ) -> Statistics {
        Statistics {
            row_count: rows,
            block_count: blocks,
            tuple_size: 100,
            blocking_factor: (rows / blocks.max(1)).max(1),
            distinct_values: distinct,
            indexes,
        }
    }

    fn provider() -> MemoryStatisticsProvider {
        MemoryStatisticsProvider::new()
            .with_table(
                "movies",
                table(
                    1000,
                    100,
                    hashmap! {
                        "movie_id".to_string() => 1000,
                        "genre".to_string() => 50,
                    },
                    hashmap! {
                        "movie_id".to_string() => Index::BTree { depth: 3 },
                    },
                ),
            )
            .with_table(
                "reviews",
                table(
                    10_000,
                    500,
                    hashmap! {
                        "movie_id".to_string() => 900,
                        "stars".to_string() => 5,
                    },
                    HashMap::new(),
                ),
            )
    }

    #[test]
    fn test_scan_cost_is_block_count() {
        let provider = provider();
        let plan = PlanBuilder::scan("movies").build();
        let estimate = CostModel::new(&provider).estimate(&plan).unwrap();
        assert_eq!(estimate.cost, Cost(100.0));
        assert_eq!(estimate.row_count, 1000);
    }

    #[test]
    fn test_equality_filter_uses_distinct_count() {
        let provider = provider();
        let plan = PlanBuilder::scan("movies")
            .filter(Predicate::parse("genre = 'drama'").unwrap())
            .build();
        let estimate = CostModel::new(&provider).estimate(&plan).unwrap();
        // 1000 rows / 50 distinct genres.
        assert_eq!(estimate.row_count, 20);
        assert_eq!(estimate.cost, Cost(100.0));
        assert_eq!(estimate.distinct_values["genre"], 20);
        assert!(estimate.indexes.is_empty());
    }

    #[test]
    fn test_inl_btree_join() {
        let provider = provider();
        // movies is the inner (right) side and has a btree on movie_id.
        let plan = PlanBuilder::scan("reviews")
            .join(
                JoinSpec::Theta(Predicate::parse("reviews.movie_id = movies.movie_id").unwrap()),
                PlanBuilder::scan("movies"),
            )
            .build();
        let estimate = CostModel::new(&provider).estimate(&plan).unwrap();
        // 500 + 100 (children) + 500 + 10000 * (3 + 1).
        assert_eq!(estimate.cost, Cost(600.0 + 500.0 + 40_000.0));
    }

    #[test]
    fn test_hash_join_when_both_sides_hashed() {
        let provider = MemoryStatisticsProvider::new()
            .with_table(
                "l",
                table(
                    1000,
                    100,
                    hashmap! {"k".to_string() => 100},
                    hashmap! {"k".to_string() => Index::Hash { buckets: 32 }},
                ),
            )
            .with_table(
                "r",
                table(
                    2000,
                    200,
                    hashmap! {"k".to_string() => 100},
                    hashmap! {"k".to_string() => Index::Hash { buckets: 32 }},
                ),
            );
        let plan = PlanBuilder::scan("l")
            .join(
                JoinSpec::Theta(Predicate::parse("l.k = r.k").unwrap()),
                PlanBuilder::scan("r"),
            )
            .build();
        let estimate = CostModel::new(&provider).estimate(&plan).unwrap();
        // 100 + 200 (children) + 3 * (100 + 200).
        assert_eq!(estimate.cost, Cost(300.0 + 900.0));
    }

    #[test]
    fn test_inl_hash_join_inner_only() {
        let provider = MemoryStatisticsProvider::new()
            .with_table("l", table(1000, 100, hashmap! {"k".to_string() => 100}, HashMap::new()))
            .with_table(
                "r",
                table(
                    2000,
                    200,
                    hashmap! {"k".to_string() => 100},
                    hashmap! {"k".to_string() => Index::Hash { buckets: 50 }},
                ),
            );
        let plan = PlanBuilder::scan("l")
            .join(
                JoinSpec::Theta(Predicate::parse("l.k = r.k").unwrap()),
                PlanBuilder::scan("r"),
            )
            .build();
        let estimate = CostModel::new(&provider).estimate(&plan).unwrap();
        // 100 + 200 + (100 + 1000 * 200/50).
        assert_eq!(estimate.cost, Cost(300.0 + 100.0 + 4000.0));
    }

    #[test]
    fn test_nested_loop_join_without_indexes() {
        let provider = MemoryStatisticsProvider::new()
            .with_table("l", table(100, 10, HashMap::new(), HashMap::new()))
            .with_table("r", table(200, 20, HashMap::new(), HashMap::new()));
        let plan = PlanBuilder::scan("l")
            .join(
                JoinSpec::Theta(Predicate::parse("l.k = r.k").unwrap()),
                PlanBuilder::scan("r"),
            )
            .build();
        let estimate = CostModel::new(&provider).estimate(&plan).unwrap();
        // 10 + 20 + (10 + 100 * 20).
        assert_eq!(estimate.cost, Cost(30.0 + 2010.0));
        // No distinct data on either side: fallback cardinality.
        assert_eq!(estimate.row_count, (100.0_f64 * 200.0 * 0.1) as u64);
    }

    #[test]
    fn test_hash_join_from_inherited_indexes() {
        let provider = MemoryStatisticsProvider::new()
            .with_table(
                "a",
                table(
                    1000,
                    100,
                    hashmap! {"k".to_string() => 100},
                    hashmap! {"k".to_string() => Index::Hash { buckets: 32 }},
                ),
            )
            .with_table(
                "b",
                table(
                    2000,
                    200,
                    hashmap! {"k".to_string() => 100},
                    hashmap! {"k".to_string() => Index::Hash { buckets: 32 }},
                ),
            )
            .with_table(
                "c",
                table(
                    4000,
                    400,
                    hashmap! {"k".to_string() => 100},
                    hashmap! {"k".to_string() => Index::Hash { buckets: 32 }},
                ),
            );
        let plan = PlanBuilder::scan("a")
            .join(
                JoinSpec::Theta(Predicate::parse("a.k = b.k").unwrap()),
                PlanBuilder::scan("b"),
            )
            .join(
                JoinSpec::Theta(Predicate::parse("b.k = c.k").unwrap()),
                PlanBuilder::scan("c"),
            )
            .build();
        let estimate = CostModel::new(&provider).estimate(&plan).unwrap();
        // The lower join hashes both sides: 100 + 200 + 3 * 300. Its output
        // is 20000 rows in 2000 blocks and keeps the hash index on k, so the
        // upper join hashes too: 400 + 3 * (2000 + 400), not nested loop.
        assert_eq!(estimate.cost, Cost(1200.0 + 400.0 + 7200.0));
        assert!(matches!(estimate.indexes["k"], Index::Hash { .. }));
    }

    #[test]
    fn test_join_index_sides_resolve_swapped_operands() {
        let provider = MemoryStatisticsProvider::new()
            .with_table(
                "l",
                table(
                    1000,
                    100,
                    hashmap! {"lk".to_string() => 100},
                    hashmap! {"lk".to_string() => Index::Hash { buckets: 32 }},
                ),
            )
            .with_table(
                "r",
                table(
                    2000,
                    200,
                    hashmap! {"rk".to_string() => 100},
                    hashmap! {"rk".to_string() => Index::BTree { depth: 2 }},
                ),
            );
        // The condition is written inner column first; the sides are told
        // apart by which estimate knows each column.
        let plan = PlanBuilder::scan("l")
            .join(
                JoinSpec::Theta(Predicate::parse("r.rk = l.lk").unwrap()),
                PlanBuilder::scan("r"),
            )
            .build();
        let estimate = CostModel::new(&provider).estimate(&plan).unwrap();
        // 100 + 200 + (100 + 1000 * (2 + 1)) with the btree on the inner.
        assert_eq!(estimate.cost, Cost(300.0 + 3100.0));
    }

    #[test]
    fn test_join_cardinality_uses_distinct_averages() {
        let provider = provider();
        let plan = PlanBuilder::scan("reviews")
            .join(
                JoinSpec::Theta(Predicate::parse("reviews.movie_id = movies.movie_id").unwrap()),
                PlanBuilder::scan("movies"),
            )
            .build();
        let estimate = CostModel::new(&provider).estimate(&plan).unwrap();
        // avg(movies) = (1000 + 50) / 2 = 525, avg(reviews) = (900 + 5) / 2.
        let expected = (10_000.0 * 1000.0 / 525.0_f64).round() as u64;
        assert_eq!(estimate.row_count, expected);
    }

    #[test]
    fn test_limit_scales_cost_monotonically() {
        let provider = provider();
        let unlimited = PlanBuilder::scan("movies").build();
        let limited = PlanBuilder::scan("movies").limit(10).build();
        let model = CostModel::new(&provider);
        let full = model.estimate(&unlimited).unwrap();
        let cut = model.estimate(&limited).unwrap();
        assert_eq!(cut.row_count, 10);
        assert!(cut.cost <= full.cost);
        assert!(cut.block_count >= 1);
    }

    #[test]
    fn test_sort_in_memory_vs_external() {
        let small = MemoryStatisticsProvider::new()
            .with_table("t", table(1000, 50, HashMap::new(), HashMap::new()));
        let plan = PlanBuilder::scan("t")
            .sort([crate::operator::SortKey::asc(crate::expr::ColumnRef::parse("t.x"))])
            .build();
        let estimate = CostModel::new(&small).estimate(&plan).unwrap();
        // 50 blocks fit the 100-block buffer: one extra pass of 50.
        assert_eq!(estimate.cost, Cost(100.0));

        let big = MemoryStatisticsProvider::new()
            .with_table("t", table(100_000, 1000, HashMap::new(), HashMap::new()));
        let plan = PlanBuilder::scan("t")
            .sort([crate::operator::SortKey::asc(crate::expr::ColumnRef::parse("t.x"))])
            .build();
        let estimate = CostModel::new(&big).estimate(&plan).unwrap();
        // ceil(log_99(10)) = 1 merge pass: 2 * 1000 * 2 on top of the scan.
        assert_eq!(estimate.cost, Cost(1000.0 + 4000.0));
    }

    #[test]
    fn test_sort_with_tiny_buffer_stays_finite() {
        let provider = MemoryStatisticsProvider::new()
            .with_table("t", table(100_000, 1000, HashMap::new(), HashMap::new()));
        let plan = PlanBuilder::scan("t")
            .sort([crate::operator::SortKey::asc(crate::expr::ColumnRef::parse("t.x"))])
            .build();
        let config = CostConfig {
            memory_buffer_blocks: 2,
            ..CostConfig::default()
        };
        let estimate = CostModel::with_config(&provider, config)
            .estimate(&plan)
            .unwrap();
        // The merge buffer clamps to 3 blocks: ceil(log_2(ceil(1000 / 3)))
        // = 9 passes, so 1000 + 2 * 1000 * (1 + 9).
        assert!(estimate.cost.value().is_finite());
        assert_eq!(estimate.cost, Cost(1000.0 + 20_000.0));
    }

    #[test]
    fn test_group_by_shrinks_rows() {
        let provider = provider();
        let plan = PlanBuilder::scan("movies")
            .group_by([crate::expr::ColumnRef::parse("genre")])
            .build();
        let estimate = CostModel::new(&provider).estimate(&plan).unwrap();
        // avg distinct of (1000, 50) = 525.
        assert_eq!(estimate.row_count, 525);
        assert_eq!(estimate.cost, Cost(200.0));
    }

    #[test]
    fn test_ddl_and_transactions_are_free() {
        let provider = provider();
        for statement in [
            crate::plan::Statement::BeginTransaction,
            crate::plan::Statement::Commit,
            crate::plan::Statement::Rollback,
        ] {
            let plan = crate::plan::build_statement(&statement).unwrap();
            let estimate = CostModel::new(&provider).estimate(&plan).unwrap();
            assert_eq!(estimate.cost, Cost(0.0));
        }
    }

    #[test]
    fn test_get_cost_entry_point() {
        let provider = provider();
        let plan = PlanBuilder::scan("movies").build();
        assert_eq!(get_cost(&plan, &provider).unwrap(), Cost(100.0));
    }

    #[test]
    fn test_breakdown_lists_every_operator() {
        let provider = provider();
        let plan = PlanBuilder::scan("movies")
            .filter(Predicate::parse("genre = 'drama'").unwrap())
            .limit(5)
            .build();
        let table = CostModel::new(&provider).breakdown(&plan).unwrap();
        assert_eq!(table.len(), 3);
    }
}
