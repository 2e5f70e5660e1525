//! Table statistics consumed by the cost model.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Access structure available on a single attribute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Index {
    /// B+tree of the given depth (root to leaf).
    BTree { depth: u64 },
    /// Static hash index with the given bucket count.
    Hash { buckets: u64 },
}

/// Block-level statistics of one base table. `distinct_values` and `indexes`
/// are keyed by bare column name; absence of a column means unknown or
/// unindexed respectively.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub row_count: u64,
    pub block_count: u64,
    /// Bytes per tuple.
    pub tuple_size: u64,
    /// Tuples per block.
    pub blocking_factor: u64,
    #[serde(default)]
    pub distinct_values: HashMap<String, u64>,
    #[serde(default)]
    pub indexes: HashMap<String, Index>,
}

impl Default for Statistics {
    /// Placeholder numbers used for tables without registered statistics.
    fn default() -> Self {
        Statistics {
            row_count: 10_000,
            block_count: 500,
            tuple_size: 80,
            blocking_factor: 10,
            distinct_values: HashMap::new(),
            indexes: HashMap::new(),
        }
    }
}

/// Source of table statistics. Lookup is total: unknown tables resolve to
/// [`Statistics::default`] so costing never fails on a missing table.
pub trait StatisticsProvider {
    fn lookup(&self, table: &str) -> Statistics;
}

/// In-memory provider, keyed by lowercased table name.
#[derive(Clone, Debug, Default)]
pub struct MemoryStatisticsProvider {
    tables: HashMap<String, Statistics>,
}

impl MemoryStatisticsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: Into<String>>(&mut self, table: S, stats: Statistics) {
        self.tables.insert(table.into().to_lowercase(), stats);
    }

    pub fn with_table<S: Into<String>>(mut self, table: S, stats: Statistics) -> Self {
        self.register(table, stats);
        self
    }
}

impl StatisticsProvider for MemoryStatisticsProvider {
    fn lookup(&self, table: &str) -> Statistics {
        self.tables
            .get(&table.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let provider = MemoryStatisticsProvider::new().with_table(
            "Movies",
            Statistics {
                row_count: 1000,
                block_count: 100,
                tuple_size: 120,
                blocking_factor: 10,
                distinct_values: hashmap! {"movie_id".to_string() => 1000},
                indexes: HashMap::new(),
            },
        );
        assert_eq!(provider.lookup("MOVIES").row_count, 1000);
        assert_eq!(provider.lookup("movies").block_count, 100);
    }

    #[test]
    fn test_unknown_table_gets_defaults() {
        let provider = MemoryStatisticsProvider::new();
        let stats = provider.lookup("nope");
        assert_eq!(stats.row_count, 10_000);
        assert_eq!(stats.block_count, 500);
        assert!(stats.distinct_values.is_empty());
        assert!(stats.indexes.is_empty());
    }

    #[test]
    fn test_index_json_round_trip() {
        let json = r#"{"kind": "b_tree", "depth": 3}"#;
        let idx: Index = serde_json::from_str(json).unwrap();
        assert_eq!(idx, Index::BTree { depth: 3 });
        let json = r#"{"kind": "hash", "buckets": 64}"#;
        let idx: Index = serde_json::from_str(json).unwrap();
        assert_eq!(idx, Index::Hash { buckets: 64 });
    }
}
