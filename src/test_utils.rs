//! Shared fixtures for unit and integration tests.

use std::collections::HashMap;

use crate::stat::{MemoryStatisticsProvider, Statistics};

/// Build a provider from a JSON object of `table name -> statistics`.
///
/// ```json
/// {
///   "movies": {
///     "row_count": 1000, "block_count": 100,
///     "tuple_size": 120, "blocking_factor": 10,
///     "distinct_values": {"movie_id": 1000},
///     "indexes": {"movie_id": {"kind": "b_tree", "depth": 3}}
///   }
/// }
/// ```
pub fn provider_from_json(json: &str) -> MemoryStatisticsProvider {
    let tables: HashMap<String, Statistics> =
        serde_json::from_str(json).expect("invalid statistics fixture");
    let mut provider = MemoryStatisticsProvider::new();
    for (name, stats) in tables {
        provider.register(name, stats);
    }
    provider
}

/// A small movie catalog with one indexed join column, enough to exercise
/// every join method and the reorderer.
pub fn movie_catalog() -> MemoryStatisticsProvider {
    provider_from_json(
        r#"{
        "movies": {
            "row_count": 1000, "block_count": 100,
            "tuple_size": 120, "blocking_factor": 10,
            "distinct_values": {"movie_id": 1000, "director_id": 180, "genre": 50},
            "indexes": {"movie_id": {"kind": "b_tree", "depth": 3}}
        },
        "reviews": {
            "row_count": 50000, "block_count": 2500,
            "tuple_size": 60, "blocking_factor": 20,
            "distinct_values": {"movie_id": 900, "stars": 5},
            "indexes": {"movie_id": {"kind": "hash", "buckets": 64}}
        },
        "directors": {
            "row_count": 200, "block_count": 20,
            "tuple_size": 100, "blocking_factor": 10,
            "distinct_values": {"director_id": 200, "country": 40},
            "indexes": {}
        }
    }"#,
    )
}
