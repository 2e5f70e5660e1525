//! ## Background
//!
//! This crate is the query-optimization core of a small relational engine. It
//! accepts the canonical relational-algebra tree of a parsed SQL statement and
//! produces an equivalent tree that is cheaper to execute, in two stages.
//!
//! The first stage is rule based: a catalog of equivalence-preserving rewrite
//! rules (selection pushdown, cartesian folding, projection pruning, join
//! commutation and association) is applied bottom-up, sweep after sweep,
//! until the plan stops changing or a structural signature repeats. The rules
//! are substitution rules in the classic sense: each fires on a node shape
//! and splices in an equivalent subtree assumed to be no worse than the
//! original.
//!
//! The second stage is cost based in the narrow sense of [1]: a bounded
//! enumeration of left-deep join orders, each scored by a block I/O cost
//! model driven by per-table statistics (row and block counts, per-column
//! distinct counts, index metadata). The cost formulas are the textbook
//! transfer-cost estimates of [2].
//!
//! ## Design
//!
//! * [`plan`] Immutable plan tree, builders, statement construction, explain.
//! * [`operator`] Relational operators.
//! * [`expr`] Predicate model and the boolean expression parser.
//! * [`rules`] Rewrite rule definition and implementation.
//! * [`heuristic`] Bottom-up fixed-point rewrite driver.
//! * [`join_order`] Bounded left-deep join order enumeration.
//! * [`cost`] Block I/O cost model and selectivity estimation.
//! * [`stat`] Table statistics and providers.
//!
//! ## Reference
//!
//! 1. Selinger, P. Griffiths, et al. "Access path selection in a relational
//! database management system." Readings in Artificial Intelligence and
//! Databases. Morgan Kaufmann, 1989. 511-522.
//! 2. Silberschatz, A., Korth, H.F. and Sudarshan, S. Database System
//! Concepts, 7th ed., chapters 15-16. McGraw-Hill, 2019.

#[macro_use]
extern crate prettytable;
#[macro_use]
extern crate lazy_static;

pub mod cost;
pub mod error;
pub mod expr;
pub mod heuristic;
pub mod join_order;
pub mod operator;
pub mod optimizer;
pub mod plan;
pub mod rules;
pub mod stat;
pub mod test_utils;

pub use cost::{get_cost, Cost, CostModel};
pub use optimizer::{optimize, OptimizerContext};
