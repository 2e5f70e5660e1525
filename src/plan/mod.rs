//! Immutable plan tree.
//!
//! Plan nodes are reference counted and never mutated. Rewrites build new
//! nodes and re-point ancestors, so `Arc::ptr_eq` doubles as a cheap
//! changed-or-not check and the `Arc` pointer as a node identity for caches.

mod builder;
pub use builder::*;
mod build;
pub use build::*;
mod explain;
pub use explain::*;

use std::collections::{HashSet, VecDeque};
use std::fmt::Write as _;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::operator::Operator;

pub type PlanNodeRef = Arc<PlanNode>;

#[derive(Debug, PartialEq)]
pub struct PlanNode {
    operator: Operator,
    inputs: SmallVec<[PlanNodeRef; 2]>,
}

impl PlanNode {
    pub fn new<I: IntoIterator<Item = PlanNodeRef>>(operator: Operator, inputs: I) -> Self {
        Self {
            operator,
            inputs: inputs.into_iter().collect(),
        }
    }

    pub fn leaf(operator: Operator) -> PlanNodeRef {
        Arc::new(Self::new(operator, []))
    }

    pub fn unary(operator: Operator, input: PlanNodeRef) -> PlanNodeRef {
        Arc::new(Self::new(operator, [input]))
    }

    pub fn binary(operator: Operator, left: PlanNodeRef, right: PlanNodeRef) -> PlanNodeRef {
        Arc::new(Self::new(operator, [left, right]))
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    pub fn inputs(&self) -> &[PlanNodeRef] {
        &self.inputs
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Plan {
    root: PlanNodeRef,
}

impl Plan {
    pub fn new(root: PlanNodeRef) -> Self {
        Self { root }
    }

    pub fn root(&self) -> PlanNodeRef {
        self.root.clone()
    }

    pub fn bfs_iterator(&self) -> PlanBfsIterator {
        PlanBfsIterator {
            queue: VecDeque::from([self.root.clone()]),
        }
    }

    /// Structural signature of the whole tree, a pre-order concatenation of
    /// operator renderings. Equal trees produce equal signatures, which is
    /// what the rewrite loop uses to detect oscillation.
    pub fn signature(&self) -> String {
        node_signature(&self.root)
    }

    /// Distinct scan binding names in depth-first, left-to-right order.
    pub fn tables(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        collect_tables(&self.root, &mut seen, &mut ordered);
        ordered
    }
}

pub struct PlanBfsIterator {
    queue: VecDeque<PlanNodeRef>,
}

impl Iterator for PlanBfsIterator {
    type Item = PlanNodeRef;

    fn next(&mut self) -> Option<PlanNodeRef> {
        let node = self.queue.pop_front()?;
        self.queue.extend(node.inputs().iter().cloned());
        Some(node)
    }
}

pub fn node_signature(node: &PlanNodeRef) -> String {
    let mut out = String::new();
    push_signature(node, &mut out);
    out
}

fn push_signature(node: &PlanNodeRef, out: &mut String) {
    if !out.is_empty() {
        out.push('|');
    }
    let _ = write!(out, "[{}]", node.operator());
    for input in node.inputs() {
        push_signature(input, out);
    }
}

/// All scan binding names under a node, as a set.
pub fn tables_under(node: &PlanNodeRef) -> HashSet<String> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    collect_tables(node, &mut seen, &mut ordered);
    seen
}

fn collect_tables(node: &PlanNodeRef, seen: &mut HashSet<String>, ordered: &mut Vec<String>) {
    if let Some(scan) = node.operator().as_scan() {
        let name = scan.binding_name().to_string();
        if seen.insert(name.clone()) {
            ordered.push(name);
        }
    }
    for input in node.inputs() {
        collect_tables(input, seen, ordered);
    }
}
