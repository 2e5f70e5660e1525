use crate::expr::{ColumnRef, Predicate};
use crate::operator::{
    Filter, GroupBy, Join, JoinSpec, Limit, Projection, Sort, SortKey, TableScan,
};
use crate::plan::{Plan, PlanNode};

/// Fluent plan construction for tests and callers that already hold
/// structured parts. Starts from a scan so the root always exists.
pub struct PlanBuilder {
    root: crate::plan::PlanNodeRef,
}

impl PlanBuilder {
    pub fn scan<S: Into<String>>(table_name: S) -> Self {
        Self {
            root: PlanNode::leaf(TableScan::new(table_name).into()),
        }
    }

    pub fn scan_as<S: Into<String>, A: Into<String>>(table_name: S, alias: A) -> Self {
        Self {
            root: PlanNode::leaf(TableScan::with_alias(table_name, alias).into()),
        }
    }

    pub fn filter(self, predicate: Predicate) -> Self {
        Self {
            root: PlanNode::unary(Filter::new(predicate).into(), self.root),
        }
    }

    pub fn project<I: IntoIterator<Item = ColumnRef>>(self, columns: I) -> Self {
        Self {
            root: PlanNode::unary(Projection::new(columns).into(), self.root),
        }
    }

    pub fn join(self, spec: JoinSpec, right: PlanBuilder) -> Self {
        Self {
            root: PlanNode::binary(Join::new(spec).into(), self.root, right.root),
        }
    }

    pub fn sort<I: IntoIterator<Item = SortKey>>(self, keys: I) -> Self {
        Self {
            root: PlanNode::unary(Sort::new(keys).into(), self.root),
        }
    }

    pub fn group_by<I: IntoIterator<Item = ColumnRef>>(self, columns: I) -> Self {
        Self {
            root: PlanNode::unary(GroupBy::new(columns).into(), self.root),
        }
    }

    pub fn limit(self, limit: u64) -> Self {
        Self {
            root: PlanNode::unary(Limit::new(limit).into(), self.root),
        }
    }

    pub fn build(self) -> Plan {
        Plan::new(self.root)
    }
}
