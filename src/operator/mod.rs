//! Relational operators.
//!
//! Each operator payload lives in its own type so rules can match on the
//! [`Operator`] enum and borrow the payload directly via `enum-as-inner`.

mod table_scan;
pub use table_scan::*;
mod filter;
pub use filter::*;
mod projection;
pub use projection::*;
mod join;
pub use join::*;
mod sort;
pub use sort::*;
mod group_by;
pub use group_by::*;
mod limit;
pub use limit::*;
mod dml;
pub use dml::*;
mod ddl;
pub use ddl::*;

use std::fmt::{Display, Formatter};

use enum_as_inner::EnumAsInner;
use enum_dispatch::enum_dispatch;
use strum_macros::AsRefStr;

/// Renders the payload fields of an operator, appended after the operator
/// name by the [`Display`] impl on [`Operator`].
#[enum_dispatch]
pub trait DisplayFields {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result;
}

/// The closed set of relational operators a plan node can carry.
#[derive(Clone, Debug, PartialEq, EnumAsInner, AsRefStr)]
#[enum_dispatch(DisplayFields)]
pub enum Operator {
    Scan(TableScan),
    Filter(Filter),
    Projection(Projection),
    Join(Join),
    Sort(Sort),
    GroupBy(GroupBy),
    Limit(Limit),
    Update(Update),
    Delete(Delete),
    Insert(Insert),
    CreateTable(CreateTable),
    DropTable(DropTable),
    Transaction(TransactionKind),
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())?;
        self.display(f)
    }
}
