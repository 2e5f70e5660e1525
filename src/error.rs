use thiserror::Error;

pub type OptResult<T> = anyhow::Result<T>;

/// Typed failures of the optimizer. Most call sites go through [`OptResult`],
/// so these convert into `anyhow::Error` at the boundary.
#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("no comparison operator found in condition {0:?}")]
    MalformedCondition(String),
    #[error("empty predicate expression")]
    EmptyPredicate,
    #[error("logical expression with fewer than two operands")]
    DegenerateLogicalExpr,
    #[error("invalid table reference {0:?}")]
    InvalidTableReference(String),
    #[error("invalid column definition {0:?}")]
    InvalidColumnDefinition(String),
    #[error("invalid set clause {0:?}")]
    InvalidSetClause(String),
}
