//! Statement-to-plan construction.
//!
//! The textual clause extraction lives outside this crate; callers hand over
//! a [`Statement`] of pre-extracted clause strings and get back the canonical
//! unoptimized tree. For SELECT the nesting is, top to bottom:
//! Projection, Limit, Sort, GroupBy, Filter, then the FROM subtree.

use crate::error::{OptResult, OptimizerError};
use crate::expr::Predicate;
use crate::operator::{
    ColumnDef, CreateTable, DataType, Delete, DropTable, Filter, ForeignKey, GroupBy,
    Insert, Join, JoinSpec, Limit, Operator, Projection, SetClause, Sort, TableScan,
    TransactionKind, Update,
};
use crate::plan::{Plan, PlanNode, PlanNodeRef};

/// One pre-extracted statement. Clause values are raw text exactly as they
/// appeared between the keywords.
#[derive(Clone, Debug)]
pub enum Statement {
    Select(SelectParts),
    Update(UpdateParts),
    Delete(DeleteParts),
    Insert(InsertParts),
    CreateTable(CreateTableParts),
    DropTable(DropTableParts),
    BeginTransaction,
    Commit,
    Rollback,
}

#[derive(Clone, Debug)]
pub struct SelectParts {
    /// Select list, `*` for all columns.
    pub columns: String,
    pub from: FromClause,
    pub filter: Option<String>,
    pub group_by: Option<String>,
    pub order_by: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct FromClause {
    /// Base table reference, optionally aliased.
    pub base: String,
    pub joins: Vec<JoinClause>,
}

#[derive(Clone, Debug)]
pub struct JoinClause {
    pub table: String,
    /// `ON` condition; absence means a natural join.
    pub on: Option<String>,
}

#[derive(Clone, Debug)]
pub struct UpdateParts {
    pub table: String,
    pub assignments: Vec<String>,
    pub filter: Option<String>,
}

#[derive(Clone, Debug)]
pub struct DeleteParts {
    pub table: String,
    pub filter: Option<String>,
}

#[derive(Clone, Debug)]
pub struct InsertParts {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct CreateTableParts {
    pub table: String,
    /// Body of the parenthesized definition list.
    pub definition: String,
}

#[derive(Clone, Debug)]
pub struct DropTableParts {
    pub table: String,
    pub cascade: bool,
}

/// Build the canonical unoptimized plan for a statement.
pub fn build_statement(statement: &Statement) -> OptResult<Plan> {
    let root = match statement {
        Statement::Select(parts) => build_select(parts)?,
        Statement::Update(parts) => build_update(parts)?,
        Statement::Delete(parts) => build_delete(parts)?,
        Statement::Insert(parts) => PlanNode::leaf(
            Insert::new(
                parts.table.clone(),
                parts.columns.clone(),
                parts.values.clone(),
            )
            .into(),
        ),
        Statement::CreateTable(parts) => build_create_table(parts)?,
        Statement::DropTable(parts) => {
            PlanNode::leaf(DropTable::new(parts.table.clone(), parts.cascade).into())
        }
        Statement::BeginTransaction => {
            PlanNode::leaf(Operator::Transaction(TransactionKind::Begin))
        }
        Statement::Commit => PlanNode::leaf(Operator::Transaction(TransactionKind::Commit)),
        Statement::Rollback => {
            PlanNode::leaf(Operator::Transaction(TransactionKind::Rollback))
        }
    };
    Ok(Plan::new(root))
}

fn build_select(parts: &SelectParts) -> OptResult<PlanNodeRef> {
    let mut node = build_from(&parts.from)?;

    if let Some(filter) = &parts.filter {
        node = PlanNode::unary(Filter::new(Predicate::parse(filter)?).into(), node);
    }
    if let Some(group_by) = &parts.group_by {
        node = PlanNode::unary(GroupBy::parse(group_by)?.into(), node);
    }
    if let Some(order_by) = &parts.order_by {
        node = PlanNode::unary(Sort::parse(order_by)?.into(), node);
    }
    if let Some(limit) = parts.limit {
        node = PlanNode::unary(Limit::new(limit).into(), node);
    }
    if parts.columns.trim() != "*" {
        node = PlanNode::unary(Projection::parse(&parts.columns)?.into(), node);
    }
    Ok(node)
}

fn build_from(from: &FromClause) -> OptResult<PlanNodeRef> {
    let mut node = PlanNode::leaf(TableScan::parse(&from.base)?.into());
    for join in &from.joins {
        let right = PlanNode::leaf(TableScan::parse(&join.table)?.into());
        let spec = match &join.on {
            Some(on) => JoinSpec::Theta(Predicate::parse(on)?),
            None => JoinSpec::Natural,
        };
        node = PlanNode::binary(Join::new(spec).into(), node, right);
    }
    Ok(node)
}

fn build_update(parts: &UpdateParts) -> OptResult<PlanNodeRef> {
    let mut node = PlanNode::leaf(TableScan::parse(&parts.table)?.into());
    if let Some(filter) = &parts.filter {
        node = PlanNode::unary(Filter::new(Predicate::parse(filter)?).into(), node);
    }
    let assignments = parts
        .assignments
        .iter()
        .map(|a| SetClause::parse(a))
        .collect::<OptResult<Vec<_>>>()?;
    Ok(PlanNode::unary(Update::new(assignments).into(), node))
}

fn build_delete(parts: &DeleteParts) -> OptResult<PlanNodeRef> {
    let mut node = PlanNode::leaf(TableScan::parse(&parts.table)?.into());
    if let Some(filter) = &parts.filter {
        node = PlanNode::unary(Filter::new(Predicate::parse(filter)?).into(), node);
    }
    Ok(PlanNode::unary(Delete::new().into(), node))
}

fn build_create_table(parts: &CreateTableParts) -> OptResult<PlanNodeRef> {
    let mut columns = Vec::new();
    let mut primary_key = Vec::new();
    let mut foreign_keys = Vec::new();

    for item in split_definition_items(&parts.definition) {
        let upper = item.to_ascii_uppercase();
        if let Some(rest) = upper.strip_prefix("PRIMARY KEY") {
            let offset = item.len() - rest.len();
            primary_key = parse_name_list(&item[offset..])?;
        } else if upper.starts_with("FOREIGN KEY") {
            foreign_keys.push(parse_foreign_key(item)?);
        } else {
            let (name, ty) = item
                .split_once(char::is_whitespace)
                .ok_or_else(|| OptimizerError::InvalidColumnDefinition(item.to_string()))?;
            columns.push(ColumnDef {
                name: name.trim().to_string(),
                data_type: DataType::parse(ty)?,
            });
        }
    }

    Ok(PlanNode::leaf(
        CreateTable::new(parts.table.clone(), columns, primary_key, foreign_keys).into(),
    ))
}

/// Split a definition list on commas outside parentheses.
fn split_definition_items(definition: &str) -> Vec<&str> {
    let bytes = definition.as_bytes();
    let mut items = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, b) in bytes.iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth -= 1,
            b',' if depth == 0 => {
                let item = definition[start..i].trim();
                if !item.is_empty() {
                    items.push(item);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    let item = definition[start..].trim();
    if !item.is_empty() {
        items.push(item);
    }
    items
}

/// Parse a parenthesized name list such as `(id, name)`.
fn parse_name_list(raw: &str) -> OptResult<Vec<String>> {
    let inner = raw
        .trim()
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(|| OptimizerError::InvalidColumnDefinition(raw.to_string()))?;
    Ok(inner
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect())
}

/// Parse `FOREIGN KEY (col) REFERENCES other(col)`.
fn parse_foreign_key(item: &str) -> OptResult<ForeignKey> {
    let invalid = || OptimizerError::InvalidColumnDefinition(item.to_string());

    let upper = item.to_ascii_uppercase();
    let refs_at = upper.find("REFERENCES").ok_or_else(invalid)?;
    let key_part = &item["FOREIGN KEY".len()..refs_at];
    let target_part = item[refs_at + "REFERENCES".len()..].trim();

    let column = parse_name_list(key_part)?
        .into_iter()
        .next()
        .ok_or_else(invalid)?;
    let open = target_part.find('(').ok_or_else(invalid)?;
    let ref_table = target_part[..open].trim().to_string();
    let ref_column = parse_name_list(&target_part[open..])?
        .into_iter()
        .next()
        .ok_or_else(invalid)?;

    Ok(ForeignKey {
        column,
        ref_table,
        ref_column,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::Operator;

    fn select(columns: &str, from: FromClause) -> SelectParts {
        SelectParts {
            columns: columns.to_string(),
            from,
            filter: None,
            group_by: None,
            order_by: None,
            limit: None,
        }
    }

    fn from_single(base: &str) -> FromClause {
        FromClause {
            base: base.to_string(),
            joins: vec![],
        }
    }

    #[test]
    fn test_select_star_has_no_projection() {
        let plan =
            build_statement(&Statement::Select(select("*", from_single("t")))).unwrap();
        assert!(plan.root().operator().as_scan().is_some());
    }

    #[test]
    fn test_select_clause_nesting() {
        let mut parts = select("s.name, s.gpa", from_single("students s"));
        parts.filter = Some("s.gpa >= 3.5".to_string());
        parts.group_by = Some("s.major".to_string());
        parts.order_by = Some("s.gpa DESC".to_string());
        parts.limit = Some(10);

        let plan = build_statement(&Statement::Select(parts)).unwrap();
        let kinds: Vec<String> = plan
            .bfs_iterator()
            .map(|n| n.operator().as_ref().to_string())
            .collect();
        assert_eq!(
            kinds,
            ["Projection", "Limit", "Sort", "GroupBy", "Filter", "Scan"]
        );
    }

    #[test]
    fn test_from_joins_build_left_deep_chain() {
        let from = FromClause {
            base: "a".to_string(),
            joins: vec![
                JoinClause {
                    table: "b".to_string(),
                    on: Some("a.id = b.id".to_string()),
                },
                JoinClause {
                    table: "c".to_string(),
                    on: None,
                },
            ],
        };
        let plan = build_statement(&Statement::Select(select("*", from))).unwrap();
        let root = plan.root();
        let top = root.operator().as_join().unwrap();
        assert!(top.is_natural());
        let lower = root.inputs()[0].operator().as_join().unwrap();
        assert!(lower.is_theta());
        assert_eq!(plan.tables(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_update_wraps_filter_and_scan() {
        let parts = UpdateParts {
            table: "students".to_string(),
            assignments: vec!["gpa = 4.0".to_string()],
            filter: Some("name = 'Amy'".to_string()),
        };
        let plan = build_statement(&Statement::Update(parts)).unwrap();
        let root = plan.root();
        assert!(matches!(root.operator(), Operator::Update(_)));
        assert!(root.inputs()[0].operator().as_filter().is_some());
    }

    #[test]
    fn test_create_table_definition_parsing() {
        let parts = CreateTableParts {
            table: "enrollment".to_string(),
            definition: "student_id int, course varchar(32), grade char(2), \
                         PRIMARY KEY (student_id, course), \
                         FOREIGN KEY (student_id) REFERENCES students(id)"
                .to_string(),
        };
        let plan = build_statement(&Statement::CreateTable(parts)).unwrap();
        let root = plan.root();
        let create = match root.operator() {
            Operator::CreateTable(c) => c,
            other => panic!("unexpected operator {other}"),
        };
        assert_eq!(create.columns().len(), 3);
        assert_eq!(create.primary_key(), ["student_id", "course"]);
        assert_eq!(create.foreign_keys().len(), 1);
        assert_eq!(create.foreign_keys()[0].ref_table, "students");
    }
}
