//! Predicate model of the optimizer.
//!
//! A predicate is a tree of comparison conditions combined with `AND`/`OR`.
//! [`Predicate::parse`] builds one from a raw boolean expression string with
//! `OR` binding looser than `AND` and parentheses overriding both. The rest of
//! the crate only ever manipulates the structured form.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::error::{OptResult, OptimizerError};
use crate::plan::PlanNodeRef;

/// A possibly table-qualified column reference.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    pub fn new<T: Into<String>, C: Into<String>>(table: T, column: C) -> Self {
        ColumnRef {
            table: Some(table.into()),
            column: column.into(),
        }
    }

    pub fn unqualified<C: Into<String>>(column: C) -> Self {
        ColumnRef {
            table: None,
            column: column.into(),
        }
    }

    /// Parse `t.c` into a qualified reference, anything else into an
    /// unqualified one.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some((table, column)) = raw.split_once('.') {
            if is_identifier(table) && is_identifier(column) {
                return ColumnRef::new(table, column);
            }
        }
        ColumnRef::unqualified(raw)
    }
}

impl Display for ColumnRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.table {
            Some(t) => write!(f, "{}.{}", t, self.column),
            None => write!(f, "{}", self.column),
        }
    }
}

/// Comparison operators recognized in condition atoms.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
    Like,
    In,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Like => "LIKE",
            CompareOp::In => "IN",
        }
    }
}

impl Display for CompareOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Right-hand side of a condition.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Column(ColumnRef),
    Str(String),
    Int(i64),
    Float(f64),
    /// Anything that is neither a literal nor a column, e.g. an `IN` list.
    /// Carried verbatim, never evaluated.
    Raw(String),
    /// Uncorrelated subquery plan. Opaque to rewriting and costing.
    Subquery(PlanNodeRef),
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Column(c) => write!(f, "{c}"),
            Operand::Str(s) => write!(f, "'{s}'"),
            Operand::Int(i) => write!(f, "{i}"),
            Operand::Float(v) => write!(f, "{v}"),
            Operand::Raw(s) => write!(f, "{s}"),
            Operand::Subquery(_) => write!(f, "(subquery)"),
        }
    }
}

/// A single comparison, e.g. `t.a >= 10`.
#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    pub attr: ColumnRef,
    pub op: CompareOp,
    pub value: Operand,
}

impl Condition {
    pub fn new(attr: ColumnRef, op: CompareOp, value: Operand) -> Self {
        Condition { attr, op, value }
    }
}

impl Display for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.attr, self.op, self.value)
    }
}

#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum LogicalOp {
    And,
    Or,
}

/// `AND`/`OR` combination of at least two child predicates.
#[derive(Clone, Debug, PartialEq)]
pub struct LogicalExpr {
    pub op: LogicalOp,
    pub children: Vec<Predicate>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Comparison(Condition),
    Logical(LogicalExpr),
}

impl Predicate {
    /// Parse a raw boolean expression. `OR` splits first, then `AND`, both
    /// paren- and quote-aware, so `a = 1 OR b = 2 AND c = 3` parses as
    /// `a = 1 OR (b = 2 AND c = 3)`.
    pub fn parse(expr: &str) -> OptResult<Predicate> {
        let stripped = strip_outer_parens(expr);
        if stripped.is_empty() {
            return Err(OptimizerError::EmptyPredicate.into());
        }

        let or_parts = split_top_level(stripped, "OR");
        if or_parts.len() > 1 {
            let children = or_parts
                .iter()
                .map(|p| Predicate::parse(p))
                .collect::<OptResult<Vec<_>>>()?;
            return Ok(Predicate::Logical(LogicalExpr {
                op: LogicalOp::Or,
                children,
            }));
        }

        let and_parts = split_top_level(stripped, "AND");
        if and_parts.len() > 1 {
            let children = and_parts
                .iter()
                .map(|p| Predicate::parse(p))
                .collect::<OptResult<Vec<_>>>()?;
            return Ok(Predicate::Logical(LogicalExpr {
                op: LogicalOp::And,
                children,
            }));
        }

        Ok(Predicate::Comparison(parse_condition(stripped)?))
    }

    /// Conjoin two predicates, flattening nested `AND`s so conjuncts stay at
    /// one level.
    pub fn and(left: Predicate, right: Predicate) -> Predicate {
        let mut children = Vec::new();
        for p in [left, right] {
            match p {
                Predicate::Logical(LogicalExpr {
                    op: LogicalOp::And,
                    children: cs,
                }) => children.extend(cs),
                other => children.push(other),
            }
        }
        Predicate::Logical(LogicalExpr {
            op: LogicalOp::And,
            children,
        })
    }

    /// Conjoin a list, returning a single element unchanged. Returns `None`
    /// for an empty list.
    pub fn and_all(preds: Vec<Predicate>) -> Option<Predicate> {
        preds.into_iter().reduce(Predicate::and)
    }

    /// Top-level conjuncts, or `None` when this is not an `AND`.
    pub fn conjuncts(&self) -> Option<&[Predicate]> {
        match self {
            Predicate::Logical(LogicalExpr {
                op: LogicalOp::And,
                children,
            }) => Some(children),
            _ => None,
        }
    }

    /// All column references mentioned anywhere in the predicate.
    pub fn attributes(&self) -> Vec<&ColumnRef> {
        match self {
            Predicate::Comparison(c) => {
                let mut attrs = vec![&c.attr];
                if let Operand::Column(rhs) = &c.value {
                    attrs.push(rhs);
                }
                attrs
            }
            Predicate::Logical(l) => {
                l.children.iter().flat_map(|c| c.attributes()).collect()
            }
        }
    }

    /// Distinct table qualifiers mentioned in the predicate.
    pub fn tables(&self) -> HashSet<&str> {
        self.attributes()
            .into_iter()
            .filter_map(|c| c.table.as_deref())
            .collect()
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::Comparison(c) => write!(f, "{c}"),
            Predicate::Logical(l) => {
                let sep = match l.op {
                    LogicalOp::And => " AND ",
                    LogicalOp::Or => " OR ",
                };
                let rendered = l
                    .children
                    .iter()
                    .map(|c| match c {
                        Predicate::Logical(_) => format!("({c})"),
                        Predicate::Comparison(_) => format!("{c}"),
                    })
                    .join(sep);
                write!(f, "{rendered}")
            }
        }
    }
}

/// Comparison symbols ordered longest first so `<=` is not misread as `<`.
const COMPARE_SYMBOLS: [(&str, CompareOp); 7] = [
    ("<>", CompareOp::NotEq),
    (">=", CompareOp::GtEq),
    ("<=", CompareOp::LtEq),
    ("!=", CompareOp::NotEq),
    ("=", CompareOp::Eq),
    (">", CompareOp::Gt),
    ("<", CompareOp::Lt),
];

fn parse_condition(raw: &str) -> OptResult<Condition> {
    let raw = raw.trim();

    for (kw, op) in [("IN", CompareOp::In), ("LIKE", CompareOp::Like)] {
        if let Some((lhs, rhs)) = split_at_keyword(raw, kw) {
            return Ok(Condition::new(
                ColumnRef::parse(lhs),
                op,
                parse_operand(rhs),
            ));
        }
    }

    for (sym, op) in COMPARE_SYMBOLS {
        if let Some(at) = find_outside_quotes(raw, sym) {
            let lhs = raw[..at].trim();
            let rhs = raw[at + sym.len()..].trim();
            if lhs.is_empty() || rhs.is_empty() {
                break;
            }
            return Ok(Condition::new(
                ColumnRef::parse(lhs),
                op,
                parse_operand(rhs),
            ));
        }
    }

    Err(OptimizerError::MalformedCondition(raw.to_string()).into())
}

fn parse_operand(raw: &str) -> Operand {
    let raw = raw.trim();
    for quote in ['\'', '"'] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return Operand::Str(raw[1..raw.len() - 1].to_string());
        }
    }
    if let Some((table, column)) = raw.split_once('.') {
        if is_identifier(table) && is_identifier(column) {
            return Operand::Column(ColumnRef::new(table, column));
        }
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Operand::Int(i);
    }
    if let Ok(v) = raw.parse::<f64>() {
        return Operand::Float(v);
    }
    Operand::Raw(raw.to_string())
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Strip matching outer parentheses repeatedly, e.g. `((a = 1))` -> `a = 1`.
fn strip_outer_parens(s: &str) -> &str {
    let mut s = s.trim();
    while s.starts_with('(') && s.ends_with(')') {
        let mut depth = 0i32;
        let mut wraps = true;
        for (i, b) in s.bytes().enumerate() {
            match b {
                b'(' => depth += 1,
                b')' => depth -= 1,
                _ => {}
            }
            if depth == 0 && i + 1 < s.len() {
                wraps = false;
                break;
            }
        }
        if !wraps {
            break;
        }
        s = s[1..s.len() - 1].trim();
    }
    s
}

/// Split on a keyword at paren depth zero and outside string literals,
/// honoring word boundaries so `MAJOR` never splits on `OR`.
fn split_top_level<'a>(s: &'a str, keyword: &str) -> Vec<&'a str> {
    let bytes = s.as_bytes();
    let kw = keyword.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_quote = false;
    let mut start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        if in_quote {
            if b == b'\'' {
                in_quote = false;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' => {
                in_quote = true;
                i += 1;
                continue;
            }
            b'(' => {
                depth += 1;
                i += 1;
                continue;
            }
            b')' => {
                depth -= 1;
                i += 1;
                continue;
            }
            _ => {}
        }
        if depth == 0
            && i + kw.len() <= bytes.len()
            && bytes[i..i + kw.len()].eq_ignore_ascii_case(kw)
        {
            let prev_ok = i == 0 || !is_word_byte(bytes[i - 1]);
            let next_ok =
                i + kw.len() == bytes.len() || !is_word_byte(bytes[i + kw.len()]);
            if prev_ok && next_ok {
                let piece = s[start..i].trim();
                if !piece.is_empty() {
                    parts.push(piece);
                }
                i += kw.len();
                start = i;
                continue;
            }
        }
        i += 1;
    }
    let piece = s[start..].trim();
    if !piece.is_empty() {
        parts.push(piece);
    }
    parts
}

/// Split once at a standalone keyword such as `IN` or `LIKE`.
fn split_at_keyword<'a>(s: &'a str, keyword: &str) -> Option<(&'a str, &'a str)> {
    let bytes = s.as_bytes();
    let kw = keyword.as_bytes();
    let mut in_quote = false;
    for i in 0..bytes.len() {
        let b = bytes[i];
        if in_quote {
            if b == b'\'' {
                in_quote = false;
            }
            continue;
        }
        if b == b'\'' {
            in_quote = true;
            continue;
        }
        if i + kw.len() <= bytes.len() && bytes[i..i + kw.len()].eq_ignore_ascii_case(kw)
        {
            let prev_ok = i == 0 || !is_word_byte(bytes[i - 1]);
            let next_ok =
                i + kw.len() == bytes.len() || !is_word_byte(bytes[i + kw.len()]);
            if prev_ok && next_ok {
                let lhs = s[..i].trim();
                let rhs = s[i + kw.len()..].trim();
                if !lhs.is_empty() && !rhs.is_empty() {
                    return Some((lhs, rhs));
                }
            }
        }
    }
    None
}

fn find_outside_quotes(s: &str, symbol: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let sym = symbol.as_bytes();
    let mut in_quote = false;
    for i in 0..bytes.len() {
        let b = bytes[i];
        if in_quote {
            if b == b'\'' {
                in_quote = false;
            }
            continue;
        }
        if b == b'\'' {
            in_quote = true;
            continue;
        }
        if i + sym.len() <= bytes.len() && &bytes[i..i + sym.len()] == sym {
            return Some(i);
        }
    }
    None
}
