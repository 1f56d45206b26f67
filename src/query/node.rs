use crate::error::{QueryError, Result};
use crate::index::Index;
use std::fmt;
use std::sync::Arc;

/// Numeric comparison operator for typed attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
}

impl CompareOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "<" => Some(CompareOp::Less),
            "<=" => Some(CompareOp::LessEqual),
            ">" => Some(CompareOp::Greater),
            ">=" => Some(CompareOp::GreaterEqual),
            "==" => Some(CompareOp::Equal),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Less => "<",
            CompareOp::LessEqual => "<=",
            CompareOp::Greater => ">",
            CompareOp::GreaterEqual => ">=",
            CompareOp::Equal => "==",
        }
    }

    /// Whether `value <op> bound` holds.
    pub fn holds(self, value: i64, bound: i64) -> bool {
        match self {
            CompareOp::Less => value < bound,
            CompareOp::LessEqual => value <= bound,
            CompareOp::Greater => value > bound,
            CompareOp::GreaterEqual => value >= bound,
            CompareOp::Equal => value == bound,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Query expression tree node
///
/// Nodes are immutable once built; children sit behind `Arc` so that
/// evaluation threads can hold on to the subtrees they run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryNode {
    /// Fuzzy tag match
    Tag(String),
    /// Exact tag match
    Equals(String),
    /// A node shown under a different label, e.g. `year:2011` standing in
    /// for `Equals("year:2011")`. Everything delegates to `target`.
    Alias { label: String, target: Arc<QueryNode> },
    And(Arc<QueryNode>, Arc<QueryNode>),
    Or(Arc<QueryNode>, Arc<QueryNode>),
    Not(Arc<QueryNode>),
    /// Numeric comparison: `left` names a typed attribute, `right` is an
    /// integer literal.
    Compare {
        op: CompareOp,
        left: Arc<QueryNode>,
        right: Arc<QueryNode>,
    },
}

impl QueryNode {
    pub fn tag(tag: impl Into<String>) -> Self {
        QueryNode::Tag(tag.into())
    }

    pub fn equals(tag: impl Into<String>) -> Self {
        QueryNode::Equals(tag.into())
    }

    pub fn alias(label: impl Into<String>, target: QueryNode) -> Self {
        QueryNode::Alias {
            label: label.into(),
            target: Arc::new(target),
        }
    }

    pub fn and(left: QueryNode, right: QueryNode) -> Self {
        QueryNode::And(Arc::new(left), Arc::new(right))
    }

    pub fn or(left: QueryNode, right: QueryNode) -> Self {
        QueryNode::Or(Arc::new(left), Arc::new(right))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(operand: QueryNode) -> Self {
        QueryNode::Not(Arc::new(operand))
    }

    pub fn compare(op: CompareOp, left: QueryNode, right: QueryNode) -> Self {
        QueryNode::Compare {
            op,
            left: Arc::new(left),
            right: Arc::new(right),
        }
    }

    /// Validate the tree before evaluation.
    ///
    /// Depth-first, left before right; the first error found wins.
    pub fn check(&self, index: &dyn Index) -> Result<()> {
        match self {
            QueryNode::Tag(_) | QueryNode::Equals(_) => Ok(()),
            QueryNode::Alias { target, .. } => target.check(index),
            QueryNode::And(left, right) | QueryNode::Or(left, right) => {
                left.check(index)?;
                right.check(index)
            }
            QueryNode::Not(operand) => operand.check(index),
            QueryNode::Compare { left, right, .. } => {
                left.check(index)?;
                right.check(index)?;
                left.attribute_name()?;
                right.numeric_bound()?;
                Ok(())
            }
        }
    }

    /// Relative estimate of the work needed to evaluate this node.
    ///
    /// An AND only has to run its cheaper side against the full index, so
    /// it costs the minimum of its children. An OR runs both. A NOT needs
    /// a full scan on top of its operand.
    pub fn cost(&self, index: &dyn Index) -> u64 {
        match self {
            QueryNode::Tag(tag) => index.cost_tag_fuzzy(tag),
            QueryNode::Equals(tag) => index.cost_tag_exact(tag),
            QueryNode::Alias { target, .. } => target.cost(index),
            QueryNode::And(left, right) => left.cost(index).min(right.cost(index)),
            QueryNode::Or(left, right) => left.cost(index).saturating_add(right.cost(index)),
            QueryNode::Not(operand) => index.cost_all().saturating_add(operand.cost(index)),
            QueryNode::Compare { left, .. } => match left.attribute_name() {
                Ok(name) => index.cost_typed_tags(name),
                Err(_) => left.cost(index),
            },
        }
    }

    /// The typed attribute name this node stands for in a comparison.
    pub(crate) fn attribute_name(&self) -> Result<&str> {
        match self {
            QueryNode::Tag(name) => Ok(name.as_str()),
            other => Err(QueryError::type_error(format!(
                "left-hand side of comparison must be an attribute name, got {other}"
            ))),
        }
    }

    /// The integer literal this node stands for in a comparison.
    pub(crate) fn numeric_bound(&self) -> Result<i64> {
        match self {
            QueryNode::Tag(literal) => literal.parse().map_err(|e| {
                QueryError::type_error(format!("non-numeric right-hand side: {literal} ({e})"))
            }),
            other => Err(QueryError::type_error(format!(
                "unexpected right-hand side for comparison: {other}"
            ))),
        }
    }
}

/// Prints the tree back in query syntax, fully parenthesized.
impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryNode::Tag(tag) => write_tag(f, tag),
            QueryNode::Equals(tag) => {
                f.write_str("^")?;
                write_tag(f, tag)?;
                f.write_str("$")
            }
            QueryNode::Alias { label, .. } => write_label(f, label),
            QueryNode::And(left, right) => write!(f, "({left} && {right})"),
            QueryNode::Or(left, right) => write!(f, "({left} || {right})"),
            // `!` is greedy, so it needs its own parens inside a larger expression
            QueryNode::Not(operand) => write!(f, "(!{operand})"),
            QueryNode::Compare { op, left, right } => write!(f, "({left} {op} {right})"),
        }
    }
}

/// `name:value`, each half quoted as needed. Any split with two
/// non-empty halves parses back to the same label.
fn write_label(f: &mut fmt::Formatter<'_>, label: &str) -> fmt::Result {
    let split = label
        .match_indices(':')
        .map(|(i, _)| (&label[..i], &label[i + 1..]))
        .find(|(name, value)| !name.is_empty() && !value.is_empty());
    match split {
        Some((name, value)) => {
            write_tag(f, name)?;
            f.write_str(":")?;
            write_tag(f, value)
        }
        None => write_tag(f, label),
    }
}

fn write_tag(f: &mut fmt::Formatter<'_>, tag: &str) -> fmt::Result {
    let needs_quotes = tag.is_empty()
        || tag
            .chars()
            .any(|c| c.is_whitespace() || super::tokenizer::is_special(c));
    if needs_quotes {
        write!(f, "\"{tag}\"")
    } else {
        f.write_str(tag)
    }
}
