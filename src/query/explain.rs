use crate::index::Index;
use crate::query::node::QueryNode;
use std::fmt;

/// Indented rendering of a tree with the index's cost for every node.
///
/// ```text
/// and (cost 2)
///   tag ~= undertwo (cost 2)
///   not (cost 6)
///     tag ~= 0 (cost 1)
/// ```
pub struct Explain<'a> {
    node: &'a QueryNode,
    index: &'a dyn Index,
}

impl QueryNode {
    pub fn explain<'a>(&'a self, index: &'a dyn Index) -> Explain<'a> {
        Explain { node: self, index }
    }
}

impl fmt::Display for Explain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self.node, self.index, 0)
    }
}

fn write_node(
    f: &mut fmt::Formatter<'_>,
    node: &QueryNode,
    index: &dyn Index,
    depth: usize,
) -> fmt::Result {
    let indent = depth * 2;
    let cost = node.cost(index);

    match node {
        QueryNode::Tag(tag) => writeln!(f, "{:indent$}tag ~= {tag} (cost {cost})", ""),
        QueryNode::Equals(tag) => writeln!(f, "{:indent$}tag == {tag} (cost {cost})", ""),
        QueryNode::Alias { label, .. } => writeln!(f, "{:indent$}{label} (cost {cost})", ""),
        QueryNode::And(left, right) => {
            writeln!(f, "{:indent$}and (cost {cost})", "")?;
            write_node(f, left, index, depth + 1)?;
            write_node(f, right, index, depth + 1)
        }
        QueryNode::Or(left, right) => {
            writeln!(f, "{:indent$}or (cost {cost})", "")?;
            write_node(f, left, index, depth + 1)?;
            write_node(f, right, index, depth + 1)
        }
        QueryNode::Not(operand) => {
            writeln!(f, "{:indent$}not (cost {cost})", "")?;
            write_node(f, operand, index, depth + 1)
        }
        QueryNode::Compare { op, left, right } => {
            writeln!(f, "{:indent$}{op} (cost {cost})", "")?;
            write_node(f, left, index, depth + 1)?;
            write_node(f, right, index, depth + 1)
        }
    }
}
