//! Linear length estimation
//!
//! Estimates how many columns a node would occupy if rendered on a single
//! line. Lengths are memoized bottom-up so each node is measured once.
//! Nodes that can never render inline (sections and section members) poison
//! the measurement: their length is `Infinite`, and infinity propagates to
//! every ancestor, the same way NaN propagates through arithmetic.

use std::collections::HashMap;

use quill_syntax::{ConstantKind, Node, NodeId, NodeKind, SyntaxTree};

use crate::error::FormatError;
use crate::CancelToken;

/// Width of a node rendered on one line, if that is possible at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinearLength {
    Finite(usize),
    Infinite,
}

impl LinearLength {
    fn add(self, other: LinearLength) -> LinearLength {
        match (self, other) {
            (LinearLength::Finite(a), LinearLength::Finite(b)) => LinearLength::Finite(a + b),
            _ => LinearLength::Infinite,
        }
    }
}

/// Memoized per-node linear lengths
#[derive(Debug, Default)]
pub struct LinearLengthMap {
    lengths: HashMap<NodeId, LinearLength>,
}

impl LinearLengthMap {
    pub fn get(&self, id: NodeId) -> Result<LinearLength, FormatError> {
        self.lengths
            .get(&id)
            .copied()
            .ok_or_else(|| FormatError::invariant(format!("no linear length for node {}", id.0)))
    }
}

/// Measure every node in the tree
pub fn compute_linear_lengths(
    tree: &SyntaxTree,
    cancel: &CancelToken,
) -> Result<LinearLengthMap, FormatError> {
    let mut map = LinearLengthMap::default();
    measure(tree, tree.root(), cancel, &mut map)?;
    Ok(map)
}

fn measure(
    tree: &SyntaxTree,
    id: NodeId,
    cancel: &CancelToken,
    map: &mut LinearLengthMap,
) -> Result<LinearLength, FormatError> {
    if cancel.is_cancelled() {
        return Err(FormatError::Cancelled);
    }
    if let Some(&known) = map.lengths.get(&id) {
        return Ok(known);
    }

    let node = tree.node(id);
    let length = match &node.kind {
        // Section documents never render on one line, but their
        // descendants still need entries for inline decisions
        NodeKind::Section | NodeKind::SectionMember => {
            for &child in &node.children {
                measure(tree, child, cancel, map)?;
            }
            LinearLength::Infinite
        }
        kind if node.is_leaf() => LinearLength::Finite(
            kind.leaf_text()
                .map(|text| text.chars().count())
                .unwrap_or(0),
        ),
        _ => {
            let mut total = LinearLength::Finite(0);
            for (index, &child) in node.children.iter().enumerate() {
                if index > 0 && space_between(tree, node, index) {
                    total = total.add(LinearLength::Finite(1));
                }
                total = total.add(measure(tree, child, cancel, map)?);
            }
            total
        }
    };

    map.lengths.insert(id, length);
    Ok(length)
}

/// Whether an inline rendering puts a space before child `index`
fn space_between(tree: &SyntaxTree, parent: &Node, index: usize) -> bool {
    let prev = tree.node(parent.children[index - 1]);
    let next = tree.node(parent.children[index]);

    // no space after an opening bracket, `@`, or a range dot
    if matches!(
        prev.kind,
        NodeKind::Constant(
            ConstantKind::OpenParen
                | ConstantKind::OpenBrace
                | ConstantKind::OpenBracket
                | ConstantKind::At
                | ConstantKind::DotDot
        )
    ) {
        return false;
    }
    // no space before a closing bracket or separator
    if matches!(
        next.kind,
        NodeKind::Constant(
            ConstantKind::CloseParen
                | ConstantKind::CloseBrace
                | ConstantKind::CloseBracket
                | ConstantKind::Comma
                | ConstantKind::Semicolon
                | ConstantKind::DotDot
        )
    ) {
        return false;
    }
    // postfix forms hug their head: `f(x)`, `xs{0}`, `r[field]`
    if matches!(
        parent.kind,
        NodeKind::InvokeExpression
            | NodeKind::ItemAccessExpression
            | NodeKind::FieldAccessExpression
    ) && index == 1
    {
        return false;
    }
    // unary operators hug their operand, except word operators
    if parent.kind == NodeKind::UnaryExpression
        && !matches!(prev.kind, NodeKind::Constant(ConstantKind::Not))
    {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quill_syntax::parse;

    fn lengths(source: &str) -> (SyntaxTree, LinearLengthMap) {
        let (tree, _) = parse(source).expect("parse failed");
        let map = compute_linear_lengths(&tree, &CancelToken::new()).expect("measure failed");
        (tree, map)
    }

    fn root_length(source: &str) -> LinearLength {
        let (tree, map) = lengths(source);
        map.get(tree.root()).unwrap()
    }

    #[test]
    fn test_binary_expression() {
        // `1 + 2` measures exactly its inline width
        assert_eq!(root_length("1+2"), LinearLength::Finite(5));
    }

    #[test]
    fn test_list_measures_inline_form() {
        // `{1, 2}` including the space after the comma
        assert_eq!(root_length("{1,2}"), LinearLength::Finite(6));
    }

    #[test]
    fn test_invoke_hugs_callee() {
        // `f(1)` has no space before the paren
        assert_eq!(root_length("f (1)"), LinearLength::Finite(4));
    }

    #[test]
    fn test_unary_minus_hugs_operand() {
        assert_eq!(root_length("- 5"), LinearLength::Finite(2));
        // `not x` keeps the space
        assert_eq!(root_length("not x"), LinearLength::Finite(5));
    }

    #[test]
    fn test_sections_are_infinite() {
        assert_eq!(root_length("section s; x = 1;"), LinearLength::Infinite);
    }

    #[test]
    fn test_infinity_poisons_ancestors() {
        // a let body cannot contain a section, but membership is what
        // matters: any infinite child makes the parent infinite
        let (tree, map) = lengths("section s; x = {1, 2};");
        assert_eq!(map.get(tree.root()).unwrap(), LinearLength::Infinite);
        // while the member's list stays finite
        let member = tree.node(tree.root()).children[3];
        let list = tree.node(member).children[2];
        assert_eq!(map.get(list).unwrap(), LinearLength::Finite(6));
    }

    #[test]
    fn test_section_member_values_are_measured() {
        // members are infinite, but every descendant still gets an entry
        let (tree, map) = lengths("section s;\nx = 1 + 2;\ny = f(1, {2});\nz = each 1;");
        for id in tree.ids() {
            assert!(map.get(id).is_ok(), "node {:?} unmeasured", id);
        }
    }

    #[test]
    fn test_cancellation() {
        let (tree, _) = parse("1 + 2").unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(
            compute_linear_lengths(&tree, &cancel),
            Err(FormatError::Cancelled)
        ));
    }
}
