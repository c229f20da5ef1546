//! Multiline classification
//!
//! Decides, per node, whether its subtree must render across multiple
//! lines. The table is frozen before rendering: the renderer consults it
//! but never revises it, so a parent marked inline can rely on every
//! descendant having been marked inline too.
//!
//! Classification runs in two passes. The first is a bottom-up sweep where
//! any multiline child makes its parent multiline, with per-kind forcing
//! layered on top. The second adjusts structure the first pass cannot see:
//! collections sitting in ordinary expression positions are broken open,
//! and multiline binary chains propagate into their same-kind operands.

use std::collections::HashMap;

use quill_syntax::{NodeId, NodeKind, SyntaxTree};

use crate::comments::CommentMap;
use crate::error::FormatError;
use crate::linear::{LinearLength, LinearLengthMap};
use crate::CancelToken;

/// Inline width above which a breakable construct is broken
pub const MULTILINE_THRESHOLD: usize = 40;

/// Invocations of intrinsic constructors stay inline regardless of arity
const INLINE_INTRINSICS: &[&str] = &["#date", "#datetime", "#datetimezone", "#time", "#duration"];

/// Frozen per-node multiline decisions
#[derive(Debug, Default)]
pub struct MultilineMap {
    flags: HashMap<NodeId, bool>,
}

impl MultilineMap {
    pub fn get(&self, id: NodeId) -> Result<bool, FormatError> {
        self.flags
            .get(&id)
            .copied()
            .ok_or_else(|| FormatError::invariant(format!("no multiline entry for node {}", id.0)))
    }
}

/// Classify every node in the tree
pub fn classify_multiline(
    tree: &SyntaxTree,
    lengths: &LinearLengthMap,
    comments: &CommentMap,
    cancel: &CancelToken,
) -> Result<MultilineMap, FormatError> {
    let mut map = MultilineMap::default();
    classify(tree, tree.root(), lengths, comments, cancel, &mut map)?;
    break_expression_collections(tree, cancel, &mut map)?;
    propagate_binary_chains(tree, cancel, &mut map)?;
    Ok(map)
}

fn classify(
    tree: &SyntaxTree,
    id: NodeId,
    lengths: &LinearLengthMap,
    comments: &CommentMap,
    cancel: &CancelToken,
    map: &mut MultilineMap,
) -> Result<bool, FormatError> {
    if cancel.is_cancelled() {
        return Err(FormatError::Cancelled);
    }

    let node = tree.node(id);
    if node.is_leaf() {
        map.flags.insert(id, false);
        return Ok(false);
    }

    let mut result = false;
    for &child in &node.children {
        if classify(tree, child, lengths, comments, cancel, map)? {
            result = true;
        }
    }

    result = result || forced_by_kind(tree, id, lengths)?;

    if !result && comments.subtree_has_comments(id) && comments.subtree_forces_break(id, tree) {
        result = true;
    }

    map.flags.insert(id, result);
    Ok(result)
}

fn forced_by_kind(
    tree: &SyntaxTree,
    id: NodeId,
    lengths: &LinearLengthMap,
) -> Result<bool, FormatError> {
    let node = tree.node(id);
    let forced = match &node.kind {
        NodeKind::IfExpression
        | NodeKind::LetExpression
        | NodeKind::Section
        | NodeKind::SectionMember => true,

        NodeKind::ListExpression | NodeKind::RecordExpression => {
            let count = element_count(tree, id);
            count > 1 || (count == 1 && single_element_nests_collection(tree, id))
        }

        NodeKind::InvokeExpression => {
            element_count(tree, id) > 1
                && exceeds_threshold(lengths.get(id)?)
                && !invokes_inline_intrinsic(tree, id)
        }

        kind if kind.is_binary_operator() => exceeds_threshold(lengths.get(id)?),

        _ => false,
    };
    Ok(forced)
}

fn exceeds_threshold(length: LinearLength) -> bool {
    match length {
        LinearLength::Finite(n) => n > MULTILINE_THRESHOLD,
        LinearLength::Infinite => true,
    }
}

/// Number of comma-separated elements inside a bracketed node
fn element_count(tree: &SyntaxTree, id: NodeId) -> usize {
    tree.node(id)
        .children
        .iter()
        .find(|&&child| tree.node(child).kind == NodeKind::ArrayWrapper)
        .map(|&wrapper| tree.node(wrapper).children.len())
        .unwrap_or(0)
}

/// A one-element collection still breaks when that element is itself a
/// collection, or a pair whose value is one
fn single_element_nests_collection(tree: &SyntaxTree, id: NodeId) -> bool {
    let Some(&wrapper) = tree
        .node(id)
        .children
        .iter()
        .find(|&&child| tree.node(child).kind == NodeKind::ArrayWrapper)
    else {
        return false;
    };
    let csv = tree.node(wrapper).children[0];
    let element = tree.node(csv).children[0];
    is_collection(&tree.node(element).kind)
        || tree
            .node(element)
            .children
            .iter()
            .any(|&child| is_collection(&tree.node(child).kind))
}

fn is_collection(kind: &NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::ListExpression | NodeKind::RecordExpression
    )
}

fn invokes_inline_intrinsic(tree: &SyntaxTree, id: NodeId) -> bool {
    let callee = tree.node(tree.node(id).children[0]);
    callee
        .kind
        .leaf_text()
        .map(|text| INLINE_INTRINSICS.contains(&text))
        .unwrap_or(false)
}

/// A node the collection sweep looks through when finding the ancestor
/// that determines its position
fn is_transparent(kind: &NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Csv
            | NodeKind::ArrayWrapper
            | NodeKind::IdentifierPairedExpression
            | NodeKind::GeneralizedIdentifierPairedExpression
    )
}

/// Collections keep their inline chance only in argument-like positions
/// (invocation arguments, item access, function bodies, section members).
/// Anywhere else they are broken open along with the path above them.
fn break_expression_collections(
    tree: &SyntaxTree,
    cancel: &CancelToken,
    map: &mut MultilineMap,
) -> Result<(), FormatError> {
    for id in tree.ids() {
        if cancel.is_cancelled() {
            return Err(FormatError::Cancelled);
        }
        if !is_collection(&tree.node(id).kind) {
            continue;
        }
        // nothing to break open in `{}` or `[]`
        if element_count(tree, id) == 0 {
            continue;
        }

        let mut path = vec![id];
        let mut cursor = tree.parent(id);
        while let Some(ancestor) = cursor {
            if is_transparent(&tree.node(ancestor).kind) {
                path.push(ancestor);
                cursor = tree.parent(ancestor);
            } else {
                break;
            }
        }

        let exempt = cursor.is_some_and(|ancestor| {
            matches!(
                tree.node(ancestor).kind,
                NodeKind::ItemAccessExpression
                    | NodeKind::InvokeExpression
                    | NodeKind::FunctionExpression
                    | NodeKind::Section
                    | NodeKind::SectionMember
            )
        });
        if exempt {
            continue;
        }

        if let Some(ancestor) = cursor {
            path.push(ancestor);
        }
        for node in path {
            map.flags.insert(node, true);
        }
    }
    Ok(())
}

/// A broken binary chain breaks as a whole: `a and b and c` nests as
/// `(a and b) and c`, and marking only the outer node would leave the
/// inner chain glued to one line
fn propagate_binary_chains(
    tree: &SyntaxTree,
    cancel: &CancelToken,
    map: &mut MultilineMap,
) -> Result<(), FormatError> {
    let mut queue: Vec<NodeId> = tree
        .ids()
        .filter(|&id| {
            tree.node(id).kind.is_binary_operator() && map.flags.get(&id) == Some(&true)
        })
        .collect();

    while let Some(id) = queue.pop() {
        if cancel.is_cancelled() {
            return Err(FormatError::Cancelled);
        }
        let kind = &tree.node(id).kind;
        for &child in &tree.node(id).children {
            if tree.node(child).kind == *kind && map.flags.get(&child) != Some(&true) {
                map.flags.insert(child, true);
                queue.push(child);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_syntax::parse;

    use crate::comments::attach_comments;
    use crate::linear::compute_linear_lengths;

    fn classify_source(source: &str) -> (SyntaxTree, MultilineMap) {
        let (tree, comments) = parse(source).expect("parse failed");
        let cancel = CancelToken::new();
        let lengths = compute_linear_lengths(&tree, &cancel).unwrap();
        let comment_map = attach_comments(&tree, &comments);
        let map = classify_multiline(&tree, &lengths, &comment_map, &cancel).unwrap();
        (tree, map)
    }

    fn root_is_multiline(source: &str) -> bool {
        let (tree, map) = classify_source(source);
        map.get(tree.root()).unwrap()
    }

    #[test]
    fn test_short_binary_stays_inline() {
        assert!(!root_is_multiline("1 + 2"));
    }

    #[test]
    fn test_long_binary_breaks() {
        assert!(root_is_multiline(
            "aLongVariableName + anotherLongName + yetAnotherLongName"
        ));
    }

    #[test]
    fn test_if_and_let_always_break() {
        assert!(root_is_multiline("if a then 1 else 2"));
        assert!(root_is_multiline("let x = 1 in x"));
    }

    #[test]
    fn test_multi_element_list_breaks() {
        assert!(root_is_multiline("{1, 2}"));
    }

    #[test]
    fn test_single_element_list_in_argument_position() {
        // a one-element list inside an invocation may stay inline
        let (tree, map) = classify_source("f({1})");
        let invoke = tree.root();
        assert!(!map.get(invoke).unwrap());
    }

    #[test]
    fn test_singleton_list_at_top_level_breaks() {
        // expression position: the sweep breaks it open
        assert!(root_is_multiline("{1}"));
    }

    #[test]
    fn test_nested_singleton_collection_breaks() {
        assert!(root_is_multiline("f({{1}})"));
    }

    #[test]
    fn test_intrinsic_invocations_stay_inline() {
        assert!(!root_is_multiline(
            "#datetimezone(2024, 1, 1, 0, 0, 0, 9, 30)"
        ));
    }

    #[test]
    fn test_multiline_child_poisons_parent() {
        assert!(root_is_multiline("f(let x = 1 in x)"));
    }

    #[test]
    fn test_line_comment_forces_multiline() {
        assert!(root_is_multiline("f(1 // one\n)"));
    }

    #[test]
    fn test_binary_chain_breaks_as_a_whole() {
        let source =
            "aLongVariableName + anotherLongName + yetAnotherLongName + oneMoreLongName";
        let (tree, map) = classify_source(source);
        // the nested left chain is marked too
        let inner = tree.node(tree.root()).children[0];
        assert!(tree.node(inner).kind.is_binary_operator());
        assert!(map.get(inner).unwrap());
    }

    #[test]
    fn test_every_node_has_an_entry() {
        let (tree, map) = classify_source("let x = {1, f(2)} in x");
        for id in tree.ids() {
            assert!(map.get(id).is_ok());
        }
    }
}
