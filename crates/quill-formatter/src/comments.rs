//! Comment re-attachment
//!
//! The lexer lifts comments out of the token stream, so the tree never sees
//! them. Before rendering we attach each comment to the leaf token that
//! follows it in the source; the renderer then emits the comment just
//! before that token. Every composite node sitting above an attached
//! comment is recorded so inline rendering can be refused for it.

use std::collections::{HashMap, HashSet};

use quill_syntax::{Comment, CommentKind, NodeId, SyntaxTree};

/// A comment bound to the token that follows it
#[derive(Debug, Clone, PartialEq)]
pub struct AttachedComment {
    pub kind: CommentKind,
    /// Comment text including delimiters
    pub text: String,
    /// Whether the text spans more than one line
    pub contains_newline: bool,
}

impl AttachedComment {
    fn from_comment(comment: &Comment) -> Self {
        Self {
            kind: comment.kind,
            text: comment.text.clone(),
            contains_newline: comment.contains_newline,
        }
    }

    /// Line comments and multiline block comments cannot share a line with
    /// surrounding tokens
    pub fn forces_break(&self) -> bool {
        self.kind == CommentKind::Line || self.contains_newline
    }
}

/// Comments indexed by the leaf they precede
#[derive(Debug, Default)]
pub struct CommentMap {
    by_leaf: HashMap<NodeId, Vec<AttachedComment>>,
    /// Composite nodes whose subtree contains at least one comment
    containers: HashSet<NodeId>,
    /// Comments after the last token of the document
    trailing: Vec<AttachedComment>,
}

impl CommentMap {
    /// Comments to emit immediately before the given leaf
    pub fn before(&self, id: NodeId) -> &[AttachedComment] {
        self.by_leaf.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the subtree rooted at `id` contains any comment
    pub fn subtree_has_comments(&self, id: NodeId) -> bool {
        self.containers.contains(&id) || self.by_leaf.contains_key(&id)
    }

    /// Whether the subtree rooted at `id` contains a comment that cannot
    /// share a line with tokens
    pub fn subtree_forces_break(&self, id: NodeId, tree: &SyntaxTree) -> bool {
        if self.before(id).iter().any(AttachedComment::forces_break) {
            return true;
        }
        tree.node(id).children.iter().any(|&child| {
            // descend only where a comment is known to live
            (self.containers.contains(&child) || self.by_leaf.contains_key(&child))
                && self.subtree_forces_break(child, tree)
        })
    }

    /// Comments after the final token
    pub fn trailing(&self) -> &[AttachedComment] {
        &self.trailing
    }

    pub fn is_empty(&self) -> bool {
        self.by_leaf.is_empty() && self.trailing.is_empty()
    }
}

/// Attach every comment to the leaf token that follows it in source order
pub fn attach_comments(tree: &SyntaxTree, comments: &[Comment]) -> CommentMap {
    let mut map = CommentMap::default();
    if comments.is_empty() {
        return map;
    }

    // Leaves come out of a DFS in source order
    let mut leaves: Vec<NodeId> = Vec::new();
    collect_leaves(tree, tree.root(), &mut leaves);

    // comments arrive position-ordered, so one cursor suffices
    let mut cursor = 0;
    for comment in comments {
        while cursor < leaves.len() && tree.node(leaves[cursor]).span.start < comment.start {
            cursor += 1;
        }

        match leaves.get(cursor) {
            Some(&leaf) => {
                map.by_leaf
                    .entry(leaf)
                    .or_default()
                    .push(AttachedComment::from_comment(comment));

                let mut ancestor = tree.parent(leaf);
                while let Some(id) = ancestor {
                    if !map.containers.insert(id) {
                        break;
                    }
                    ancestor = tree.parent(id);
                }
            }
            None => map.trailing.push(AttachedComment::from_comment(comment)),
        }
    }

    map
}

fn collect_leaves(tree: &SyntaxTree, id: NodeId, out: &mut Vec<NodeId>) {
    let node = tree.node(id);
    if node.is_leaf() {
        out.push(id);
        return;
    }
    for &child in &node.children {
        collect_leaves(tree, child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quill_syntax::parse;

    fn attach(source: &str) -> (SyntaxTree, CommentMap) {
        let (tree, comments) = parse(source).expect("parse failed");
        let map = attach_comments(&tree, &comments);
        (tree, map)
    }

    #[test]
    fn test_no_comments() {
        let (_, map) = attach("1 + 2");
        assert!(map.is_empty());
    }

    #[test]
    fn test_comment_attaches_to_next_token() {
        let (tree, map) = attach("{1, // note\n2}");
        // the comment lands on the leaf for `2`
        let mut found = 0;
        for id in tree.ids() {
            let before = map.before(id);
            if !before.is_empty() {
                found += 1;
                assert_eq!(before[0].text, "// note");
                assert_eq!(tree.node(id).span.start, 12);
            }
        }
        assert_eq!(found, 1);
    }

    #[test]
    fn test_ancestors_are_marked() {
        let (tree, map) = attach("{1, /* x */ 2}");
        assert!(map.subtree_has_comments(tree.root()));
    }

    #[test]
    fn test_single_line_block_comment_does_not_force_break() {
        let (tree, map) = attach("{1, /* x */ 2}");
        assert!(!map.subtree_forces_break(tree.root(), &tree));
    }

    #[test]
    fn test_line_comment_forces_break() {
        let (tree, map) = attach("{1, // x\n2}");
        assert!(map.subtree_forces_break(tree.root(), &tree));
    }

    #[test]
    fn test_each_comment_lands_on_its_own_leaf() {
        // several comments in one document, some sharing a leaf, the
        // last one past every token
        let (tree, map) = attach("// a\n{1, // b\n/* c */ 2} // d");
        let mut attached: Vec<(usize, Vec<String>)> = Vec::new();
        for id in tree.ids() {
            let before = map.before(id);
            if !before.is_empty() {
                attached.push((
                    tree.node(id).span.start,
                    before.iter().map(|c| c.text.clone()).collect(),
                ));
            }
        }
        attached.sort();
        assert_eq!(
            attached,
            vec![
                (5, vec!["// a".to_string()]),
                (22, vec!["// b".to_string(), "/* c */".to_string()]),
            ]
        );
        assert_eq!(map.trailing().len(), 1);
        assert_eq!(map.trailing()[0].text, "// d");
    }

    #[test]
    fn test_trailing_comment() {
        let (_, map) = attach("1 + 2 // done");
        assert_eq!(map.trailing().len(), 1);
        assert_eq!(map.trailing()[0].text, "// done");
    }
}
