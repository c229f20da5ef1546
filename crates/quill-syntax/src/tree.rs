//! Arena-backed syntax tree with id-based lookups
//!
//! Nodes are owned by the tree; everything downstream borrows by
//! [`NodeId`] and annotates nodes through side tables keyed by id. The
//! tree is frozen once the parser returns it.

use crate::ast::{Node, NodeId, NodeKind};
use crate::span::Span;

/// An immutable syntax tree plus its index
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    parents: Vec<Option<NodeId>>,
    root: NodeId,
}

impl SyntaxTree {
    /// The root node id
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Total number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes (never true for parser output)
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by id
    ///
    /// # Panics
    /// Panics if the id does not belong to this tree. Use [`Self::try_node`]
    /// where a missing id is a recoverable contract violation.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Look up a node by id, returning `None` for foreign ids
    pub fn try_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Parent id of a node, `None` for the root
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(id.index()).copied().flatten()
    }

    /// Children of a node in source order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// All node ids in arena order (children precede parents)
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }
}

/// Write-side construction API, used only by the parser
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
    parents: Vec<Option<NodeId>>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a leaf node
    pub fn leaf(&mut self, kind: NodeKind, span: Span, line: u32) -> NodeId {
        self.push(Node {
            kind,
            children: Vec::new(),
            span,
            line,
        })
    }

    /// Add a composite node; the children must already exist
    pub fn node(&mut self, kind: NodeKind, children: Vec<NodeId>) -> NodeId {
        debug_assert!(!children.is_empty(), "composite node needs children");
        let span = children
            .iter()
            .map(|&c| self.nodes[c.index()].span)
            .reduce(|a, b| a.merge(b))
            .unwrap_or(Span::new(0, 0));
        let line = children
            .first()
            .map(|&c| self.nodes[c.index()].line)
            .unwrap_or(1);
        let id = self.push(Node {
            kind,
            children: children.clone(),
            span,
            line,
        });
        for child in children {
            self.parents[child.index()] = Some(id);
        }
        id
    }

    /// Freeze into an immutable tree rooted at `root`
    pub fn finish(self, root: NodeId) -> SyntaxTree {
        SyntaxTree {
            nodes: self.nodes,
            parents: self.parents,
            root,
        }
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.parents.push(None);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ConstantKind;

    #[test]
    fn test_build_and_index() {
        let mut b = TreeBuilder::new();
        let one = b.leaf(NodeKind::NumberLiteral("1".into()), Span::new(0, 1), 1);
        let plus = b.leaf(NodeKind::Constant(ConstantKind::Plus), Span::new(2, 3), 1);
        let two = b.leaf(NodeKind::NumberLiteral("2".into()), Span::new(4, 5), 1);
        let expr = b.node(NodeKind::ArithmeticExpression, vec![one, plus, two]);
        let tree = b.finish(expr);

        assert_eq!(tree.root(), expr);
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.children(expr), &[one, plus, two]);
        assert_eq!(tree.parent(one), Some(expr));
        assert_eq!(tree.parent(expr), None);
        assert_eq!(tree.node(expr).span, Span::new(0, 5));
        assert!(tree.node(one).is_leaf());
        assert!(!tree.node(expr).is_leaf());
    }

    #[test]
    fn test_try_node_out_of_range() {
        let mut b = TreeBuilder::new();
        let n = b.leaf(NodeKind::NullLiteral, Span::new(0, 4), 1);
        let tree = b.finish(n);
        assert!(tree.try_node(NodeId(99)).is_none());
        assert!(tree.try_node(n).is_some());
    }
}
