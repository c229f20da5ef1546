//! Width-aware rendering
//!
//! Walks the tree emitting tokens into a line buffer. Line breaks are
//! lazy: anchors record pending newlines instead of writing them, so a
//! later token can retract a break (a comma hugging the closing bracket
//! of a broken list) or widen it (a section header demanding a blank
//! line). The buffer commits only when the next token actually lands on
//! a new line.
//!
//! Containers open either a block or an inline region. Inside an inline
//! region every anchor collapses to simple padding; inside a block,
//! openers indent and break, closers dedent and break, and dividers
//! break on their configured side. Indentation is transactional: a
//! container restores the indent it entered with, so an unbalanced
//! anchor cannot leak indent into the rest of the document.

use quill_syntax::{CommentKind, NodeId, NodeKind, SyntaxTree};

use crate::comments::{AttachedComment, CommentMap};
use crate::config::FormatConfig;
use crate::error::FormatError;
use crate::linear::{LinearLength, LinearLengthMap};
use crate::multiline::MultilineMap;
use crate::rules::{Directive, RuleSet, Side};
use crate::scope::{scope_name, ScopeChain};
use crate::CancelToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Block,
    Inline,
}

pub struct Renderer<'a> {
    tree: &'a SyntaxTree,
    source: &'a str,
    config: &'a FormatConfig,
    rules: &'a RuleSet,
    comments: &'a CommentMap,
    multiline: &'a MultilineMap,
    lengths: &'a LinearLengthMap,
    cancel: &'a CancelToken,
    out: String,
    line: String,
    pending_newlines: u8,
    indent: usize,
    regions: Vec<Region>,
    started: bool,
}

impl<'a> Renderer<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tree: &'a SyntaxTree,
        source: &'a str,
        config: &'a FormatConfig,
        rules: &'a RuleSet,
        comments: &'a CommentMap,
        multiline: &'a MultilineMap,
        lengths: &'a LinearLengthMap,
        cancel: &'a CancelToken,
    ) -> Self {
        Self {
            tree,
            source,
            config,
            rules,
            comments,
            multiline,
            lengths,
            cancel,
            out: String::new(),
            line: String::new(),
            pending_newlines: 0,
            indent: 0,
            // root sentinel, so the document itself breaks freely
            regions: vec![Region::Block],
            started: false,
        }
    }

    pub fn render(mut self) -> Result<String, FormatError> {
        self.visit(self.tree.root(), &ScopeChain::root())?;

        let trailing = self.comments.trailing().to_vec();
        for comment in &trailing {
            self.emit_comment(comment);
        }

        // commit the last line and end with exactly one newline
        let tail = self.line.trim_end();
        self.out.push_str(tail);
        if !self.out.is_empty() {
            self.out.push_str(self.config.newline.as_str());
        }
        Ok(self.out)
    }

    fn visit(&mut self, id: NodeId, parent_chain: &ScopeChain) -> Result<(), FormatError> {
        if self.cancel.is_cancelled() {
            return Err(FormatError::Cancelled);
        }

        let node = self.tree.node(id);
        let chain = parent_chain.push(scope_name(&node.kind));
        let directive = self.rules.resolve(&chain);

        if node.is_leaf() {
            return self.emit_leaf(id, &directive);
        }

        if directive.is_container {
            let inline = self.decide_inline(id, &directive)?;
            self.regions.push(if inline {
                Region::Inline
            } else {
                Region::Block
            });
            let saved_indent = self.indent;

            self.visit_children(id, &chain)?;

            self.indent = saved_indent;
            let region = self.regions.pop();
            if region == Some(Region::Block) && !directive.skip_post_container_newline {
                self.ensure_pending(1);
            }
            Ok(())
        } else {
            self.visit_children(id, &chain)
        }
    }

    fn visit_children(&mut self, id: NodeId, chain: &ScopeChain) -> Result<(), FormatError> {
        let is_section = self.tree.node(id).kind == NodeKind::Section;
        let mut previous_member: Option<NodeId> = None;

        for index in 0..self.tree.node(id).children.len() {
            let child = self.tree.node(id).children[index];

            if is_section && self.tree.node(child).kind == NodeKind::SectionMember {
                if let Some(previous) = previous_member {
                    if self.wants_separating_blank(previous, child) {
                        self.ensure_pending(2);
                    }
                }
                previous_member = Some(child);
            }

            self.visit(child, chain)?;
        }
        Ok(())
    }

    /// Whether an adjacent pair of section members gets a blank line:
    /// their leading name segments differ, the next member carries a
    /// leading comment, or the source already held a blank line between
    /// them
    fn wants_separating_blank(&self, previous: NodeId, next: NodeId) -> bool {
        let previous_group = self.member_name_group(previous);
        let next_group = self.member_name_group(next);
        if previous_group != next_group {
            return true;
        }
        if !self.comments.before(self.first_leaf(next)).is_empty() {
            return true;
        }
        // raw text between the members, semicolon to first token
        let between = self
            .source
            .get(self.tree.node(previous).span.end..self.tree.node(next).span.start)
            .unwrap_or("");
        between.matches('\n').count() > 1
    }

    /// Leading dotted segment of a member's name, e.g. `Table` for
    /// `Table.RowCount`
    fn member_name_group(&self, member: NodeId) -> Option<String> {
        self.tree.node(member).children.iter().find_map(|&child| {
            match &self.tree.node(child).kind {
                NodeKind::Identifier(name) | NodeKind::QuotedIdentifier(name) => Some(
                    name.split('.')
                        .next()
                        .unwrap_or(name.as_str())
                        .to_string(),
                ),
                _ => None,
            }
        })
    }

    /// First token in a subtree
    fn first_leaf(&self, id: NodeId) -> NodeId {
        let node = self.tree.node(id);
        match node.children.first() {
            Some(&child) => self.first_leaf(child),
            None => id,
        }
    }

    // === Inline decision ===

    fn decide_inline(&self, id: NodeId, directive: &Directive) -> Result<bool, FormatError> {
        // nested containers inside an inline region stay inline
        if self.regions.last() == Some(&Region::Inline) {
            return Ok(true);
        }
        if !self.config.is_width_aware() || directive.ignore_inline {
            return Ok(false);
        }
        if self.comments.subtree_has_comments(id) {
            return Ok(false);
        }
        if self.multiline.get(id)? {
            return Ok(false);
        }
        match self.lengths.get(id)? {
            LinearLength::Finite(length) => {
                Ok(self.current_column() + length < self.config.max_width)
            }
            LinearLength::Infinite => Ok(false),
        }
    }

    fn current_column(&self) -> usize {
        if self.pending_newlines > 0 {
            self.indent * self.config.indent_size
        } else {
            // Tabs only appear as indentation; charge them a full level.
            self.line
                .chars()
                .map(|c| if c == '\t' { self.config.indent_size } else { 1 })
                .sum()
        }
    }

    // === Token emission ===

    fn emit_leaf(&mut self, id: NodeId, directive: &Directive) -> Result<(), FormatError> {
        let mut comment_broke_line = false;
        for comment in self.comments.before(id).to_vec() {
            if comment.forces_break() {
                comment_broke_line = true;
            }
            self.emit_comment(&comment);
        }

        let text = self
            .tree
            .node(id)
            .kind
            .leaf_text()
            .ok_or_else(|| {
                FormatError::invariant(format!("leaf node {} has no text", id.0))
            })?
            .to_string();

        let in_block = self.regions.last() == Some(&Region::Block);

        // a comma never hugs across a comment that owns its line
        if directive.clear_trailing && !comment_broke_line {
            self.pending_newlines = 0;
        }
        if directive.closes_block && in_block {
            self.indent = self.indent.saturating_sub(1);
            self.ensure_pending(1);
        }
        if directive.divider == Some(Side::Left) && in_block {
            self.ensure_pending(1);
        }
        if directive.left_padding {
            self.pad();
        }

        self.write(&text);

        if directive.opens_block && in_block {
            self.indent += 1;
            self.ensure_pending(1);
        }
        match directive.divider {
            Some(Side::Right) if in_block => self.ensure_pending(1),
            Some(Side::Right) => self.pad(),
            _ => {}
        }
        if directive.right_padding {
            self.pad();
        }
        if directive.line_break_after > 0 {
            self.ensure_pending(directive.line_break_after);
        }
        Ok(())
    }

    fn emit_comment(&mut self, comment: &AttachedComment) {
        match comment.kind {
            CommentKind::Line => {
                self.ensure_pending(1);
                self.write(&comment.text);
                self.ensure_pending(1);
            }
            CommentKind::Block if comment.contains_newline => {
                self.pad();
                self.write(&comment.text);
                self.ensure_pending(1);
            }
            CommentKind::Block => {
                self.pad();
                self.write(&comment.text);
                self.pad();
            }
        }
    }

    /// Append text to the current line, committing pending breaks first
    fn write(&mut self, text: &str) {
        if self.pending_newlines > 0 {
            let committed = self.line.trim_end().to_string();
            self.out.push_str(&committed);
            for _ in 0..self.pending_newlines {
                self.out.push_str(self.config.newline.as_str());
            }
            self.line = self.config.indent_unit().repeat(self.indent);
            self.pending_newlines = 0;
        }
        self.line.push_str(text);
        self.started = true;
    }

    /// Record that at least `count` newlines separate this token from the
    /// next one. Capped at one blank line; inert before the first token.
    fn ensure_pending(&mut self, count: u8) {
        if !self.started {
            return;
        }
        self.pending_newlines = self.pending_newlines.max(count).min(2);
    }

    /// Single space, skipped at line starts and after existing spaces
    fn pad(&mut self) {
        if self.pending_newlines == 0
            && !self.line.is_empty()
            && !self.line.ends_with(|c| c == ' ' || c == '\t')
        {
            self.line.push(' ');
        }
    }
}
