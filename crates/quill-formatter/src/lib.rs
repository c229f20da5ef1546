//! Quill source formatter
//!
//! Produces a canonical rendering of Quill source: comments are lifted
//! out of the token stream and re-attached to the tokens they precede,
//! every node is classified as inline or multiline up front, and a
//! rule-driven renderer emits the result within the configured width.
//!
//! ```
//! use quill_formatter::{format_source, FormatConfig};
//!
//! let formatted = format_source("let x = 1 in x", &FormatConfig::default()).unwrap();
//! assert_eq!(formatted, "let\n    x = 1\nin\n    x\n");
//! ```

pub mod comments;
pub mod config;
pub mod error;
pub mod linear;
pub mod multiline;
pub mod renderer;
pub mod rules;
pub mod scope;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use quill_syntax::{Comment, SyntaxTree};

pub use crate::config::{FormatConfig, IndentStyle, NewlineStyle};
pub use crate::error::FormatError;

use crate::comments::attach_comments;
use crate::linear::compute_linear_lengths;
use crate::multiline::classify_multiline;
use crate::renderer::Renderer;
use crate::rules::RuleSet;

/// Cooperative cancellation shared with the caller. Every pipeline stage
/// polls the token per node, so a cancelled format returns promptly with
/// [`FormatError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Format source text with the given configuration
pub fn format_source(source: &str, config: &FormatConfig) -> Result<String, FormatError> {
    format_source_with_cancel(source, config, &CancelToken::new())
}

/// Format source text, polling `cancel` throughout
pub fn format_source_with_cancel(
    source: &str,
    config: &FormatConfig,
    cancel: &CancelToken,
) -> Result<String, FormatError> {
    let (tree, comments) = quill_syntax::parse(source)?;
    format_tree(&tree, source, &comments, config, cancel)
}

/// Format an already-parsed tree and its lifted comments. The original
/// source text is consulted for section-member spacing only.
pub fn format_tree(
    tree: &SyntaxTree,
    source: &str,
    comments: &[Comment],
    config: &FormatConfig,
    cancel: &CancelToken,
) -> Result<String, FormatError> {
    let comment_map = attach_comments(tree, comments);
    let lengths = compute_linear_lengths(tree, cancel)?;
    let multiline = classify_multiline(tree, &lengths, &comment_map, cancel)?;
    let rules = RuleSet::with_defaults();
    Renderer::new(
        tree,
        source,
        config,
        &rules,
        &comment_map,
        &multiline,
        &lengths,
        cancel,
    )
    .render()
}

/// Whether `source` is already in canonical form
pub fn check_formatted(source: &str, config: &FormatConfig) -> Result<bool, FormatError> {
    Ok(format_source(source, config)? == source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_simple_expression() {
        let out = format_source("1  +   2", &FormatConfig::default()).unwrap();
        assert_eq!(out, "1 + 2\n");
    }

    #[test]
    fn test_check_formatted() {
        let config = FormatConfig::default();
        assert!(check_formatted("1 + 2\n", &config).unwrap());
        assert!(!check_formatted("1+2", &config).unwrap());
    }

    #[test]
    fn test_formatting_is_idempotent() {
        let config = FormatConfig::default();
        let once = format_source("let x = {1, 2} in f(x, 3)", &config).unwrap();
        let twice = format_source(&once, &config).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_member_gap_read_from_source_text() {
        // the blank line between same-group members lives only in the
        // raw text between their spans
        let source = "section s;\nTable.A = 1;\n\n\nTable.B = 2;";
        let (tree, comments) = quill_syntax::parse(source).unwrap();
        let out = format_tree(
            &tree,
            source,
            &comments,
            &FormatConfig::default(),
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(out, "section s;\n\nTable.A = 1;\n\nTable.B = 2;\n");
    }

    #[test]
    fn test_parse_error_is_propagated() {
        let err = format_source("1 +", &FormatConfig::default()).unwrap_err();
        assert!(matches!(err, FormatError::Parse(_)));
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err =
            format_source_with_cancel("1 + 2", &FormatConfig::default(), &cancel).unwrap_err();
        assert!(matches!(err, FormatError::Cancelled));
    }
}
