//! Quill Syntax - lexer, parser, and syntax tree
//!
//! This library turns Quill source text into an id-indexed syntax tree:
//! - Lexical analysis with a separate, position-ordered comment stream
//! - Recursive-descent parsing into an arena-backed tree
//! - A read-only tree index (node/parent/children lookups by id)

/// Quill syntax version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;
pub mod tree;

pub use ast::{ConstantKind, Node, NodeId, NodeKind};
pub use lexer::{Comment, CommentKind, Lexer};
pub use parser::{ParseError, Parser};
pub use span::Span;
pub use token::{Token, TokenKind};
pub use tree::SyntaxTree;

/// Parse Quill source into a syntax tree plus its ordered comment list.
///
/// Convenience wrapper over [`Lexer`] and [`Parser`] for callers that do
/// not need the raw token stream.
pub fn parse(source: &str) -> Result<(SyntaxTree, Vec<Comment>), ParseError> {
    let mut lexer = Lexer::new(source);
    let (tokens, comments) = lexer.tokenize();
    let parser = Parser::new(tokens);
    let tree = parser.parse()?;
    Ok((tree, comments))
}
