//! Token types for lexical analysis
//!
//! Defines all token types recognized by the Quill lexer.

use crate::span::Span;
use serde::{Deserialize, Serialize};

/// Token type produced by the lexer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The source text of this token
    pub lexeme: String,
    /// Source location
    pub span: Span,
    /// Line number the token starts on (1-indexed)
    pub line: u32,
}

impl Token {
    /// Create a new token
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span, line: u32) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
            line,
        }
    }
}

/// Classification of token types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    /// Number literal (42, 3.14, 0xFF, 1e9)
    Number,
    /// Text literal ("hello", with `""` escaping a quote)
    Text,
    /// `true` keyword
    True,
    /// `false` keyword
    False,
    /// `null` keyword
    Null,
    /// Identifier (may contain interior dots: `Table.RowCount`)
    Identifier,
    /// Quoted identifier: `#"strange name"`
    QuotedIdentifier,
    /// Hash-prefixed identifier: `#date`, `#table`
    HashIdentifier,

    // Keywords
    /// `let` keyword
    Let,
    /// `in` keyword
    In,
    /// `if` keyword
    If,
    /// `then` keyword
    Then,
    /// `else` keyword
    Else,
    /// `each` keyword
    Each,
    /// `try` keyword
    Try,
    /// `otherwise` keyword
    Otherwise,
    /// `error` keyword
    Error,
    /// `section` keyword
    Section,
    /// `shared` keyword
    Shared,
    /// `type` keyword
    Type,
    /// `nullable` keyword
    Nullable,
    /// `optional` keyword
    Optional,
    /// `as` keyword
    As,
    /// `is` keyword
    Is,
    /// `meta` keyword
    Meta,
    /// `and` keyword
    And,
    /// `or` keyword
    Or,
    /// `not` keyword
    Not,

    // Operators
    /// `+` (addition)
    Plus,
    /// `-` (subtraction or negation)
    Minus,
    /// `*` (multiplication)
    Star,
    /// `/` (division)
    Slash,
    /// `&` (concatenation)
    Ampersand,
    /// `=` (equality or pairing)
    Equal,
    /// `<>` (inequality)
    NotEqual,
    /// `<` (less than)
    Less,
    /// `<=` (less than or equal)
    LessEqual,
    /// `>` (greater than)
    Greater,
    /// `>=` (greater than or equal)
    GreaterEqual,
    /// `??` (null coalescing)
    QuestionQuestion,

    // Punctuation
    /// `(` (left parenthesis)
    LeftParen,
    /// `)` (right parenthesis)
    RightParen,
    /// `{` (left brace)
    LeftBrace,
    /// `}` (right brace)
    RightBrace,
    /// `[` (left bracket)
    LeftBracket,
    /// `]` (right bracket)
    RightBracket,
    /// `;` (semicolon)
    Semicolon,
    /// `,` (comma)
    Comma,
    /// `=>` (fat arrow for function bodies)
    FatArrow,
    /// `@` (recursive reference)
    At,
    /// `..` (range)
    DotDot,
    /// `...` (not-implemented placeholder)
    Ellipsis,

    // Special
    /// End of file
    Eof,
    /// Lexer error
    LexError,
}

impl TokenKind {
    /// Check if a string is a keyword and return its token kind
    pub fn is_keyword(s: &str) -> Option<TokenKind> {
        match s {
            "let" => Some(TokenKind::Let),
            "in" => Some(TokenKind::In),
            "if" => Some(TokenKind::If),
            "then" => Some(TokenKind::Then),
            "else" => Some(TokenKind::Else),
            "each" => Some(TokenKind::Each),
            "try" => Some(TokenKind::Try),
            "otherwise" => Some(TokenKind::Otherwise),
            "error" => Some(TokenKind::Error),
            "section" => Some(TokenKind::Section),
            "shared" => Some(TokenKind::Shared),
            "type" => Some(TokenKind::Type),
            "nullable" => Some(TokenKind::Nullable),
            "optional" => Some(TokenKind::Optional),
            "as" => Some(TokenKind::As),
            "is" => Some(TokenKind::Is),
            "meta" => Some(TokenKind::Meta),
            "and" => Some(TokenKind::And),
            "or" => Some(TokenKind::Or),
            "not" => Some(TokenKind::Not),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            "null" => Some(TokenKind::Null),
            _ => None,
        }
    }

    /// Get the string representation of this token kind
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Number => "number",
            TokenKind::Text => "text",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::Identifier => "identifier",
            TokenKind::QuotedIdentifier => "quoted identifier",
            TokenKind::HashIdentifier => "hash identifier",
            TokenKind::Let => "let",
            TokenKind::In => "in",
            TokenKind::If => "if",
            TokenKind::Then => "then",
            TokenKind::Else => "else",
            TokenKind::Each => "each",
            TokenKind::Try => "try",
            TokenKind::Otherwise => "otherwise",
            TokenKind::Error => "error",
            TokenKind::Section => "section",
            TokenKind::Shared => "shared",
            TokenKind::Type => "type",
            TokenKind::Nullable => "nullable",
            TokenKind::Optional => "optional",
            TokenKind::As => "as",
            TokenKind::Is => "is",
            TokenKind::Meta => "meta",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Not => "not",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Ampersand => "&",
            TokenKind::Equal => "=",
            TokenKind::NotEqual => "<>",
            TokenKind::Less => "<",
            TokenKind::LessEqual => "<=",
            TokenKind::Greater => ">",
            TokenKind::GreaterEqual => ">=",
            TokenKind::QuestionQuestion => "??",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::LeftBrace => "{",
            TokenKind::RightBrace => "}",
            TokenKind::LeftBracket => "[",
            TokenKind::RightBracket => "]",
            TokenKind::Semicolon => ";",
            TokenKind::Comma => ",",
            TokenKind::FatArrow => "=>",
            TokenKind::At => "@",
            TokenKind::DotDot => "..",
            TokenKind::Ellipsis => "...",
            TokenKind::Eof => "EOF",
            TokenKind::LexError => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_creation() {
        let token = Token::new(TokenKind::Number, "42", Span::new(0, 2), 1);
        assert_eq!(token.kind, TokenKind::Number);
        assert_eq!(token.lexeme, "42");
        assert_eq!(token.span, Span::new(0, 2));
        assert_eq!(token.line, 1);
    }

    #[test]
    fn test_keyword_detection() {
        assert_eq!(TokenKind::is_keyword("let"), Some(TokenKind::Let));
        assert_eq!(TokenKind::is_keyword("in"), Some(TokenKind::In));
        assert_eq!(TokenKind::is_keyword("each"), Some(TokenKind::Each));
        assert_eq!(TokenKind::is_keyword("otherwise"), Some(TokenKind::Otherwise));
        assert_eq!(TokenKind::is_keyword("section"), Some(TokenKind::Section));
        assert_eq!(TokenKind::is_keyword("true"), Some(TokenKind::True));
    }

    #[test]
    fn test_non_keyword() {
        assert_eq!(TokenKind::is_keyword("foo"), None);
        assert_eq!(TokenKind::is_keyword("Let"), None); // Case-sensitive
        assert_eq!(TokenKind::is_keyword("sections"), None);
    }

    #[test]
    fn test_token_kind_as_str() {
        assert_eq!(TokenKind::Let.as_str(), "let");
        assert_eq!(TokenKind::NotEqual.as_str(), "<>");
        assert_eq!(TokenKind::QuestionQuestion.as_str(), "??");
        assert_eq!(TokenKind::FatArrow.as_str(), "=>");
    }
}
