//! Syntax tree node definitions
//!
//! The tree is concrete: every token of the source appears as a leaf node
//! (constants, literals, identifiers), and composite nodes own their
//! delimiters as ordinary children. The kind set is closed; every stage of
//! the formatter dispatches over it with an exhaustive `match`.

use crate::span::Span;
use serde::{Deserialize, Serialize};

/// Stable integer id of a node within one [`crate::tree::SyntaxTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Index into the owning arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single syntax tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// What this node is
    pub kind: NodeKind,
    /// Ordered child references (empty for leaves)
    pub children: Vec<NodeId>,
    /// Source byte range covered by this node
    pub span: Span,
    /// Line number the node starts on (1-indexed)
    pub line: u32,
}

impl Node {
    /// Whether this node is a leaf (carries token text, has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Fixed keyword / punctuation / operator tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstantKind {
    // Keywords
    Let,
    In,
    If,
    Then,
    Else,
    Each,
    Try,
    Otherwise,
    Error,
    Section,
    Shared,
    Type,
    Nullable,
    Optional,
    As,
    Is,
    Meta,
    And,
    Or,
    Not,
    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Ampersand,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    NullCoalescing,
    // Punctuation
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    Comma,
    Semicolon,
    Equal,
    FatArrow,
    At,
    DotDot,
    Ellipsis,
}

impl ConstantKind {
    /// The exact source text of this constant
    pub fn text(&self) -> &'static str {
        match self {
            ConstantKind::Let => "let",
            ConstantKind::In => "in",
            ConstantKind::If => "if",
            ConstantKind::Then => "then",
            ConstantKind::Else => "else",
            ConstantKind::Each => "each",
            ConstantKind::Try => "try",
            ConstantKind::Otherwise => "otherwise",
            ConstantKind::Error => "error",
            ConstantKind::Section => "section",
            ConstantKind::Shared => "shared",
            ConstantKind::Type => "type",
            ConstantKind::Nullable => "nullable",
            ConstantKind::Optional => "optional",
            ConstantKind::As => "as",
            ConstantKind::Is => "is",
            ConstantKind::Meta => "meta",
            ConstantKind::And => "and",
            ConstantKind::Or => "or",
            ConstantKind::Not => "not",
            ConstantKind::Plus => "+",
            ConstantKind::Minus => "-",
            ConstantKind::Star => "*",
            ConstantKind::Slash => "/",
            ConstantKind::Ampersand => "&",
            ConstantKind::NotEqual => "<>",
            ConstantKind::Less => "<",
            ConstantKind::LessEqual => "<=",
            ConstantKind::Greater => ">",
            ConstantKind::GreaterEqual => ">=",
            ConstantKind::NullCoalescing => "??",
            ConstantKind::OpenParen => "(",
            ConstantKind::CloseParen => ")",
            ConstantKind::OpenBrace => "{",
            ConstantKind::CloseBrace => "}",
            ConstantKind::OpenBracket => "[",
            ConstantKind::CloseBracket => "]",
            ConstantKind::Comma => ",",
            ConstantKind::Semicolon => ";",
            ConstantKind::Equal => "=",
            ConstantKind::FatArrow => "=>",
            ConstantKind::At => "@",
            ConstantKind::DotDot => "..",
            ConstantKind::Ellipsis => "...",
        }
    }
}

/// The closed set of node kinds
///
/// Leaf kinds carry their source text (or constant identity); composite
/// kinds are structure only, with their tokens as child nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    // === Leaves ===
    /// Number literal, original text preserved
    NumberLiteral(String),
    /// Text literal, including quotes
    TextLiteral(String),
    /// `true` / `false`
    LogicalLiteral(bool),
    /// `null`
    NullLiteral,
    /// Plain (possibly dotted) identifier
    Identifier(String),
    /// `#"quoted identifier"` or `#date`-style name
    QuotedIdentifier(String),
    /// Identifier in a record-field position (keys allow keywords)
    GeneralizedIdentifier(String),
    /// Primitive type name (`number`, `text`, `any`, ...)
    PrimitiveType(String),
    /// Fixed keyword / operator / punctuation token
    Constant(ConstantKind),
    /// `...` placeholder expression
    NotImplemented,

    // === Wrapped collections ===
    /// `{ e1, e2 }`
    ListExpression,
    /// `[ k = v, ... ]`
    RecordExpression,
    /// `( e )`
    ParenthesizedExpression,
    /// `e{ i }`
    ItemAccessExpression,
    /// `f(a, b)`
    InvokeExpression,
    /// `e[field]`
    FieldAccessExpression,
    /// One element of a comma-separated list, including its trailing comma
    Csv,
    /// The ordered run of csv elements inside a wrapped construct
    ArrayWrapper,

    // === Operators ===
    /// `+ - * / &`
    ArithmeticExpression,
    /// `= <>`
    EqualityExpression,
    /// `< <= > >=`
    RelationalExpression,
    /// `and or`
    LogicalExpression,
    /// `??`
    NullCoalescingExpression,
    /// `is`
    IsExpression,
    /// `as`
    AsExpression,
    /// `meta`
    MetadataExpression,
    /// `a..b` (inside item access)
    RangeExpression,
    /// `-e`, `+e`, `not e`
    UnaryExpression,

    // === Control constructs ===
    /// `if c then t else f`
    IfExpression,
    /// `each e`
    EachExpression,
    /// `try e otherwise d`
    TryOtherwiseExpression,
    /// `error e`
    ErrorRaisingExpression,
    /// `let a = x, ... in body`
    LetExpression,

    // === Functions ===
    /// `(params) => body`
    FunctionExpression,
    /// `( p1, p2 )` in a function head
    ParameterList,
    /// `optional name as type`
    Parameter,
    /// `as nullable-primitive-type` clause
    AsNullablePrimitiveType,
    /// `@name` recursive reference
    IdentifierExpression,

    // === Pairs ===
    /// `name = expression` (let bindings, section members)
    IdentifierPairedExpression,
    /// `key = expression` (record fields)
    GeneralizedIdentifierPairedExpression,

    // === Type expressions ===
    /// `nullable T`
    NullableType,
    /// `type T`
    TypePrimaryType,
    /// `{ T }`
    ListType,
    /// `[ f = T, ... ]`
    RecordType,
    /// Field in a record type
    FieldSpecification,
    /// `= T` part of a field specification
    FieldTypeSpecification,

    // === Sections ===
    /// `section name; member*`
    Section,
    /// `[shared] name = expression ;`
    SectionMember,
}

impl NodeKind {
    /// The source text of a leaf kind, if this is a leaf kind
    pub fn leaf_text(&self) -> Option<&str> {
        match self {
            NodeKind::NumberLiteral(s)
            | NodeKind::TextLiteral(s)
            | NodeKind::Identifier(s)
            | NodeKind::QuotedIdentifier(s)
            | NodeKind::GeneralizedIdentifier(s)
            | NodeKind::PrimitiveType(s) => Some(s),
            NodeKind::LogicalLiteral(true) => Some("true"),
            NodeKind::LogicalLiteral(false) => Some("false"),
            NodeKind::NullLiteral => Some("null"),
            NodeKind::Constant(c) => Some(c.text()),
            NodeKind::NotImplemented => Some("..."),
            _ => None,
        }
    }

    /// Whether this kind is one of the binary-operator chain kinds
    pub fn is_binary_operator(&self) -> bool {
        matches!(
            self,
            NodeKind::ArithmeticExpression
                | NodeKind::EqualityExpression
                | NodeKind::RelationalExpression
                | NodeKind::LogicalExpression
                | NodeKind::NullCoalescingExpression
                | NodeKind::IsExpression
                | NodeKind::AsExpression
                | NodeKind::MetadataExpression
                | NodeKind::RangeExpression
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_text() {
        assert_eq!(ConstantKind::Let.text(), "let");
        assert_eq!(ConstantKind::NotEqual.text(), "<>");
        assert_eq!(ConstantKind::FatArrow.text(), "=>");
    }

    #[test]
    fn test_leaf_text() {
        assert_eq!(
            NodeKind::NumberLiteral("42".into()).leaf_text(),
            Some("42")
        );
        assert_eq!(NodeKind::LogicalLiteral(true).leaf_text(), Some("true"));
        assert_eq!(NodeKind::NullLiteral.leaf_text(), Some("null"));
        assert_eq!(NodeKind::ListExpression.leaf_text(), None);
    }

    #[test]
    fn test_binary_operator_kinds() {
        assert!(NodeKind::ArithmeticExpression.is_binary_operator());
        assert!(NodeKind::LogicalExpression.is_binary_operator());
        assert!(!NodeKind::ListExpression.is_binary_operator());
        assert!(!NodeKind::UnaryExpression.is_binary_operator());
    }
}
