//! Scope naming
//!
//! Every node gets a dotted scope name describing what it is, and rendering
//! tracks the chain of scope names from the current node up to the root.
//! Formatting rules match against that chain: the chain is shared
//! immutably, so pushing a scope is cheap and the chains of siblings share
//! their tails.

use std::borrow::Cow;
use std::rc::Rc;

use quill_syntax::{ConstantKind, NodeKind};

/// The dotted scope name for a node kind
pub fn scope_name(kind: &NodeKind) -> Cow<'static, str> {
    let name: &'static str = match kind {
        NodeKind::NumberLiteral(_) => "literal.number",
        NodeKind::TextLiteral(_) => "literal.text",
        NodeKind::LogicalLiteral(_) => "literal.logical",
        NodeKind::NullLiteral => "literal.null",
        NodeKind::NotImplemented => "literal.not-implemented",
        NodeKind::Identifier(_) => "identifier",
        NodeKind::QuotedIdentifier(_) => "identifier.quoted",
        NodeKind::GeneralizedIdentifier(_) => "identifier.generalized",
        NodeKind::PrimitiveType(_) => "type.name",
        NodeKind::Constant(constant) => return Cow::Borrowed(constant_scope_name(constant)),

        NodeKind::ListExpression => "list",
        NodeKind::RecordExpression => "record",
        NodeKind::ParenthesizedExpression => "paren",
        NodeKind::ItemAccessExpression => "item-access",
        NodeKind::InvokeExpression => "invoke",
        NodeKind::FieldAccessExpression => "field-access",
        NodeKind::Csv => "csv",
        NodeKind::ArrayWrapper => "elements",

        NodeKind::ArithmeticExpression => "arithmetic",
        NodeKind::EqualityExpression => "equality",
        NodeKind::RelationalExpression => "relational",
        NodeKind::LogicalExpression => "logical",
        NodeKind::NullCoalescingExpression => "coalesce",
        NodeKind::IsExpression => "is",
        NodeKind::AsExpression => "as",
        NodeKind::MetadataExpression => "meta",
        NodeKind::RangeExpression => "range",
        NodeKind::UnaryExpression => "unary",

        NodeKind::IfExpression => "if",
        NodeKind::EachExpression => "each",
        NodeKind::TryOtherwiseExpression => "try",
        NodeKind::ErrorRaisingExpression => "error",
        NodeKind::LetExpression => "let",

        NodeKind::FunctionExpression => "function",
        NodeKind::ParameterList => "parameters",
        NodeKind::Parameter => "parameter",
        NodeKind::AsNullablePrimitiveType => "type.annotation",
        NodeKind::IdentifierExpression => "identifier-ref",

        NodeKind::IdentifierPairedExpression => "pair.identifier",
        NodeKind::GeneralizedIdentifierPairedExpression => "pair.generalized",

        NodeKind::NullableType => "type.nullable",
        NodeKind::TypePrimaryType => "type.primary",
        NodeKind::ListType => "type.list",
        NodeKind::RecordType => "type.record",
        NodeKind::FieldSpecification => "type.field",
        NodeKind::FieldTypeSpecification => "type.field-spec",

        NodeKind::Section => "section",
        NodeKind::SectionMember => "section-member",
    };
    Cow::Borrowed(name)
}

fn constant_scope_name(constant: &ConstantKind) -> &'static str {
    match constant {
        ConstantKind::Let => "constant.keyword.let",
        ConstantKind::In => "constant.keyword.in",
        ConstantKind::If => "constant.keyword.if",
        ConstantKind::Then => "constant.keyword.then",
        ConstantKind::Else => "constant.keyword.else",
        ConstantKind::Each => "constant.keyword.each",
        ConstantKind::Try => "constant.keyword.try",
        ConstantKind::Otherwise => "constant.keyword.otherwise",
        ConstantKind::Error => "constant.keyword.error",
        ConstantKind::Section => "constant.keyword.section",
        ConstantKind::Shared => "constant.keyword.shared",
        ConstantKind::Type => "constant.keyword.type",
        ConstantKind::Nullable => "constant.keyword.nullable",
        ConstantKind::Optional => "constant.keyword.optional",

        ConstantKind::And => "constant.operator.and",
        ConstantKind::Or => "constant.operator.or",
        ConstantKind::Not => "constant.operator.not",
        ConstantKind::As => "constant.operator.as",
        ConstantKind::Is => "constant.operator.is",
        ConstantKind::Meta => "constant.operator.meta",
        ConstantKind::Plus => "constant.operator.plus",
        ConstantKind::Minus => "constant.operator.minus",
        ConstantKind::Star => "constant.operator.star",
        ConstantKind::Slash => "constant.operator.slash",
        ConstantKind::Ampersand => "constant.operator.ampersand",
        ConstantKind::Equal => "constant.operator.equals",
        ConstantKind::NotEqual => "constant.operator.not-equals",
        ConstantKind::Less => "constant.operator.less",
        ConstantKind::LessEqual => "constant.operator.less-equals",
        ConstantKind::Greater => "constant.operator.greater",
        ConstantKind::GreaterEqual => "constant.operator.greater-equals",
        ConstantKind::NullCoalescing => "constant.operator.coalesce",
        ConstantKind::FatArrow => "constant.operator.arrow",

        ConstantKind::OpenParen => "constant.punctuation.open-paren",
        ConstantKind::CloseParen => "constant.punctuation.close-paren",
        ConstantKind::OpenBrace => "constant.punctuation.open-brace",
        ConstantKind::CloseBrace => "constant.punctuation.close-brace",
        ConstantKind::OpenBracket => "constant.punctuation.open-bracket",
        ConstantKind::CloseBracket => "constant.punctuation.close-bracket",
        ConstantKind::Comma => "constant.punctuation.comma",
        ConstantKind::Semicolon => "constant.punctuation.semicolon",
        ConstantKind::At => "constant.punctuation.at",
        ConstantKind::DotDot => "constant.punctuation.range",
        ConstantKind::Ellipsis => "constant.punctuation.ellipsis",
    }
}

struct ScopeLink {
    name: Cow<'static, str>,
    parent: Option<Rc<ScopeLink>>,
}

/// An immutable chain of scope names, nearest scope first
#[derive(Clone, Default)]
pub struct ScopeChain {
    head: Option<Rc<ScopeLink>>,
}

impl ScopeChain {
    /// The empty chain at the document root
    pub fn root() -> Self {
        Self::default()
    }

    /// A new chain with `name` as the nearest scope
    pub fn push(&self, name: Cow<'static, str>) -> Self {
        Self {
            head: Some(Rc::new(ScopeLink {
                name,
                parent: self.head.clone(),
            })),
        }
    }

    /// The nearest scope name, if any
    pub fn current(&self) -> Option<&str> {
        self.head.as_deref().map(|link| link.name.as_ref())
    }

    /// Scope names from nearest to root
    pub fn names(&self) -> ScopeNames<'_> {
        ScopeNames {
            link: self.head.as_deref(),
        }
    }

    /// Depth of the chain
    pub fn depth(&self) -> usize {
        self.names().count()
    }
}

pub struct ScopeNames<'a> {
    link: Option<&'a ScopeLink>,
}

impl<'a> Iterator for ScopeNames<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let link = self.link?;
        self.link = link.parent.as_deref();
        Some(link.name.as_ref())
    }
}
