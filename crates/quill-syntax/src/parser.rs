//! Parsing (tokens to syntax tree)
//!
//! Recursive descent with a precedence ladder for binary operators. The
//! parser builds a concrete tree: every token becomes a leaf node, so the
//! formatter can re-emit the program token by token.

use thiserror::Error;

use crate::ast::{ConstantKind, NodeId, NodeKind};
use crate::span::Span;
use crate::token::{Token, TokenKind};
use crate::tree::{SyntaxTree, TreeBuilder};

/// A fatal parse (or lex) error
#[derive(Debug, Clone, PartialEq, Error)]
#[error("parse error: {message} (bytes {}..{})", span.start, span.end)]
pub struct ParseError {
    /// Human-readable description
    pub message: String,
    /// Source location of the offending token
    pub span: Span,
}

impl ParseError {
    fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Parser state for building a syntax tree from tokens
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    builder: TreeBuilder,
}

impl Parser {
    /// Create a new parser for the given tokens (comments already removed)
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            builder: TreeBuilder::new(),
        }
    }

    /// Parse a document: a section document or a single expression
    pub fn parse(mut self) -> Result<SyntaxTree, ParseError> {
        let root = if self.check(TokenKind::Section) {
            self.parse_section()?
        } else {
            self.parse_expression()?
        };

        if !self.check(TokenKind::Eof) {
            let tok = self.peek().clone();
            return Err(ParseError::new(
                format!("unexpected '{}' after document", tok.lexeme),
                tok.span,
            ));
        }

        Ok(self.builder.finish(root))
    }

    // === Sections ===

    fn parse_section(&mut self) -> Result<NodeId, ParseError> {
        let section_kw = self.constant(TokenKind::Section, ConstantKind::Section)?;
        let name = self.identifier_leaf("a section name")?;
        let semicolon = self.constant(TokenKind::Semicolon, ConstantKind::Semicolon)?;

        let mut children = vec![section_kw, name, semicolon];
        while !self.check(TokenKind::Eof) {
            children.push(self.parse_section_member()?);
        }
        Ok(self.builder.node(NodeKind::Section, children))
    }

    fn parse_section_member(&mut self) -> Result<NodeId, ParseError> {
        let mut children = Vec::new();
        if self.check(TokenKind::Shared) {
            children.push(self.constant(TokenKind::Shared, ConstantKind::Shared)?);
        }
        children.push(self.identifier_leaf("a member name")?);
        children.push(self.constant(TokenKind::Equal, ConstantKind::Equal)?);
        children.push(self.parse_expression()?);
        children.push(self.constant(TokenKind::Semicolon, ConstantKind::Semicolon)?);
        Ok(self.builder.node(NodeKind::SectionMember, children))
    }

    // === Expressions ===

    fn parse_expression(&mut self) -> Result<NodeId, ParseError> {
        match self.peek().kind {
            TokenKind::If => self.parse_if(),
            TokenKind::Let => self.parse_let(),
            TokenKind::Each => self.parse_each(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Error => self.parse_error_raising(),
            TokenKind::Type => self.parse_type_primary(),
            TokenKind::LeftParen if self.looks_like_function() => self.parse_function(),
            _ => self.parse_coalesce(),
        }
    }

    fn parse_if(&mut self) -> Result<NodeId, ParseError> {
        let if_kw = self.constant(TokenKind::If, ConstantKind::If)?;
        let cond = self.parse_expression()?;
        let then_kw = self.constant(TokenKind::Then, ConstantKind::Then)?;
        let then_expr = self.parse_expression()?;
        let else_kw = self.constant(TokenKind::Else, ConstantKind::Else)?;
        let else_expr = self.parse_expression()?;
        Ok(self.builder.node(
            NodeKind::IfExpression,
            vec![if_kw, cond, then_kw, then_expr, else_kw, else_expr],
        ))
    }

    fn parse_let(&mut self) -> Result<NodeId, ParseError> {
        let let_kw = self.constant(TokenKind::Let, ConstantKind::Let)?;

        let mut csvs = Vec::new();
        loop {
            let name = self.identifier_leaf("a binding name")?;
            let equal = self.constant(TokenKind::Equal, ConstantKind::Equal)?;
            let value = self.parse_expression()?;
            let pair = self
                .builder
                .node(NodeKind::IdentifierPairedExpression, vec![name, equal, value]);

            if self.check(TokenKind::Comma) {
                let comma = self.constant(TokenKind::Comma, ConstantKind::Comma)?;
                csvs.push(self.builder.node(NodeKind::Csv, vec![pair, comma]));
            } else {
                csvs.push(self.builder.node(NodeKind::Csv, vec![pair]));
                break;
            }
        }
        let bindings = self.builder.node(NodeKind::ArrayWrapper, csvs);

        let in_kw = self.constant(TokenKind::In, ConstantKind::In)?;
        let body = self.parse_expression()?;
        Ok(self
            .builder
            .node(NodeKind::LetExpression, vec![let_kw, bindings, in_kw, body]))
    }

    fn parse_each(&mut self) -> Result<NodeId, ParseError> {
        let each_kw = self.constant(TokenKind::Each, ConstantKind::Each)?;
        let body = self.parse_expression()?;
        Ok(self.builder.node(NodeKind::EachExpression, vec![each_kw, body]))
    }

    fn parse_try(&mut self) -> Result<NodeId, ParseError> {
        let try_kw = self.constant(TokenKind::Try, ConstantKind::Try)?;
        let protected = self.parse_expression()?;
        let mut children = vec![try_kw, protected];
        if self.check(TokenKind::Otherwise) {
            children.push(self.constant(TokenKind::Otherwise, ConstantKind::Otherwise)?);
            children.push(self.parse_expression()?);
        }
        Ok(self.builder.node(NodeKind::TryOtherwiseExpression, children))
    }

    fn parse_error_raising(&mut self) -> Result<NodeId, ParseError> {
        let error_kw = self.constant(TokenKind::Error, ConstantKind::Error)?;
        let value = self.parse_expression()?;
        Ok(self
            .builder
            .node(NodeKind::ErrorRaisingExpression, vec![error_kw, value]))
    }

    // === Functions ===

    /// Lookahead: does `(` start a parameter list followed by `=>`?
    fn looks_like_function(&self) -> bool {
        let mut depth = 0usize;
        let mut i = self.current;
        while let Some(tok) = self.tokens.get(i) {
            match tok.kind {
                TokenKind::LeftParen | TokenKind::LeftBrace | TokenKind::LeftBracket => depth += 1,
                TokenKind::RightParen | TokenKind::RightBrace | TokenKind::RightBracket => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return match self.tokens.get(i + 1).map(|t| t.kind) {
                            Some(TokenKind::FatArrow) => true,
                            // `) as <type> =>` is a function with a return
                            // type, while `) as <type>` alone is a cast
                            Some(TokenKind::As) => {
                                let mut j = i + 2;
                                if self.tokens.get(j).map(|t| t.kind)
                                    == Some(TokenKind::Nullable)
                                {
                                    j += 1;
                                }
                                self.tokens.get(j + 1).map(|t| t.kind)
                                    == Some(TokenKind::FatArrow)
                            }
                            _ => false,
                        };
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            i += 1;
        }
        false
    }

    fn parse_function(&mut self) -> Result<NodeId, ParseError> {
        let params = self.parse_parameter_list()?;
        let mut children = vec![params];
        if self.check(TokenKind::As) {
            children.push(self.parse_as_nullable_primitive_type()?);
        }
        children.push(self.constant(TokenKind::FatArrow, ConstantKind::FatArrow)?);
        children.push(self.parse_expression()?);
        Ok(self.builder.node(NodeKind::FunctionExpression, children))
    }

    fn parse_parameter_list(&mut self) -> Result<NodeId, ParseError> {
        let open = self.constant(TokenKind::LeftParen, ConstantKind::OpenParen)?;
        let mut children = vec![open];

        if !self.check(TokenKind::RightParen) {
            let mut csvs = Vec::new();
            loop {
                let param = self.parse_parameter()?;
                if self.check(TokenKind::Comma) {
                    let comma = self.constant(TokenKind::Comma, ConstantKind::Comma)?;
                    csvs.push(self.builder.node(NodeKind::Csv, vec![param, comma]));
                } else {
                    csvs.push(self.builder.node(NodeKind::Csv, vec![param]));
                    break;
                }
            }
            children.push(self.builder.node(NodeKind::ArrayWrapper, csvs));
        }

        children.push(self.constant(TokenKind::RightParen, ConstantKind::CloseParen)?);
        Ok(self.builder.node(NodeKind::ParameterList, children))
    }

    fn parse_parameter(&mut self) -> Result<NodeId, ParseError> {
        let mut children = Vec::new();
        if self.check(TokenKind::Optional) {
            children.push(self.constant(TokenKind::Optional, ConstantKind::Optional)?);
        }
        children.push(self.identifier_leaf("a parameter name")?);
        if self.check(TokenKind::As) {
            children.push(self.parse_as_nullable_primitive_type()?);
        }
        Ok(self.builder.node(NodeKind::Parameter, children))
    }

    fn parse_as_nullable_primitive_type(&mut self) -> Result<NodeId, ParseError> {
        let as_kw = self.constant(TokenKind::As, ConstantKind::As)?;
        let ty = self.parse_nullable_primitive_type()?;
        Ok(self
            .builder
            .node(NodeKind::AsNullablePrimitiveType, vec![as_kw, ty]))
    }

    // === Types ===

    fn parse_type_primary(&mut self) -> Result<NodeId, ParseError> {
        let type_kw = self.constant(TokenKind::Type, ConstantKind::Type)?;
        let ty = match self.peek().kind {
            TokenKind::LeftBrace => self.parse_list_type()?,
            TokenKind::LeftBracket => self.parse_record_type()?,
            _ => self.parse_nullable_primitive_type()?,
        };
        Ok(self
            .builder
            .node(NodeKind::TypePrimaryType, vec![type_kw, ty]))
    }

    fn parse_list_type(&mut self) -> Result<NodeId, ParseError> {
        let open = self.constant(TokenKind::LeftBrace, ConstantKind::OpenBrace)?;
        let item = self.parse_item_type()?;
        let close = self.constant(TokenKind::RightBrace, ConstantKind::CloseBrace)?;
        Ok(self.builder.node(NodeKind::ListType, vec![open, item, close]))
    }

    fn parse_record_type(&mut self) -> Result<NodeId, ParseError> {
        let open = self.constant(TokenKind::LeftBracket, ConstantKind::OpenBracket)?;
        let mut children = vec![open];

        if !self.check(TokenKind::RightBracket) {
            let mut csvs = Vec::new();
            loop {
                let field = self.parse_field_specification()?;
                if self.check(TokenKind::Comma) {
                    let comma = self.constant(TokenKind::Comma, ConstantKind::Comma)?;
                    csvs.push(self.builder.node(NodeKind::Csv, vec![field, comma]));
                } else {
                    csvs.push(self.builder.node(NodeKind::Csv, vec![field]));
                    break;
                }
            }
            children.push(self.builder.node(NodeKind::ArrayWrapper, csvs));
        }

        children.push(self.constant(TokenKind::RightBracket, ConstantKind::CloseBracket)?);
        Ok(self.builder.node(NodeKind::RecordType, children))
    }

    fn parse_field_specification(&mut self) -> Result<NodeId, ParseError> {
        let name = self.generalized_identifier_leaf("a field name")?;
        let mut children = vec![name];
        if self.check(TokenKind::Equal) {
            let equal = self.constant(TokenKind::Equal, ConstantKind::Equal)?;
            let ty = self.parse_item_type()?;
            children.push(
                self.builder
                    .node(NodeKind::FieldTypeSpecification, vec![equal, ty]),
            );
        }
        Ok(self.builder.node(NodeKind::FieldSpecification, children))
    }

    fn parse_item_type(&mut self) -> Result<NodeId, ParseError> {
        match self.peek().kind {
            TokenKind::LeftBrace => self.parse_list_type(),
            TokenKind::LeftBracket => self.parse_record_type(),
            _ => self.parse_nullable_primitive_type(),
        }
    }

    fn parse_nullable_primitive_type(&mut self) -> Result<NodeId, ParseError> {
        if self.check(TokenKind::Nullable) {
            let nullable_kw = self.constant(TokenKind::Nullable, ConstantKind::Nullable)?;
            let ty = self.primitive_type_leaf()?;
            Ok(self
                .builder
                .node(NodeKind::NullableType, vec![nullable_kw, ty]))
        } else {
            self.primitive_type_leaf()
        }
    }

    fn primitive_type_leaf(&mut self) -> Result<NodeId, ParseError> {
        let tok = self.peek().clone();
        // Primitive type names are contextual identifiers plus a few
        // keywords that double as types (`type`, `null`).
        match tok.kind {
            TokenKind::Identifier | TokenKind::Null | TokenKind::Type => {
                self.advance();
                Ok(self.builder.leaf(
                    NodeKind::PrimitiveType(tok.lexeme.clone()),
                    tok.span,
                    tok.line,
                ))
            }
            _ => Err(ParseError::new(
                format!("expected a type name, found '{}'", tok.lexeme),
                tok.span,
            )),
        }
    }

    // === Binary operator ladder ===

    fn parse_coalesce(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_logical_or()?;
        while self.check(TokenKind::QuestionQuestion) {
            let op = self.constant(TokenKind::QuestionQuestion, ConstantKind::NullCoalescing)?;
            let right = self.parse_logical_or()?;
            left = self
                .builder
                .node(NodeKind::NullCoalescingExpression, vec![left, op, right]);
        }
        Ok(left)
    }

    fn parse_logical_or(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_logical_and()?;
        while self.check(TokenKind::Or) {
            let op = self.constant(TokenKind::Or, ConstantKind::Or)?;
            let right = self.parse_logical_and()?;
            left = self
                .builder
                .node(NodeKind::LogicalExpression, vec![left, op, right]);
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_equality()?;
        while self.check(TokenKind::And) {
            let op = self.constant(TokenKind::And, ConstantKind::And)?;
            let right = self.parse_equality()?;
            left = self
                .builder
                .node(NodeKind::LogicalExpression, vec![left, op, right]);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Equal => self.constant(TokenKind::Equal, ConstantKind::Equal)?,
                TokenKind::NotEqual => self.constant(TokenKind::NotEqual, ConstantKind::NotEqual)?,
                _ => break,
            };
            let right = self.parse_relational()?;
            left = self
                .builder
                .node(NodeKind::EqualityExpression, vec![left, op, right]);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Less => self.constant(TokenKind::Less, ConstantKind::Less)?,
                TokenKind::LessEqual => {
                    self.constant(TokenKind::LessEqual, ConstantKind::LessEqual)?
                }
                TokenKind::Greater => self.constant(TokenKind::Greater, ConstantKind::Greater)?,
                TokenKind::GreaterEqual => {
                    self.constant(TokenKind::GreaterEqual, ConstantKind::GreaterEqual)?
                }
                _ => break,
            };
            let right = self.parse_additive()?;
            left = self
                .builder
                .node(NodeKind::RelationalExpression, vec![left, op, right]);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => self.constant(TokenKind::Plus, ConstantKind::Plus)?,
                TokenKind::Minus => self.constant(TokenKind::Minus, ConstantKind::Minus)?,
                TokenKind::Ampersand => {
                    self.constant(TokenKind::Ampersand, ConstantKind::Ampersand)?
                }
                _ => break,
            };
            let right = self.parse_multiplicative()?;
            left = self
                .builder
                .node(NodeKind::ArithmeticExpression, vec![left, op, right]);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_as()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => self.constant(TokenKind::Star, ConstantKind::Star)?,
                TokenKind::Slash => self.constant(TokenKind::Slash, ConstantKind::Slash)?,
                _ => break,
            };
            let right = self.parse_as()?;
            left = self
                .builder
                .node(NodeKind::ArithmeticExpression, vec![left, op, right]);
        }
        Ok(left)
    }

    fn parse_as(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_is()?;
        while self.check(TokenKind::As) {
            let op = self.constant(TokenKind::As, ConstantKind::As)?;
            let ty = self.parse_nullable_primitive_type()?;
            left = self.builder.node(NodeKind::AsExpression, vec![left, op, ty]);
        }
        Ok(left)
    }

    fn parse_is(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_metadata()?;
        while self.check(TokenKind::Is) {
            let op = self.constant(TokenKind::Is, ConstantKind::Is)?;
            let ty = self.parse_nullable_primitive_type()?;
            left = self.builder.node(NodeKind::IsExpression, vec![left, op, ty]);
        }
        Ok(left)
    }

    fn parse_metadata(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_unary()?;
        while self.check(TokenKind::Meta) {
            let op = self.constant(TokenKind::Meta, ConstantKind::Meta)?;
            let right = self.parse_unary()?;
            left = self
                .builder
                .node(NodeKind::MetadataExpression, vec![left, op, right]);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<NodeId, ParseError> {
        let op = match self.peek().kind {
            TokenKind::Minus => Some(self.constant(TokenKind::Minus, ConstantKind::Minus)?),
            TokenKind::Plus => Some(self.constant(TokenKind::Plus, ConstantKind::Plus)?),
            TokenKind::Not => Some(self.constant(TokenKind::Not, ConstantKind::Not)?),
            _ => None,
        };
        match op {
            Some(op) => {
                let operand = self.parse_unary()?;
                Ok(self
                    .builder
                    .node(NodeKind::UnaryExpression, vec![op, operand]))
            }
            None => self.parse_postfix(),
        }
    }

    // === Postfix (invoke / item access / field access) ===

    fn parse_postfix(&mut self) -> Result<NodeId, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek().kind {
                TokenKind::LeftParen => {
                    expr = self.parse_invoke(expr)?;
                }
                TokenKind::LeftBrace => {
                    expr = self.parse_item_access(expr)?;
                }
                TokenKind::LeftBracket => {
                    expr = self.parse_field_access(expr)?;
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_invoke(&mut self, head: NodeId) -> Result<NodeId, ParseError> {
        let open = self.constant(TokenKind::LeftParen, ConstantKind::OpenParen)?;
        let mut children = vec![head, open];

        if !self.check(TokenKind::RightParen) {
            let mut csvs = Vec::new();
            loop {
                let arg = self.parse_expression()?;
                if self.check(TokenKind::Comma) {
                    let comma = self.constant(TokenKind::Comma, ConstantKind::Comma)?;
                    csvs.push(self.builder.node(NodeKind::Csv, vec![arg, comma]));
                } else {
                    csvs.push(self.builder.node(NodeKind::Csv, vec![arg]));
                    break;
                }
            }
            children.push(self.builder.node(NodeKind::ArrayWrapper, csvs));
        }

        children.push(self.constant(TokenKind::RightParen, ConstantKind::CloseParen)?);
        Ok(self.builder.node(NodeKind::InvokeExpression, children))
    }

    fn parse_item_access(&mut self, head: NodeId) -> Result<NodeId, ParseError> {
        let open = self.constant(TokenKind::LeftBrace, ConstantKind::OpenBrace)?;
        let index = self.parse_range_or_expression()?;
        let close = self.constant(TokenKind::RightBrace, ConstantKind::CloseBrace)?;
        Ok(self
            .builder
            .node(NodeKind::ItemAccessExpression, vec![head, open, index, close]))
    }

    fn parse_field_access(&mut self, head: NodeId) -> Result<NodeId, ParseError> {
        let open = self.constant(TokenKind::LeftBracket, ConstantKind::OpenBracket)?;
        let field = self.generalized_identifier_leaf("a field name")?;
        let close = self.constant(TokenKind::RightBracket, ConstantKind::CloseBracket)?;
        Ok(self
            .builder
            .node(NodeKind::FieldAccessExpression, vec![head, open, field, close]))
    }

    fn parse_range_or_expression(&mut self) -> Result<NodeId, ParseError> {
        let left = self.parse_expression()?;
        if self.check(TokenKind::DotDot) {
            let op = self.constant(TokenKind::DotDot, ConstantKind::DotDot)?;
            let right = self.parse_expression()?;
            return Ok(self
                .builder
                .node(NodeKind::RangeExpression, vec![left, op, right]));
        }
        Ok(left)
    }

    // === Primary expressions ===

    fn parse_primary(&mut self) -> Result<NodeId, ParseError> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Number => {
                self.advance();
                Ok(self.builder.leaf(
                    NodeKind::NumberLiteral(tok.lexeme.clone()),
                    tok.span,
                    tok.line,
                ))
            }
            TokenKind::Text => {
                self.advance();
                Ok(self.builder.leaf(
                    NodeKind::TextLiteral(tok.lexeme.clone()),
                    tok.span,
                    tok.line,
                ))
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                Ok(self.builder.leaf(
                    NodeKind::LogicalLiteral(tok.kind == TokenKind::True),
                    tok.span,
                    tok.line,
                ))
            }
            TokenKind::Null => {
                self.advance();
                Ok(self.builder.leaf(NodeKind::NullLiteral, tok.span, tok.line))
            }
            TokenKind::Ellipsis => {
                self.advance();
                Ok(self
                    .builder
                    .leaf(NodeKind::NotImplemented, tok.span, tok.line))
            }
            TokenKind::Identifier | TokenKind::HashIdentifier => {
                self.advance();
                let kind = if tok.kind == TokenKind::HashIdentifier {
                    NodeKind::QuotedIdentifier(tok.lexeme.clone())
                } else {
                    NodeKind::Identifier(tok.lexeme.clone())
                };
                Ok(self.builder.leaf(kind, tok.span, tok.line))
            }
            TokenKind::QuotedIdentifier => {
                self.advance();
                Ok(self.builder.leaf(
                    NodeKind::QuotedIdentifier(tok.lexeme.clone()),
                    tok.span,
                    tok.line,
                ))
            }
            TokenKind::At => {
                let at = self.constant(TokenKind::At, ConstantKind::At)?;
                let name = self.identifier_leaf("an identifier after '@'")?;
                Ok(self
                    .builder
                    .node(NodeKind::IdentifierExpression, vec![at, name]))
            }
            TokenKind::LeftParen => self.parse_parenthesized(),
            TokenKind::LeftBrace => self.parse_list(),
            TokenKind::LeftBracket => self.parse_record(),
            TokenKind::LexError => Err(ParseError::new(
                format!("unrecognized character sequence '{}'", tok.lexeme),
                tok.span,
            )),
            _ => Err(ParseError::new(
                format!("expected an expression, found '{}'", tok.lexeme),
                tok.span,
            )),
        }
    }

    fn parse_parenthesized(&mut self) -> Result<NodeId, ParseError> {
        let open = self.constant(TokenKind::LeftParen, ConstantKind::OpenParen)?;
        let inner = self.parse_expression()?;
        let close = self.constant(TokenKind::RightParen, ConstantKind::CloseParen)?;
        Ok(self
            .builder
            .node(NodeKind::ParenthesizedExpression, vec![open, inner, close]))
    }

    fn parse_list(&mut self) -> Result<NodeId, ParseError> {
        let open = self.constant(TokenKind::LeftBrace, ConstantKind::OpenBrace)?;
        let mut children = vec![open];

        if !self.check(TokenKind::RightBrace) {
            let mut csvs = Vec::new();
            loop {
                let element = self.parse_range_or_expression()?;
                if self.check(TokenKind::Comma) {
                    let comma = self.constant(TokenKind::Comma, ConstantKind::Comma)?;
                    csvs.push(self.builder.node(NodeKind::Csv, vec![element, comma]));
                } else {
                    csvs.push(self.builder.node(NodeKind::Csv, vec![element]));
                    break;
                }
            }
            children.push(self.builder.node(NodeKind::ArrayWrapper, csvs));
        }

        children.push(self.constant(TokenKind::RightBrace, ConstantKind::CloseBrace)?);
        Ok(self.builder.node(NodeKind::ListExpression, children))
    }

    fn parse_record(&mut self) -> Result<NodeId, ParseError> {
        let open = self.constant(TokenKind::LeftBracket, ConstantKind::OpenBracket)?;
        let mut children = vec![open];

        if !self.check(TokenKind::RightBracket) {
            let mut csvs = Vec::new();
            loop {
                let key = self.generalized_identifier_leaf("a record key")?;
                let equal = self.constant(TokenKind::Equal, ConstantKind::Equal)?;
                let value = self.parse_expression()?;
                let pair = self.builder.node(
                    NodeKind::GeneralizedIdentifierPairedExpression,
                    vec![key, equal, value],
                );
                if self.check(TokenKind::Comma) {
                    let comma = self.constant(TokenKind::Comma, ConstantKind::Comma)?;
                    csvs.push(self.builder.node(NodeKind::Csv, vec![pair, comma]));
                } else {
                    csvs.push(self.builder.node(NodeKind::Csv, vec![pair]));
                    break;
                }
            }
            children.push(self.builder.node(NodeKind::ArrayWrapper, csvs));
        }

        children.push(self.constant(TokenKind::RightBracket, ConstantKind::CloseBracket)?);
        Ok(self.builder.node(NodeKind::RecordExpression, children))
    }

    // === Token helpers ===

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if self.current < self.tokens.len() - 1 {
            self.current += 1;
        }
        &self.tokens[self.current - 1]
    }

    /// Consume a token of `kind` and add it as a constant leaf
    fn constant(&mut self, kind: TokenKind, constant: ConstantKind) -> Result<NodeId, ParseError> {
        let tok = self.peek().clone();
        if tok.kind != kind {
            return Err(ParseError::new(
                format!("expected '{}', found '{}'", kind.as_str(), tok.lexeme),
                tok.span,
            ));
        }
        self.advance();
        Ok(self
            .builder
            .leaf(NodeKind::Constant(constant), tok.span, tok.line))
    }

    /// Consume an identifier (plain or quoted) as a leaf
    fn identifier_leaf(&mut self, what: &str) -> Result<NodeId, ParseError> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Identifier => {
                self.advance();
                Ok(self.builder.leaf(
                    NodeKind::Identifier(tok.lexeme.clone()),
                    tok.span,
                    tok.line,
                ))
            }
            TokenKind::QuotedIdentifier => {
                self.advance();
                Ok(self.builder.leaf(
                    NodeKind::QuotedIdentifier(tok.lexeme.clone()),
                    tok.span,
                    tok.line,
                ))
            }
            _ => Err(ParseError::new(
                format!("expected {what}, found '{}'", tok.lexeme),
                tok.span,
            )),
        }
    }

    /// Consume a generalized identifier (record keys allow keywords)
    fn generalized_identifier_leaf(&mut self, what: &str) -> Result<NodeId, ParseError> {
        let tok = self.peek().clone();
        let acceptable = matches!(
            tok.kind,
            TokenKind::Identifier | TokenKind::QuotedIdentifier
        ) || TokenKind::is_keyword(&tok.lexeme).is_some();
        if !acceptable {
            return Err(ParseError::new(
                format!("expected {what}, found '{}'", tok.lexeme),
                tok.span,
            ));
        }
        self.advance();
        Ok(self.builder.leaf(
            NodeKind::GeneralizedIdentifier(tok.lexeme.clone()),
            tok.span,
            tok.line,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(source: &str) -> SyntaxTree {
        let (tokens, _) = Lexer::new(source).tokenize();
        Parser::new(tokens).parse().expect("parse failed")
    }

    fn parse_err(source: &str) -> ParseError {
        let (tokens, _) = Lexer::new(source).tokenize();
        Parser::new(tokens).parse().expect_err("expected error")
    }

    #[test]
    fn test_simple_arithmetic() {
        let tree = parse("1 + 2");
        let root = tree.node(tree.root());
        assert_eq!(root.kind, NodeKind::ArithmeticExpression);
        assert_eq!(root.children.len(), 3);
    }

    #[test]
    fn test_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let tree = parse("1 + 2 * 3");
        let root = tree.node(tree.root());
        assert_eq!(root.kind, NodeKind::ArithmeticExpression);
        let right = tree.node(root.children[2]);
        assert_eq!(right.kind, NodeKind::ArithmeticExpression);
    }

    #[test]
    fn test_list_structure() {
        let tree = parse("{1, 2}");
        let root = tree.node(tree.root());
        assert_eq!(root.kind, NodeKind::ListExpression);
        // open brace, array wrapper, close brace
        assert_eq!(root.children.len(), 3);
        let wrapper = tree.node(root.children[1]);
        assert_eq!(wrapper.kind, NodeKind::ArrayWrapper);
        assert_eq!(wrapper.children.len(), 2);
        // first csv carries its comma, last does not
        assert_eq!(tree.node(wrapper.children[0]).children.len(), 2);
        assert_eq!(tree.node(wrapper.children[1]).children.len(), 1);
    }

    #[test]
    fn test_empty_list() {
        let tree = parse("{}");
        let root = tree.node(tree.root());
        assert_eq!(root.kind, NodeKind::ListExpression);
        assert_eq!(root.children.len(), 2);
    }

    #[test]
    fn test_let_expression() {
        let tree = parse("let x = 1, y = 2 in x + y");
        let root = tree.node(tree.root());
        assert_eq!(root.kind, NodeKind::LetExpression);
        assert_eq!(root.children.len(), 4);
        let bindings = tree.node(root.children[1]);
        assert_eq!(bindings.kind, NodeKind::ArrayWrapper);
        assert_eq!(bindings.children.len(), 2);
    }

    #[test]
    fn test_if_expression() {
        let tree = parse("if a then 1 else 2");
        let root = tree.node(tree.root());
        assert_eq!(root.kind, NodeKind::IfExpression);
        assert_eq!(root.children.len(), 6);
    }

    #[test]
    fn test_invoke_and_field_access() {
        let tree = parse("Table.RowCount(t)[count]");
        let root = tree.node(tree.root());
        assert_eq!(root.kind, NodeKind::FieldAccessExpression);
        let invoke = tree.node(root.children[0]);
        assert_eq!(invoke.kind, NodeKind::InvokeExpression);
    }

    #[test]
    fn test_item_access_range() {
        let tree = parse("xs{1..3}");
        let root = tree.node(tree.root());
        assert_eq!(root.kind, NodeKind::ItemAccessExpression);
        let index = tree.node(root.children[2]);
        assert_eq!(index.kind, NodeKind::RangeExpression);
    }

    #[test]
    fn test_function_expression() {
        let tree = parse("(x, optional y as number) => x + 1");
        let root = tree.node(tree.root());
        assert_eq!(root.kind, NodeKind::FunctionExpression);
        let params = tree.node(root.children[0]);
        assert_eq!(params.kind, NodeKind::ParameterList);
    }

    #[test]
    fn test_parenthesized_not_function() {
        let tree = parse("(1 + 2) * 3");
        let root = tree.node(tree.root());
        assert_eq!(root.kind, NodeKind::ArithmeticExpression);
        let left = tree.node(root.children[0]);
        assert_eq!(left.kind, NodeKind::ParenthesizedExpression);
    }

    #[test]
    fn test_section_document() {
        let tree = parse("section demo; x = 1; shared y = 2;");
        let root = tree.node(tree.root());
        assert_eq!(root.kind, NodeKind::Section);
        // section, name, semicolon, two members
        assert_eq!(root.children.len(), 5);
        let second = tree.node(root.children[4]);
        assert_eq!(second.kind, NodeKind::SectionMember);
        assert_eq!(
            tree.node(second.children[0]).kind,
            NodeKind::Constant(ConstantKind::Shared)
        );
    }

    #[test]
    fn test_record_with_keyword_key() {
        let tree = parse("[type = 1]");
        let root = tree.node(tree.root());
        assert_eq!(root.kind, NodeKind::RecordExpression);
    }

    #[test]
    fn test_each_try_error() {
        assert_eq!(tree_kind("each x > 1"), NodeKind::EachExpression);
        assert_eq!(
            tree_kind("try 1/0 otherwise null"),
            NodeKind::TryOtherwiseExpression
        );
        assert_eq!(tree_kind("error \"boom\""), NodeKind::ErrorRaisingExpression);
    }

    fn tree_kind(source: &str) -> NodeKind {
        let tree = parse(source);
        tree.node(tree.root()).kind.clone()
    }

    #[test]
    fn test_parse_error_reports_span() {
        let err = parse_err("1 +");
        assert!(err.message.contains("expected an expression"));
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let err = parse_err("1 2");
        assert!(err.message.contains("after document"));
    }
}
