//! Lexical analysis (tokenization)
//!
//! The lexer converts Quill source code into a stream of tokens with
//! accurate span information. Comments are not tokens: they are collected
//! into a separate, position-ordered list so the parser never sees them
//! and the formatter can re-attach them to the tree.

use serde::{Deserialize, Serialize};

use crate::span::Span;
use crate::token::{Token, TokenKind};

/// What kind of comment was lexed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentKind {
    /// Single-line comment: `// ...`
    Line,
    /// Block comment: `/* ... */`
    Block,
}

/// A comment lifted out of the token stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// What kind of comment
    pub kind: CommentKind,
    /// The comment text, including delimiters
    pub text: String,
    /// Start byte offset in the source
    pub start: usize,
    /// Whether the comment text spans more than one line
    pub contains_newline: bool,
}

/// Lexer state for tokenizing source code
pub struct Lexer {
    /// Characters of source code
    chars: Vec<char>,
    /// Current position in chars
    current: usize,
    /// Current byte offset
    offset: usize,
    /// Current line number (1-indexed)
    line: u32,
    /// Start byte offset of current token
    start_offset: usize,
    /// Start line of current token
    start_line: u32,
    /// Comments collected so far, in source order
    comments: Vec<Comment>,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            current: 0,
            offset: 0,
            line: 1,
            start_offset: 0,
            start_line: 1,
            comments: Vec::new(),
        }
    }

    /// Tokenize the source, returning tokens and the ordered comment list
    pub fn tokenize(&mut self) -> (Vec<Token>, Vec<Comment>) {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        (tokens, std::mem::take(&mut self.comments))
    }

    /// Scan the next token
    fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        self.start_offset = self.offset;
        self.start_line = self.line;

        if self.is_at_end() {
            return self.make_token(TokenKind::Eof, "");
        }

        let c = self.advance();

        match c {
            '(' => self.make_token(TokenKind::LeftParen, "("),
            ')' => self.make_token(TokenKind::RightParen, ")"),
            '{' => self.make_token(TokenKind::LeftBrace, "{"),
            '}' => self.make_token(TokenKind::RightBrace, "}"),
            '[' => self.make_token(TokenKind::LeftBracket, "["),
            ']' => self.make_token(TokenKind::RightBracket, "]"),
            ';' => self.make_token(TokenKind::Semicolon, ";"),
            ',' => self.make_token(TokenKind::Comma, ","),
            '+' => self.make_token(TokenKind::Plus, "+"),
            '-' => self.make_token(TokenKind::Minus, "-"),
            '*' => self.make_token(TokenKind::Star, "*"),
            '/' => self.make_token(TokenKind::Slash, "/"),
            '&' => self.make_token(TokenKind::Ampersand, "&"),
            '@' => self.make_token(TokenKind::At, "@"),
            '=' => {
                if self.match_char('>') {
                    self.make_token(TokenKind::FatArrow, "=>")
                } else {
                    self.make_token(TokenKind::Equal, "=")
                }
            }
            '<' => {
                if self.match_char('>') {
                    self.make_token(TokenKind::NotEqual, "<>")
                } else if self.match_char('=') {
                    self.make_token(TokenKind::LessEqual, "<=")
                } else {
                    self.make_token(TokenKind::Less, "<")
                }
            }
            '>' => {
                if self.match_char('=') {
                    self.make_token(TokenKind::GreaterEqual, ">=")
                } else {
                    self.make_token(TokenKind::Greater, ">")
                }
            }
            '?' => {
                if self.match_char('?') {
                    self.make_token(TokenKind::QuestionQuestion, "??")
                } else {
                    self.error_token("?")
                }
            }
            '.' => {
                if self.match_char('.') {
                    if self.match_char('.') {
                        self.make_token(TokenKind::Ellipsis, "...")
                    } else {
                        self.make_token(TokenKind::DotDot, "..")
                    }
                } else {
                    self.error_token(".")
                }
            }
            '"' => self.text_literal(),
            '#' => self.hash_identifier(),
            c if c.is_ascii_digit() => self.number_literal(),
            c if is_identifier_start(c) => self.identifier(),
            c => {
                let lexeme: String = c.to_string();
                self.error_token(&lexeme)
            }
        }
    }

    /// Skip whitespace, collecting any comments encountered
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                }
                Some('\n') => {
                    self.advance();
                }
                Some('/') if self.peek_next() == Some('/') => {
                    let start = self.offset;
                    let mut text = String::new();
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        text.push(c);
                        self.advance();
                    }
                    self.comments.push(Comment {
                        kind: CommentKind::Line,
                        text,
                        start,
                        contains_newline: false,
                    });
                }
                Some('/') if self.peek_next() == Some('*') => {
                    let start = self.offset;
                    let mut text = String::new();
                    let mut contains_newline = false;
                    text.push(self.advance()); // '/'
                    text.push(self.advance()); // '*'
                    while let Some(c) = self.peek() {
                        if c == '*' && self.peek_next() == Some('/') {
                            text.push(self.advance());
                            text.push(self.advance());
                            break;
                        }
                        if c == '\n' {
                            contains_newline = true;
                        }
                        text.push(self.advance());
                    }
                    self.comments.push(Comment {
                        kind: CommentKind::Block,
                        text,
                        start,
                        contains_newline,
                    });
                }
                _ => break,
            }
        }
    }

    /// Scan a text literal; `""` escapes a quote
    fn text_literal(&mut self) -> Token {
        let mut lexeme = String::from("\"");
        loop {
            match self.peek() {
                Some('"') => {
                    lexeme.push(self.advance());
                    if self.peek() == Some('"') {
                        lexeme.push(self.advance());
                    } else {
                        break;
                    }
                }
                Some(c) => {
                    lexeme.push(c);
                    self.advance();
                }
                None => return self.error_token(&lexeme),
            }
        }
        self.make_token(TokenKind::Text, lexeme)
    }

    /// Scan a number literal: integer, decimal, exponent, or hex
    fn number_literal(&mut self) -> Token {
        let mut lexeme = String::new();
        lexeme.push(self.chars[self.current - 1]);

        if lexeme == "0" && matches!(self.peek(), Some('x') | Some('X')) {
            lexeme.push(self.advance());
            while let Some(c) = self.peek() {
                if c.is_ascii_hexdigit() {
                    lexeme.push(self.advance());
                } else {
                    break;
                }
            }
            return self.make_token(TokenKind::Number, lexeme);
        }

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                lexeme.push(self.advance());
            } else {
                break;
            }
        }
        if self.peek() == Some('.')
            && self.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            lexeme.push(self.advance());
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    lexeme.push(self.advance());
                } else {
                    break;
                }
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            lexeme.push(self.advance());
            if matches!(self.peek(), Some('+') | Some('-')) {
                lexeme.push(self.advance());
            }
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    lexeme.push(self.advance());
                } else {
                    break;
                }
            }
        }
        self.make_token(TokenKind::Number, lexeme)
    }

    /// Scan `#date`-style and `#"quoted"` identifiers
    fn hash_identifier(&mut self) -> Token {
        if self.peek() == Some('"') {
            self.advance();
            let mut lexeme = String::from("#\"");
            loop {
                match self.peek() {
                    Some('"') => {
                        lexeme.push(self.advance());
                        if self.peek() == Some('"') {
                            lexeme.push(self.advance());
                        } else {
                            break;
                        }
                    }
                    Some(c) => {
                        lexeme.push(c);
                        self.advance();
                    }
                    None => return self.error_token(&lexeme),
                }
            }
            return self.make_token(TokenKind::QuotedIdentifier, lexeme);
        }

        let mut lexeme = String::from("#");
        while let Some(c) = self.peek() {
            if is_identifier_part(c) {
                lexeme.push(self.advance());
            } else {
                break;
            }
        }
        if lexeme.len() == 1 {
            return self.error_token("#");
        }
        self.make_token(TokenKind::HashIdentifier, lexeme)
    }

    /// Scan an identifier or keyword; identifiers may contain interior dots
    fn identifier(&mut self) -> Token {
        let mut lexeme = String::new();
        lexeme.push(self.chars[self.current - 1]);

        loop {
            match self.peek() {
                Some(c) if is_identifier_part(c) => {
                    lexeme.push(self.advance());
                }
                // Dotted names (Table.RowCount); the dot must be followed
                // by another identifier character to avoid eating `..`
                Some('.') if self.peek_next().is_some_and(is_identifier_start) => {
                    lexeme.push(self.advance());
                }
                _ => break,
            }
        }

        if let Some(kind) = TokenKind::is_keyword(&lexeme) {
            self.make_token(kind, lexeme)
        } else {
            self.make_token(TokenKind::Identifier, lexeme)
        }
    }

    // === Helpers ===

    fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.current).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.current + 1).copied()
    }

    fn advance(&mut self) -> char {
        let c = self.chars[self.current];
        self.current += 1;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn make_token(&self, kind: TokenKind, lexeme: impl Into<String>) -> Token {
        Token::new(
            kind,
            lexeme,
            Span::new(self.start_offset, self.offset),
            self.start_line,
        )
    }

    fn error_token(&self, lexeme: &str) -> Token {
        Token::new(
            TokenKind::LexError,
            lexeme,
            Span::new(self.start_offset, self.offset),
            self.start_line,
        )
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lex(source: &str) -> (Vec<Token>, Vec<Comment>) {
        Lexer::new(source).tokenize()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_expression() {
        assert_eq!(
            kinds("1 + 2"),
            vec![
                TokenKind::Number,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_dotted_identifier() {
        let (tokens, _) = lex("Table.RowCount(t)");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].lexeme, "Table.RowCount");
    }

    #[test]
    fn test_hash_identifiers() {
        let (tokens, _) = lex("#date(2024, 1, 2)");
        assert_eq!(tokens[0].kind, TokenKind::HashIdentifier);
        assert_eq!(tokens[0].lexeme, "#date");

        let (tokens, _) = lex("#\"two words\"");
        assert_eq!(tokens[0].kind, TokenKind::QuotedIdentifier);
        assert_eq!(tokens[0].lexeme, "#\"two words\"");
    }

    #[test]
    fn test_text_with_escaped_quote() {
        let (tokens, _) = lex("\"say \"\"hi\"\"\"");
        assert_eq!(tokens[0].kind, TokenKind::Text);
        assert_eq!(tokens[0].lexeme, "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_two_char_operators() {
        assert_eq!(
            kinds("a <> b <= c ?? d"),
            vec![
                TokenKind::Identifier,
                TokenKind::NotEqual,
                TokenKind::Identifier,
                TokenKind::LessEqual,
                TokenKind::Identifier,
                TokenKind::QuestionQuestion,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_line_comment_collected() {
        let (tokens, comments) = lex("1 // trailing\n+ 2");
        assert_eq!(tokens.len(), 4); // 1, +, 2, EOF
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "// trailing");
        assert_eq!(comments[0].kind, CommentKind::Line);
        assert!(!comments[0].contains_newline);
        assert_eq!(comments[0].start, 2);
    }

    #[test]
    fn test_block_comment_multiline() {
        let (_, comments) = lex("/* a\nb */ 1");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].kind, CommentKind::Block);
        assert!(comments[0].contains_newline);
    }

    #[test]
    fn test_comments_in_order() {
        let (_, comments) = lex("// one\n1 /* two */ + 2 // three");
        let texts: Vec<&str> = comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["// one", "/* two */", "// three"]);
        assert!(comments.windows(2).all(|w| w[0].start < w[1].start));
    }

    #[test]
    fn test_number_forms() {
        let (tokens, _) = lex("42 3.14 0xFF 1e9 2.5e-3");
        let lexemes: Vec<&str> = tokens[..5].iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["42", "3.14", "0xFF", "1e9", "2.5e-3"]);
        assert!(tokens[..5].iter().all(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn test_line_tracking() {
        let (tokens, _) = lex("1\n+\n2");
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[2].line, 3);
    }

    #[test]
    fn test_lex_error() {
        let (tokens, _) = lex("1 $ 2");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::LexError));
    }
}
