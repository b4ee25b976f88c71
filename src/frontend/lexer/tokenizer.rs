//! Tokenizer implementation
//! Main lexer structure and token generation logic

use super::literals::{
    is_digit, is_identifier_char, is_identifier_start, is_operator_char, scan_char, scan_number,
    scan_string,
};
use super::tokens::*;
use crate::util::span::{Position, Span};
use std::iter::Peekable;
use std::str::Chars;

/// Main lexer structure
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<Chars<'a>>,
    offset: usize,
    line: usize,
    column: usize,
    start_offset: usize,
    start_line: usize,
    start_column: usize,
    last_was_newline: bool,
    pub error: Option<LexError>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().peekable(),
            offset: 0,
            line: 1,
            column: 1,
            start_offset: 0,
            start_line: 1,
            start_column: 1,
            // Leading line breaks carry no statement boundary information.
            last_was_newline: true,
            error: None,
        }
    }

    /// Length of the underlying source in bytes
    pub fn source_len(&self) -> usize {
        self.source.len()
    }

    /// Get current position
    pub fn position(&self) -> Position {
        Position::with_offset(self.line, self.column, self.offset)
    }

    /// Get start position of current token
    pub fn start_position(&self) -> Position {
        Position::with_offset(self.start_line, self.start_column, self.start_offset)
    }

    /// Get span of current token
    pub fn span(&self) -> Span {
        Span::new(self.start_position(), self.position())
    }

    /// Byte offset where the current token started
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    /// Text of the current token so far
    pub fn current_text(&self) -> &'a str {
        &self.source[self.start_offset..self.offset]
    }

    /// Advance to next character
    pub fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Peek at next character
    pub fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    /// Peek at character after next
    pub fn peek_next(&mut self) -> Option<char> {
        self.chars.clone().nth(1)
    }

    /// Peek `n` characters ahead (0 is the next character)
    pub fn peek_at(
        &self,
        n: usize,
    ) -> Option<char> {
        self.chars.clone().nth(n)
    }

    /// Whether the remaining input starts with `prefix`
    pub fn lookahead(
        &self,
        prefix: &str,
    ) -> bool {
        self.source[self.offset..].starts_with(prefix)
    }

    /// Record an error; the lexer stops producing tokens afterwards
    pub fn fail(
        &mut self,
        error: LexError,
    ) -> Option<Token> {
        if self.error.is_none() {
            self.error = Some(error);
        }
        None
    }

    /// Skip whitespace and comments, returning the position of the first line
    /// break crossed (outside of block comments), if any
    fn skip_trivia(&mut self) -> Option<Position> {
        let mut newline = None;
        while let Some(&c) = self.peek() {
            match c {
                '\n' => {
                    if newline.is_none() {
                        newline = Some(self.position());
                    }
                    self.advance();
                }
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                '/' if self.peek_next() == Some('/') => {
                    while let Some(&c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                '/' if self.peek_next() == Some('*') => {
                    self.advance();
                    self.advance();
                    let mut depth = 1;
                    while depth > 0 {
                        match self.advance() {
                            Some('/') if self.peek() == Some(&'*') => {
                                self.advance();
                                depth += 1;
                            }
                            Some('*') if self.peek() == Some(&'/') => {
                                self.advance();
                                depth -= 1;
                            }
                            Some(_) => {}
                            None => {
                                let offset = self.source.len();
                                self.fail(LexError::UnterminatedComment { offset });
                                return newline;
                            }
                        }
                    }
                }
                _ => break,
            }
        }
        newline
    }

    /// Generate next token
    pub fn next_token(&mut self) -> Option<Token> {
        if self.error.is_some() {
            return None;
        }

        let newline = self.skip_trivia();
        if self.error.is_some() {
            return None;
        }

        if let Some(at) = newline {
            if !self.last_was_newline && self.peek().is_some() {
                self.last_was_newline = true;
                let end = Position::with_offset(at.line, at.column + 1, at.offset + 1);
                return Some(Token::new(TokenKind::Newline, Span::new(at, end)));
            }
        }

        self.peek()?;

        self.start_offset = self.offset;
        self.start_line = self.line;
        self.start_column = self.column;
        self.last_was_newline = false;

        let c = self.advance()?;

        match c {
            '_' if !self.peek().map(|&c| is_identifier_char(c)).unwrap_or(false) => {
                Some(self.make_token(TokenKind::Underscore))
            }
            c if is_identifier_start(c) => self.scan_identifier(),
            c if is_digit(c) => scan_number(self, c),
            '"' => scan_string(self),
            '\'' => scan_char(self),
            '`' => self.scan_backquoted(),
            '(' => Some(self.make_token(TokenKind::LParen)),
            ')' => Some(self.make_token(TokenKind::RParen)),
            '[' => Some(self.make_token(TokenKind::LBracket)),
            ']' => Some(self.make_token(TokenKind::RBracket)),
            '{' => Some(self.make_token(TokenKind::LBrace)),
            '}' => Some(self.make_token(TokenKind::RBrace)),
            ',' => Some(self.make_token(TokenKind::Comma)),
            ';' => Some(self.make_token(TokenKind::Semicolon)),
            '.' => Some(self.make_token(TokenKind::Dot)),
            c if is_operator_char(c) => self.scan_operator(),
            c => {
                let offset = self.start_offset;
                self.fail(LexError::UnexpectedChar { ch: c, offset })
            }
        }
    }

    /// Scan an alphanumeric identifier or keyword; a trailing `_` may be
    /// followed by operator characters (`unary_!`)
    fn scan_identifier(&mut self) -> Option<Token> {
        while let Some(&c) = self.peek() {
            if is_identifier_char(c) {
                self.advance();
            } else {
                break;
            }
        }
        if self.current_text().ends_with('_') {
            while let Some(&c) = self.peek() {
                if is_operator_char(c) && !self.lookahead("//") && !self.lookahead("/*") {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        let text = self.current_text();
        let kind = keyword_from_str(text).unwrap_or_else(|| TokenKind::Identifier(text.to_string()));
        Some(self.make_token(kind))
    }

    /// Scan a run of operator characters
    fn scan_operator(&mut self) -> Option<Token> {
        while let Some(&c) = self.peek() {
            if is_operator_char(c) && !self.lookahead("//") && !self.lookahead("/*") {
                self.advance();
            } else {
                break;
            }
        }

        let kind = match self.current_text() {
            "=" => TokenKind::Eq,
            ":" => TokenKind::Colon,
            "=>" => TokenKind::Arrow,
            "<-" => TokenKind::LArrow,
            "@" => TokenKind::At,
            "#" => TokenKind::Hash,
            op => TokenKind::Operator(op.to_string()),
        };
        Some(self.make_token(kind))
    }

    /// Scan a quoted identifier such as `` `type` ``
    fn scan_backquoted(&mut self) -> Option<Token> {
        let mut name = String::new();
        loop {
            match self.peek().copied() {
                Some('`') => {
                    self.advance();
                    break;
                }
                Some('\n') => {
                    let offset = self.offset;
                    return self.fail(LexError::UnterminatedBackquote { offset });
                }
                Some(c) => {
                    name.push(c);
                    self.advance();
                }
                None => {
                    let offset = self.source.len();
                    return self.fail(LexError::UnterminatedBackquote { offset });
                }
            }
        }
        Some(self.make_token(TokenKind::Identifier(name)))
    }

    /// Create token with current span
    pub fn make_token(
        &self,
        kind: TokenKind,
    ) -> Token {
        Token::new(kind, self.span())
    }
}

/// Convert string to keyword token
fn keyword_from_str(s: &str) -> Option<TokenKind> {
    let kind = match s {
        "object" => TokenKind::KwObject,
        "class" => TokenKind::KwClass,
        "trait" => TokenKind::KwTrait,
        "enum" => TokenKind::KwEnum,
        "def" => TokenKind::KwDef,
        "type" => TokenKind::KwType,
        "val" => TokenKind::KwVal,
        "var" => TokenKind::KwVar,
        "import" => TokenKind::KwImport,
        "package" => TokenKind::KwPackage,

        "case" => TokenKind::KwCase,
        "lazy" => TokenKind::KwLazy,
        "abstract" => TokenKind::KwAbstract,
        "final" => TokenKind::KwFinal,
        "sealed" => TokenKind::KwSealed,
        "implicit" => TokenKind::KwImplicit,
        "private" => TokenKind::KwPrivate,
        "protected" => TokenKind::KwProtected,
        "override" => TokenKind::KwOverride,

        "if" => TokenKind::KwIf,
        "else" => TokenKind::KwElse,
        "then" => TokenKind::KwThen,
        "match" => TokenKind::KwMatch,
        "while" => TokenKind::KwWhile,
        "do" => TokenKind::KwDo,
        "for" => TokenKind::KwFor,
        "yield" => TokenKind::KwYield,
        "return" => TokenKind::KwReturn,
        "throw" => TokenKind::KwThrow,
        "try" => TokenKind::KwTry,
        "catch" => TokenKind::KwCatch,
        "finally" => TokenKind::KwFinally,
        "new" => TokenKind::KwNew,
        "extends" => TokenKind::KwExtends,
        "with" => TokenKind::KwWith,
        "this" => TokenKind::KwThis,
        "super" => TokenKind::KwSuper,
        "null" => TokenKind::KwNull,

        "true" => TokenKind::BoolLiteral(true),
        "false" => TokenKind::BoolLiteral(false),
        _ => return None,
    };
    Some(kind)
}
