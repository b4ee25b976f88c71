//! Statement splitter
//!
//! Turns a raw input buffer into top-level statements. The splitter knows
//! just enough grammar to find statement boundaries: bracket nesting, `;`,
//! and the rules that decide whether a line break ends a statement. Anything
//! that fails exactly at end of input is reported as [`Split::Incomplete`]
//! so the front-end can ask for a continuation line.

use crate::frontend::lexer::{tokenize, Token, TokenKind};
use crate::util::span::Span;
use tracing::debug;

/// A top-level statement extracted from one input buffer
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Position of the statement within its input
    pub index: usize,
    /// Exact source text, from the first to the last token
    pub source: String,
    /// Location within the input buffer
    pub span: Span,
    /// Tokens of the statement, including line breaks nested inside it
    pub tokens: Vec<Token>,
}

impl Statement {
    /// Token kinds without the line breaks
    pub fn significant_kinds(&self) -> impl Iterator<Item = &TokenKind> {
        self.tokens
            .iter()
            .map(|t| &t.kind)
            .filter(|k| **k != TokenKind::Newline)
    }
}

/// Definitive syntax error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (at byte {offset})")]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
}

impl ParseError {
    pub fn new(
        message: impl Into<String>,
        offset: usize,
    ) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Outcome of splitting one buffer
#[derive(Debug, Clone, PartialEq)]
pub enum Split {
    /// All statements are complete; empty for blank input
    Complete(Vec<Statement>),
    /// The buffer is a prefix of valid input
    Incomplete,
    /// The buffer can never become valid by appending text
    Malformed(ParseError),
}

/// Split a buffer into top-level statements
pub fn split(buffer: &str) -> Split {
    let tokens = match tokenize(buffer) {
        Ok(tokens) => tokens,
        Err(err) if at_end(buffer, err.offset()) => return Split::Incomplete,
        Err(err) => return Split::Malformed(ParseError::new(err.to_string(), err.offset())),
    };

    let mut splitter = Splitter::new(buffer);
    for (i, token) in tokens.iter().enumerate() {
        if token.kind == TokenKind::Eof {
            break;
        }
        let next = tokens.get(i + 1).map(|t| &t.kind).unwrap_or(&TokenKind::Eof);
        if let Err(err) = splitter.feed(token, next) {
            return if at_end(buffer, err.offset) {
                Split::Incomplete
            } else {
                Split::Malformed(err)
            };
        }
    }

    splitter.finish()
}

/// Whether a failure offset lies at the end of `buffer`, trailing whitespace
/// ignored
fn at_end(
    buffer: &str,
    offset: usize,
) -> bool {
    offset >= buffer.trim_end().len()
}

struct Splitter<'a> {
    buffer: &'a str,
    statements: Vec<Statement>,
    current: Vec<Token>,
    /// Expected closers; the flag marks the condition of `if`/`while`/`for`
    stack: Vec<(TokenKind, bool)>,
    /// A control header just closed at top level and still needs its body
    awaiting_body: bool,
}

impl<'a> Splitter<'a> {
    fn new(buffer: &'a str) -> Self {
        Self {
            buffer,
            statements: Vec::new(),
            current: Vec::new(),
            stack: Vec::new(),
            awaiting_body: false,
        }
    }

    fn last_significant(&self) -> Option<&TokenKind> {
        self.current
            .iter()
            .rev()
            .map(|t| &t.kind)
            .find(|k| **k != TokenKind::Newline)
    }

    /// Whether the statement read so far may end here
    fn may_end(&self) -> bool {
        let mut kinds = self
            .current
            .iter()
            .rev()
            .map(|t| &t.kind)
            .filter(|k| **k != TokenKind::Newline);
        match kinds.next() {
            Some(TokenKind::Operator(symbol)) => operand_operator(symbol, kinds.next()),
            Some(kind) => can_end(kind),
            None => false,
        }
    }

    fn feed(
        &mut self,
        token: &Token,
        next: &TokenKind,
    ) -> Result<(), ParseError> {
        let offset = token.span.start.offset;
        let top_level = self.stack.is_empty();

        match &token.kind {
            TokenKind::Newline if top_level => {
                if self.current.is_empty() {
                    return Ok(());
                }
                let ends = self.may_end();
                if self.awaiting_body || !ends || !can_begin(next) {
                    self.current.push(token.clone());
                } else {
                    self.close_statement();
                }
            }
            TokenKind::Semicolon if top_level => {
                if self.current.is_empty() {
                    return Ok(());
                }
                let ends = self.may_end();
                if self.awaiting_body || !ends {
                    return Err(ParseError::new("expected expression but found ';'", offset));
                }
                self.close_statement();
            }
            kind if kind.is_open() => {
                let control = top_level
                    && *kind == TokenKind::LParen
                    && match self.last_significant() {
                        Some(TokenKind::KwIf) | Some(TokenKind::KwFor) => true,
                        // `do { ... } while (cond)` has no body after the condition
                        Some(TokenKind::KwWhile) => {
                            !matches!(self.current.first().map(|t| &t.kind), Some(TokenKind::KwDo))
                        }
                        _ => false,
                    };
                if self.current.is_empty() && !can_begin(kind) {
                    return Err(illegal_start(token));
                }
                if let Some(closer) = kind.closer() {
                    self.stack.push((closer, control));
                }
                self.awaiting_body = false;
                self.current.push(token.clone());
            }
            kind if kind.is_close() => match self.stack.pop() {
                Some((expected, control)) if expected == *kind => {
                    self.current.push(token.clone());
                    if self.stack.is_empty() && control {
                        self.awaiting_body = true;
                    }
                }
                Some((expected, _)) => {
                    return Err(ParseError::new(
                        format!(
                            "expected {} but found {}",
                            expected.describe(),
                            kind.describe()
                        ),
                        offset,
                    ));
                }
                None => {
                    return Err(ParseError::new(
                        format!("unmatched closing {}", kind.describe()),
                        offset,
                    ));
                }
            },
            kind => {
                if self.current.is_empty() && !can_begin(kind) {
                    return Err(illegal_start(token));
                }
                if *kind != TokenKind::Newline {
                    self.awaiting_body = false;
                }
                self.current.push(token.clone());
            }
        }
        Ok(())
    }

    fn close_statement(&mut self) {
        let tokens = std::mem::take(&mut self.current);
        let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
            return;
        };
        let span = first.span.to(last.span);
        let statement = Statement {
            index: self.statements.len(),
            source: span.slice(self.buffer).to_string(),
            span,
            tokens,
        };
        debug!(
            "split statement {} at {}: {:?}",
            statement.index, statement.span, statement.source
        );
        self.statements.push(statement);
    }

    fn finish(mut self) -> Split {
        if !self.stack.is_empty() || self.awaiting_body {
            return Split::Incomplete;
        }
        if !self.current.is_empty() {
            if !self.may_end() {
                return Split::Incomplete;
            }
            self.close_statement();
        }
        Split::Complete(self.statements)
    }
}

fn illegal_start(token: &Token) -> ParseError {
    ParseError::new(
        format!("illegal start of statement: {}", token.kind.describe()),
        token.span.start.offset,
    )
}

/// Tokens after which a statement may end
fn can_end(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier(_)
            | TokenKind::IntLiteral(_)
            | TokenKind::FloatLiteral(_)
            | TokenKind::BoolLiteral(_)
            | TokenKind::CharLiteral(_)
            | TokenKind::StringLiteral(_)
            | TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::RBrace
            | TokenKind::Underscore
            | TokenKind::KwThis
            | TokenKind::KwNull
            | TokenKind::KwReturn
    )
}

/// An operator used as an operand rather than applied infix, as in
/// `def f: Int = ???` or `import scala.math.*`, may end a statement.
/// After anything that can end an expression the operator is infix and
/// still needs its right operand. Prefix operators always need one.
fn operand_operator(
    symbol: &str,
    previous: Option<&TokenKind>,
) -> bool {
    match previous {
        Some(TokenKind::Dot) => true,
        _ if matches!(symbol, "-" | "+" | "!" | "~") => false,
        Some(kind) => !can_end(kind),
        None => true,
    }
}

/// Tokens that may start a statement
fn can_begin(kind: &TokenKind) -> bool {
    !matches!(
        kind,
        TokenKind::Dot
            | TokenKind::Comma
            | TokenKind::Colon
            | TokenKind::Eq
            | TokenKind::Arrow
            | TokenKind::LArrow
            | TokenKind::Semicolon
            | TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::RBrace
            | TokenKind::KwElse
            | TokenKind::KwThen
            | TokenKind::KwExtends
            | TokenKind::KwWith
            | TokenKind::KwMatch
            | TokenKind::KwCatch
            | TokenKind::KwFinally
            | TokenKind::KwYield
    )
}
