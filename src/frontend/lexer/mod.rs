//! Lexer module
//! Split into specialized modules: token types, the tokenizer state machine
//! and literal scanning.

pub mod literals;
pub mod tokenizer;
pub mod tokens;

#[cfg(test)]
mod tests;

// Re-export types
pub use tokenizer::Lexer;
pub use tokens::{LexError, Token, TokenKind};

use crate::util::span::Span;

/// Tokenize source code
///
/// The returned tokens always end with [`TokenKind::Eof`]. Line breaks between
/// tokens are preserved as single [`TokenKind::Newline`] tokens because they
/// separate statements.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    tracing::debug!("lexing {} bytes", source.len());

    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();

    while let Some(token) = lexer.next_token() {
        tokens.push(token);
    }

    if let Some(err) = lexer.error {
        tracing::debug!("lexing failed at byte {}: {}", err.offset(), err);
        return Err(err);
    }

    // A trailing line break carries no boundary information.
    if matches!(tokens.last(), Some(t) if t.kind == TokenKind::Newline) {
        tokens.pop();
    }

    let end = lexer.position();
    tokens.push(Token::new(TokenKind::Eof, Span::new(end, end)));
    tracing::debug!("lexing produced {} tokens", tokens.len());
    Ok(tokens)
}
