//! Literal scanning implementations
//! Handles number, string, and character literals

use super::tokenizer::Lexer;
use super::tokens::*;

/// Scan a number literal (decimal or hexadecimal, integer or floating point)
pub fn scan_number(
    lexer: &mut Lexer<'_>,
    first_char: char,
) -> Option<Token> {
    if first_char == '0' && matches!(lexer.peek(), Some('x') | Some('X')) {
        lexer.advance();
        return scan_hex_number(lexer);
    }

    let mut digits = String::new();
    digits.push(first_char);
    let mut is_float = false;

    scan_digits(lexer, &mut digits);

    if lexer.peek() == Some(&'.') && lexer.peek_next().map(is_digit).unwrap_or(false) {
        is_float = true;
        lexer.advance();
        digits.push('.');
        scan_digits(lexer, &mut digits);
    }

    if matches!(lexer.peek(), Some('e') | Some('E')) {
        let mut ahead = lexer.peek_next();
        let signed = matches!(ahead, Some('+') | Some('-'));
        if signed {
            // `1e+5`: look one further for the first exponent digit
            ahead = lexer.peek_at(2);
        }
        if ahead.map(is_digit).unwrap_or(false) {
            is_float = true;
            lexer.advance();
            digits.push('e');
            if signed {
                if let Some(sign) = lexer.advance() {
                    digits.push(sign);
                }
            }
            scan_digits(lexer, &mut digits);
        }
    }

    match lexer.peek() {
        Some('L') | Some('l') => {
            lexer.advance();
        }
        Some('d') | Some('D') | Some('f') | Some('F') => {
            lexer.advance();
            is_float = true;
        }
        _ => {}
    }

    let kind = if is_float {
        match digits.parse::<f64>() {
            Ok(value) => TokenKind::FloatLiteral(value),
            Err(_) => return invalid_number(lexer),
        }
    } else {
        match digits.parse::<i64>() {
            Ok(value) => TokenKind::IntLiteral(value),
            Err(_) => return invalid_number(lexer),
        }
    };
    Some(lexer.make_token(kind))
}

/// Scan the digits of a hexadecimal literal, the `0x` prefix already consumed
fn scan_hex_number(lexer: &mut Lexer<'_>) -> Option<Token> {
    let mut value: i64 = 0;
    let mut has_digits = false;

    while let Some(&c) = lexer.peek() {
        if let Some(digit) = c.to_digit(16) {
            lexer.advance();
            has_digits = true;
            value = match value.checked_mul(16).and_then(|v| v.checked_add(digit as i64)) {
                Some(v) => v,
                None => return invalid_number(lexer),
            };
        } else if c == '_' {
            lexer.advance();
        } else {
            break;
        }
    }

    if !has_digits {
        return invalid_number(lexer);
    }
    if matches!(lexer.peek(), Some('L') | Some('l')) {
        lexer.advance();
    }
    Some(lexer.make_token(TokenKind::IntLiteral(value)))
}

fn scan_digits(
    lexer: &mut Lexer<'_>,
    digits: &mut String,
) {
    while let Some(&c) = lexer.peek() {
        if is_digit(c) {
            digits.push(c);
            lexer.advance();
        } else if c == '_' && lexer.peek_next().map(is_digit).unwrap_or(false) {
            lexer.advance();
        } else {
            break;
        }
    }
}

fn invalid_number(lexer: &mut Lexer<'_>) -> Option<Token> {
    let text = lexer.current_text().to_string();
    let offset = lexer.start_offset();
    lexer.fail(LexError::InvalidNumber { text, offset })
}

/// Scan a string literal, the opening quote already consumed
///
/// A string that runs into end of input is reported at the end of the
/// source; a single-line string broken by a line feed is reported at the
/// line feed.
pub fn scan_string(lexer: &mut Lexer<'_>) -> Option<Token> {
    if lexer.lookahead("\"\"") {
        lexer.advance();
        lexer.advance();
        return scan_multi_line_string(lexer);
    }

    let mut value = String::new();
    loop {
        match lexer.peek().copied() {
            Some('"') => {
                lexer.advance();
                break;
            }
            Some('\n') => {
                let offset = lexer.position().offset;
                return lexer.fail(LexError::UnterminatedString { offset });
            }
            Some('\\') => {
                lexer.advance();
                match scan_escape(lexer) {
                    Some(c) => value.push(c),
                    None => {
                        let offset = lexer.source_len();
                        return lexer.fail(LexError::UnterminatedString { offset });
                    }
                }
            }
            Some(c) => {
                value.push(c);
                lexer.advance();
            }
            None => {
                let offset = lexer.source_len();
                return lexer.fail(LexError::UnterminatedString { offset });
            }
        }
    }

    Some(lexer.make_token(TokenKind::StringLiteral(value)))
}

/// Scan a `"""` string; content is raw and may span lines
fn scan_multi_line_string(lexer: &mut Lexer<'_>) -> Option<Token> {
    let mut value = String::new();
    loop {
        if lexer.lookahead("\"\"\"") {
            lexer.advance();
            lexer.advance();
            lexer.advance();
            // Extra quotes directly before the delimiter belong to the content
            while lexer.peek() == Some(&'"') {
                value.push('"');
                lexer.advance();
            }
            break;
        }
        match lexer.advance() {
            Some(c) => value.push(c),
            None => {
                let offset = lexer.source_len();
                return lexer.fail(LexError::UnterminatedString { offset });
            }
        }
    }

    Some(lexer.make_token(TokenKind::StringLiteral(value)))
}

/// Scan a character literal, the opening quote already consumed
pub fn scan_char(lexer: &mut Lexer<'_>) -> Option<Token> {
    let value = match lexer.peek().copied() {
        None => {
            let offset = lexer.source_len();
            return lexer.fail(LexError::UnterminatedChar { offset });
        }
        Some('\\') => {
            lexer.advance();
            match scan_escape(lexer) {
                Some(c) => c,
                None => {
                    let offset = lexer.source_len();
                    return lexer.fail(LexError::UnterminatedChar { offset });
                }
            }
        }
        Some('\n') => {
            let offset = lexer.start_offset();
            return lexer.fail(LexError::UnterminatedChar { offset });
        }
        Some(c) => {
            lexer.advance();
            c
        }
    };

    match lexer.peek().copied() {
        Some('\'') => {
            lexer.advance();
            Some(lexer.make_token(TokenKind::CharLiteral(value)))
        }
        None => {
            let offset = lexer.source_len();
            lexer.fail(LexError::UnterminatedChar { offset })
        }
        Some(_) => {
            let offset = lexer.start_offset();
            lexer.fail(LexError::UnterminatedChar { offset })
        }
    }
}

/// Decode one escape sequence after a backslash; `None` at end of input
fn scan_escape(lexer: &mut Lexer<'_>) -> Option<char> {
    let c = lexer.advance()?;
    let decoded = match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        'b' => '\u{8}',
        'f' => '\u{c}',
        '0' => '\0',
        'u' => {
            let mut code = 0u32;
            for _ in 0..4 {
                match lexer.peek().and_then(|c| c.to_digit(16)) {
                    Some(d) => {
                        lexer.advance();
                        code = code * 16 + d;
                    }
                    None => break,
                }
            }
            char::from_u32(code).unwrap_or('\u{fffd}')
        }
        other => other,
    };
    Some(decoded)
}

/// Check if character can start an identifier
pub fn is_identifier_start(c: char) -> bool {
    c == '_' || c == '$' || unicode_ident::is_xid_start(c)
}

/// Check if character can continue an identifier
pub fn is_identifier_char(c: char) -> bool {
    c == '$' || unicode_ident::is_xid_continue(c)
}

/// Check if character is a decimal digit
pub fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Check if character belongs to a symbolic identifier
pub fn is_operator_char(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | '*' | '/' | '%' | '<' | '>' | '=' | '!' | '&' | '|' | '^' | '~' | '?' | ':'
            | '\\' | '#' | '@'
    )
}
