//! Token-level reading of declaration headers
//!
//! Only the leading part of a statement is inspected: modifiers and
//! annotations, the declaration keyword, and for value definitions the
//! pattern left of `=`. Nothing here builds a syntax tree.

use crate::frontend::lexer::{Token, TokenKind};

/// Modifiers and annotations stripped from the front of a statement
#[derive(Debug)]
pub(super) struct Header<'t> {
    pub lazy: bool,
    pub case: bool,
    /// Tokens starting at the first non-modifier token
    pub rest: &'t [Token],
}

/// Soft modifiers spelled as plain identifiers
const SOFT_MODIFIERS: &[&str] = &["open", "inline", "transparent", "opaque", "infix"];

/// Skip annotations (`@ann`, `@a.b.C(args)`) and modifiers
pub(super) fn skip_modifiers(tokens: &[Token]) -> Header<'_> {
    let mut lazy = false;
    let mut case = false;
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i].kind {
            TokenKind::At => {
                i += 1;
                // Annotation name, possibly qualified
                while i < tokens.len() {
                    match tokens[i].kind {
                        TokenKind::Identifier(_) => i += 1,
                        TokenKind::Dot => i += 1,
                        _ => break,
                    }
                }
                if matches!(tokens.get(i).map(|t| &t.kind), Some(TokenKind::LParen)) {
                    i = skip_group(tokens, i);
                }
            }
            TokenKind::KwPrivate | TokenKind::KwProtected => {
                i += 1;
                // Access qualifier: `private[pkg]`
                if matches!(tokens.get(i).map(|t| &t.kind), Some(TokenKind::LBracket)) {
                    i = skip_group(tokens, i);
                }
            }
            kind if kind.is_modifier() => {
                lazy |= *kind == TokenKind::KwLazy;
                case |= *kind == TokenKind::KwCase;
                i += 1;
            }
            TokenKind::Identifier(word)
                if SOFT_MODIFIERS.contains(&word.as_str()) && starts_definition(&tokens[i + 1..]) =>
            {
                i += 1;
            }
            _ => break,
        }
    }

    Header {
        lazy,
        case,
        rest: &tokens[i..],
    }
}

/// Whether the tokens continue with a modifier or a definition keyword
fn starts_definition(tokens: &[Token]) -> bool {
    match tokens.first().map(|t| &t.kind) {
        Some(TokenKind::Identifier(word)) => SOFT_MODIFIERS.contains(&word.as_str()),
        Some(kind) => {
            kind.is_modifier()
                || matches!(
                    kind,
                    TokenKind::KwObject
                        | TokenKind::KwClass
                        | TokenKind::KwTrait
                        | TokenKind::KwEnum
                        | TokenKind::KwDef
                        | TokenKind::KwType
                        | TokenKind::KwVal
                        | TokenKind::KwVar
                        | TokenKind::At
                )
        }
        None => false,
    }
}

/// Index just past the bracket group opening at `start`
fn skip_group(
    tokens: &[Token],
    start: usize,
) -> usize {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(start) {
        if token.kind.is_open() {
            depth += 1;
        } else if token.kind.is_close() {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return i + 1;
            }
        }
    }
    tokens.len()
}

/// Name following a definition keyword
pub(super) fn declared_name(tokens: &[Token]) -> Option<String> {
    match tokens.first().map(|t| &t.kind) {
        Some(TokenKind::Identifier(name)) | Some(TokenKind::Operator(name)) => Some(name.clone()),
        _ => None,
    }
}

/// Split tokens at commas outside of any bracket
fn split_top_level(tokens: &[Token]) -> Vec<&[Token]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            ref k if k.is_open() => depth += 1,
            ref k if k.is_close() => depth = depth.saturating_sub(1),
            TokenKind::Comma if depth == 0 => {
                parts.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&tokens[start..]);
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

/// Names bound by the pattern of a `val`/`var`, `tokens` starting right
/// after the keyword
///
/// A pattern consisting of one identifier binds it whatever its case.
/// Inside a larger pattern only variable identifiers bind: lower case, not
/// backquoted, not a constructor (`Some(`), not part of a path, and not in a
/// type ascription.
pub(super) fn pattern_names(
    tokens: &[Token],
    source: &str,
) -> Vec<String> {
    let mut depth = 0usize;
    let mut end = tokens.len();
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            ref k if k.is_open() => depth += 1,
            ref k if k.is_close() => depth = depth.saturating_sub(1),
            TokenKind::Eq if depth == 0 => {
                end = i;
                break;
            }
            _ => {}
        }
    }

    let mut names = Vec::new();
    for part in split_top_level(&tokens[..end]) {
        for name in part_names(part, source) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

fn part_names(
    part: &[Token],
    source: &str,
) -> Vec<String> {
    let unascribed = match part.iter().position(|t| t.kind == TokenKind::Colon) {
        Some(colon) => &part[..colon],
        None => part,
    };
    if let [Token {
        kind: TokenKind::Identifier(name),
        ..
    }] = unascribed
    {
        return vec![name.clone()];
    }

    let mut names = Vec::new();
    let mut depth = 0usize;
    // Depth at which a type ascription is being skipped
    let mut ascription: Option<usize> = None;

    for (i, token) in part.iter().enumerate() {
        match &token.kind {
            k if k.is_open() => {
                depth += 1;
                continue;
            }
            k if k.is_close() => {
                depth = depth.saturating_sub(1);
                if ascription.map(|d| depth < d).unwrap_or(false) {
                    ascription = None;
                }
                continue;
            }
            TokenKind::Comma => {
                if ascription == Some(depth) {
                    ascription = None;
                }
                continue;
            }
            TokenKind::Colon => {
                if ascription.is_none() {
                    ascription = Some(depth);
                }
                continue;
            }
            _ => {}
        }
        if ascription.is_some() {
            continue;
        }

        let TokenKind::Identifier(name) = &token.kind else {
            continue;
        };
        let next = part.get(i + 1).map(|t| &t.kind);
        let prev = i.checked_sub(1).map(|j| &part[j].kind);
        let constructor = matches!(
            next,
            Some(TokenKind::LParen) | Some(TokenKind::Dot) | Some(TokenKind::LBracket)
        );
        let qualified = matches!(prev, Some(TokenKind::Dot));
        let backquoted = source
            .get(token.span.range())
            .map(|text| text.starts_with('`'))
            .unwrap_or(false);

        if is_variable(name) && !constructor && !qualified && !backquoted {
            names.push(name.clone());
        }
    }
    names
}

/// Variable identifiers start with anything but an upper case letter
fn is_variable(name: &str) -> bool {
    name.chars().next().map(|c| !c.is_uppercase()).unwrap_or(false)
}

/// Comma separated clauses of an import, `tokens` starting right after
/// `import`
pub(super) fn import_clauses(
    tokens: &[Token],
    source: &str,
) -> Vec<String> {
    split_top_level(tokens)
        .into_iter()
        .filter_map(|clause| {
            let first = clause.first()?;
            let last = clause.last()?;
            source
                .get(first.span.start.offset..last.span.end.offset)
                .map(str::to_string)
        })
        .collect()
}
