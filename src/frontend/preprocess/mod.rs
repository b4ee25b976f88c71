//! Declaration classifier and source rewriter
//!
//! Each statement is classified without a symbol table, from its leading
//! tokens only, in priority order:
//!
//! 1. structural declarations (`object`, `class`, `enum`, `trait`, `def`,
//!    `type`) are kept as-is and announced as `defined <label> <name>`
//! 2. `val`/`var`/`lazy val` definitions are kept as-is and display every
//!    name their pattern binds
//! 3. imports are kept as-is and echo their first clause
//! 4. anything else is an expression, rewritten to `val <hint> = (<expr>)`
//!
//! Before classifying, the statement text is split again on its own. It must
//! come back as exactly one statement with the same tokens; any disagreement
//! is reported, never patched over.

mod display;
mod parse;

#[cfg(test)]
mod tests;

pub use display::{
    ident_code, quote, render_defined, render_deferred, render_import, render_value,
    DisplayInstruction, DISPLAY_RUNTIME,
};

use crate::frontend::lexer::{Token, TokenKind};
use crate::frontend::splitter::{split, Split, Statement};
use tracing::debug;

/// Kind of a top-level statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    ObjectDef,
    ClassDef,
    TraitDef,
    FunctionDef,
    TypeDef,
    ValueOrPatternDef,
    ImportDecl,
    Expression,
}

impl DeclarationKind {
    /// Whether the statement defines a named entity
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            DeclarationKind::ObjectDef
                | DeclarationKind::ClassDef
                | DeclarationKind::TraitDef
                | DeclarationKind::FunctionDef
                | DeclarationKind::TypeDef
        )
    }
}

/// A name a statement adds to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    /// Defined with `lazy val`
    pub lazy: bool,
    /// Introduced by rewriting an expression
    pub synthetic: bool,
}

impl Binding {
    fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lazy: false,
            synthetic: false,
        }
    }
}

/// A classified statement ready to be placed in a unit
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub statement_index: usize,
    pub kind: DeclarationKind,
    /// Code placed in the unit body
    pub code: String,
    /// Display calls, in declaration order
    pub display: Vec<DisplayInstruction>,
    /// Names the statement binds
    pub bindings: Vec<Binding>,
    /// Import clauses the statement adds to the session scope
    pub imports: Vec<String>,
}

/// Result of classifying one statement
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Output(Processed),
    /// Nothing to evaluate (`package` clauses)
    Skip,
    /// The statement could not be read consistently
    Failure(Vec<String>),
}

/// Whether a name is an internal artifact that is never displayed
pub fn is_synthetic_name(name: &str) -> bool {
    name.contains('$')
}

/// Name an expression statement is bound to
///
/// The base is shared by every statement of one input; inputs with more than
/// one statement suffix it with the statement index.
pub fn result_name(
    base: &str,
    index: usize,
    statement_count: usize,
) -> String {
    if statement_count > 1 {
        format!("{}_{}", base, index)
    } else {
        base.to_string()
    }
}

/// Classify a statement and rewrite it for inclusion in a unit
///
/// `name_hint` names the binding an expression statement is rewritten into.
pub fn classify(
    statement: &Statement,
    name_hint: &str,
) -> Classification {
    let tokens = match resplit(statement) {
        Ok(tokens) => tokens,
        Err(disagreements) => {
            debug!(
                "statement {} failed the re-split check: {:?}",
                statement.index, disagreements
            );
            return Classification::Failure(disagreements);
        }
    };
    let source = statement.source.as_str();

    let header = parse::skip_modifiers(&tokens);
    let Some(keyword) = header.rest.first() else {
        return expression(statement, name_hint);
    };
    let after = &header.rest[1..];

    let result = match &keyword.kind {
        TokenKind::KwObject => {
            structural(statement, DeclarationKind::ObjectDef, "object", header.case, after)
        }
        TokenKind::KwClass => {
            structural(statement, DeclarationKind::ClassDef, "class", header.case, after)
        }
        TokenKind::KwEnum => structural(statement, DeclarationKind::ClassDef, "enum", false, after),
        TokenKind::KwTrait => {
            structural(statement, DeclarationKind::TraitDef, "trait", false, after)
        }
        TokenKind::KwDef => {
            structural(statement, DeclarationKind::FunctionDef, "function", false, after)
        }
        TokenKind::KwType => structural(statement, DeclarationKind::TypeDef, "type", false, after),
        TokenKind::KwVal | TokenKind::KwVar => {
            let keyword = if keyword.kind == TokenKind::KwVal { "val" } else { "var" };
            value_def(statement, keyword, header.lazy, parse::pattern_names(after, source))
        }
        TokenKind::KwImport => import(statement, parse::import_clauses(after, source)),
        TokenKind::KwPackage => {
            debug!("statement {} is a package clause, skipped", statement.index);
            Classification::Skip
        }
        _ if header.rest.len() < tokens.len() => Classification::Failure(vec![format!(
            "statement {}: modifiers must be followed by a definition, found {}",
            statement.index,
            keyword.kind.describe()
        )]),
        _ => expression(statement, name_hint),
    };

    if let Classification::Output(processed) = &result {
        debug!(
            "classified statement {} as {:?} with {} display instruction(s)",
            statement.index,
            processed.kind,
            processed.display.len()
        );
    }
    result
}

/// Split the statement text again on its own and compare token kinds
///
/// Returns the statement's significant tokens relative to its own text.
fn resplit(statement: &Statement) -> Result<Vec<Token>, Vec<String>> {
    let index = statement.index;
    let again = match split(&statement.source) {
        Split::Complete(mut statements) if statements.len() == 1 => statements.remove(0),
        Split::Complete(statements) => {
            return Err(vec![format!(
                "statement {} splits into {} statements on its own",
                index,
                statements.len()
            )]);
        }
        Split::Incomplete => {
            return Err(vec![format!(
                "statement {} is incomplete on its own",
                index
            )]);
        }
        Split::Malformed(err) => {
            return Err(vec![format!("statement {}: {}", index, err)]);
        }
    };

    let tokens: Vec<Token> = again
        .tokens
        .into_iter()
        .filter(|t| t.kind != TokenKind::Newline)
        .collect();
    let expected: Vec<&TokenKind> = statement.significant_kinds().collect();

    let mut disagreements = Vec::new();
    for (position, (found, wanted)) in tokens.iter().zip(expected.iter()).enumerate() {
        if &found.kind != *wanted {
            disagreements.push(format!(
                "statement {}: token {} reads as {} alone but as {} in context",
                index,
                position,
                found.kind.describe(),
                wanted.describe()
            ));
        }
    }
    if tokens.len() != expected.len() {
        disagreements.push(format!(
            "statement {}: {} tokens alone but {} in context",
            index,
            tokens.len(),
            expected.len()
        ));
    }

    if disagreements.is_empty() {
        Ok(tokens)
    } else {
        Err(disagreements)
    }
}

fn structural(
    statement: &Statement,
    kind: DeclarationKind,
    keyword: &str,
    case: bool,
    after: &[Token],
) -> Classification {
    let Some(name) = parse::declared_name(after) else {
        return Classification::Failure(vec![format!(
            "statement {}: expected a name after `{}`",
            statement.index, keyword
        )]);
    };
    let label = if case {
        format!("case {}", keyword)
    } else {
        keyword.to_string()
    };

    Classification::Output(Processed {
        statement_index: statement.index,
        kind,
        code: statement.source.clone(),
        display: vec![DisplayInstruction::Defined {
            label,
            name: name.clone(),
        }],
        bindings: vec![Binding::plain(name)],
        imports: Vec::new(),
    })
}

fn value_def(
    statement: &Statement,
    keyword: &str,
    lazy: bool,
    names: Vec<String>,
) -> Classification {
    let display = names
        .iter()
        .filter(|name| !is_synthetic_name(name))
        .map(|name| {
            if lazy {
                DisplayInstruction::Deferred { name: name.clone() }
            } else {
                DisplayInstruction::Value {
                    keyword: keyword.to_string(),
                    name: name.clone(),
                }
            }
        })
        .collect();
    let bindings = names
        .into_iter()
        .map(|name| Binding {
            name,
            lazy,
            synthetic: false,
        })
        .collect();

    Classification::Output(Processed {
        statement_index: statement.index,
        kind: DeclarationKind::ValueOrPatternDef,
        code: statement.source.clone(),
        display,
        bindings,
        imports: Vec::new(),
    })
}

fn import(
    statement: &Statement,
    clauses: Vec<String>,
) -> Classification {
    let display = clauses
        .first()
        .map(|path| DisplayInstruction::Import { path: path.clone() })
        .into_iter()
        .collect();

    Classification::Output(Processed {
        statement_index: statement.index,
        kind: DeclarationKind::ImportDecl,
        code: statement.source.clone(),
        display,
        bindings: Vec::new(),
        imports: clauses,
    })
}

fn expression(
    statement: &Statement,
    name_hint: &str,
) -> Classification {
    Classification::Output(Processed {
        statement_index: statement.index,
        kind: DeclarationKind::Expression,
        code: format!("val {} = ({})", ident_code(name_hint), statement.source),
        display: vec![DisplayInstruction::Value {
            keyword: "val".to_string(),
            name: name_hint.to_string(),
        }],
        bindings: vec![Binding {
            name: name_hint.to_string(),
            lazy: false,
            synthetic: true,
        }],
        imports: Vec::new(),
    })
}
