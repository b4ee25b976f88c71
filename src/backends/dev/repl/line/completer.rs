//! REPL Completer
//!
//! Provides completion candidates for rustyline from the session scope.

use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use crate::backends::dev::repl::commands::COMMANDS;
use crate::backends::dev::repl::engine::SharedScope;

/// Keywords offered alongside bound names
const KEYWORDS: &[&str] = &[
    "case", "class", "def", "else", "extends", "false", "for", "if", "implicit", "import",
    "lazy", "match", "new", "null", "object", "override", "package", "private", "protected",
    "return", "sealed", "this", "trait", "true", "type", "val", "var", "while", "with",
    "yield",
];

/// rustyline helper for the line REPL
///
/// Reads the scope the engine commits to, so names bound by earlier
/// inputs complete without any extra bookkeeping.
pub struct ReplHelper {
    scope: SharedScope,
}

impl ReplHelper {
    /// Create a helper over `scope`
    pub fn new(scope: SharedScope) -> Self {
        Self { scope }
    }

    /// Candidates for `word`, sorted and deduplicated
    pub fn candidates(
        &self,
        word: &str,
    ) -> Vec<Pair> {
        let mut candidates = Vec::new();

        if word.starts_with(':') {
            for command in COMMANDS.iter().filter(|c| c.starts_with(word)) {
                candidates.push(Pair {
                    display: command.to_string(),
                    replacement: command.to_string(),
                });
            }
        } else if !word.is_empty() {
            let scope = self.scope.read();
            for entry in scope.visible_bindings() {
                if entry.name.starts_with(word) {
                    candidates.push(Pair {
                        display: format!("{}  ({})", entry.name, entry.origin),
                        replacement: entry.name.clone(),
                    });
                }
            }
            for keyword in KEYWORDS.iter().filter(|k| k.starts_with(word)) {
                candidates.push(Pair {
                    display: keyword.to_string(),
                    replacement: keyword.to_string(),
                });
            }
        }

        candidates.sort_by(|a, b| a.replacement.cmp(&b.replacement));
        candidates.dedup_by(|a, b| a.replacement == b.replacement);
        candidates
    }
}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, word) = find_word_start(line, pos);
        Ok((start, self.candidates(word)))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;
}

impl Highlighter for ReplHelper {}

impl Validator for ReplHelper {}

impl Helper for ReplHelper {}

/// Start of the word ending at `pos`; a leading `:` at the start of the
/// line belongs to the word
fn find_word_start(
    line: &str,
    pos: usize,
) -> (usize, &str) {
    let line = &line[..pos];
    let trimmed = line.trim_start();
    if trimmed.starts_with(':') && !trimmed.contains(char::is_whitespace) {
        let start = line.len() - trimmed.len();
        return (start, trimmed);
    }
    let start = line
        .rfind(|c: char| !c.is_alphanumeric() && c != '_' && c != '$')
        .map(|i| i + 1)
        .unwrap_or(0);
    (start, &line[start..])
}
