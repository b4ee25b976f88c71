//! Display instructions
//!
//! Instructions are emitted into the unit as calls on the `$repl` display
//! runtime so that text only exists once the unit runs. The same module owns
//! the textual rendering the runtime produces for each call.

use crate::frontend::lexer::{tokenize, TokenKind};
use std::fmt;

/// Receiver of display calls inside generated units
pub const DISPLAY_RUNTIME: &str = "$repl";

/// Deferred, ordered action producing text for one declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayInstruction {
    /// `defined <label> <name>`
    Defined { label: String, name: String },
    /// Evaluate the binding and print it with its type
    Value { keyword: String, name: String },
    /// Placeholder for a lazy binding; never forces it
    Deferred { name: String },
    /// Echo of an import path
    Import { path: String },
}

impl DisplayInstruction {
    /// Method of the display runtime this instruction calls
    pub fn method(&self) -> &'static str {
        match self {
            DisplayInstruction::Defined { .. } => "defined",
            DisplayInstruction::Value { .. } => "value",
            DisplayInstruction::Deferred { .. } => "deferred",
            DisplayInstruction::Import { .. } => "imported",
        }
    }

    /// Source of the call, e.g. `$repl.value("val", "x", x)`
    pub fn to_code(&self) -> String {
        let args = match self {
            DisplayInstruction::Defined { label, name } => {
                format!("{}, {}", quote(label), quote(name))
            }
            DisplayInstruction::Value { keyword, name } => {
                format!("{}, {}, {}", quote(keyword), quote(name), ident_code(name))
            }
            DisplayInstruction::Deferred { name } => quote(name),
            DisplayInstruction::Import { path } => quote(path),
        };
        format!("{}.{}({})", DISPLAY_RUNTIME, self.method(), args)
    }
}

impl fmt::Display for DisplayInstruction {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.to_code())
    }
}

/// String literal for `text`
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Reference to a binding in source, backquoted unless it lexes as a plain
/// identifier
pub fn ident_code(name: &str) -> String {
    let plain = match tokenize(name) {
        Ok(tokens) => matches!(
            tokens.as_slice(),
            [first, last]
                if first.kind == TokenKind::Identifier(name.to_string())
                    && first.span.len() == name.len()
                    && last.kind == TokenKind::Eof
        ),
        Err(_) => false,
    };
    if plain {
        name.to_string()
    } else {
        format!("`{}`", name)
    }
}

/// `defined class Foo`
pub fn render_defined(
    label: &str,
    name: &str,
) -> String {
    format!("defined {} {}", label, name)
}

/// `val x: Int = 2`
pub fn render_value(
    keyword: &str,
    name: &str,
    type_name: &str,
    value: &str,
) -> String {
    format!("{} {}: {} = {}", keyword, name, type_name, value)
}

/// `lazy val x = <lazy>`
pub fn render_deferred(name: &str) -> String {
    format!("lazy val {} = <lazy>", name)
}

/// `import foo.bar`
pub fn render_import(path: &str) -> String {
    format!("import {}", path)
}
