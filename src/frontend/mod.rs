//! Frontend of the incremental evaluator
//!
//! Raw input travels through three stages before anything is compiled:
//! the lexer produces tokens, the splitter cuts the buffer into top-level
//! statements, and the preprocessor classifies each statement and rewrites it
//! into wrapper-ready code plus display instructions.

pub mod lexer;
pub mod preprocess;
pub mod splitter;

#[cfg(test)]
mod tests;

pub use preprocess::{classify, Classification, DeclarationKind, DisplayInstruction, Processed};
pub use splitter::{split, ParseError, Split, Statement};
