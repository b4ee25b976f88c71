//! Development tools
//!
//! Interactive evaluation lives here; backends plug in through
//! [`repl::Backend`].

pub mod repl;

pub use repl::{Evaluator, LineREPL};
