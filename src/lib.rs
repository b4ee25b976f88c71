//! linewise
//!
//! Incremental execution core for an interactive read-eval-print loop.
//! Each submission is split into statements, classified, wrapped into a
//! uniquely named unit that imports everything earlier units defined, then
//! compiled, loaded and run by a pluggable backend.
//!
//! # Example
//!
//! ```
//! use linewise::backends::dev::repl::{EvalResult, Evaluator};
//! use linewise::backends::interpreter::Interpreter;
//!
//! let mut session = Evaluator::new(Interpreter::new());
//! session.submit("val x = 20");
//! match session.submit("x * 2 + 2") {
//!     EvalResult::Success(evaluated) => {
//!         assert_eq!(evaluated.output, vec!["val res0: Int = 42"]);
//!     }
//!     _ => unreachable!(),
//! }
//! ```

#![warn(rust_2018_idioms)]

pub mod backends;
pub mod frontend;
pub mod util;

// Re-exports
pub use anyhow::{Context, Result};
pub use thiserror::Error;

use tracing::debug;

use crate::backends::dev::repl::{EvalResult, Evaluator};
use crate::backends::interpreter::Interpreter;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Program name
pub const NAME: &str = "linewise";

/// Evaluate `source` in a fresh session with the reference interpreter,
/// returning the display output
///
/// ```
/// let output = linewise::run("val a = 1\na + 1").unwrap();
/// assert_eq!(output, vec!["val a: Int = 1", "val res0_1: Int = 2"]);
/// ```
pub fn run(source: &str) -> Result<Vec<String>> {
    debug!("evaluating {} byte(s) in a fresh session", source.len());
    let mut session = Evaluator::new(Interpreter::new());
    match session.submit(source) {
        EvalResult::Success(evaluated) => Ok(evaluated.output),
        EvalResult::Incomplete => Err(anyhow::anyhow!("input is incomplete")),
        EvalResult::Interrupted => Err(anyhow::anyhow!("evaluation was interrupted")),
        EvalResult::Failed(e) => Err(e.into()),
    }
}
