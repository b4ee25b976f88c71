//! REPL Backend Trait
//!
//! Defines the compile/load/invoke contract the execution engine drives, and
//! the result types handed back to the front-end.

use std::fmt;
use std::time::Duration;

use crate::frontend::splitter::ParseError;

use super::engine::context::WrapperId;
use super::engine::interrupt::CancelToken;

/// Compiler message for a unit that failed to compile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based line within the unit source, when known
    pub line: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic without a location
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            line: None,
            message: message.into(),
        }
    }

    /// Attach a unit source line
    pub fn at_line(
        mut self,
        line: usize,
    ) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Failure raised while loading or running a unit
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    /// An exception escaped user code
    #[error("{0}")]
    Raised(String),
    /// The unit references a wrapper that is not available
    #[error("link error: {0}")]
    Link(String),
}

/// Lazily produced display text of one unit; each `next()` runs one display
/// instruction
pub type Fragments = Box<dyn Iterator<Item = Result<String, Fault>> + Send>;

/// Compiler and loading substrate behind the execution engine
///
/// Every call happens on the unit's worker thread, so implementations must be
/// shareable across threads. `invoke` may block for as long as user code runs.
pub trait Backend: Send + Sync + 'static {
    /// Compiled form of a unit
    type Artifact: Send + 'static;
    /// Linked form of a unit, ready to run
    type Runnable: Send + 'static;

    /// Compile the source of one unit
    fn compile(
        &self,
        source: &str,
    ) -> Result<Self::Artifact, Vec<Diagnostic>>;

    /// Link a compiled unit against the units loaded before it
    fn load(
        &self,
        artifact: Self::Artifact,
    ) -> Result<Self::Runnable, Fault>;

    /// Run the unit body and return its display fragments
    fn invoke(
        &self,
        runnable: Self::Runnable,
    ) -> Result<Fragments, Fault>;

    /// `invoke`, stopping early once `cancel` fires
    ///
    /// The engine always calls this form. The default ignores the token, in
    /// which case an interrupted worker runs on until user code returns.
    fn invoke_cancellable(
        &self,
        runnable: Self::Runnable,
        _cancel: &CancelToken,
    ) -> Result<Fragments, Fault> {
        self.invoke(runnable)
    }
}

/// Error surfaced for one submission
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReplError {
    #[error("syntax error: {0}")]
    Parse(ParseError),
    #[error("could not classify input: {}", .0.join("; "))]
    Classification(Vec<String>),
    #[error("compilation failed: {}", join_diagnostics(.0))]
    Compile(Vec<Diagnostic>),
    #[error("{0}")]
    Runtime(String),
}

fn join_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Successful evaluation of one submission
#[derive(Debug, Default, PartialEq)]
pub struct Evaluated {
    /// Wrapper the submission ran in; `None` when nothing had to run
    pub wrapper: Option<WrapperId>,
    /// Display fragments in declaration order
    pub output: Vec<String>,
    /// Names committed to the session scope
    pub bindings: Vec<String>,
    /// Import clauses committed to the session scope
    pub imports: Vec<String>,
}

/// Evaluation result
///
/// Consumed once by the front-end, hence not `Clone`.
#[derive(Debug)]
pub enum EvalResult {
    Success(Evaluated),
    /// More input needed (incomplete statement)
    Incomplete,
    /// The unit was cancelled while running
    Interrupted,
    Failed(ReplError),
}

impl EvalResult {
    /// Whether the submission completed successfully
    pub fn is_success(&self) -> bool {
        matches!(self, EvalResult::Success(_))
    }
}

/// Execution statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExecutionStats {
    /// Units that ran to completion
    pub units_run: usize,
    /// Submissions that ended in an error
    pub failures: usize,
    /// Units cancelled by an interrupt
    pub interrupts: usize,
    /// Wall time spent running units
    pub total_time: Duration,
}
