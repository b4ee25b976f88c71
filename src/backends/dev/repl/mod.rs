//! REPL Module
//!
//! Incremental evaluation of an interactive session.
//!
//! This module contains:
//! - [`backend_trait::Backend`] - Compile, load and invoke boundary
//! - [`engine::Evaluator`] - Drives a submission through to committed state
//! - [`history`] - Persistent store of successful inputs
//! - [`commands::CommandHandler`] - `:` command processor
//! - [`line::LineREPL`] - Line-based front-end with rustyline

pub mod backend_trait;
pub mod commands;
pub mod engine;
pub mod history;
pub mod line;

pub use backend_trait::{
    Backend, Diagnostic, EvalResult, Evaluated, ExecutionStats, Fault, Fragments, ReplError,
};
pub use commands::{CommandHandler, CommandResult};
pub use engine::{
    CancelToken, Evaluator, EvaluatorConfig, Interrupter, SessionScope, WrapperId, WrapperMode,
};
pub use history::{FileHistory, HistoryError, HistoryStore, MemoryHistory};
pub use line::{LineConfig, LineREPL};
