//! REPL Engine Module
//!
//! Core evaluation engine for REPL sessions.

pub mod context;
pub mod evaluator;
pub mod interrupt;
pub mod module_builder;

#[cfg(test)]
mod tests;

pub use context::{BindingEntry, ImportEntry, ScopeDelta, SessionScope, SharedScope, WrapperId};
pub use evaluator::{Evaluator, EvaluatorConfig};
pub use interrupt::{CancelToken, InterruptController, Interrupter, RunOutcome};
pub use module_builder::{build_unit, Unit, WrapperMode};
