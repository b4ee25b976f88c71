//! REPL Evaluation Engine
//!
//! Drives one submission from raw text to committed session state:
//! split, classify, build the unit, then compile, load and run it on a
//! worker thread. Scope, statistics and history only change after a unit
//! ran to completion.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::backends::dev::repl::backend_trait::{
    Backend, EvalResult, Evaluated, ExecutionStats, ReplError,
};
use crate::backends::dev::repl::history::HistoryStore;
use crate::frontend::preprocess::{classify, result_name, Classification};
use crate::frontend::splitter::{split, Split};

use super::context::{SessionScope, SharedScope, WrapperId};
use super::interrupt::{
    CancelToken, EventSender, InterruptController, Interrupter, RunOutcome, WorkerEvent,
};
use super::module_builder::{build_unit, Unit, WrapperMode};

/// Engine settings
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// Base of synthetic result names (`res` gives `res0`, `res1`, ...)
    pub result_prefix: String,
    pub wrapper_mode: WrapperMode,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            result_prefix: "res".to_string(),
            wrapper_mode: WrapperMode::Object,
        }
    }
}

/// Evaluation Engine
///
/// Owns the session: scope, wrapper numbering, statistics and history.
/// Submissions are strictly sequential.
pub struct Evaluator<B: Backend> {
    backend: Arc<B>,
    config: EvaluatorConfig,
    scope: SharedScope,
    controller: InterruptController,
    /// Next wrapper number; never reused
    next_wrapper: u64,
    /// Units that committed a synthetic result
    result_counter: u64,
    stats: ExecutionStats,
    history: Option<Box<dyn HistoryStore>>,
    /// History as loaded at session start plus this session's entries
    history_entries: Vec<String>,
    last_unit: Option<Unit>,
}

impl<B: Backend> Evaluator<B> {
    /// Create an engine with default settings
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, EvaluatorConfig::default())
    }

    /// Create an engine with custom settings
    pub fn with_config(
        backend: B,
        config: EvaluatorConfig,
    ) -> Self {
        info!(
            "starting session ({} wrappers, result prefix '{}')",
            config.wrapper_mode, config.result_prefix
        );
        Self {
            backend: Arc::new(backend),
            config,
            scope: SessionScope::shared(),
            controller: InterruptController::new(),
            next_wrapper: 1,
            result_counter: 0,
            stats: ExecutionStats::default(),
            history: None,
            history_entries: Vec::new(),
            last_unit: None,
        }
    }

    /// Attach a history store; its entries are read once, here
    pub fn with_history(
        mut self,
        store: Box<dyn HistoryStore>,
    ) -> Self {
        match store.load() {
            Ok(entries) => {
                debug!("loaded {} history entries", entries.len());
                self.history_entries = entries;
            }
            Err(e) => warn!("cannot load history: {}", e),
        }
        self.history = Some(store);
        self
    }

    /// Handle for cancelling the running unit from another thread
    pub fn interrupter(&self) -> Interrupter {
        self.controller.interrupter()
    }

    /// Shared session scope, for readers such as the completer
    pub fn scope(&self) -> SharedScope {
        Arc::clone(&self.scope)
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    pub fn stats(&self) -> &ExecutionStats {
        &self.stats
    }

    /// History loaded at start plus inputs recorded since
    pub fn history(&self) -> &[String] {
        &self.history_entries
    }

    /// The most recently built unit, whatever became of it
    pub fn last_unit(&self) -> Option<&Unit> {
        self.last_unit.as_ref()
    }

    /// Evaluate one submission, discarding streamed fragments
    pub fn submit(
        &mut self,
        raw: &str,
    ) -> EvalResult {
        self.submit_with(raw, &mut |_| {})
    }

    /// Evaluate one submission, passing each display fragment to `sink` as
    /// soon as it is produced
    pub fn submit_with(
        &mut self,
        raw: &str,
        sink: &mut dyn FnMut(&str),
    ) -> EvalResult {
        let result = self.evaluate(raw, sink);
        if let EvalResult::Success(evaluated) = &result {
            if !raw.trim().is_empty() {
                self.record_history(raw);
            }
            debug!(
                "submission done: {} fragment(s), {} binding(s)",
                evaluated.output.len(),
                evaluated.bindings.len()
            );
        }
        result
    }

    /// Run session start imports; they are never recorded in history
    pub fn preload(
        &mut self,
        imports: &[String],
    ) -> Result<(), ReplError> {
        if imports.is_empty() {
            return Ok(());
        }
        let source = imports
            .iter()
            .map(|path| format!("import {}", path))
            .collect::<Vec<_>>()
            .join("\n");
        match self.evaluate(&source, &mut |_| {}) {
            EvalResult::Success(_) => Ok(()),
            EvalResult::Failed(e) => Err(e),
            EvalResult::Incomplete => Err(ReplError::Runtime(
                "auto-import list is incomplete".to_string(),
            )),
            EvalResult::Interrupted => {
                Err(ReplError::Runtime("auto-imports were interrupted".to_string()))
            }
        }
    }

    fn evaluate(
        &mut self,
        raw: &str,
        sink: &mut dyn FnMut(&str),
    ) -> EvalResult {
        let statements = match split(raw) {
            Split::Complete(statements) => statements,
            Split::Incomplete => {
                debug!("input is incomplete, waiting for more");
                return EvalResult::Incomplete;
            }
            Split::Malformed(e) => {
                self.stats.failures += 1;
                return EvalResult::Failed(ReplError::Parse(e));
            }
        };
        if statements.is_empty() {
            return EvalResult::Success(Evaluated::default());
        }

        let base = format!("{}{}", self.config.result_prefix, self.result_counter);
        let count = statements.len();
        let mut processed = Vec::with_capacity(count);
        let mut reasons = Vec::new();
        for statement in &statements {
            match classify(statement, &result_name(&base, statement.index, count)) {
                Classification::Output(p) => processed.push(p),
                Classification::Skip => {}
                Classification::Failure(r) => reasons.extend(r),
            }
        }
        if !reasons.is_empty() {
            self.stats.failures += 1;
            return EvalResult::Failed(ReplError::Classification(reasons));
        }
        if processed.is_empty() {
            return EvalResult::Success(Evaluated::default());
        }

        let id = self.allocate_wrapper();
        let unit = {
            let scope = self.scope.read();
            build_unit(processed, &scope, id, self.config.wrapper_mode)
        };
        self.last_unit = Some(unit.clone());

        let started = Instant::now();
        let outcome = self.controller.run(
            format!("eval-{}", id),
            self.job(&unit),
            sink,
        );

        match outcome {
            RunOutcome::Completed(output) => {
                self.stats.units_run += 1;
                self.stats.total_time += started.elapsed();
                EvalResult::Success(self.commit(&unit, output))
            }
            RunOutcome::Failed(e) => {
                debug!("unit {} failed: {}", id, e);
                self.stats.failures += 1;
                EvalResult::Failed(e)
            }
            RunOutcome::Interrupted => {
                info!("unit {} interrupted", id);
                self.stats.interrupts += 1;
                EvalResult::Interrupted
            }
        }
    }

    fn allocate_wrapper(&mut self) -> WrapperId {
        let id = WrapperId::new(self.next_wrapper);
        self.next_wrapper += 1;
        id
    }

    /// Work done on the worker thread: compile, load, invoke, stream
    fn job(
        &self,
        unit: &Unit,
    ) -> impl FnOnce(&EventSender, CancelToken) -> Result<(), ReplError> + Send + 'static {
        let backend = Arc::clone(&self.backend);
        let source = unit.source.clone();
        let id = unit.id;
        move |events, cancel| {
            let artifact = backend.compile(&source).map_err(ReplError::Compile)?;
            debug!("compiled {}", id);
            let runnable = backend
                .load(artifact)
                .map_err(|f| ReplError::Runtime(f.to_string()))?;
            let fragments = backend
                .invoke_cancellable(runnable, &cancel)
                .map_err(|f| ReplError::Runtime(f.to_string()))?;
            for fragment in fragments {
                let text = fragment.map_err(|f| ReplError::Runtime(f.to_string()))?;
                if events.send(WorkerEvent::Fragment(text)).is_err() {
                    // The engine stopped listening
                    return Ok(());
                }
            }
            Ok(())
        }
    }

    /// Publish a completed unit to the session
    fn commit(
        &mut self,
        unit: &Unit,
        output: Vec<String>,
    ) -> Evaluated {
        let delta = unit.delta();
        let evaluated = Evaluated {
            wrapper: Some(unit.id),
            output,
            bindings: delta.bindings.iter().map(|(name, _)| name.clone()).collect(),
            imports: delta.imports.clone(),
        };

        self.scope.write().commit(unit.id, delta);
        if unit.has_synthetic() {
            self.result_counter += 1;
        }
        debug!("committed unit {}", unit.id);
        evaluated
    }

    fn record_history(
        &mut self,
        raw: &str,
    ) {
        self.history_entries.push(raw.to_string());
        if let Some(store) = self.history.as_mut() {
            if let Err(e) = store.record(raw) {
                warn!("cannot record history: {}", e);
            }
        }
    }
}
