//! Engine tests against a scripted backend

use std::sync::Arc;

use parking_lot::Mutex;

use crate::backends::dev::repl::backend_trait::{
    Backend, Diagnostic, EvalResult, Evaluated, Fault, Fragments, ReplError,
};
use crate::backends::dev::repl::history::MemoryHistory;

use super::*;

/// Compiles anything without `broken`, faults on `explode`, and echoes the
/// display calls of a unit as its fragments
#[derive(Debug, Default, Clone)]
struct ScriptedBackend {
    compiled: Arc<Mutex<Vec<String>>>,
}

impl Backend for ScriptedBackend {
    type Artifact = String;
    type Runnable = String;

    fn compile(
        &self,
        source: &str,
    ) -> Result<String, Vec<Diagnostic>> {
        self.compiled.lock().push(source.to_string());
        if source.contains("broken") {
            return Err(vec![Diagnostic::new("not found: value broken").at_line(2)]);
        }
        Ok(source.to_string())
    }

    fn load(
        &self,
        artifact: String,
    ) -> Result<String, Fault> {
        Ok(artifact)
    }

    fn invoke(
        &self,
        runnable: String,
    ) -> Result<Fragments, Fault> {
        if runnable.contains("explode") {
            return Err(Fault::Raised("boom".to_string()));
        }
        let fragments: Vec<Result<String, Fault>> = runnable
            .lines()
            .filter(|line| line.starts_with("$repl."))
            .map(|line| Ok(line.to_string()))
            .collect();
        Ok(Box::new(fragments.into_iter()))
    }
}

fn evaluator() -> Evaluator<ScriptedBackend> {
    Evaluator::new(ScriptedBackend::default())
}

fn success(result: EvalResult) -> Evaluated {
    match result {
        EvalResult::Success(evaluated) => evaluated,
        other => panic!("expected success, got {:?}", other),
    }
}

fn failure(result: EvalResult) -> ReplError {
    match result {
        EvalResult::Failed(e) => e,
        other => panic!("expected failure, got {:?}", other),
    }
}

#[cfg(test)]
mod submit_tests {
    use super::*;

    #[test]
    fn test_single_expression() {
        let mut eval = evaluator();
        let done = success(eval.submit("1 + 1"));
        assert_eq!(done.wrapper, Some(WrapperId::new(1)));
        assert_eq!(done.bindings, vec!["res0"]);
        assert_eq!(done.output, vec!["$repl.value(\"val\", \"res0\", res0)"]);
        assert_eq!(eval.scope().read().len(), 1);
        assert_eq!(eval.stats().units_run, 1);
    }

    #[test]
    fn test_blank_input_runs_nothing() {
        let mut eval = evaluator();
        let done = success(eval.submit("  \n "));
        assert_eq!(done, Evaluated::default());
        assert!(eval.last_unit().is_none());
        assert_eq!(eval.stats().units_run, 0);
    }

    #[test]
    fn test_package_clause_runs_nothing() {
        let mut eval = evaluator();
        assert_eq!(success(eval.submit("package foo")).wrapper, None);
    }

    #[test]
    fn test_result_counter_counts_synthetic_units() {
        let mut eval = evaluator();
        success(eval.submit("1 + 1"));
        success(eval.submit("val x = 1"));
        let done = success(eval.submit("2"));
        assert_eq!(done.bindings, vec!["res1"]);
        assert_eq!(done.wrapper, Some(WrapperId::new(3)));
    }

    #[test]
    fn test_multiple_expressions_get_suffixes() {
        let mut eval = evaluator();
        let done = success(eval.submit("1; 2"));
        assert_eq!(done.bindings, vec!["res0_0", "res0_1"]);
        assert_eq!(done.output.len(), 2);
        assert_eq!(success(eval.submit("3")).bindings, vec!["res1"]);
    }

    #[test]
    fn test_sink_sees_fragments_in_order() {
        let mut eval = evaluator();
        let mut seen = Vec::new();
        let result = eval.submit_with("val a = 1\nimport foo.bar\nclass C", &mut |text| {
            seen.push(text.to_string())
        });
        let done = success(result);
        assert_eq!(seen, done.output);
        assert_eq!(
            seen,
            vec![
                "$repl.value(\"val\", \"a\", a)",
                "$repl.imported(\"foo.bar\")",
                "$repl.defined(\"class\", \"C\")",
            ]
        );
        assert_eq!(done.imports, vec!["foo.bar"]);
    }

    #[test]
    fn test_later_units_bridge_earlier_names() {
        let mut eval = evaluator();
        success(eval.submit("val x = 1"));
        success(eval.submit("x + 1"));
        let unit = eval.last_unit().unwrap();
        assert!(unit.source.contains("import $line1.x"));
        assert_eq!(unit.snapshot.version(), 1);
    }

    #[test]
    fn test_class_mode_is_used() {
        let mut eval = Evaluator::with_config(
            ScriptedBackend::default(),
            EvaluatorConfig {
                result_prefix: "out".to_string(),
                wrapper_mode: WrapperMode::Class,
            },
        );
        let done = success(eval.submit("42"));
        assert_eq!(done.bindings, vec!["out0"]);
        assert!(eval
            .last_unit()
            .unwrap()
            .source
            .ends_with("object $line1$instance extends $line1"));
    }
}

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[test]
    fn test_incomplete_builds_no_unit() {
        let mut eval = evaluator();
        assert!(matches!(eval.submit("val x = {"), EvalResult::Incomplete));
        assert!(eval.last_unit().is_none());
        // No wrapper id was spent
        assert_eq!(success(eval.submit("1")).wrapper, Some(WrapperId::new(1)));
    }

    #[test]
    fn test_malformed_input() {
        let mut eval = evaluator();
        assert!(matches!(failure(eval.submit("1)")), ReplError::Parse(_)));
        assert_eq!(eval.stats().failures, 1);
        assert!(eval.scope().read().is_empty());
    }

    #[test]
    fn test_classification_failure_spends_nothing() {
        let history = MemoryHistory::new();
        let backend = ScriptedBackend::default();
        let compiled = Arc::clone(&backend.compiled);
        let mut eval = Evaluator::new(backend).with_history(Box::new(history.clone()));

        match failure(eval.submit("private 1")) {
            ReplError::Classification(reasons) => {
                assert_eq!(reasons.len(), 1);
                assert!(reasons[0].contains("modifiers must be followed by a definition"));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(eval.scope().read().is_empty());
        assert_eq!(eval.scope().read().version(), 0);
        assert!(history.entries().is_empty());
        assert!(eval.history().is_empty());
        assert!(eval.last_unit().is_none());
        assert!(compiled.lock().is_empty());

        assert_eq!(success(eval.submit("1")).wrapper, Some(WrapperId::new(1)));
    }

    #[test]
    fn test_compile_failure_leaves_scope_and_spends_id() {
        let backend = ScriptedBackend::default();
        let compiled = Arc::clone(&backend.compiled);
        let mut eval = Evaluator::new(backend);

        match failure(eval.submit("broken + 1")) {
            ReplError::Compile(diagnostics) => {
                assert_eq!(diagnostics[0].to_string(), "line 2: not found: value broken")
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(eval.scope().read().is_empty());
        assert_eq!(compiled.lock().len(), 1);

        // The failed unit's wrapper id is never reused, nor its result name
        let done = success(eval.submit("1"));
        assert_eq!(done.wrapper, Some(WrapperId::new(2)));
        assert_eq!(done.bindings, vec!["res0"]);
    }

    #[test]
    fn test_fault_after_some_statements_commits_nothing() {
        let history = MemoryHistory::new();
        let mut eval = evaluator().with_history(Box::new(history.clone()));
        success(eval.submit("val before = 0"));
        let version = eval.scope().read().version();

        let error = failure(eval.submit("val a = 1\nval b = 2\nexplode"));
        assert_eq!(error, ReplError::Runtime("boom".to_string()));
        assert_eq!(eval.scope().read().version(), version);
        assert_eq!(eval.scope().read().len(), 1);
        assert_eq!(history.entries(), vec!["val before = 0"]);
    }
}

#[cfg(test)]
mod history_tests {
    use super::*;

    #[test]
    fn test_only_successful_input_is_recorded() {
        let history = MemoryHistory::new();
        let mut eval = evaluator().with_history(Box::new(history.clone()));

        success(eval.submit("1 + 1"));
        eval.submit("val x = {");
        eval.submit("1)");
        eval.submit("   ");
        success(eval.submit("val y =\n  2"));

        assert_eq!(history.entries(), vec!["1 + 1", "val y =\n  2"]);
        assert_eq!(eval.history(), history.entries().as_slice());
    }

    #[test]
    fn test_loaded_entries_come_first() {
        let mut history = MemoryHistory::new();
        crate::backends::dev::repl::history::HistoryStore::record(&mut history, "old").unwrap();
        let mut eval = evaluator().with_history(Box::new(history.clone()));
        success(eval.submit("fresh"));
        assert_eq!(eval.history(), ["old".to_string(), "fresh".to_string()]);
    }

    #[test]
    fn test_preload_is_not_recorded() {
        let history = MemoryHistory::new();
        let mut eval = evaluator().with_history(Box::new(history.clone()));
        eval.preload(&["foo.bar".to_string(), "baz._".to_string()])
            .unwrap();

        let scope = eval.scope();
        let paths: Vec<String> = scope
            .read()
            .imports()
            .iter()
            .map(|entry| entry.path.clone())
            .collect();
        assert_eq!(paths, vec!["foo.bar", "baz._"]);
        assert!(history.entries().is_empty());
        assert!(eval.history().is_empty());
    }
}

mod properties {
    use proptest::prelude::*;

    use super::*;

    fn input_strategy() -> impl Strategy<Value = &'static str> {
        prop_oneof![
            Just("val x = 1"),
            Just("1 + 1"),
            Just("import foo.bar"),
            Just("def f(a: Int) = a"),
            Just("val (p, q) = (1, 2)"),
            Just("lazy val l = 3"),
            Just("broken"),
            Just("explode"),
            Just("val y = {"),
            Just("2; 3"),
            Just("private 1"),
        ]
    }

    proptest! {
        /// The scope never shrinks, and only successful units grow it
        #[test]
        fn test_scope_is_monotone(inputs in prop::collection::vec(input_strategy(), 1..12)) {
            let mut eval = evaluator();
            let mut size = 0;
            for input in inputs {
                let succeeded = eval.submit(input).is_success();
                let now = eval.scope().read().len();
                prop_assert!(now >= size);
                if !succeeded {
                    prop_assert_eq!(now, size);
                }
                size = now;
            }
        }

        /// Equal histories build byte-identical units
        #[test]
        fn test_units_are_deterministic(inputs in prop::collection::vec(input_strategy(), 1..10)) {
            let first = ScriptedBackend::default();
            let second = ScriptedBackend::default();
            let mut a = Evaluator::new(first.clone());
            let mut b = Evaluator::new(second.clone());
            for input in inputs {
                a.submit(input);
                b.submit(input);
            }
            prop_assert_eq!(first.compiled.lock().clone(), second.compiled.lock().clone());
            prop_assert_eq!(a.scope().read().clone(), b.scope().read().clone());
        }
    }
}
