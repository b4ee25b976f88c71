//! Session tests
//!
//! Whole submissions through the engine and the reference interpreter.

use linewise::backends::dev::repl::{
    EvalResult, Evaluated, Evaluator, EvaluatorConfig, ReplError, WrapperId, WrapperMode,
};
use linewise::backends::interpreter::Interpreter;

fn session() -> Evaluator<Interpreter> {
    Evaluator::new(Interpreter::new())
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

/// Output of each input in turn
fn outputs(
    eval: &mut Evaluator<Interpreter>,
    inputs: &[&str],
) -> Vec<Vec<String>> {
    inputs
        .iter()
        .map(|input| success(eval.submit(input)).output)
        .collect()
}

#[test]
fn test_expression_gets_a_fresh_result() {
    let mut eval = session();
    let done = success(eval.submit("1 + 1"));
    assert_eq!(done.output, vec!["val res0: Int = 2"]);
    assert_eq!(done.bindings, vec!["res0"]);
    assert_eq!(done.wrapper, Some(WrapperId::new(1)));
    assert_eq!(eval.scope().read().len(), 1);

    let done = success(eval.submit("res0 * 10"));
    assert_eq!(done.output, vec!["val res1: Int = 20"]);
}

#[test]
fn test_definitions_are_visible_later() {
    let mut eval = session();
    let seen = outputs(
        &mut eval,
        &["val x = 2", "def sq(n: Int) = n * n", "sq(x) + 1"],
    );
    assert_eq!(
        seen,
        vec![
            vec!["val x: Int = 2"],
            vec!["defined function sq"],
            vec!["val res0: Int = 5"],
        ]
    );
}

#[test]
fn test_latest_definition_wins() {
    let mut eval = session();
    let seen = outputs(&mut eval, &["val x = 1", "val x = \"s\"", "x + \"!\""]);
    assert_eq!(seen[2], vec!["val res0: String = s!"]);
}

#[test]
fn test_import_is_echoed_and_recorded() {
    let mut eval = session();
    let done = success(eval.submit("import foo.bar"));
    assert_eq!(done.output, vec!["import foo.bar"]);
    assert_eq!(done.imports, vec!["foo.bar"]);
    {
        let scope = eval.scope();
        let scope = scope.read();
        assert_eq!(scope.imports().len(), 1);
        assert_eq!(scope.imports()[0].path, "foo.bar");
    }

    // Later units carry the import without echoing it again
    assert_eq!(success(eval.submit("3")).output, vec!["val res0: Int = 3"]);
}

#[test]
fn test_display_follows_declaration_order() {
    let mut eval = session();
    let done = success(eval.submit("val a = 1\nimport foo.bar\ncase class P(x: Int)\na + 1"));
    assert_eq!(
        done.output,
        vec![
            "val a: Int = 1",
            "import foo.bar",
            "defined case class P",
            "val res0_3: Int = 2",
        ]
    );
}

#[test]
fn test_incomplete_input_builds_nothing() {
    let mut eval = session();
    assert!(matches!(eval.submit("val x = {"), EvalResult::Incomplete));
    assert!(eval.last_unit().is_none());
    assert!(eval.scope().read().is_empty());

    let done = success(eval.submit("val x = {\n  1 + 2\n}"));
    assert_eq!(done.output, vec!["val x: Int = 3"]);
}

#[test]
fn test_fault_commits_nothing() {
    let mut eval = session();
    let e = failure(eval.submit("val a = 1\nval b = 2\nval c = a / 0"));
    assert_eq!(e.to_string(), "java.lang.ArithmeticException: / by zero");
    assert!(eval.scope().read().is_empty());

    // `a` never reached the scope
    let e = failure(eval.submit("a"));
    assert!(matches!(e, ReplError::Compile(_)));
    assert!(e.to_string().contains("not found: value a"));

    // The failed units spent their wrapper ids
    let done = success(eval.submit("val a = 5"));
    assert_eq!(done.wrapper, Some(WrapperId::new(3)));
}

#[test]
fn test_lazy_value_is_deferred() {
    let mut eval = session();
    let seen = outputs(
        &mut eval,
        &["lazy val big = { Thread.sleep(1); 99 }", "big - 9"],
    );
    assert_eq!(seen[0], vec!["lazy val big = <lazy>"]);
    assert_eq!(seen[1], vec!["val res0: Int = 90"]);

    let scope = eval.scope();
    let scope = scope.read();
    assert!(scope.lookup("big").is_some_and(|entry| entry.lazy));
}

#[test]
fn test_destructuring_displays_each_name() {
    let mut eval = session();
    let seen = outputs(&mut eval, &["val (a, b) = (1, \"two\")", "b + a"]);
    assert_eq!(seen[0], vec!["val a: Int = 1", "val b: String = two"]);
    assert_eq!(seen[1], vec!["val res0: String = two1"]);

    let e = failure(eval.submit("b * 2"));
    assert!(e.to_string().starts_with("type mismatch"));
}

#[test]
fn test_class_wrappers() {
    let config = EvaluatorConfig {
        wrapper_mode: WrapperMode::Class,
        ..EvaluatorConfig::default()
    };
    let mut eval = Evaluator::with_config(Interpreter::new(), config);
    let seen = outputs(&mut eval, &["val x = 3", "def twice(n: Int) = n * 2", "twice(x)"]);
    assert_eq!(seen[2], vec!["val res0: Int = 6"]);
    let source = &eval.last_unit().unwrap().source;
    assert!(source.starts_with("class $line3 {"));
    assert!(source.contains("import $line1$instance.x"));
}

#[test]
fn test_recursion_across_units() {
    let mut eval = session();
    let seen = outputs(
        &mut eval,
        &[
            "def fib(n: Int): Int = if (n < 2) n else fib(n - 1) + fib(n - 2)",
            "fib(15)",
        ],
    );
    assert_eq!(seen[1], vec!["val res0: Int = 610"]);
}

#[test]
fn test_custom_result_prefix() {
    let config = EvaluatorConfig {
        result_prefix: "out".to_string(),
        ..EvaluatorConfig::default()
    };
    let mut eval = Evaluator::with_config(Interpreter::new(), config);
    assert_eq!(success(eval.submit("true")).output, vec!["val out0: Boolean = true"]);
}

#[test]
fn test_package_clause_is_skipped() {
    let mut eval = session();
    let done = success(eval.submit("package demo"));
    assert_eq!(done.wrapper, None);
    assert!(done.output.is_empty());
}

#[test]
fn test_preload_imports() {
    let mut eval = session();
    eval.preload(&["scala.math._".to_string()]).unwrap();
    assert_eq!(eval.scope().read().imports().len(), 1);
    assert!(eval.history().is_empty());
    assert_eq!(
        success(eval.submit("math.max(2, 9)")).output,
        vec!["val res0: Int = 9"]
    );
}

#[test]
fn test_run_helper() {
    assert_eq!(linewise::run("40 + 2").unwrap(), vec!["val res0: Int = 42"]);
    assert!(linewise::run("val x = (").is_err());
    assert!(linewise::run("sys.error(\"no\")")
        .unwrap_err()
        .to_string()
        .contains("RuntimeException: no"));
}
