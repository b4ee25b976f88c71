//! History tests
//!
//! File-backed history across sessions.

use std::fs;

use linewise::backends::dev::repl::{Evaluator, FileHistory, HistoryStore};
use linewise::backends::interpreter::Interpreter;

fn session(history: &FileHistory) -> Evaluator<Interpreter> {
    Evaluator::new(Interpreter::new()).with_history(Box::new(history.clone()))
}

#[test]
fn test_history_survives_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let history = FileHistory::new(dir.path().join("nested").join("history.jsonl"), 100);

    {
        let mut eval = session(&history);
        assert!(eval.submit("val x = 1").is_success());
        assert!(!eval.submit("1 / 0").is_success());
        assert!(eval.submit("def inc(n: Int) =\n  n + x").is_success());
        assert!(eval.submit("   ").is_success());
    }

    let eval = session(&history);
    assert_eq!(
        eval.history(),
        &["val x = 1".to_string(), "def inc(n: Int) =\n  n + x".to_string()]
    );

    // One JSON string per line
    let content = fs::read_to_string(history.path()).unwrap();
    assert_eq!(content.lines().count(), 2);
}

#[test]
fn test_history_is_trimmed_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.jsonl");

    let mut eval = session(&FileHistory::new(&path, 100));
    for input in ["1", "2", "3", "4"] {
        assert!(eval.submit(input).is_success());
    }

    let short = FileHistory::new(&path, 2);
    assert_eq!(short.load().unwrap(), vec!["3", "4"]);
    assert_eq!(session(&short).history(), &["3".to_string(), "4".to_string()]);

    // Loading rewrote the file down to the kept entries
    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
}

#[test]
fn test_preload_is_not_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let history = FileHistory::new(dir.path().join("history.jsonl"), 10);

    let mut eval = session(&history);
    eval.preload(&["scala.math._".to_string()]).unwrap();
    assert!(eval.submit("math.abs(-3)").is_success());
    assert_eq!(history.load().unwrap(), vec!["math.abs(-3)"]);
}
