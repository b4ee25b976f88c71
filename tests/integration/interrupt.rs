//! Interrupt tests
//!
//! Cancelling a running unit from another thread, the way the binary's
//! Ctrl-C listener does.

use std::thread;
use std::time::{Duration, Instant};

use linewise::backends::dev::repl::{EvalResult, Evaluator, Interrupter};
use linewise::backends::interpreter::Interpreter;

/// Interrupt as soon as a unit is running
fn interrupt_when_busy(interrupter: Interrupter) -> thread::JoinHandle<bool> {
    thread::spawn(move || {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !interrupter.is_busy() {
            if Instant::now() > deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
        interrupter.interrupt()
    })
}

#[test]
fn test_idle_interrupt_is_ignored() {
    let eval = Evaluator::new(Interpreter::new());
    let interrupter = eval.interrupter();
    assert!(!interrupter.is_busy());
    assert!(!interrupter.interrupt());
}

#[test]
fn test_interrupt_abandons_the_unit() {
    let mut eval = Evaluator::new(Interpreter::new());
    assert!(eval.submit("val kept = 1").is_success());

    let canceller = interrupt_when_busy(eval.interrupter());
    let started = Instant::now();
    let result = eval.submit("val slow = { Thread.sleep(3000); 2 }");
    assert!(matches!(result, EvalResult::Interrupted));
    assert!(canceller.join().unwrap());
    assert!(started.elapsed() < Duration::from_millis(2500));

    // Scope is unchanged and the session keeps going
    assert_eq!(eval.scope().read().len(), 1);
    assert!(eval.scope().read().lookup("slow").is_none());
    assert_eq!(eval.stats().interrupts, 1);

    match eval.submit("kept + 1") {
        EvalResult::Success(done) => assert_eq!(done.output, vec!["val res0: Int = 2"]),
        other => panic!("expected success, got {:?}", other),
    }
    assert!(!eval.interrupter().is_busy());
}

#[test]
fn test_interrupted_input_is_not_recorded() {
    let mut eval = Evaluator::new(Interpreter::new());
    let canceller = interrupt_when_busy(eval.interrupter());
    assert!(matches!(
        eval.submit("Thread.sleep(3000)"),
        EvalResult::Interrupted
    ));
    assert!(canceller.join().unwrap());
    assert!(eval.history().is_empty());
}

#[test]
fn test_interrupted_worker_stops_running() {
    // Clones share the table of published wrappers
    let interpreter = Interpreter::new();
    let mut eval = Evaluator::new(interpreter.clone());

    let canceller = interrupt_when_busy(eval.interrupter());
    assert!(matches!(
        eval.submit("val slow = { Thread.sleep(800); 2 }"),
        EvalResult::Interrupted
    ));
    assert!(canceller.join().unwrap());

    // Left running, the worker would publish its wrapper once the sleep ended
    thread::sleep(Duration::from_millis(1500));
    assert!(!interpreter.is_loaded("$line1"));
    assert_eq!(interpreter.loaded_count(), 0);
}

#[test]
fn test_interrupt_stops_long_recursion() {
    let mut eval = Evaluator::new(Interpreter::new());
    assert!(eval
        .submit("def fib(n: Int): Int = if (n < 2) n else fib(n - 1) + fib(n - 2)")
        .is_success());

    let canceller = interrupt_when_busy(eval.interrupter());
    let started = Instant::now();
    assert!(matches!(eval.submit("fib(40)"), EvalResult::Interrupted));
    assert!(canceller.join().unwrap());
    assert!(started.elapsed() < Duration::from_secs(5));

    match eval.submit("fib(10)") {
        EvalResult::Success(done) => assert_eq!(done.output, vec!["val res0: Int = 55"]),
        other => panic!("expected success, got {:?}", other),
    }
}
