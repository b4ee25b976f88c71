//! Frontend tests
//!
//! - splitter: statement boundaries, continuation and incomplete input
//! - fuzz: property tests for boundary stability

mod splitter;

use crate::frontend::splitter::{split, Split, Statement};

/// Split and expect complete input
fn statements(buffer: &str) -> Vec<Statement> {
    match split(buffer) {
        Split::Complete(statements) => statements,
        other => panic!("expected complete input for {:?}, got {:?}", buffer, other),
    }
}

fn sources(buffer: &str) -> Vec<String> {
    statements(buffer).into_iter().map(|s| s.source).collect()
}
