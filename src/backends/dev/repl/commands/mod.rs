//! REPL Command Handler
//!
//! Handles special commands starting with ':'. Commands only read session
//! state; printing is left to the front-end.

use std::fmt::Write as _;

use super::backend_trait::Backend;
use super::engine::Evaluator;

/// Command result
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Exit the REPL
    Exit,
    /// Continue to next input
    Continue,
    /// Output a message
    Output(String),
}

/// Command names offered for completion
pub const COMMANDS: &[&str] = &[
    ":bindings", ":b", ":help", ":h", ":history", ":imports", ":quit", ":q", ":stats", ":unit",
    ":u",
];

const HELP: &str = "\
Available commands:
  :quit, :q           - Exit the REPL
  :help, :h           - Show this help
  :imports            - List session imports
  :bindings, :b       - List visible bindings and their wrappers
  :history [n]        - Show the last n inputs (all by default)
  :stats              - Show execution statistics
  :unit, :u           - Show the source of the last built unit";

/// Command handler for REPL
pub struct CommandHandler<'a, B: Backend> {
    evaluator: &'a Evaluator<B>,
}

impl<'a, B: Backend> CommandHandler<'a, B> {
    /// Create a new command handler
    pub fn new(evaluator: &'a Evaluator<B>) -> Self {
        Self { evaluator }
    }

    /// Whether `line` is a command rather than source
    pub fn is_command(line: &str) -> bool {
        line.trim_start().starts_with(':')
    }

    /// Handle a command
    pub fn handle(
        &self,
        line: &str,
    ) -> CommandResult {
        let command = line.trim().trim_start_matches(':');
        let mut parts = command.split_whitespace();
        let Some(name) = parts.next() else {
            return CommandResult::Continue;
        };

        match name {
            "quit" | "q" => CommandResult::Exit,
            "help" | "h" => CommandResult::Output(HELP.to_string()),
            "imports" => CommandResult::Output(self.imports()),
            "bindings" | "b" => CommandResult::Output(self.bindings()),
            "history" | "hist" => match parts.next().map(str::parse::<usize>) {
                None => CommandResult::Output(self.history(None)),
                Some(Ok(count)) => CommandResult::Output(self.history(Some(count))),
                Some(Err(_)) => CommandResult::Output("Usage: :history [n]".to_string()),
            },
            "stats" => CommandResult::Output(self.stats()),
            "unit" | "u" => CommandResult::Output(self.unit()),
            _ => CommandResult::Output(format!(
                "Unknown command: :{}. Type :help for assistance",
                name
            )),
        }
    }

    fn imports(&self) -> String {
        let scope = self.evaluator.scope();
        let scope = scope.read();
        if scope.imports().is_empty() {
            return "No imports".to_string();
        }
        let lines: Vec<String> = scope
            .imports()
            .iter()
            .map(|entry| format!("import {}  ({})", entry.path, entry.origin))
            .collect();
        lines.join("\n")
    }

    fn bindings(&self) -> String {
        let scope = self.evaluator.scope();
        let scope = scope.read();
        let visible = scope.visible_bindings();
        if visible.is_empty() {
            return "No bindings".to_string();
        }
        let lines: Vec<String> = visible
            .iter()
            .map(|entry| {
                let lazy = if entry.lazy { ", lazy" } else { "" };
                format!("{}  ({}{})", entry.name, entry.origin, lazy)
            })
            .collect();
        lines.join("\n")
    }

    fn history(
        &self,
        count: Option<usize>,
    ) -> String {
        let entries = self.evaluator.history();
        if entries.is_empty() {
            return "History is empty".to_string();
        }
        let skip = count.map_or(0, |n| entries.len().saturating_sub(n));

        let mut out = String::new();
        for (i, entry) in entries.iter().enumerate().skip(skip) {
            for (j, line) in entry.lines().enumerate() {
                if j == 0 {
                    let _ = writeln!(out, "{:>4}  {}", i + 1, line);
                } else {
                    let _ = writeln!(out, "      {}", line);
                }
            }
        }
        out.trim_end().to_string()
    }

    fn stats(&self) -> String {
        let stats = self.evaluator.stats();
        format!(
            "Units run: {}\nFailures: {}\nInterrupts: {}\nTotal time: {:?}",
            stats.units_run, stats.failures, stats.interrupts, stats.total_time
        )
    }

    fn unit(&self) -> String {
        match self.evaluator.last_unit() {
            Some(unit) => unit.source.clone(),
            None => "No unit has been built yet".to_string(),
        }
    }
}
