//! Line-based REPL with rustyline
//!
//! Reads input line by line, accumulating a buffer while the engine reports
//! it incomplete, and prints display fragments as the unit produces them.

use rustyline::config::Config;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, EditMode, Editor};
use tracing::{debug, warn};

use crate::backends::dev::repl::backend_trait::{Backend, EvalResult};
use crate::backends::dev::repl::commands::{CommandHandler, CommandResult};
use crate::backends::dev::repl::engine::Evaluator;

mod completer;
pub use completer::ReplHelper;

/// Line REPL configuration
#[derive(Debug, Clone)]
pub struct LineConfig {
    /// Prompt to display
    pub prompt: String,
    /// Prompt while a statement is incomplete
    pub continuation_prompt: String,
    /// Enable VI mode
    pub vi_mode: bool,
    /// Entries kept by the line editor
    pub history_size: usize,
    /// Colour errors and notices
    pub colors: bool,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            prompt: "scala> ".into(),
            continuation_prompt: "     | ".into(),
            vi_mode: false,
            history_size: 1000,
            colors: true,
        }
    }
}

/// Line REPL
pub struct LineREPL<B: Backend> {
    config: LineConfig,
    editor: Editor<ReplHelper, DefaultHistory>,
    evaluator: Evaluator<B>,
}

impl<B: Backend> LineREPL<B> {
    /// Create a line REPL with the default configuration
    pub fn new(evaluator: Evaluator<B>) -> Result<Self> {
        Self::with_config(evaluator, LineConfig::default())
    }

    /// Create with custom config
    ///
    /// The editor's history is seeded from the session history, which the
    /// evaluator loaded from its store.
    pub fn with_config(
        evaluator: Evaluator<B>,
        config: LineConfig,
    ) -> Result<Self> {
        let rl_config = Config::builder()
            .history_ignore_space(true)
            .max_history_size(config.history_size)?
            .auto_add_history(false)
            .completion_type(CompletionType::List)
            .edit_mode(if config.vi_mode {
                EditMode::Vi
            } else {
                EditMode::Emacs
            })
            .build();

        let mut editor = Editor::with_config(rl_config)?;
        editor.set_helper(Some(ReplHelper::new(evaluator.scope())));
        for entry in evaluator.history() {
            editor.add_history_entry(entry.as_str())?;
        }
        debug!("seeded line editor with {} entries", evaluator.history().len());

        Ok(Self {
            config,
            editor,
            evaluator,
        })
    }

    /// Run until `:quit` or end of input
    pub fn run(&mut self) -> Result<()> {
        println!("linewise {} - Type :help for assistance", crate::VERSION);
        println!("Press Ctrl+D or :quit to exit\n");

        let mut buffer = String::new();

        loop {
            let prompt = if buffer.is_empty() {
                &self.config.prompt
            } else {
                &self.config.continuation_prompt
            };

            let line = match self.editor.readline(prompt) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    // Ctrl-C drops the pending buffer
                    println!("^C");
                    buffer.clear();
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e),
            };

            if buffer.is_empty() && CommandHandler::<B>::is_command(&line) {
                match CommandHandler::new(&self.evaluator).handle(&line) {
                    CommandResult::Exit => break,
                    CommandResult::Continue => {}
                    CommandResult::Output(text) => println!("{}", text),
                }
                continue;
            }

            if !buffer.is_empty() {
                buffer.push('\n');
            }
            buffer.push_str(&line);

            let result = self.evaluator.submit_with(&buffer, &mut |fragment| {
                println!("{}", fragment);
            });
            match result {
                EvalResult::Incomplete => continue,
                EvalResult::Success(_) => {
                    if let Err(e) = self.editor.add_history_entry(buffer.as_str()) {
                        warn!("failed to add history entry: {}", e);
                    }
                }
                EvalResult::Interrupted => {
                    println!("{}", self.paint_notice("Execution interrupted"));
                }
                EvalResult::Failed(e) => {
                    println!("{}", self.paint_error(&format!("error: {}", e)));
                }
            }
            buffer.clear();
        }

        Ok(())
    }

    /// The session driven by this REPL
    pub fn evaluator(&self) -> &Evaluator<B> {
        &self.evaluator
    }

    fn paint_error(
        &self,
        text: &str,
    ) -> String {
        use owo_colors::OwoColorize;

        if !self.use_color() {
            return text.to_string();
        }
        text.red().to_string()
    }

    fn paint_notice(
        &self,
        text: &str,
    ) -> String {
        use owo_colors::OwoColorize;

        if !self.use_color() {
            return text.to_string();
        }
        text.yellow().to_string()
    }

    fn use_color(&self) -> bool {
        if !self.config.colors || std::env::var("NO_COLOR").is_ok() {
            return false;
        }
        !std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false)
    }
}

type Result<T> = std::result::Result<T, ReadlineError>;
