//! linewise - CLI

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use linewise::backends::dev::repl::{
    Evaluator, FileHistory, Interrupter, LineREPL, WrapperMode,
};
use linewise::backends::interpreter::Interpreter;
use linewise::util::config::{self, UserConfig};
use linewise::util::logger::{self, LogLevel};
use linewise::{NAME, VERSION};

/// Interactive read-eval-print loop over incrementally compiled units
#[derive(Parser, Debug)]
#[command(name = "linewise")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (defaults to the user config)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// History file
    #[arg(long, value_name = "FILE", conflicts_with = "no_history")]
    history: Option<PathBuf>,

    /// Do not read or write history
    #[arg(long)]
    no_history: bool,

    /// How units hold their members: object or class
    #[arg(long, value_name = "MODE")]
    wrapper: Option<WrapperMode>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate code in a fresh session and print its output
    Eval {
        /// Code to evaluate
        #[arg(value_name = "CODE")]
        code: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::load_from(path)?,
        None => config::load_user_config().context("Failed to load user config")?,
    };

    let level = if args.verbose {
        LogLevel::Debug
    } else {
        config.log.level
    };
    logger::init_with_level(level);
    debug!("{} {} on {}", NAME, VERSION, std::env::consts::OS);

    if let Some(mode) = args.wrapper {
        config.repl.wrapper_mode = mode;
    }
    if let Some(path) = &args.history {
        config.repl.history_file = Some(path.clone());
    }

    match args.command {
        Some(Commands::Eval { code }) => {
            for line in linewise::run(&code).context("Failed to evaluate code")? {
                println!("{}", line);
            }
            Ok(())
        }
        None => interactive(&config, args.no_history),
    }
}

/// Run the line REPL until `:quit` or end of input
fn interactive(
    config: &UserConfig,
    no_history: bool,
) -> Result<()> {
    let mut evaluator = Evaluator::with_config(Interpreter::new(), config.repl.evaluator_config());
    if !no_history {
        if let Some(path) = config.repl.history_path() {
            info!("history file: {}", path.display());
            evaluator = evaluator.with_history(Box::new(FileHistory::new(
                path,
                config.repl.history_size,
            )));
        }
    }
    evaluator
        .preload(&config.repl.auto_imports)
        .context("Failed to run auto-imports")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("Failed to start signal runtime")?;
    runtime.spawn(forward_interrupts(evaluator.interrupter()));

    let mut repl = LineREPL::with_config(evaluator, config.repl.line_config())
        .context("Failed to initialise line editor")?;
    repl.run().context("Line editor failed")?;

    let stats = repl.evaluator().stats();
    debug!(
        "session ended: {} unit(s), {} failure(s), {} interrupt(s)",
        stats.units_run, stats.failures, stats.interrupts
    );
    Ok(())
}

/// Ctrl-C while a unit runs cancels it; at the prompt the line editor
/// handles the key itself
async fn forward_interrupts(interrupter: Interrupter) {
    while tokio::signal::ctrl_c().await.is_ok() {
        if !interrupter.interrupt() {
            debug!("ctrl-c with no unit running");
        }
    }
}
