//! Execution backends
//!
//! The session engine talks to a backend only through
//! [`dev::repl::Backend`]: compile a wrapper unit, load it against the
//! units published before it, then invoke its display routine.
//!
//! ```text
//!   wrapper source
//!         |
//!      compile  --> diagnostics
//!         |
//!       load    --> link fault
//!         |
//!      invoke   --> display fragments
//! ```

pub mod dev;
pub mod interpreter;
