//! Reference backend
//!
//! An in-process interpreter for generated units. It understands enough of
//! the language to run a whole session without an external compiler: member
//! declarations, bridge imports, the display block and a small expression
//! language.

pub mod ast;
pub mod executor;
pub mod frames;
pub mod parser;
pub mod value;


pub use executor::{Interpreter, LinkedUnit};
pub use frames::{Instance, Slot};
pub use value::Value;
