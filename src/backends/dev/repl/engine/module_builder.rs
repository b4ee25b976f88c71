//! Unit builder
//!
//! Assembles classified statements into the source of one wrapper. The
//! layout in object mode:
//!
//! ```text
//! object $line7 {
//! import <session imports, in commit order>
//! import $line3.x
//! <statement code, in order>
//! def $display(): Unit = {
//! $repl.value("val", "res2", res2)
//! }
//! }
//! ```
//!
//! Class mode wraps the same body in `class $line7 { ... }` followed by
//! `object $line7$instance extends $line7`, and bridges earlier names
//! through their `$instance` objects.
//!
//! Known limitation: every session import comes before every bridge,
//! whatever order they were committed in. After `val x = 1` and then
//! `import foo.x`, a later unit still resolves `x` through the bridge to
//! `$line1.x`, because the bridge is the later and therefore shadowing
//! import. Names an import brings in are not tracked in the scope, so the
//! two kinds cannot be interleaved by commit order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::frontend::preprocess::{ident_code, Binding, Processed};

use super::context::{ScopeDelta, SessionScope, WrapperId};

/// Name of the display method every unit defines
pub const DISPLAY_METHOD: &str = "$display";

/// How a unit's members are held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapperMode {
    /// Named singleton holder
    #[default]
    Object,
    /// Class body instantiated once through a companion object
    Class,
}

impl WrapperMode {
    /// Name later units import this unit's members through
    pub fn holder_name(
        &self,
        id: WrapperId,
    ) -> String {
        match self {
            WrapperMode::Object => id.to_string(),
            WrapperMode::Class => id.instance_name(),
        }
    }
}

impl fmt::Display for WrapperMode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            WrapperMode::Object => write!(f, "object"),
            WrapperMode::Class => write!(f, "class"),
        }
    }
}

impl FromStr for WrapperMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "object" => Ok(WrapperMode::Object),
            "class" => Ok(WrapperMode::Class),
            other => Err(format!(
                "unknown wrapper mode '{}', expected 'object' or 'class'",
                other
            )),
        }
    }
}

/// One compilable program unit
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub id: WrapperId,
    pub mode: WrapperMode,
    /// Full wrapper source handed to the backend
    pub source: String,
    /// Classified statements, in input order
    pub statements: Vec<Processed>,
    /// Scope the unit was built against
    pub snapshot: SessionScope,
}

impl Unit {
    /// Names the unit binds, in declaration order
    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.statements.iter().flat_map(|s| s.bindings.iter())
    }

    /// Whether any statement was rewritten into a synthetic binding
    pub fn has_synthetic(&self) -> bool {
        self.bindings().any(|b| b.synthetic)
    }

    /// Number of display instructions the unit runs
    pub fn display_count(&self) -> usize {
        self.statements.iter().map(|s| s.display.len()).sum()
    }

    /// Entries the unit adds to the session scope once it succeeds
    pub fn delta(&self) -> ScopeDelta {
        ScopeDelta {
            imports: self
                .statements
                .iter()
                .flat_map(|s| s.imports.iter().cloned())
                .collect(),
            bindings: self.bindings().map(|b| (b.name.clone(), b.lazy)).collect(),
        }
    }
}

/// Build the unit for `statements` against `scope`
///
/// The source depends on nothing but the arguments.
pub fn build_unit(
    statements: Vec<Processed>,
    scope: &SessionScope,
    id: WrapperId,
    mode: WrapperMode,
) -> Unit {
    let mut lines = Vec::new();

    match mode {
        WrapperMode::Object => lines.push(format!("object {} {{", id)),
        WrapperMode::Class => lines.push(format!("class {} {{", id)),
    }

    for entry in scope.imports() {
        lines.push(format!("import {}", entry.path));
    }

    let redefined: Vec<&str> = statements
        .iter()
        .flat_map(|s| s.bindings.iter().map(|b| b.name.as_str()))
        .collect();
    for entry in scope.visible_bindings() {
        if redefined.contains(&entry.name.as_str()) {
            continue;
        }
        lines.push(format!(
            "import {}.{}",
            mode.holder_name(entry.origin),
            ident_code(&entry.name)
        ));
    }

    for statement in &statements {
        lines.push(statement.code.clone());
    }

    lines.push(format!("def {}(): Unit = {{", DISPLAY_METHOD));
    for instruction in statements.iter().flat_map(|s| s.display.iter()) {
        lines.push(instruction.to_code());
    }
    lines.push("}".to_string());
    lines.push("}".to_string());

    if mode == WrapperMode::Class {
        lines.push(format!("object {} extends {}", id.instance_name(), id));
    }

    let source = lines.join("\n");
    debug!(
        "built unit {} ({} statement(s), scope version {}, {} bytes)",
        id,
        statements.len(),
        scope.version(),
        source.len()
    );

    Unit {
        id,
        mode,
        source,
        statements,
        snapshot: scope.clone(),
    }
}
