//! Environments for the interpreter
//!
//! Locals live in immutable linked frames so closures capture them by
//! reference count. Members of a wrapper live in its [`Instance`], which
//! also holds the slots bridged in from earlier units.

use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use hashbrown::HashMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use super::ast::{Expr, FunctionDef};
use super::value::Value;

/// Local bindings, innermost first
#[derive(Debug, Clone, Default)]
pub struct Locals(Option<Arc<LocalFrame>>);

#[derive(Debug)]
struct LocalFrame {
    name: String,
    value: Value,
    parent: Locals,
}

impl Locals {
    /// New frame binding `name` on top of `self`
    pub fn bind(
        &self,
        name: impl Into<String>,
        value: Value,
    ) -> Locals {
        Locals(Some(Arc::new(LocalFrame {
            name: name.into(),
            value,
            parent: self.clone(),
        })))
    }

    pub fn lookup(
        &self,
        name: &str,
    ) -> Option<&Value> {
        let mut frame = self.0.as_deref();
        while let Some(current) = frame {
            if current.name == name {
                return Some(&current.value);
            }
            frame = current.parent.0.as_deref();
        }
        None
    }
}

/// Storage of one member
#[derive(Debug, Clone)]
pub enum Slot {
    Value(Value),
    Lazy(Arc<LazyValue>),
}

/// `lazy val`, computed on first access and memoised
pub struct LazyValue {
    pub name: String,
    pub(crate) expr: Expr,
    pub(crate) instance: Arc<Instance>,
    pub(crate) cell: OnceCell<Value>,
    /// Set while the initialiser runs
    pub(crate) forcing: AtomicBool,
}

impl LazyValue {
    pub fn new(
        name: impl Into<String>,
        expr: Expr,
        instance: Arc<Instance>,
    ) -> Self {
        Self {
            name: name.into(),
            expr,
            instance,
            cell: OnceCell::new(),
            forcing: AtomicBool::new(false),
        }
    }

    /// The value, if it has been computed
    pub fn get(&self) -> Option<&Value> {
        self.cell.get()
    }
}

impl fmt::Debug for LazyValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("LazyValue")
            .field("name", &self.name)
            .field("instance", &self.instance.name())
            .field("value", &self.cell.get())
            .finish()
    }
}

/// Members of one wrapper
pub struct Instance {
    name: String,
    members: RwLock<HashMap<String, Slot>>,
    /// Bridged from earlier units
    imports: HashMap<String, Slot>,
}

impl Instance {
    pub fn new(
        name: impl Into<String>,
        imports: HashMap<String, Slot>,
    ) -> Self {
        Self {
            name: name.into(),
            members: RwLock::new(HashMap::new()),
            imports,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn define(
        &self,
        name: impl Into<String>,
        slot: Slot,
    ) {
        self.members.write().insert(name.into(), slot);
    }

    /// A member of this wrapper, ignoring imports
    pub fn member(
        &self,
        name: &str,
    ) -> Option<Slot> {
        self.members.read().get(name).cloned()
    }

    /// A member, or else an imported slot
    pub fn lookup(
        &self,
        name: &str,
    ) -> Option<Slot> {
        self.member(name).or_else(|| self.imports.get(name).cloned())
    }

    /// Member names, sorted
    pub fn member_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.members.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for Instance {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Instance")
            .field("name", &self.name)
            .field("members", &self.member_names())
            .field("imports", &self.imports.len())
            .finish()
    }
}

/// Evaluation environment: the wrapper in scope plus locals
#[derive(Debug, Clone)]
pub struct Env {
    pub instance: Arc<Instance>,
    pub locals: Locals,
}

impl Env {
    pub fn new(instance: Arc<Instance>) -> Self {
        Self {
            instance,
            locals: Locals::default(),
        }
    }

    pub fn bind(
        &self,
        name: impl Into<String>,
        value: Value,
    ) -> Env {
        Env {
            instance: Arc::clone(&self.instance),
            locals: self.locals.bind(name, value),
        }
    }
}

/// Function value with its defining environment
#[derive(Debug)]
pub struct Closure {
    pub def: Arc<FunctionDef>,
    pub env: Env,
}

impl Closure {
    pub fn arity(&self) -> usize {
        self.def.arity()
    }
}
