//! Interpreter executor
//!
//! Compiles a generated unit by parsing it, links its bridge imports against
//! wrappers initialised earlier, then initialises members in declaration
//! order by walking the syntax tree. Display text is rendered lazily, one
//! instruction per fragment.
//!
//! The cancel token is checked on every call and during `Thread.sleep`, so an
//! interrupted unit fails with `java.lang.InterruptedException` and its worker
//! returns.

use std::cmp::Ordering as Order;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use hashbrown::HashMap;
use parking_lot::RwLock;
use smallvec::SmallVec;
use tracing::debug;

use crate::backends::dev::repl::backend_trait::{Backend, Diagnostic, Fault, Fragments};
use crate::backends::dev::repl::engine::CancelToken;
use crate::frontend::preprocess::{
    render_defined, render_deferred, render_import, render_value, DisplayInstruction,
};

use super::ast::*;
use super::frames::{Closure, Env, Instance, LazyValue, Slot};
use super::parser::parse_unit;
use super::value::{Numeric, Value};

/// Maximum call depth before a unit fails with a stack overflow
const DEFAULT_MAX_CALL_DEPTH: usize = 512;

type ValueResult = Result<Value, Fault>;

/// Evaluated arguments of one call
type Args = SmallVec<[Value; 4]>;

/// Compiled unit with its bridges resolved
#[derive(Debug)]
pub struct LinkedUnit {
    unit: CompiledUnit,
    imports: HashMap<String, Slot>,
}

impl LinkedUnit {
    pub fn unit(&self) -> &CompiledUnit {
        &self.unit
    }
}

/// Tree-walking interpreter for generated units
///
/// Clones share the table of initialised wrappers.
#[derive(Debug, Clone)]
pub struct Interpreter {
    /// Initialised wrappers by holder name
    wrappers: Arc<RwLock<HashMap<String, Arc<Instance>>>>,
    max_call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Create an interpreter with no wrappers loaded
    pub fn new() -> Self {
        Self {
            wrappers: Arc::new(RwLock::new(HashMap::new())),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Limit the depth of nested calls
    pub fn with_max_call_depth(
        mut self,
        depth: usize,
    ) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Whether a wrapper has been initialised under `holder`
    pub fn is_loaded(
        &self,
        holder: &str,
    ) -> bool {
        self.wrappers.read().contains_key(holder)
    }

    /// Initialised wrapper published under `holder`
    pub fn wrapper(
        &self,
        holder: &str,
    ) -> Option<Arc<Instance>> {
        self.wrappers.read().get(holder).cloned()
    }

    pub fn loaded_count(&self) -> usize {
        self.wrappers.read().len()
    }

    fn machine(
        &self,
        cancel: &CancelToken,
    ) -> Machine {
        Machine {
            max_depth: self.max_call_depth,
            cancel: cancel.clone(),
        }
    }
}

impl Backend for Interpreter {
    type Artifact = CompiledUnit;
    type Runnable = LinkedUnit;

    fn compile(
        &self,
        source: &str,
    ) -> Result<CompiledUnit, Vec<Diagnostic>> {
        parse_unit(source)
    }

    fn load(
        &self,
        unit: CompiledUnit,
    ) -> Result<LinkedUnit, Fault> {
        let mut imports = HashMap::new();
        {
            let wrappers = self.wrappers.read();
            for (holder, name) in unit.bridges() {
                let instance = wrappers
                    .get(holder)
                    .ok_or_else(|| Fault::Link(format!("{} is not loaded", holder)))?;
                let slot = instance.member(name).ok_or_else(|| {
                    Fault::Link(format!("value {} is not a member of {}", name, holder))
                })?;
                imports.insert(name.to_string(), slot);
            }
        }
        debug!("linked {} ({} bridge(s))", unit.wrapper, imports.len());
        Ok(LinkedUnit { unit, imports })
    }

    fn invoke(
        &self,
        linked: LinkedUnit,
    ) -> Result<Fragments, Fault> {
        self.invoke_cancellable(linked, &CancelToken::new())
    }

    fn invoke_cancellable(
        &self,
        linked: LinkedUnit,
        cancel: &CancelToken,
    ) -> Result<Fragments, Fault> {
        let LinkedUnit { unit, imports } = linked;
        let instance = Arc::new(Instance::new(unit.holder.clone(), imports));
        self.machine(cancel).initialise(&unit, &instance)?;

        self.wrappers
            .write()
            .insert(unit.holder.clone(), Arc::clone(&instance));
        debug!("initialised {}", unit.holder);

        Ok(Box::new(DisplayFragments {
            instance,
            pending: unit.display.into_iter(),
        }))
    }
}

/// Renders one display instruction per `next()`
struct DisplayFragments {
    instance: Arc<Instance>,
    pending: std::vec::IntoIter<DisplayInstruction>,
}

impl DisplayFragments {
    fn render(
        &self,
        instruction: &DisplayInstruction,
    ) -> Result<String, Fault> {
        match instruction {
            DisplayInstruction::Defined { label, name } => Ok(render_defined(label, name)),
            DisplayInstruction::Deferred { name } => Ok(render_deferred(name)),
            DisplayInstruction::Import { path } => Ok(render_import(path)),
            DisplayInstruction::Value { keyword, name } => {
                let value = match self.instance.member(name) {
                    Some(Slot::Value(value)) => value,
                    Some(Slot::Lazy(lazy)) => match lazy.get() {
                        Some(value) => value.clone(),
                        None => return Ok(render_deferred(name)),
                    },
                    None => {
                        return Err(Fault::Raised(format!("value {} is not initialised", name)));
                    }
                };
                Ok(render_value(
                    keyword,
                    name,
                    &value.type_name(),
                    &value.to_string(),
                ))
            }
        }
    }
}

impl Iterator for DisplayFragments {
    type Item = Result<String, Fault>;

    fn next(&mut self) -> Option<Self::Item> {
        let instruction = self.pending.next()?;
        Some(self.render(&instruction))
    }
}

/// Evaluation settings shared by every call
#[derive(Debug, Clone)]
struct Machine {
    max_depth: usize,
    cancel: CancelToken,
}

impl Machine {
    /// Run the member initialisers of `unit` into `instance`
    fn initialise(
        &self,
        unit: &CompiledUnit,
        instance: &Arc<Instance>,
    ) -> Result<(), Fault> {
        let env = Env::new(Arc::clone(instance));

        // Methods, lazy values and definitions exist before any initialiser runs
        for member in &unit.members {
            match member {
                Member::Def(def) => {
                    let closure = Closure {
                        def: Arc::clone(def),
                        env: env.clone(),
                    };
                    instance.define(def.name.clone(), Slot::Value(Value::Function(Arc::new(closure))));
                }
                Member::Lazy { name, value } => {
                    let lazy = LazyValue::new(name.clone(), value.clone(), Arc::clone(instance));
                    instance.define(name.clone(), Slot::Lazy(Arc::new(lazy)));
                }
                Member::Opaque { name } => {
                    instance.define(name.clone(), Slot::Value(Value::Object(Arc::from(name.as_str()))));
                }
                Member::Value { .. } | Member::Expr(_) => {}
            }
        }

        for member in &unit.members {
            match member {
                Member::Value { pattern, value, line } => {
                    let value = self.eval(value, &env, 0)?;
                    debug!("initialised member at line {} of {}", line, unit.wrapper);
                    destructure(pattern, value, &mut |name: &str, value: Value| {
                        instance.define(name, Slot::Value(value))
                    })?;
                }
                Member::Expr(expr) => {
                    self.eval(expr, &env, 0)?;
                }
                Member::Def(_) | Member::Lazy { .. } | Member::Opaque { .. } => {}
            }
        }
        Ok(())
    }

    fn eval(
        &self,
        expr: &Expr,
        env: &Env,
        depth: usize,
    ) -> ValueResult {
        match expr {
            Expr::Literal(literal) => Ok(Value::from_literal(literal)),
            Expr::Name { name, .. } => self.lookup(name, env, depth),
            Expr::Tuple(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval(item, env, depth))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Tuple(values.into()))
            }
            Expr::Unary(op, operand) => unary(*op, self.eval(operand, env, depth)?),
            Expr::Binary(BinOp::And, lhs, rhs) => {
                let result = self.condition(lhs, env, depth)? && self.condition(rhs, env, depth)?;
                Ok(Value::Bool(result))
            }
            Expr::Binary(BinOp::Or, lhs, rhs) => {
                let result = self.condition(lhs, env, depth)? || self.condition(rhs, env, depth)?;
                Ok(Value::Bool(result))
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs, env, depth)?;
                let rhs = self.eval(rhs, env, depth)?;
                binary(*op, lhs, rhs)
            }
            Expr::If {
                cond,
                then,
                otherwise,
            } => {
                if self.condition(cond, env, depth)? {
                    self.eval(then, env, depth)
                } else if let Some(otherwise) = otherwise {
                    self.eval(otherwise, env, depth)
                } else {
                    Ok(Value::Unit)
                }
            }
            Expr::Block(locals) => self.block(locals, env, depth),
            Expr::Call { callee, args } => self.call(callee, args, env, depth),
            Expr::Select { target, member } => select(self.eval(target, env, depth)?, member),
            Expr::TupleIndex { target, index } => {
                let value = self.eval(target, env, depth)?;
                match &value {
                    Value::Tuple(items) if (1..=items.len()).contains(index) => Ok(items[*index - 1].clone()),
                    _ => Err(not_a_member(&format!("_{}", index), &value)),
                }
            }
            Expr::Builtin(builtin) => Err(Fault::Raised(format!(
                "missing argument list for method {}",
                builtin.name()
            ))),
        }
    }

    fn condition(
        &self,
        expr: &Expr,
        env: &Env,
        depth: usize,
    ) -> Result<bool, Fault> {
        let value = self.eval(expr, env, depth)?;
        value.as_bool().ok_or_else(|| type_mismatch("Boolean", &value))
    }

    /// Value of a name; parameterless defs run on every reference
    fn lookup(
        &self,
        name: &str,
        env: &Env,
        depth: usize,
    ) -> ValueResult {
        let value = match env.locals.lookup(name) {
            Some(value) => value.clone(),
            None => match env.instance.lookup(name) {
                Some(Slot::Value(value)) => value,
                Some(Slot::Lazy(lazy)) => self.force(&lazy, depth)?,
                None => return Err(Fault::Raised(format!("uninitialized value {}", name))),
            },
        };
        match &value {
            Value::Function(closure) if closure.def.params.is_none() => {
                self.apply(closure, Args::new(), depth)
            }
            _ => Ok(value),
        }
    }

    fn force(
        &self,
        lazy: &LazyValue,
        depth: usize,
    ) -> ValueResult {
        if let Some(value) = lazy.get() {
            return Ok(value.clone());
        }
        if lazy.forcing.swap(true, Ordering::SeqCst) {
            return Err(Fault::Raised(format!(
                "lazy value {} is referenced during its own initialization",
                lazy.name
            )));
        }
        let env = Env::new(Arc::clone(&lazy.instance));
        let result = lazy
            .cell
            .get_or_try_init(|| self.eval(&lazy.expr, &env, depth))
            .cloned();
        lazy.forcing.store(false, Ordering::SeqCst);
        if result.is_ok() {
            debug!("forced lazy value {}", lazy.name);
        }
        result
    }

    fn block(
        &self,
        locals: &[Local],
        env: &Env,
        depth: usize,
    ) -> ValueResult {
        let mut scope = env.clone();
        let mut last = Value::Unit;
        for local in locals {
            last = Value::Unit;
            match local {
                Local::Val { pattern, value } => {
                    let value = self.eval(value, &scope, depth)?;
                    destructure(pattern, value, &mut |name: &str, value: Value| {
                        scope = scope.bind(name, value)
                    })?;
                }
                Local::Def(def) => {
                    let closure = Closure {
                        def: Arc::clone(def),
                        env: scope.clone(),
                    };
                    scope = scope.bind(def.name.clone(), Value::Function(Arc::new(closure)));
                }
                Local::Expr(expr) => last = self.eval(expr, &scope, depth)?,
            }
        }
        Ok(last)
    }

    fn call(
        &self,
        callee: &Expr,
        args: &[Expr],
        env: &Env,
        depth: usize,
    ) -> ValueResult {
        let function = match callee {
            Expr::Builtin(builtin) => {
                let values = self.arguments(args, env, depth)?;
                return call_builtin(*builtin, values, &self.cancel);
            }
            _ => self.eval(callee, env, depth)?,
        };
        let values = self.arguments(args, env, depth)?;
        match &function {
            Value::Function(closure) => self.apply(closure, values, depth),
            Value::Str(text) => char_at(text, &values),
            other => Err(Fault::Raised(format!(
                "{} does not take parameters",
                other.type_name()
            ))),
        }
    }

    fn arguments(
        &self,
        args: &[Expr],
        env: &Env,
        depth: usize,
    ) -> Result<Args, Fault> {
        args.iter().map(|arg| self.eval(arg, env, depth)).collect()
    }

    fn apply(
        &self,
        closure: &Arc<Closure>,
        args: Args,
        depth: usize,
    ) -> ValueResult {
        let def = &closure.def;
        if args.len() != def.arity() {
            return Err(Fault::Raised(format!(
                "wrong number of arguments for {}: expected {}, found {}",
                def.name,
                def.arity(),
                args.len()
            )));
        }
        if self.cancel.is_cancelled() {
            return Err(interrupted());
        }
        if depth >= self.max_depth {
            return Err(Fault::Raised("java.lang.StackOverflowError".to_string()));
        }

        let mut env = closure
            .env
            .bind(def.name.clone(), Value::Function(Arc::clone(closure)));
        if let Some(params) = &def.params {
            for (param, arg) in params.iter().zip(args) {
                env = env.bind(param.clone(), arg);
            }
        }
        self.eval(&def.body, &env, depth + 1)
    }
}

/// Bind the parts of `value` matched by `pattern`
fn destructure(
    pattern: &Pattern,
    value: Value,
    bind: &mut dyn FnMut(&str, Value),
) -> Result<(), Fault> {
    match pattern {
        Pattern::Name(name) => {
            bind(name, value);
            Ok(())
        }
        Pattern::Wildcard => Ok(()),
        Pattern::Tuple(patterns) => match &value {
            Value::Tuple(items) if items.len() == patterns.len() => {
                for (pattern, item) in patterns.iter().zip(items.iter()) {
                    destructure(pattern, item.clone(), bind)?;
                }
                Ok(())
            }
            _ => Err(Fault::Raised(format!(
                "scala.MatchError: {} (of type {})",
                value,
                value.type_name()
            ))),
        },
    }
}

fn not_a_member(
    member: &str,
    value: &Value,
) -> Fault {
    Fault::Raised(format!(
        "value {} is not a member of {}",
        member,
        value.type_name()
    ))
}

fn type_mismatch(
    expected: &str,
    value: &Value,
) -> Fault {
    Fault::Raised(format!(
        "type mismatch: expected {}, found {}",
        expected,
        value.type_name()
    ))
}

fn unary(
    op: UnaryOp,
    value: Value,
) -> ValueResult {
    match (op, &value) {
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
        (UnaryOp::Neg, Value::Char(c)) => Ok(Value::Int(-(*c as i32))),
        (UnaryOp::Neg, Value::Double(d)) => Ok(Value::Double(-d)),
        (UnaryOp::Not, _) => Err(not_a_member("unary_!", &value)),
        (UnaryOp::Neg, _) => Err(not_a_member("unary_-", &value)),
    }
}

fn binary(
    op: BinOp,
    lhs: Value,
    rhs: Value,
) -> ValueResult {
    match op {
        BinOp::Eq => return Ok(Value::Bool(lhs.equals(&rhs))),
        BinOp::Ne => return Ok(Value::Bool(!lhs.equals(&rhs))),
        BinOp::Add if matches!(lhs, Value::Str(_)) || matches!(rhs, Value::Str(_)) => {
            return Ok(Value::str(format!("{}{}", lhs, rhs)));
        }
        _ => {}
    }

    if let (Some(a), Some(b)) = (lhs.as_numeric(), rhs.as_numeric()) {
        return match (a, b) {
            (Numeric::Int(x), Numeric::Int(y)) => int_op(op, x, y),
            _ => double_op(op, a.to_f64(), b.to_f64()),
        };
    }

    match (&lhs, &rhs) {
        (Value::Str(a), Value::Str(b)) if is_comparison(op) => {
            Ok(Value::Bool(holds(op, a.cmp(b))))
        }
        _ => Err(Fault::Raised(format!(
            "type mismatch: cannot apply {} to {} and {}",
            op.symbol(),
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}

fn is_comparison(op: BinOp) -> bool {
    matches!(op, BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge)
}

/// Whether `ordering` satisfies the comparison `op`
fn holds(
    op: BinOp,
    ordering: Order,
) -> bool {
    match op {
        BinOp::Lt => ordering.is_lt(),
        BinOp::Le => ordering.is_le(),
        BinOp::Gt => ordering.is_gt(),
        BinOp::Ge => ordering.is_ge(),
        _ => false,
    }
}

fn int_op(
    op: BinOp,
    x: i32,
    y: i32,
) -> ValueResult {
    let value = match op {
        BinOp::Add => Value::Int(x.wrapping_add(y)),
        BinOp::Sub => Value::Int(x.wrapping_sub(y)),
        BinOp::Mul => Value::Int(x.wrapping_mul(y)),
        BinOp::Div | BinOp::Rem if y == 0 => {
            return Err(Fault::Raised(
                "java.lang.ArithmeticException: / by zero".to_string(),
            ));
        }
        BinOp::Div => Value::Int(x.wrapping_div(y)),
        BinOp::Rem => Value::Int(x.wrapping_rem(y)),
        op if is_comparison(op) => Value::Bool(holds(op, x.cmp(&y))),
        op => return Err(not_a_member(op.symbol(), &Value::Int(x))),
    };
    Ok(value)
}

fn double_op(
    op: BinOp,
    x: f64,
    y: f64,
) -> ValueResult {
    let value = match op {
        BinOp::Add => Value::Double(x + y),
        BinOp::Sub => Value::Double(x - y),
        BinOp::Mul => Value::Double(x * y),
        BinOp::Div => Value::Double(x / y),
        BinOp::Rem => Value::Double(x % y),
        op if is_comparison(op) => {
            Value::Bool(x.partial_cmp(&y).is_some_and(|ordering| holds(op, ordering)))
        }
        op => return Err(not_a_member(op.symbol(), &Value::Double(x))),
    };
    Ok(value)
}

/// `value.member` for the members the interpreter knows
fn select(
    value: Value,
    member: &str,
) -> ValueResult {
    let result = match (member, &value) {
        ("toString", _) => Value::str(value.to_string()),
        ("length", Value::Str(s)) => Value::Int(utf16_len(s)),
        ("isEmpty", Value::Str(s)) => Value::Bool(s.is_empty()),
        ("nonEmpty", Value::Str(s)) => Value::Bool(!s.is_empty()),
        ("toUpperCase", Value::Str(s)) => Value::str(s.to_uppercase()),
        ("toLowerCase", Value::Str(s)) => Value::str(s.to_lowercase()),
        ("trim", Value::Str(s)) => Value::str(s.trim()),
        ("toInt", Value::Str(s)) => Value::Int(s.parse().map_err(|_| number_format(s))?),
        ("toDouble", Value::Str(s)) => Value::Double(s.parse().map_err(|_| number_format(s))?),
        ("toInt", Value::Double(d)) => Value::Int(*d as i32),
        ("toInt", Value::Int(n)) => Value::Int(*n),
        ("toInt", Value::Char(c)) => Value::Int(*c as i32),
        ("toDouble", Value::Int(n)) => Value::Double(f64::from(*n)),
        ("toDouble", Value::Double(d)) => Value::Double(*d),
        ("toChar", Value::Int(n)) => {
            let c = u32::try_from(*n).ok().and_then(char::from_u32).unwrap_or('\u{fffd}');
            Value::Char(c)
        }
        ("abs", Value::Int(n)) => Value::Int(n.wrapping_abs()),
        ("abs", Value::Double(d)) => Value::Double(d.abs()),
        _ => return Err(not_a_member(member, &value)),
    };
    Ok(result)
}

fn utf16_len(text: &str) -> i32 {
    i32::try_from(text.encode_utf16().count()).unwrap_or(i32::MAX)
}

fn number_format(text: &str) -> Fault {
    Fault::Raised(format!(
        "java.lang.NumberFormatException: For input string: \"{}\"",
        text
    ))
}

/// `text(i)`
fn char_at(
    text: &str,
    args: &[Value],
) -> ValueResult {
    match args {
        [Value::Int(index)] => usize::try_from(*index)
            .ok()
            .and_then(|i| text.chars().nth(i))
            .map(Value::Char)
            .ok_or_else(|| {
                Fault::Raised(format!(
                    "java.lang.StringIndexOutOfBoundsException: index {}, length {}",
                    index,
                    utf16_len(text)
                ))
            }),
        [other] => Err(type_mismatch("Int", other)),
        _ => Err(Fault::Raised(format!(
            "wrong number of arguments for apply: expected 1, found {}",
            args.len()
        ))),
    }
}

fn interrupted() -> Fault {
    Fault::Raised("java.lang.InterruptedException".to_string())
}

fn call_builtin(
    builtin: Builtin,
    args: Args,
    cancel: &CancelToken,
) -> ValueResult {
    if args.len() != builtin.arity() {
        return Err(Fault::Raised(format!(
            "wrong number of arguments for {}: expected {}, found {}",
            builtin.name(),
            builtin.arity(),
            args.len()
        )));
    }

    match builtin {
        Builtin::SysError => Err(Fault::Raised(format!(
            "java.lang.RuntimeException: {}",
            args[0]
        ))),
        Builtin::ThreadSleep => match &args[0] {
            Value::Int(ms) if *ms >= 0 => {
                if cancel.sleep(Duration::from_millis(u64::from(ms.unsigned_abs()))) {
                    Ok(Value::Unit)
                } else {
                    Err(Fault::Raised(
                        "java.lang.InterruptedException: sleep interrupted".to_string(),
                    ))
                }
            }
            Value::Int(_) => Err(Fault::Raised(
                "java.lang.IllegalArgumentException: timeout value is negative".to_string(),
            )),
            other => Err(type_mismatch("Long", other)),
        },
        Builtin::MathMax | Builtin::MathMin => {
            let max = builtin == Builtin::MathMax;
            match (args[0].as_numeric(), args[1].as_numeric()) {
                (Some(Numeric::Int(a)), Some(Numeric::Int(b))) => {
                    Ok(Value::Int(if max { a.max(b) } else { a.min(b) }))
                }
                (Some(a), Some(b)) => {
                    let (a, b) = (a.to_f64(), b.to_f64());
                    Ok(Value::Double(if max { a.max(b) } else { a.min(b) }))
                }
                (None, _) => Err(type_mismatch("Int", &args[0])),
                (_, None) => Err(type_mismatch("Int", &args[1])),
            }
        }
        Builtin::MathAbs => match &args[0] {
            Value::Int(n) => Ok(Value::Int(n.wrapping_abs())),
            Value::Double(d) => Ok(Value::Double(d.abs())),
            other => Err(type_mismatch("Int", other)),
        },
    }
}
