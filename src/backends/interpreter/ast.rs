//! Syntax tree of a generated unit
//!
//! Only what wrappers and their members need: member declarations, bridge
//! imports, the display block and a small expression language.

use std::sync::Arc;

use crate::frontend::preprocess::DisplayInstruction;

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    /// Operator for a symbolic identifier, if the language has one
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            "*" => BinOp::Mul,
            "/" => BinOp::Div,
            "%" => BinOp::Rem,
            "==" => BinOp::Eq,
            "!=" => BinOp::Ne,
            "<" => BinOp::Lt,
            "<=" => BinOp::Le,
            ">" => BinOp::Gt,
            ">=" => BinOp::Ge,
            "&&" => BinOp::And,
            "||" => BinOp::Or,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    /// Left and right binding power; every operator is left associative
    pub fn binding_power(&self) -> (u8, u8) {
        let bp = match self {
            BinOp::Or => BP_OR,
            BinOp::And => BP_AND,
            BinOp::Eq | BinOp::Ne => BP_EQUALITY,
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => BP_COMPARE,
            BinOp::Add | BinOp::Sub => BP_ADD,
            BinOp::Mul | BinOp::Div | BinOp::Rem => BP_MUL,
        };
        (bp, bp + 1)
    }
}

pub const BP_LOWEST: u8 = 0;
pub const BP_OR: u8 = 2;
pub const BP_AND: u8 = 4;
pub const BP_EQUALITY: u8 = 6;
pub const BP_COMPARE: u8 = 8;
pub const BP_ADD: u8 = 10;
pub const BP_MUL: u8 = 12;
pub const BP_PREFIX: u8 = 14;

/// Prefix operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Library functions known to the interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    SysError,
    ThreadSleep,
    MathMax,
    MathMin,
    MathAbs,
}

impl Builtin {
    /// Builtin reached by `owner.member`
    pub fn lookup(
        owner: &str,
        member: &str,
    ) -> Option<Self> {
        let builtin = match (owner, member) {
            ("sys", "error") => Builtin::SysError,
            ("Thread", "sleep") => Builtin::ThreadSleep,
            ("math", "max") => Builtin::MathMax,
            ("math", "min") => Builtin::MathMin,
            ("math", "abs") => Builtin::MathAbs,
            _ => return None,
        };
        Some(builtin)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::SysError => "sys.error",
            Builtin::ThreadSleep => "Thread.sleep",
            Builtin::MathMax => "math.max",
            Builtin::MathMin => "math.min",
            Builtin::MathAbs => "math.abs",
        }
    }

    /// Number of arguments the builtin takes
    pub fn arity(&self) -> usize {
        match self {
            Builtin::MathMax | Builtin::MathMin => 2,
            _ => 1,
        }
    }
}

/// Literal
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Unit,
    Int(i32),
    Double(f64),
    Bool(bool),
    Char(char),
    Str(String),
}

/// Expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Name {
        name: String,
        line: usize,
    },
    Tuple(Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Option<Box<Expr>>,
    },
    /// `{ ... }`; its value is that of the last statement when it is an
    /// expression, `()` otherwise
    Block(Vec<Local>),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `target.member`
    Select {
        target: Box<Expr>,
        member: String,
    },
    /// `target._N`
    TupleIndex {
        target: Box<Expr>,
        index: usize,
    },
    Builtin(Builtin),
}

/// Binding pattern of a `val`
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Name(String),
    Wildcard,
    Tuple(Vec<Pattern>),
}

impl Pattern {
    /// Names bound by the pattern, left to right
    pub fn names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(
        &'a self,
        names: &mut Vec<&'a str>,
    ) {
        match self {
            Pattern::Name(name) => names.push(name),
            Pattern::Wildcard => {}
            Pattern::Tuple(items) => {
                for item in items {
                    item.collect_names(names);
                }
            }
        }
    }
}

/// `def name(params) = body`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    /// `None` for a parameterless def, re-evaluated on every reference
    pub params: Option<Vec<String>>,
    pub body: Expr,
}

impl FunctionDef {
    pub fn arity(&self) -> usize {
        self.params.as_ref().map_or(0, Vec::len)
    }
}

/// Statement inside a block
#[derive(Debug, Clone, PartialEq)]
pub enum Local {
    Val { pattern: Pattern, value: Expr },
    Def(Arc<FunctionDef>),
    Expr(Expr),
}

/// Member of the wrapper, initialised in order
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    /// `val` or `var`
    Value {
        pattern: Pattern,
        value: Expr,
        line: usize,
    },
    Lazy {
        name: String,
        value: Expr,
    },
    Def(Arc<FunctionDef>),
    /// Structural definition whose body the interpreter does not model
    Opaque { name: String },
    /// Expression evaluated for its effect
    Expr(Expr),
}

impl Member {
    /// Names the member binds
    pub fn names(&self) -> Vec<&str> {
        match self {
            Member::Value { pattern, .. } => pattern.names(),
            Member::Lazy { name, .. } | Member::Opaque { name } => vec![name.as_str()],
            Member::Def(def) => vec![def.name.as_str()],
            Member::Expr(_) => Vec::new(),
        }
    }
}

/// Import clause of the unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Import {
    /// `import <holder>.<name>` pointing at an earlier unit
    Bridge { holder: String, name: String },
    /// Any other import; it has no effect on evaluation
    Plain(String),
}

/// Parsed unit, ready to link
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledUnit {
    /// Wrapper name, `$line<N>`
    pub wrapper: String,
    /// Name later units reach the members through
    pub holder: String,
    pub imports: Vec<Import>,
    pub members: Vec<Member>,
    pub display: Vec<DisplayInstruction>,
}

impl CompiledUnit {
    /// Bridged names, in import order
    pub fn bridges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.imports.iter().filter_map(|import| match import {
            Import::Bridge { holder, name } => Some((holder.as_str(), name.as_str())),
            Import::Plain(_) => None,
        })
    }
}
