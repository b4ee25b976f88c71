//! Token types

use crate::util::span::Span;

/// Lexer error
///
/// Every variant carries the byte offset the failure is attributed to, so the
/// splitter can tell a failure at end-of-input from one in the middle.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("unclosed string literal")]
    UnterminatedString { offset: usize },
    #[error("unclosed character literal")]
    UnterminatedChar { offset: usize },
    #[error("unclosed comment")]
    UnterminatedComment { offset: usize },
    #[error("unclosed quoted identifier")]
    UnterminatedBackquote { offset: usize },
    #[error("invalid number literal: {text}")]
    InvalidNumber { text: String, offset: usize },
    #[error("illegal character '{ch}'")]
    UnexpectedChar { ch: char, offset: usize },
}

impl LexError {
    /// Byte offset the error is reported at
    pub fn offset(&self) -> usize {
        match self {
            LexError::UnterminatedString { offset }
            | LexError::UnterminatedChar { offset }
            | LexError::UnterminatedComment { offset }
            | LexError::UnterminatedBackquote { offset }
            | LexError::InvalidNumber { offset, .. }
            | LexError::UnexpectedChar { offset, .. } => *offset,
        }
    }
}

/// Token kind
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Declaration keywords
    KwObject,
    KwClass,
    KwTrait,
    KwEnum,
    KwDef,
    KwType,
    KwVal,
    KwVar,
    KwImport,
    KwPackage,

    // Modifiers
    KwCase,
    KwLazy,
    KwAbstract,
    KwFinal,
    KwSealed,
    KwImplicit,
    KwPrivate,
    KwProtected,
    KwOverride,

    // Expression keywords
    KwIf,
    KwElse,
    KwThen,
    KwMatch,
    KwWhile,
    KwDo,
    KwFor,
    KwYield,
    KwReturn,
    KwThrow,
    KwTry,
    KwCatch,
    KwFinally,
    KwNew,
    KwExtends,
    KwWith,
    KwThis,
    KwSuper,
    KwNull,

    // Identifiers
    Identifier(String),
    /// Symbolic identifier such as `+`, `::` or `<=`
    Operator(String),
    Underscore,

    // Literals
    IntLiteral(i64),
    FloatLiteral(f64),
    BoolLiteral(bool),
    CharLiteral(char),
    StringLiteral(String),

    // Reserved symbols
    Eq,
    Colon,
    Arrow,
    LArrow,
    At,
    Hash,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
    Dot,

    /// One or more line breaks outside of any token
    Newline,

    // Special
    Eof,
}

impl TokenKind {
    /// Whether this token opens a bracket pair
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace
        )
    }

    /// Whether this token closes a bracket pair
    pub fn is_close(&self) -> bool {
        matches!(
            self,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace
        )
    }

    /// The closer matching an opening bracket
    pub fn closer(&self) -> Option<TokenKind> {
        match self {
            TokenKind::LParen => Some(TokenKind::RParen),
            TokenKind::LBracket => Some(TokenKind::RBracket),
            TokenKind::LBrace => Some(TokenKind::RBrace),
            _ => None,
        }
    }

    /// Modifier keywords that may precede a definition
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            TokenKind::KwCase
                | TokenKind::KwLazy
                | TokenKind::KwAbstract
                | TokenKind::KwFinal
                | TokenKind::KwSealed
                | TokenKind::KwImplicit
                | TokenKind::KwPrivate
                | TokenKind::KwProtected
                | TokenKind::KwOverride
        )
    }

    /// Source spelling of a keyword token
    pub fn keyword(&self) -> Option<&'static str> {
        let word = match self {
            TokenKind::KwObject => "object",
            TokenKind::KwClass => "class",
            TokenKind::KwTrait => "trait",
            TokenKind::KwEnum => "enum",
            TokenKind::KwDef => "def",
            TokenKind::KwType => "type",
            TokenKind::KwVal => "val",
            TokenKind::KwVar => "var",
            TokenKind::KwImport => "import",
            TokenKind::KwPackage => "package",
            TokenKind::KwCase => "case",
            TokenKind::KwLazy => "lazy",
            TokenKind::KwAbstract => "abstract",
            TokenKind::KwFinal => "final",
            TokenKind::KwSealed => "sealed",
            TokenKind::KwImplicit => "implicit",
            TokenKind::KwPrivate => "private",
            TokenKind::KwProtected => "protected",
            TokenKind::KwOverride => "override",
            TokenKind::KwIf => "if",
            TokenKind::KwElse => "else",
            TokenKind::KwThen => "then",
            TokenKind::KwMatch => "match",
            TokenKind::KwWhile => "while",
            TokenKind::KwDo => "do",
            TokenKind::KwFor => "for",
            TokenKind::KwYield => "yield",
            TokenKind::KwReturn => "return",
            TokenKind::KwThrow => "throw",
            TokenKind::KwTry => "try",
            TokenKind::KwCatch => "catch",
            TokenKind::KwFinally => "finally",
            TokenKind::KwNew => "new",
            TokenKind::KwExtends => "extends",
            TokenKind::KwWith => "with",
            TokenKind::KwThis => "this",
            TokenKind::KwSuper => "super",
            TokenKind::KwNull => "null",
            _ => return None,
        };
        Some(word)
    }

    /// Short human readable rendering used in diagnostics
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Identifier(name) => format!("identifier `{}`", name),
            TokenKind::Operator(op) => format!("`{}`", op),
            TokenKind::IntLiteral(n) => format!("integer literal {}", n),
            TokenKind::FloatLiteral(f) => format!("floating point literal {}", f),
            TokenKind::BoolLiteral(b) => format!("`{}`", b),
            TokenKind::CharLiteral(c) => format!("character literal {:?}", c),
            TokenKind::StringLiteral(_) => "string literal".to_string(),
            TokenKind::LParen => "`(`".to_string(),
            TokenKind::RParen => "`)`".to_string(),
            TokenKind::LBracket => "`[`".to_string(),
            TokenKind::RBracket => "`]`".to_string(),
            TokenKind::LBrace => "`{`".to_string(),
            TokenKind::RBrace => "`}`".to_string(),
            TokenKind::Comma => "`,`".to_string(),
            TokenKind::Semicolon => "`;`".to_string(),
            TokenKind::Dot => "`.`".to_string(),
            TokenKind::Eq => "`=`".to_string(),
            TokenKind::Colon => "`:`".to_string(),
            TokenKind::Arrow => "`=>`".to_string(),
            TokenKind::Newline => "newline".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            other => match other.keyword() {
                Some(word) => format!("`{}`", word),
                None => format!("{:?}", other),
            },
        }
    }
}

/// Token
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Create a token
    pub fn new(
        kind: TokenKind,
        span: Span,
    ) -> Self {
        Self { kind, span }
    }
}
