//! Unit parser
//!
//! Reads the source of a generated wrapper back into a [`CompiledUnit`],
//! then checks that every name an expression refers to is bound by a
//! member, a bridge import or an enclosing local.
//!
//! Expressions are parsed with a Pratt parser. Line breaks separate
//! statements inside braces and are insignificant inside parentheses.

use std::sync::Arc;

use hashbrown::HashSet;
use tracing::debug;

use crate::backends::dev::repl::backend_trait::Diagnostic;
use crate::backends::dev::repl::engine::module_builder::DISPLAY_METHOD;
use crate::frontend::lexer::{tokenize, Token, TokenKind};
use crate::frontend::preprocess::{DisplayInstruction, DISPLAY_RUNTIME};

use super::ast::*;

/// Soft keywords skipped in front of a definition
const SOFT_MODIFIERS: [&str; 5] = ["inline", "transparent", "opaque", "open", "infix"];

type ParseResult<T> = Result<T, Diagnostic>;

/// Parse and check the source of one unit
pub fn parse_unit(source: &str) -> Result<CompiledUnit, Vec<Diagnostic>> {
    let tokens = tokenize(source).map_err(|e| {
        vec![Diagnostic::new(e.to_string()).at_line(line_of(source, e.offset()))]
    })?;

    let mut parser = Parser::new(source, &tokens);
    let unit = parser.unit().map_err(|d| vec![d])?;

    let diagnostics = Resolver::check(&unit);
    if !diagnostics.is_empty() {
        debug!("{} unresolved name(s) in {}", diagnostics.len(), unit.wrapper);
        return Err(diagnostics);
    }

    debug!(
        "parsed {}: {} import(s), {} member(s), {} display call(s)",
        unit.wrapper,
        unit.imports.len(),
        unit.members.len(),
        unit.display.len()
    );
    Ok(unit)
}

/// 1-based line of a byte offset
fn line_of(
    source: &str,
    offset: usize,
) -> usize {
    let end = offset.min(source.len());
    source.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
}

/// Recursive descent over the unit's tokens
struct Parser<'a> {
    source: &'a str,
    /// Always ends with `Eof`; `pos` never moves past it
    tokens: &'a [Token],
    pos: usize,
    /// Whether line breaks separate statements, per nesting level
    newlines: Vec<bool>,
}

impl<'a> Parser<'a> {
    fn new(
        source: &'a str,
        tokens: &'a [Token],
    ) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            newlines: vec![true],
        }
    }

    // ---- token access ----

    fn newline_significant(&self) -> bool {
        self.newlines.last().copied().unwrap_or(true)
    }

    /// Current token; line breaks are skipped where they carry no meaning
    fn peek(&mut self) -> &'a Token {
        if !self.newline_significant() {
            self.skip_newlines();
        }
        let tokens = self.tokens;
        &tokens[self.pos]
    }

    fn kind(&mut self) -> &'a TokenKind {
        &self.peek().kind
    }

    /// Kind of the token `n` positions after the cursor, line breaks included
    fn nth_kind(
        &self,
        n: usize,
    ) -> &'a TokenKind {
        let tokens = self.tokens;
        tokens.get(self.pos + n).map_or(&TokenKind::Eof, |t| &t.kind)
    }

    fn line(&mut self) -> usize {
        self.peek().span.start.line
    }

    fn bump(&mut self) -> &'a Token {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(
        &mut self,
        kind: &TokenKind,
    ) -> bool {
        if self.kind() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(
        &mut self,
        kind: TokenKind,
    ) -> ParseResult<()> {
        if self.eat(&kind) {
            Ok(())
        } else {
            Err(self.unexpected(&kind.describe()))
        }
    }

    fn unexpected(
        &mut self,
        wanted: &str,
    ) -> Diagnostic {
        let token = self.peek();
        Diagnostic::new(format!(
            "expected {} but found {}",
            wanted,
            token.kind.describe()
        ))
        .at_line(token.span.start.line)
    }

    fn skip_newlines(&mut self) {
        while self.tokens[self.pos].kind == TokenKind::Newline {
            self.pos += 1;
        }
    }

    fn skip_separators(&mut self) {
        while matches!(
            self.tokens[self.pos].kind,
            TokenKind::Newline | TokenKind::Semicolon
        ) {
            self.pos += 1;
        }
    }

    fn at_terminator(&mut self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        )
    }

    fn expect_terminator(&mut self) -> ParseResult<()> {
        if self.at_terminator() {
            Ok(())
        } else {
            Err(self.unexpected("end of statement"))
        }
    }

    /// Run `f` one nesting level down
    fn nested<T>(
        &mut self,
        newlines_significant: bool,
        f: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        self.newlines.push(newlines_significant);
        let result = f(self);
        self.newlines.pop();
        result
    }

    /// Skip a balanced bracket group starting at the cursor
    fn skip_group(&mut self) -> ParseResult<()> {
        let mut depth = 0usize;
        loop {
            let token = &self.tokens[self.pos];
            if token.kind == TokenKind::Eof {
                return Err(Diagnostic::new("unclosed bracket").at_line(token.span.start.line));
            }
            if token.kind.is_open() {
                depth += 1;
            } else if token.kind.is_close() {
                depth = depth.saturating_sub(1);
            }
            self.pos += 1;
            if depth == 0 {
                return Ok(());
            }
        }
    }

    /// Skip the rest of a statement, bracket groups included
    fn skip_statement(&mut self) -> ParseResult<Option<usize>> {
        let mut end = None;
        while !self.at_terminator() {
            if self.kind().is_open() {
                self.skip_group()?;
                end = Some(self.tokens[self.pos - 1].span.end.offset);
            } else {
                end = Some(self.bump().span.end.offset);
            }
        }
        Ok(end)
    }

    fn ident(&mut self) -> ParseResult<String> {
        match self.kind() {
            TokenKind::Identifier(name) => {
                self.bump();
                Ok(name.clone())
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    // ---- unit structure ----

    fn unit(&mut self) -> ParseResult<CompiledUnit> {
        self.skip_separators();
        match self.kind() {
            TokenKind::KwObject | TokenKind::KwClass => {
                self.bump();
            }
            _ => return Err(self.unexpected("wrapper definition")),
        }
        let wrapper = self.ident()?;
        self.expect(TokenKind::LBrace)?;

        let mut imports = Vec::new();
        let mut members = Vec::new();
        let mut display = Vec::new();
        self.nested(true, |p| loop {
            p.skip_separators();
            match p.kind() {
                TokenKind::RBrace => {
                    p.bump();
                    return Ok(());
                }
                TokenKind::Eof => return Err(p.unexpected("`}`")),
                TokenKind::KwImport => {
                    p.bump();
                    imports.push(p.import()?);
                }
                TokenKind::KwDef
                    if matches!(p.nth_kind(1), TokenKind::Identifier(name) if name == DISPLAY_METHOD) =>
                {
                    display.extend(p.display_block()?);
                }
                _ => members.push(p.member()?),
            }
            p.expect_terminator()?;
        })?;

        self.skip_separators();
        let holder = if self.eat(&TokenKind::KwObject) {
            let instance = self.ident()?;
            self.expect(TokenKind::KwExtends)?;
            let line = self.line();
            let parent = self.ident()?;
            if parent != wrapper {
                return Err(Diagnostic::new(format!(
                    "instance object {} extends {} instead of {}",
                    instance, parent, wrapper
                ))
                .at_line(line));
            }
            instance
        } else {
            wrapper.clone()
        };
        self.skip_separators();
        if self.kind() != &TokenKind::Eof {
            return Err(self.unexpected("end of unit"));
        }

        Ok(CompiledUnit {
            wrapper,
            holder,
            imports,
            members,
            display,
        })
    }

    fn import(&mut self) -> ParseResult<Import> {
        if let (TokenKind::Identifier(holder), TokenKind::Dot, TokenKind::Identifier(name)) =
            (self.nth_kind(0), self.nth_kind(1), self.nth_kind(2))
        {
            let terminated = matches!(
                self.nth_kind(3),
                TokenKind::Newline | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
            );
            if holder.starts_with("$line") && terminated {
                self.pos += 3;
                return Ok(Import::Bridge {
                    holder: holder.clone(),
                    name: name.clone(),
                });
            }
        }

        let start = self.peek().span.start.offset;
        match self.skip_statement()? {
            Some(end) => {
                let path = self.source.get(start..end).unwrap_or_default();
                Ok(Import::Plain(path.to_string()))
            }
            None => Err(self.unexpected("import path")),
        }
    }

    fn display_block(&mut self) -> ParseResult<Vec<DisplayInstruction>> {
        self.expect(TokenKind::KwDef)?;
        self.ident()?;
        self.expect(TokenKind::LParen)?;
        self.expect(TokenKind::RParen)?;
        self.annotation()?;
        self.expect(TokenKind::Eq)?;
        self.expect(TokenKind::LBrace)?;
        self.nested(true, |p| {
            let mut calls = Vec::new();
            loop {
                p.skip_separators();
                if p.eat(&TokenKind::RBrace) {
                    return Ok(calls);
                }
                calls.push(p.display_call()?);
                p.expect_terminator()?;
            }
        })
    }

    /// `$repl.<method>("arg", ..., name)`
    fn display_call(&mut self) -> ParseResult<DisplayInstruction> {
        let line = self.line();
        let receiver = self.ident()?;
        if receiver != DISPLAY_RUNTIME {
            return Err(Diagnostic::new(format!(
                "unexpected statement in display block: {}",
                receiver
            ))
            .at_line(line));
        }
        self.expect(TokenKind::Dot)?;
        let method = self.ident()?;
        self.expect(TokenKind::LParen)?;

        // `Some` for string literals, `None` for a value reference
        let args = self.nested(false, |p| {
            let mut args = Vec::new();
            if p.eat(&TokenKind::RParen) {
                return Ok(args);
            }
            loop {
                match p.kind() {
                    TokenKind::StringLiteral(text) => {
                        p.bump();
                        args.push(Some(text.clone()));
                    }
                    TokenKind::Identifier(_) => {
                        p.bump();
                        args.push(None);
                    }
                    _ => return Err(p.unexpected("display argument")),
                }
                if !p.eat(&TokenKind::Comma) {
                    p.expect(TokenKind::RParen)?;
                    return Ok(args);
                }
            }
        })?;

        let instruction = match (method.as_str(), args.as_slice()) {
            ("defined", [Some(label), Some(name)]) => DisplayInstruction::Defined {
                label: label.clone(),
                name: name.clone(),
            },
            ("value", [Some(keyword), Some(name), None]) => DisplayInstruction::Value {
                keyword: keyword.clone(),
                name: name.clone(),
            },
            ("deferred", [Some(name)]) => DisplayInstruction::Deferred { name: name.clone() },
            ("imported", [Some(path)]) => DisplayInstruction::Import { path: path.clone() },
            _ => {
                return Err(Diagnostic::new(format!(
                    "malformed display call {}.{}",
                    DISPLAY_RUNTIME, method
                ))
                .at_line(line));
            }
        };
        Ok(instruction)
    }

    // ---- declarations ----

    /// Skip modifiers and annotations; returns whether `lazy` was among them
    fn modifiers(&mut self) -> ParseResult<bool> {
        let mut lazy = false;
        loop {
            match self.kind() {
                TokenKind::KwLazy => {
                    self.bump();
                    lazy = true;
                }
                TokenKind::KwPrivate | TokenKind::KwProtected => {
                    self.bump();
                    if self.kind() == &TokenKind::LBracket {
                        self.skip_group()?;
                    }
                }
                kind if kind.is_modifier() => {
                    self.bump();
                }
                TokenKind::At => {
                    self.bump();
                    self.ident()?;
                    while self.eat(&TokenKind::Dot) {
                        self.ident()?;
                    }
                    if self.kind() == &TokenKind::LParen {
                        self.skip_group()?;
                    }
                    self.skip_newlines();
                }
                TokenKind::Identifier(word)
                    if SOFT_MODIFIERS.contains(&word.as_str())
                        && self.nth_kind(1).keyword().is_some() =>
                {
                    self.bump();
                }
                _ => return Ok(lazy),
            }
        }
    }

    fn member(&mut self) -> ParseResult<Member> {
        let lazy = self.modifiers()?;
        let line = self.line();
        match self.kind() {
            TokenKind::KwVal | TokenKind::KwVar => {
                self.bump();
                let (pattern, value) = self.binding()?;
                if !lazy {
                    return Ok(Member::Value {
                        pattern,
                        value,
                        line,
                    });
                }
                match pattern {
                    Pattern::Name(name) => Ok(Member::Lazy { name, value }),
                    _ => Err(Diagnostic::new("lazy patterns are not supported").at_line(line)),
                }
            }
            TokenKind::KwDef => {
                self.bump();
                Ok(Member::Def(Arc::new(self.function()?)))
            }
            TokenKind::KwObject
            | TokenKind::KwClass
            | TokenKind::KwTrait
            | TokenKind::KwType
            | TokenKind::KwEnum => {
                self.bump();
                let name = self.ident()?;
                self.skip_statement()?;
                Ok(Member::Opaque { name })
            }
            _ if lazy => Err(self.unexpected("`val`")),
            _ => Ok(Member::Expr(self.expr()?)),
        }
    }

    /// `<pattern> [: Type] = <expr>` after `val` or `var`
    fn binding(&mut self) -> ParseResult<(Pattern, Expr)> {
        let pattern = self.pattern()?;
        self.annotation()?;
        self.expect(TokenKind::Eq)?;
        self.skip_newlines();
        let value = self.expr()?;
        Ok((pattern, value))
    }

    fn pattern(&mut self) -> ParseResult<Pattern> {
        match self.kind() {
            TokenKind::Identifier(name) => {
                self.bump();
                Ok(Pattern::Name(name.clone()))
            }
            TokenKind::Underscore => {
                self.bump();
                Ok(Pattern::Wildcard)
            }
            TokenKind::LParen => {
                self.bump();
                self.nested(false, |p| {
                    let mut items = Vec::new();
                    loop {
                        items.push(p.pattern()?);
                        p.annotation()?;
                        if !p.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                    p.expect(TokenKind::RParen)?;
                    if items.len() == 1 {
                        Ok(items.swap_remove(0))
                    } else {
                        Ok(Pattern::Tuple(items))
                    }
                })
            }
            _ => Err(self.unexpected("pattern")),
        }
    }

    /// Optional `: Type`
    fn annotation(&mut self) -> ParseResult<()> {
        if self.eat(&TokenKind::Colon) {
            self.skip_type()?;
        }
        Ok(())
    }

    fn skip_type(&mut self) -> ParseResult<()> {
        let start = self.pos;
        loop {
            match self.kind() {
                TokenKind::Eq
                | TokenKind::Comma
                | TokenKind::Semicolon
                | TokenKind::Newline
                | TokenKind::Eof
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::LBrace => break,
                kind if kind.is_open() => self.skip_group()?,
                _ => {
                    self.bump();
                }
            }
        }
        if self.pos == start {
            Err(self.unexpected("type"))
        } else {
            Ok(())
        }
    }

    /// `name[T](params)[: Type] = body` after `def`
    fn function(&mut self) -> ParseResult<FunctionDef> {
        let name = match self.kind() {
            TokenKind::Identifier(name) | TokenKind::Operator(name) => {
                self.bump();
                name.clone()
            }
            _ => return Err(self.unexpected("function name")),
        };
        if self.kind() == &TokenKind::LBracket {
            self.skip_group()?;
        }
        let params = if self.kind() == &TokenKind::LParen {
            Some(self.params()?)
        } else {
            None
        };
        if self.kind() == &TokenKind::LParen {
            let line = self.line();
            return Err(Diagnostic::new(format!(
                "multiple parameter lists are not supported ({})",
                name
            ))
            .at_line(line));
        }
        self.annotation()?;

        let body = if self.eat(&TokenKind::Eq) {
            self.skip_newlines();
            self.expr()?
        } else if self.kind() == &TokenKind::LBrace {
            self.block()?
        } else {
            return Err(self.unexpected("`=`"));
        };
        Ok(FunctionDef { name, params, body })
    }

    fn params(&mut self) -> ParseResult<Vec<String>> {
        self.bump();
        self.nested(false, |p| {
            let mut params = Vec::new();
            if p.eat(&TokenKind::RParen) {
                return Ok(params);
            }
            loop {
                p.eat(&TokenKind::KwImplicit);
                params.push(p.ident()?);
                p.expect(TokenKind::Colon)?;
                p.skip_type()?;
                if !p.eat(&TokenKind::Comma) {
                    p.expect(TokenKind::RParen)?;
                    return Ok(params);
                }
            }
        })
    }

    // ---- expressions ----

    fn expr(&mut self) -> ParseResult<Expr> {
        self.expr_bp(BP_LOWEST)
    }

    fn expr_bp(
        &mut self,
        min_bp: u8,
    ) -> ParseResult<Expr> {
        let mut lhs = self.prefix()?;
        loop {
            // A selection may continue on the next line
            if self.newline_significant()
                && self.nth_kind(0) == &TokenKind::Newline
                && self.nth_kind(1) == &TokenKind::Dot
            {
                self.skip_newlines();
            }

            lhs = match self.kind() {
                TokenKind::Operator(symbol) => {
                    let Some(op) = BinOp::from_symbol(symbol) else {
                        break;
                    };
                    let (left_bp, right_bp) = op.binding_power();
                    if left_bp < min_bp {
                        break;
                    }
                    self.bump();
                    self.skip_newlines();
                    let rhs = self.expr_bp(right_bp)?;
                    Expr::Binary(op, Box::new(lhs), Box::new(rhs))
                }
                TokenKind::LParen => {
                    let args = self.args()?;
                    Expr::Call {
                        callee: Box::new(lhs),
                        args,
                    }
                }
                TokenKind::Dot => {
                    self.bump();
                    self.skip_newlines();
                    self.selection(lhs)?
                }
                _ => break,
            };
        }
        Ok(lhs)
    }

    fn prefix(&mut self) -> ParseResult<Expr> {
        let token = self.peek();
        let line = token.span.start.line;
        let expr = match &token.kind {
            TokenKind::IntLiteral(n) => {
                self.bump();
                Expr::Literal(Literal::Int(int_literal(*n, line)?))
            }
            TokenKind::FloatLiteral(f) => {
                self.bump();
                Expr::Literal(Literal::Double(*f))
            }
            TokenKind::BoolLiteral(b) => {
                self.bump();
                Expr::Literal(Literal::Bool(*b))
            }
            TokenKind::CharLiteral(c) => {
                self.bump();
                Expr::Literal(Literal::Char(*c))
            }
            TokenKind::StringLiteral(text) => {
                self.bump();
                Expr::Literal(Literal::Str(text.clone()))
            }
            TokenKind::Identifier(name) => {
                self.bump();
                Expr::Name {
                    name: name.clone(),
                    line,
                }
            }
            TokenKind::Operator(op) if op == "-" => {
                self.bump();
                if let TokenKind::IntLiteral(n) = self.nth_kind(0) {
                    self.bump();
                    Expr::Literal(Literal::Int(int_literal(-*n, line)?))
                } else {
                    Expr::Unary(UnaryOp::Neg, Box::new(self.expr_bp(BP_PREFIX)?))
                }
            }
            TokenKind::Operator(op) if op == "!" => {
                self.bump();
                Expr::Unary(UnaryOp::Not, Box::new(self.expr_bp(BP_PREFIX)?))
            }
            TokenKind::LParen => self.parenthesised()?,
            TokenKind::LBrace => self.block()?,
            TokenKind::KwIf => self.if_expr()?,
            _ => return Err(self.unexpected("expression")),
        };
        Ok(expr)
    }

    /// `()`, `(e)` or a tuple
    fn parenthesised(&mut self) -> ParseResult<Expr> {
        let mut items = self.args()?;
        Ok(match items.len() {
            0 => Expr::Literal(Literal::Unit),
            1 => items.swap_remove(0),
            _ => Expr::Tuple(items),
        })
    }

    /// Comma separated expressions between parentheses
    fn args(&mut self) -> ParseResult<Vec<Expr>> {
        self.expect(TokenKind::LParen)?;
        self.nested(false, |p| {
            let mut items = Vec::new();
            if p.eat(&TokenKind::RParen) {
                return Ok(items);
            }
            loop {
                items.push(p.expr()?);
                if !p.eat(&TokenKind::Comma) {
                    p.expect(TokenKind::RParen)?;
                    return Ok(items);
                }
            }
        })
    }

    fn block(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::LBrace)?;
        self.nested(true, |p| {
            let mut locals = Vec::new();
            loop {
                p.skip_separators();
                match p.kind() {
                    TokenKind::RBrace => {
                        p.bump();
                        return Ok(Expr::Block(locals));
                    }
                    TokenKind::Eof => return Err(p.unexpected("`}`")),
                    _ => locals.push(p.local()?),
                }
                p.expect_terminator()?;
            }
        })
    }

    /// Statement inside a block; `lazy` is accepted and evaluated eagerly
    fn local(&mut self) -> ParseResult<Local> {
        let lazy = self.modifiers()?;
        match self.kind() {
            TokenKind::KwVal | TokenKind::KwVar => {
                self.bump();
                let (pattern, value) = self.binding()?;
                Ok(Local::Val { pattern, value })
            }
            TokenKind::KwDef => {
                self.bump();
                Ok(Local::Def(Arc::new(self.function()?)))
            }
            _ if lazy => Err(self.unexpected("`val`")),
            _ => Ok(Local::Expr(self.expr()?)),
        }
    }

    fn if_expr(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::KwIf)?;
        let cond = if self.kind() == &TokenKind::LParen {
            let cond = self.parenthesised()?;
            self.eat(&TokenKind::KwThen);
            cond
        } else {
            let cond = self.expr()?;
            self.expect(TokenKind::KwThen)?;
            cond
        };
        self.skip_newlines();
        let then = self.expr()?;

        // `else` may start the next line
        if self.nth_kind(0) == &TokenKind::Newline && self.nth_kind(1) == &TokenKind::KwElse {
            self.skip_newlines();
        }
        let otherwise = if self.eat(&TokenKind::KwElse) {
            self.skip_newlines();
            Some(Box::new(self.expr()?))
        } else {
            None
        };
        Ok(Expr::If {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise,
        })
    }

    /// Member access after `.`
    fn selection(
        &mut self,
        target: Expr,
    ) -> ParseResult<Expr> {
        let member = self.ident()?;
        if let Some(index) = member
            .strip_prefix('_')
            .and_then(|digits| digits.parse::<usize>().ok())
            .filter(|index| *index > 0)
        {
            return Ok(Expr::TupleIndex {
                target: Box::new(target),
                index,
            });
        }
        if let Expr::Name { name, .. } = &target {
            if let Some(builtin) = Builtin::lookup(name, &member) {
                return Ok(Expr::Builtin(builtin));
            }
        }
        Ok(Expr::Select {
            target: Box::new(target),
            member,
        })
    }
}

fn int_literal(
    value: i64,
    line: usize,
) -> ParseResult<i32> {
    i32::try_from(value).map_err(|_| {
        Diagnostic::new(format!("integer number too large: {}", value)).at_line(line)
    })
}

/// Checks that every referenced name is bound
struct Resolver<'a> {
    /// Members of the unit and bridged names
    globals: HashSet<&'a str>,
    /// Enclosing locals, innermost last
    locals: Vec<&'a str>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Resolver<'a> {
    fn check(unit: &'a CompiledUnit) -> Vec<Diagnostic> {
        let mut globals: HashSet<&str> = unit.members.iter().flat_map(|m| m.names()).collect();
        globals.extend(unit.bridges().map(|(_, name)| name));

        let mut resolver = Resolver {
            globals,
            locals: Vec::new(),
            diagnostics: Vec::new(),
        };
        for member in &unit.members {
            match member {
                Member::Value { value, .. } | Member::Lazy { value, .. } | Member::Expr(value) => {
                    resolver.expr(value)
                }
                Member::Def(def) => resolver.function(def),
                Member::Opaque { .. } => {}
            }
        }
        resolver.diagnostics
    }

    fn is_bound(
        &self,
        name: &str,
    ) -> bool {
        self.locals.iter().any(|local| *local == name) || self.globals.contains(name)
    }

    fn function(
        &mut self,
        def: &'a FunctionDef,
    ) {
        let mark = self.locals.len();
        self.locals.push(&def.name);
        if let Some(params) = &def.params {
            self.locals.extend(params.iter().map(String::as_str));
        }
        self.expr(&def.body);
        self.locals.truncate(mark);
    }

    fn expr(
        &mut self,
        expr: &'a Expr,
    ) {
        match expr {
            Expr::Literal(_) | Expr::Builtin(_) => {}
            Expr::Name { name, line } => {
                if !self.is_bound(name) {
                    let diagnostic =
                        Diagnostic::new(format!("not found: value {}", name)).at_line(*line);
                    if !self.diagnostics.contains(&diagnostic) {
                        self.diagnostics.push(diagnostic);
                    }
                }
            }
            Expr::Tuple(items) => {
                for item in items {
                    self.expr(item);
                }
            }
            Expr::Unary(_, operand) => self.expr(operand),
            Expr::Binary(_, lhs, rhs) => {
                self.expr(lhs);
                self.expr(rhs);
            }
            Expr::If {
                cond,
                then,
                otherwise,
            } => {
                self.expr(cond);
                self.expr(then);
                if let Some(otherwise) = otherwise {
                    self.expr(otherwise);
                }
            }
            Expr::Block(locals) => {
                let mark = self.locals.len();
                for local in locals {
                    match local {
                        Local::Val { pattern, value } => {
                            self.expr(value);
                            self.locals.extend(pattern.names());
                        }
                        Local::Def(def) => {
                            self.locals.push(&def.name);
                            self.function(def);
                        }
                        Local::Expr(value) => self.expr(value),
                    }
                }
                self.locals.truncate(mark);
            }
            Expr::Call { callee, args } => {
                self.expr(callee);
                for arg in args {
                    self.expr(arg);
                }
            }
            Expr::Select { target, .. } | Expr::TupleIndex { target, .. } => self.expr(target),
        }
    }
}
