pub mod ast;

use std::mem::discriminant;

use tracing::debug;

use crate::diagnostics::FragmentError;
use crate::lexer::{self, IntLit, Token};
use crate::span::{Span, Spanned};
use ast::*;

/// Attributes whose arguments are type-level syntax. Their tokens are kept
/// verbatim instead of being parsed as expressions.
const RAW_ATTRIBUTES: &[&str] = &["spec", "type", "opaque", "nominal", "callback", "record", "define"];

pub struct Parser<'a> {
    tokens: &'a [Spanned<Token>],
    pos: usize,
    /// Set while parsing `Class:Reason:Stack` catch patterns, where `:`
    /// separates patterns instead of forming a remote call.
    restrict_remote: bool,
    context: &'static str,
}

enum Infix {
    Match,
    Op(BinOp),
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Spanned<Token>]) -> Self {
        Self { tokens, pos: 0, restrict_remote: false, context: "expression" }
    }

    fn peek(&self) -> Option<&'a Spanned<Token>> {
        self.tokens.get(self.pos)
    }

    fn peek_node(&self) -> Option<&'a Token> {
        self.peek().map(|t| &t.node)
    }

    fn peek_nth(&self, n: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + n).map(|t| &t.node)
    }

    fn check(&self, expected: &Token) -> bool {
        self.peek_node().is_some_and(|tok| discriminant(tok) == discriminant(expected))
    }

    fn eat(&mut self, expected: &Token) -> bool {
        let found = self.check(expected);
        if found {
            self.pos += 1;
        }
        found
    }

    fn expect(&mut self, expected: &Token) -> Result<Span, FragmentError> {
        match self.peek() {
            Some(tok) if discriminant(&tok.node) == discriminant(expected) => {
                self.pos += 1;
                Ok(tok.span)
            }
            Some(tok) => Err(self.error(format!("expected '{expected}', found '{}'", tok.node), tok.span)),
            None => Err(self.error(format!("expected '{expected}', found end of input"), self.eof_span())),
        }
    }

    fn expect_atom(&mut self) -> Result<Spanned<String>, FragmentError> {
        match self.peek() {
            Some(Spanned { node: Token::Atom(name), span }) => {
                self.pos += 1;
                Ok(Spanned::new(name.clone(), *span))
            }
            _ => Err(self.unexpected("atom")),
        }
    }

    fn expect_end(&self) -> Result<(), FragmentError> {
        match self.peek() {
            Some(tok) => Err(self.error(format!("unexpected '{}' after terminating '.'", tok.node), tok.span)),
            None => Ok(()),
        }
    }

    fn error(&self, reason: impl Into<String>, span: Span) -> FragmentError {
        FragmentError::parse(self.context, reason, span)
    }

    fn unexpected(&self, what: &str) -> FragmentError {
        match self.peek() {
            Some(tok) => self.error(format!("expected {what}, found '{}'", tok.node), tok.span),
            None => self.error(format!("expected {what}, found end of input"), self.eof_span()),
        }
    }

    fn eof_span(&self) -> Span {
        match self.tokens.last() {
            Some(last) => Span::new(last.span.end, last.span.end, last.span.line),
            None => Span::dummy(),
        }
    }

    fn current_span(&self) -> Span {
        self.peek().map_or_else(|| self.eof_span(), |t| t.span)
    }

    fn prev_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(tok) => tok.span,
            None => self.eof_span(),
        }
    }

    /// Run `f` with `context` as the grammar context named in errors.
    fn in_context<T>(
        &mut self,
        context: &'static str,
        f: impl FnOnce(&mut Self) -> Result<T, FragmentError>,
    ) -> Result<T, FragmentError> {
        let saved = std::mem::replace(&mut self.context, context);
        let result = f(self);
        self.context = saved;
        result
    }

    fn with_restrict_remote<T>(
        &mut self,
        restrict: bool,
        f: impl FnOnce(&mut Self) -> Result<T, FragmentError>,
    ) -> Result<T, FragmentError> {
        let saved = std::mem::replace(&mut self.restrict_remote, restrict);
        let result = f(self);
        self.restrict_remote = saved;
        result
    }

    /// `Expr, ..., Expr .` with nothing after the terminator. The result is a
    /// `Block` holding the expressions in order.
    pub fn parse_expression_sequence(&mut self) -> Result<Spanned<Expr>, FragmentError> {
        self.in_context("expression sequence", |p| {
            let start = p.current_span();
            let exprs = p.parse_exprs()?;
            let end = p.expect(&Token::Terminator)?;
            p.expect_end()?;
            Ok(Spanned::new(Expr::Block(exprs), start.to(end)))
        })
    }

    /// One attribute or function declaration followed by its terminator.
    pub fn parse_form(&mut self) -> Result<Spanned<Form>, FragmentError> {
        let form = if self.check(&Token::Minus) {
            self.in_context("attribute", Self::parse_attribute)?
        } else {
            self.in_context("function", Self::parse_function)?
        };
        self.expect(&Token::Terminator)?;
        self.expect_end()?;
        Ok(form)
    }

    // ── Forms ──────────────────────────────────────────────────────────

    fn parse_attribute(&mut self) -> Result<Spanned<Form>, FragmentError> {
        let start = self.expect(&Token::Minus)?;
        let name = match self.peek() {
            Some(Spanned { node: Token::Atom(name), span }) => Spanned::new(name.clone(), *span),
            // -if(...) and friends from the preprocessor
            Some(Spanned { node: tok, span }) if lexer::is_keyword(&tok.to_string()) => {
                Spanned::new(tok.to_string(), *span)
            }
            _ => return Err(self.unexpected("attribute name")),
        };
        self.pos += 1;

        let value = if RAW_ATTRIBUTES.contains(&name.node.as_str()) {
            let mut raw = Vec::new();
            while let Some(tok) = self.peek() {
                if matches!(tok.node, Token::Terminator) {
                    break;
                }
                raw.push(tok.node.clone());
                self.pos += 1;
            }
            AttributeValue::Tokens(raw)
        } else if self.eat(&Token::LParen) {
            let args = if self.check(&Token::RParen) { Vec::new() } else { self.parse_exprs()? };
            self.expect(&Token::RParen)?;
            AttributeValue::Exprs(args)
        } else {
            AttributeValue::Exprs(Vec::new())
        };

        let span = start.to(self.prev_span());
        Ok(Spanned::new(Form::Attribute(Attribute { name, value }), span))
    }

    fn parse_function(&mut self) -> Result<Spanned<Form>, FragmentError> {
        let (name, first) = self.parse_function_clause()?;
        let arity = first.node.patterns.len();
        let start = name.span;
        let mut clauses = vec![first];

        while self.eat(&Token::Semicolon) {
            let (clause_name, clause) = self.parse_function_clause()?;
            if clause_name.node != name.node || clause.node.patterns.len() != arity {
                return Err(self.error(
                    format!(
                        "head mismatch: {}/{} does not match {}/{}",
                        clause_name.node,
                        clause.node.patterns.len(),
                        name.node,
                        arity
                    ),
                    clause_name.span,
                ));
            }
            clauses.push(clause);
        }

        let span = start.to(self.prev_span());
        debug!(name = %name.node, arity, clauses = clauses.len(), "parsed function");
        Ok(Spanned::new(Form::Function(Function { name, arity, clauses }), span))
    }

    fn parse_function_clause(&mut self) -> Result<(Spanned<String>, Spanned<Clause>), FragmentError> {
        let name = self.expect_atom()?;
        let patterns = self.parse_arg_patterns()?;
        let guards = self.parse_guard_opt()?;
        self.expect(&Token::Arrow)?;
        let body = self.parse_body()?;
        let span = name.span.to(self.prev_span());
        Ok((name, Spanned::new(Clause { patterns, guards, body }, span)))
    }

    // ── Clauses ────────────────────────────────────────────────────────

    fn parse_arg_patterns(&mut self) -> Result<Vec<Spanned<Expr>>, FragmentError> {
        self.expect(&Token::LParen)?;
        if self.eat(&Token::RParen) {
            return Ok(Vec::new());
        }
        let patterns = self.in_context("pattern", Self::parse_exprs)?;
        self.expect(&Token::RParen)?;
        Ok(patterns)
    }

    fn parse_guard_opt(&mut self) -> Result<Vec<Vec<Spanned<Expr>>>, FragmentError> {
        if self.eat(&Token::When) { self.parse_guard_seq() } else { Ok(Vec::new()) }
    }

    fn parse_guard_seq(&mut self) -> Result<Vec<Vec<Spanned<Expr>>>, FragmentError> {
        self.in_context("guard", |p| {
            let mut seq = vec![p.parse_exprs()?];
            while p.eat(&Token::Semicolon) {
                seq.push(p.parse_exprs()?);
            }
            Ok(seq)
        })
    }

    fn parse_body(&mut self) -> Result<Vec<Spanned<Expr>>, FragmentError> {
        self.parse_exprs()
    }

    fn parse_exprs(&mut self) -> Result<Vec<Spanned<Expr>>, FragmentError> {
        let mut exprs = vec![self.parse_expr()?];
        while self.eat(&Token::Comma) {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    /// `Pattern [when Guard] -> Body`, as in `case` and `receive`.
    fn parse_cr_clause(&mut self) -> Result<Spanned<Clause>, FragmentError> {
        self.in_context("clause", |p| {
            let start = p.current_span();
            let pattern = p.parse_expr()?;
            let guards = p.parse_guard_opt()?;
            p.expect(&Token::Arrow)?;
            let body = p.parse_body()?;
            let span = start.to(p.prev_span());
            Ok(Spanned::new(Clause { patterns: vec![pattern], guards, body }, span))
        })
    }

    fn parse_cr_clauses(&mut self) -> Result<Vec<Spanned<Clause>>, FragmentError> {
        let mut clauses = vec![self.parse_cr_clause()?];
        while self.eat(&Token::Semicolon) {
            clauses.push(self.parse_cr_clause()?);
        }
        Ok(clauses)
    }

    fn parse_catch_clause(&mut self) -> Result<Spanned<Clause>, FragmentError> {
        self.in_context("catch clause", |p| {
            let start = p.current_span();
            let patterns = p.with_restrict_remote(true, Self::parse_catch_pattern)?;
            let guards = p.parse_guard_opt()?;
            p.expect(&Token::Arrow)?;
            let body = p.parse_body()?;
            let span = start.to(p.prev_span());
            Ok(Spanned::new(Clause { patterns, guards, body }, span))
        })
    }

    /// `Reason`, `Class:Reason` or `Class:Reason:Stack`, normalised to three
    /// patterns. Class defaults to `throw` and the stacktrace to `_`.
    fn parse_catch_pattern(&mut self) -> Result<Vec<Spanned<Expr>>, FragmentError> {
        let first = self.parse_expr()?;
        if !self.eat(&Token::Colon) {
            let span = first.span;
            return Ok(vec![
                Spanned::new(Expr::Atom("throw".into()), span),
                first,
                Spanned::new(Expr::Var("_".into()), span),
            ]);
        }
        let reason = self.parse_expr()?;
        let stack = if self.eat(&Token::Colon) {
            self.parse_expr()?
        } else {
            Spanned::new(Expr::Var("_".into()), reason.span)
        };
        Ok(vec![first, reason, stack])
    }

    fn parse_fun_clause(&mut self, name: Option<&str>) -> Result<Spanned<Clause>, FragmentError> {
        self.in_context("fun clause", |p| {
            let start = p.current_span();
            if let Some(expected) = name {
                match p.peek_node() {
                    Some(Token::Var(found)) if found == expected => p.pos += 1,
                    _ => return Err(p.unexpected(&format!("'{expected}'"))),
                }
            }
            let patterns = p.parse_arg_patterns()?;
            let guards = p.parse_guard_opt()?;
            p.expect(&Token::Arrow)?;
            let body = p.parse_body()?;
            let span = start.to(p.prev_span());
            Ok(Spanned::new(Clause { patterns, guards, body }, span))
        })
    }

    // ── Expressions ────────────────────────────────────────────────────

    fn parse_expr(&mut self) -> Result<Spanned<Expr>, FragmentError> {
        if self.check(&Token::Catch) {
            let start = self.expect(&Token::Catch)?;
            let inner = self.parse_expr()?;
            let span = start.to(inner.span);
            return Ok(Spanned::new(Expr::Catch(Box::new(inner)), span));
        }
        self.parse_binary(0)
    }

    fn parse_binary(&mut self, min_bp: u8) -> Result<Spanned<Expr>, FragmentError> {
        let mut lhs = self.parse_unary()?;
        let mut after_comparison = false;

        loop {
            let Some(tok) = self.peek() else { break };
            let Some(infix) = infix_op(&tok.node) else { break };
            let (lbp, rbp) = infix_binding_power(&infix);
            if lbp < min_bp {
                break;
            }
            let comparison = matches!(infix, Infix::Op(op) if op.is_comparison());
            if comparison && after_comparison {
                return Err(self.error("comparison operators do not chain", tok.span));
            }
            self.pos += 1;

            let rhs = self.parse_binary(rbp)?;
            let span = lhs.span.to(rhs.span);
            let node = match infix {
                Infix::Match => Expr::Match { pattern: Box::new(lhs), value: Box::new(rhs) },
                Infix::Op(op) => Expr::BinOp { op, lhs: Box::new(lhs), rhs: Box::new(rhs) },
            };
            lhs = Spanned::new(node, span);
            after_comparison = comparison;
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Spanned<Expr>, FragmentError> {
        if let Some(op) = self.peek_node().and_then(prefix_op) {
            let start = self.current_span();
            self.pos += 1;
            let operand = self.parse_unary()?;
            let span = start.to(operand.span);
            return Ok(Spanned::new(Expr::UnaryOp { op, operand: Box::new(operand) }, span));
        }
        let primary = self.parse_primary()?;
        self.parse_postfix(primary)
    }

    fn parse_postfix(&mut self, mut expr: Spanned<Expr>) -> Result<Spanned<Expr>, FragmentError> {
        loop {
            match self.peek_node() {
                Some(Token::LParen) => {
                    let args = self.parse_call_args()?;
                    let span = expr.span.to(self.prev_span());
                    expr = Spanned::new(Expr::Call { function: Box::new(expr), args }, span);
                }
                Some(Token::Colon) if !self.restrict_remote => {
                    self.pos += 1;
                    let function = self.parse_primary()?;
                    if !self.check(&Token::LParen) {
                        return Err(self.unexpected("'(' after remote function name"));
                    }
                    let remote_span = expr.span.to(function.span);
                    let remote = Spanned::new(
                        Expr::Remote { module: Box::new(expr), function: Box::new(function) },
                        remote_span,
                    );
                    let args = self.parse_call_args()?;
                    let span = remote_span.to(self.prev_span());
                    expr = Spanned::new(Expr::Call { function: Box::new(remote), args }, span);
                }
                Some(Token::Hash) => expr = self.parse_hash(Some(expr))?,
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_call_args(&mut self) -> Result<Vec<Spanned<Expr>>, FragmentError> {
        self.expect(&Token::LParen)?;
        if self.eat(&Token::RParen) {
            return Ok(Vec::new());
        }
        let args = self.with_restrict_remote(false, Self::parse_exprs)?;
        self.expect(&Token::RParen)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Spanned<Expr>, FragmentError> {
        let Some(tok) = self.peek() else {
            return Err(self.unexpected("expression"));
        };
        let span = tok.span;
        let simple = match &tok.node {
            Token::Var(name) => Some(Expr::Var(name.clone())),
            Token::Atom(name) => Some(Expr::Atom(name.clone())),
            Token::Integer(n) => Some(Expr::Integer(n.clone())),
            Token::Float(f) => Some(Expr::Float(*f)),
            Token::Char(c) => Some(Expr::Char(*c)),
            _ => None,
        };
        if let Some(node) = simple {
            self.pos += 1;
            return Ok(Spanned::new(node, span));
        }

        match &tok.node {
            Token::String(_) => Ok(self.parse_strings()),
            Token::LParen => {
                self.pos += 1;
                let inner = self.with_restrict_remote(false, Self::parse_expr)?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::LBrace => self.parse_tuple(),
            Token::LBracket => self.parse_list(),
            Token::LtLt => self.parse_binary_expr(),
            Token::Hash => self.parse_hash(None),
            Token::Begin => self.parse_block(),
            Token::Case => self.parse_case(),
            Token::If => self.parse_if(),
            Token::Receive => self.parse_receive(),
            Token::Try => self.parse_try(),
            Token::Fun => self.parse_fun(),
            Token::Question => self.parse_macro(),
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Adjacent string literals concatenate.
    fn parse_strings(&mut self) -> Spanned<Expr> {
        let start = self.current_span();
        let mut text = String::new();
        while let Some(Spanned { node: Token::String(part), .. }) = self.peek() {
            text.push_str(part);
            self.pos += 1;
        }
        Spanned::new(Expr::String(text), start.to(self.prev_span()))
    }

    fn parse_tuple(&mut self) -> Result<Spanned<Expr>, FragmentError> {
        let start = self.expect(&Token::LBrace)?;
        let elements = if self.check(&Token::RBrace) { Vec::new() } else { self.parse_exprs()? };
        let end = self.expect(&Token::RBrace)?;
        Ok(Spanned::new(Expr::Tuple(elements), start.to(end)))
    }

    fn parse_list(&mut self) -> Result<Spanned<Expr>, FragmentError> {
        let start = self.expect(&Token::LBracket)?;
        if self.check(&Token::RBracket) {
            let end = self.expect(&Token::RBracket)?;
            return Ok(Spanned::new(Expr::List { elements: Vec::new(), tail: None }, start.to(end)));
        }

        let first = self.parse_expr()?;
        if self.eat(&Token::PipePipe) {
            let qualifiers = self.parse_qualifiers()?;
            let end = self.expect(&Token::RBracket)?;
            let node = Expr::ListComp { template: Box::new(first), qualifiers };
            return Ok(Spanned::new(node, start.to(end)));
        }

        let mut elements = vec![first];
        while self.eat(&Token::Comma) {
            elements.push(self.parse_expr()?);
        }
        let tail = if self.eat(&Token::Pipe) { Some(Box::new(self.parse_expr()?)) } else { None };
        let end = self.expect(&Token::RBracket)?;
        Ok(Spanned::new(Expr::List { elements, tail }, start.to(end)))
    }

    fn parse_qualifiers(&mut self) -> Result<Vec<Qualifier>, FragmentError> {
        self.in_context("comprehension", |p| {
            let mut qualifiers = vec![p.parse_qualifier()?];
            while p.eat(&Token::Comma) {
                qualifiers.push(p.parse_qualifier()?);
            }
            Ok(qualifiers)
        })
    }

    fn parse_qualifier(&mut self) -> Result<Qualifier, FragmentError> {
        let expr = self.parse_expr()?;
        if self.eat(&Token::LArrow) {
            let source = self.parse_expr()?;
            Ok(Qualifier::Generator { pattern: expr, source })
        } else if self.eat(&Token::LDoubleArrow) {
            let source = self.parse_expr()?;
            Ok(Qualifier::BinGenerator { pattern: expr, source })
        } else {
            Ok(Qualifier::Filter(expr))
        }
    }

    fn parse_binary_expr(&mut self) -> Result<Spanned<Expr>, FragmentError> {
        let start = self.expect(&Token::LtLt)?;
        if self.check(&Token::GtGt) {
            let end = self.expect(&Token::GtGt)?;
            return Ok(Spanned::new(Expr::Binary(Vec::new()), start.to(end)));
        }

        let first = self.parse_bin_element()?;
        if self.check(&Token::PipePipe) {
            if first.size.is_some() || !first.types.is_empty() {
                return Err(self.error("binary comprehension template cannot carry a size or type", first.value.span));
            }
            self.pos += 1;
            let qualifiers = self.parse_qualifiers()?;
            let end = self.expect(&Token::GtGt)?;
            let node = Expr::BinComp { template: Box::new(first.value), qualifiers };
            return Ok(Spanned::new(node, start.to(end)));
        }

        let mut elements = vec![first];
        while self.eat(&Token::Comma) {
            elements.push(self.parse_bin_element()?);
        }
        let end = self.expect(&Token::GtGt)?;
        Ok(Spanned::new(Expr::Binary(elements), start.to(end)))
    }

    fn parse_bin_element(&mut self) -> Result<BinElement, FragmentError> {
        self.in_context("binary element", |p| {
            let value = match p.peek_node().and_then(prefix_op) {
                Some(op) => {
                    let start = p.current_span();
                    p.pos += 1;
                    let operand = p.parse_primary()?;
                    let span = start.to(operand.span);
                    Spanned::new(Expr::UnaryOp { op, operand: Box::new(operand) }, span)
                }
                None => p.parse_primary()?,
            };
            let size = if p.eat(&Token::Colon) { Some(p.parse_primary()?) } else { None };
            let mut types = Vec::new();
            if p.eat(&Token::Slash) {
                loop {
                    let name = p.expect_atom()?.node;
                    let arg = if p.eat(&Token::Colon) {
                        match p.peek_node() {
                            Some(Token::Integer(IntLit::Small(n))) => {
                                p.pos += 1;
                                Some(*n)
                            }
                            _ => return Err(p.unexpected("integer")),
                        }
                    } else {
                        None
                    };
                    types.push(BinType { name, arg });
                    if !p.eat(&Token::Minus) {
                        break;
                    }
                }
            }
            Ok(BinElement { value, size, types })
        })
    }

    /// `#{...}`, `#rec{...}` and `#rec.field`, optionally applied to `base`.
    fn parse_hash(&mut self, base: Option<Spanned<Expr>>) -> Result<Spanned<Expr>, FragmentError> {
        let hash = self.expect(&Token::Hash)?;
        let start = base.as_ref().map_or(hash, |b| b.span);

        if self.check(&Token::LBrace) {
            let fields = self.in_context("map", Self::parse_map_fields)?;
            let span = start.to(self.prev_span());
            return Ok(Spanned::new(Expr::Map { base: base.map(Box::new), fields }, span));
        }

        let name = self.expect_atom()?;
        if self.eat(&Token::Dot) {
            let field = self.expect_atom()?;
            let span = start.to(field.span);
            let node = match base {
                Some(base) => Expr::RecordAccess { base: Box::new(base), name: name.node, field: field.node },
                None => Expr::RecordIndex { name: name.node, field: field.node },
            };
            return Ok(Spanned::new(node, span));
        }

        let fields = self.in_context("record", Self::parse_record_fields)?;
        let span = start.to(self.prev_span());
        Ok(Spanned::new(Expr::Record { base: base.map(Box::new), name: name.node, fields }, span))
    }

    fn parse_map_fields(&mut self) -> Result<Vec<MapField>, FragmentError> {
        self.expect(&Token::LBrace)?;
        let mut fields = Vec::new();
        if self.eat(&Token::RBrace) {
            return Ok(fields);
        }
        loop {
            let key = self.parse_expr()?;
            let op = if self.eat(&Token::FatArrow) {
                MapOp::Assoc
            } else if self.eat(&Token::ColonEq) {
                MapOp::Exact
            } else {
                return Err(self.unexpected("'=>' or ':='"));
            };
            let value = self.parse_expr()?;
            fields.push(MapField { key, op, value });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RBrace)?;
        Ok(fields)
    }

    fn parse_record_fields(&mut self) -> Result<Vec<RecordField>, FragmentError> {
        self.expect(&Token::LBrace)?;
        let mut fields = Vec::new();
        if self.eat(&Token::RBrace) {
            return Ok(fields);
        }
        loop {
            let name = match self.peek() {
                Some(Spanned { node: Token::Atom(name) | Token::Var(name), span }) => {
                    Spanned::new(name.clone(), *span)
                }
                _ => return Err(self.unexpected("record field name")),
            };
            self.pos += 1;
            self.expect(&Token::Eq)?;
            let value = self.parse_expr()?;
            fields.push(RecordField { name, value });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RBrace)?;
        Ok(fields)
    }

    fn parse_block(&mut self) -> Result<Spanned<Expr>, FragmentError> {
        let start = self.expect(&Token::Begin)?;
        let body = self.in_context("begin block", Self::parse_body)?;
        let end = self.expect(&Token::End)?;
        Ok(Spanned::new(Expr::Block(body), start.to(end)))
    }

    fn parse_case(&mut self) -> Result<Spanned<Expr>, FragmentError> {
        let start = self.expect(&Token::Case)?;
        let subject = self.parse_expr()?;
        self.expect(&Token::Of)?;
        let clauses = self.parse_cr_clauses()?;
        let end = self.expect(&Token::End)?;
        Ok(Spanned::new(Expr::Case { subject: Box::new(subject), clauses }, start.to(end)))
    }

    fn parse_if(&mut self) -> Result<Spanned<Expr>, FragmentError> {
        let start = self.expect(&Token::If)?;
        let mut clauses = Vec::new();
        loop {
            let clause = self.in_context("if clause", |p| {
                let clause_start = p.current_span();
                let guards = p.parse_guard_seq()?;
                p.expect(&Token::Arrow)?;
                let body = p.parse_body()?;
                let span = clause_start.to(p.prev_span());
                Ok(Spanned::new(Clause { patterns: Vec::new(), guards, body }, span))
            })?;
            clauses.push(clause);
            if !self.eat(&Token::Semicolon) {
                break;
            }
        }
        let end = self.expect(&Token::End)?;
        Ok(Spanned::new(Expr::If(clauses), start.to(end)))
    }

    fn parse_receive(&mut self) -> Result<Spanned<Expr>, FragmentError> {
        let start = self.expect(&Token::Receive)?;
        let clauses = if self.check(&Token::After) { Vec::new() } else { self.parse_cr_clauses()? };
        let after = if self.eat(&Token::After) {
            let timeout = self.parse_expr()?;
            self.expect(&Token::Arrow)?;
            let body = self.parse_body()?;
            Some(After { timeout: Box::new(timeout), body })
        } else {
            None
        };
        let end = self.expect(&Token::End)?;
        Ok(Spanned::new(Expr::Receive { clauses, after }, start.to(end)))
    }

    fn parse_try(&mut self) -> Result<Spanned<Expr>, FragmentError> {
        let start = self.expect(&Token::Try)?;
        let body = self.parse_body()?;
        let of_clauses = if self.eat(&Token::Of) { self.parse_cr_clauses()? } else { Vec::new() };

        let mut catch_clauses = Vec::new();
        if self.eat(&Token::Catch) {
            catch_clauses.push(self.parse_catch_clause()?);
            while self.eat(&Token::Semicolon) {
                catch_clauses.push(self.parse_catch_clause()?);
            }
        }
        let after = if self.eat(&Token::After) { self.parse_body()? } else { Vec::new() };
        if catch_clauses.is_empty() && after.is_empty() {
            return Err(self.unexpected("'catch' or 'after'"));
        }

        let end = self.expect(&Token::End)?;
        let node = Expr::Try { body, of_clauses, catch_clauses, after };
        Ok(Spanned::new(node, start.to(end)))
    }

    fn parse_fun(&mut self) -> Result<Spanned<Expr>, FragmentError> {
        let start = self.expect(&Token::Fun)?;
        match (self.peek_node(), self.peek_nth(1)) {
            (Some(Token::LParen), _) => {
                let clauses = self.parse_fun_clauses(None)?;
                let end = self.expect(&Token::End)?;
                Ok(Spanned::new(Expr::Fun { name: None, clauses }, start.to(end)))
            }
            (Some(Token::Var(name)), Some(Token::LParen)) => {
                let clauses = self.parse_fun_clauses(Some(name.as_str()))?;
                let end = self.expect(&Token::End)?;
                Ok(Spanned::new(Expr::Fun { name: Some(name.clone()), clauses }, start.to(end)))
            }
            (Some(Token::Atom(_)), Some(Token::Slash)) => {
                let function = self.parse_primary()?;
                self.expect(&Token::Slash)?;
                let arity = self.parse_primary()?;
                let span = start.to(arity.span);
                let node = Expr::FunRef { module: None, function: Box::new(function), arity: Box::new(arity) };
                Ok(Spanned::new(node, span))
            }
            (Some(Token::Atom(_) | Token::Var(_)), Some(Token::Colon)) => {
                let module = self.parse_primary()?;
                self.expect(&Token::Colon)?;
                let function = self.parse_primary()?;
                self.expect(&Token::Slash)?;
                let arity = self.parse_primary()?;
                let span = start.to(arity.span);
                let node = Expr::FunRef {
                    module: Some(Box::new(module)),
                    function: Box::new(function),
                    arity: Box::new(arity),
                };
                Ok(Spanned::new(node, span))
            }
            _ => Err(self.unexpected("fun clauses or a function reference")),
        }
    }

    fn parse_fun_clauses(&mut self, name: Option<&str>) -> Result<Vec<Spanned<Clause>>, FragmentError> {
        let mut clauses = vec![self.parse_fun_clause(name)?];
        while self.eat(&Token::Semicolon) {
            clauses.push(self.parse_fun_clause(name)?);
        }
        Ok(clauses)
    }

    fn parse_macro(&mut self) -> Result<Spanned<Expr>, FragmentError> {
        let start = self.expect(&Token::Question)?;
        let name = match self.peek_node() {
            Some(Token::Atom(name) | Token::Var(name)) => name.clone(),
            _ => return Err(self.unexpected("macro name")),
        };
        self.pos += 1;
        let args = if self.check(&Token::LParen) { Some(self.parse_call_args()?) } else { None };
        Ok(Spanned::new(Expr::Macro { name, args }, start.to(self.prev_span())))
    }
}

fn prefix_op(tok: &Token) -> Option<UnaryOp> {
    match tok {
        Token::Plus => Some(UnaryOp::Plus),
        Token::Minus => Some(UnaryOp::Neg),
        Token::Bnot => Some(UnaryOp::Bnot),
        Token::Not => Some(UnaryOp::Not),
        _ => None,
    }
}

fn infix_op(tok: &Token) -> Option<Infix> {
    let op = match tok {
        Token::Eq => return Some(Infix::Match),
        Token::Bang => BinOp::Send,
        Token::Orelse => BinOp::Orelse,
        Token::Andalso => BinOp::Andalso,
        Token::EqEq => BinOp::Eq,
        Token::SlashEq => BinOp::Neq,
        Token::EqColonEq => BinOp::ExactEq,
        Token::EqSlashEq => BinOp::ExactNeq,
        Token::Lt => BinOp::Lt,
        Token::LtEq => BinOp::LtEq,
        Token::Gt => BinOp::Gt,
        Token::GtEq => BinOp::GtEq,
        Token::PlusPlus => BinOp::Append,
        Token::MinusMinus => BinOp::Subtract,
        Token::Plus => BinOp::Add,
        Token::Minus => BinOp::Sub,
        Token::Bor => BinOp::Bor,
        Token::Bxor => BinOp::Bxor,
        Token::Bsl => BinOp::Bsl,
        Token::Bsr => BinOp::Bsr,
        Token::Or => BinOp::Or,
        Token::Xor => BinOp::Xor,
        Token::Star => BinOp::Mul,
        Token::Slash => BinOp::Div,
        Token::Div => BinOp::IntDiv,
        Token::Rem => BinOp::Rem,
        Token::Band => BinOp::Band,
        Token::And => BinOp::And,
        _ => return None,
    };
    Some(Infix::Op(op))
}

/// Right-associative levels bind tighter on the left (`(l + 1, l)`).
fn infix_binding_power(infix: &Infix) -> (u8, u8) {
    match infix {
        Infix::Match => MATCH_BINDING_POWER,
        Infix::Op(op) => binop_binding_power(*op),
    }
}

pub(crate) const MATCH_BINDING_POWER: (u8, u8) = (2, 1);

pub(crate) fn binop_binding_power(op: BinOp) -> (u8, u8) {
    match op {
        BinOp::Send => (2, 1),
        BinOp::Orelse => (4, 3),
        BinOp::Andalso => (6, 5),
        BinOp::Eq | BinOp::Neq | BinOp::ExactEq | BinOp::ExactNeq
        | BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => (7, 8),
        BinOp::Append | BinOp::Subtract => (10, 9),
        BinOp::Add | BinOp::Sub | BinOp::Bor | BinOp::Bxor
        | BinOp::Bsl | BinOp::Bsr | BinOp::Or | BinOp::Xor => (11, 12),
        BinOp::Mul | BinOp::Div | BinOp::IntDiv | BinOp::Rem
        | BinOp::Band | BinOp::And => (13, 14),
    }
}

/// Parse a token sequence holding expressions and exactly one terminator,
/// which must be the last token.
pub fn parse_expression_sequence(tokens: &[Spanned<Token>]) -> Result<Spanned<Expr>, FragmentError> {
    Parser::new(tokens).parse_expression_sequence()
}

/// Parse a snippet of expressions with no terminator, e.g. `foo(X), Y + 1`.
pub fn parse_snippet(source: &str) -> Result<Spanned<Expr>, FragmentError> {
    parse_snippet_at(source, 1)
}

/// Like [`parse_snippet`], with the first character on `start_line`.
///
/// The snippet is wrapped as `begin <snippet> end.`, so the result is a
/// single `Block`.
pub fn parse_snippet_at(source: &str, start_line: u32) -> Result<Spanned<Expr>, FragmentError> {
    let (tokens, end_line) = lexer::tokenize(source, start_line)?;
    let open = Span::new(0, 0, start_line);
    let close = Span::new(source.len(), source.len(), end_line);

    let mut wrapped = Vec::with_capacity(tokens.len() + 3);
    wrapped.push(Spanned::new(Token::Begin, open));
    wrapped.extend(tokens);
    wrapped.push(Spanned::new(Token::End, close));
    wrapped.push(Spanned::new(Token::Terminator, close));

    let sequence = parse_expression_sequence(&wrapped)?;
    match sequence.node {
        Expr::Block(mut exprs) if exprs.len() == 1 => match exprs.pop() {
            Some(block) => Ok(block),
            None => Err(FragmentError::parse("snippet", "empty snippet", sequence.span)),
        },
        _ => Err(FragmentError::parse("snippet", "snippet closes a block it did not open", sequence.span)),
    }
}

/// Parse a whole module source into its forms.
pub fn parse_declaration_sequence(source: &str) -> Result<Vec<Spanned<Form>>, FragmentError> {
    let tokens = lexer::lex(source)?;
    parse_declaration_tokens(&tokens)
}

/// Parse pre-lexed declarations. Fails atomically: one bad form rejects
/// the whole sequence.
pub fn parse_declaration_tokens(tokens: &[Spanned<Token>]) -> Result<Vec<Spanned<Form>>, FragmentError> {
    let forms = split_forms(tokens)?
        .into_iter()
        .map(|segment| Parser::new(segment).parse_form())
        .collect::<Result<Vec<_>, _>>()?;
    debug!(forms = forms.len(), "parsed declaration sequence");
    Ok(forms)
}

/// Cut `tokens` after every terminator that sits outside all brackets.
fn split_forms(tokens: &[Spanned<Token>]) -> Result<Vec<&[Spanned<Token>]>, FragmentError> {
    let mut segments = Vec::new();
    let mut depth: i32 = 0;
    let mut start = 0;

    for (i, tok) in tokens.iter().enumerate() {
        match tok.node {
            Token::LParen | Token::LBracket | Token::LBrace | Token::LtLt => depth += 1,
            Token::RParen | Token::RBracket | Token::RBrace | Token::GtGt => depth -= 1,
            Token::Terminator if depth <= 0 => {
                segments.push(&tokens[start..=i]);
                start = i + 1;
                depth = 0;
            }
            _ => {}
        }
    }

    if let Some(last) = tokens.get(start..).and_then(|rest| rest.last()) {
        let span = Span::new(last.span.end, last.span.end, last.span.line);
        return Err(FragmentError::parse("declaration", "missing terminating '.'", span));
    }
    Ok(segments)
}
