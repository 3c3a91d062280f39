//! Free-variable analysis.
//!
//! A variable is free when some occurrence of it is not bound by an
//! enclosing construct. The first unbound occurrence also binds the name
//! for the rest of its frame, so later uses are not reported again.
//!
//! Frames are pushed for every clause (function, fun, `case`, `receive`,
//! `try ... of`, catch, `if`), for each comprehension, for `begin ... end`,
//! for `try` bodies and for `after` bodies. Nothing bound inside a frame is
//! visible once it is popped.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::diagnostics::FragmentError;
use crate::parser::ast::*;
use crate::parser::parse_snippet;
use crate::span::{Span, Spanned};
use crate::visit::scope_tracker::ScopeTracker;
use crate::visit::{Visitor, walk_expr};

/// Free variables of an expression tree.
pub fn free_variables(root: &Spanned<Expr>) -> Result<BTreeSet<String>, FragmentError> {
    let mut analyzer = FreeVarAnalyzer::new();
    analyzer.visit_expr(root);
    analyzer.finish()
}

/// Free variables of a function declaration. Every clause is analyzed in
/// its own frame, so the result only holds names its bodies use unbound.
pub fn free_variables_in_form(form: &Spanned<Form>) -> Result<BTreeSet<String>, FragmentError> {
    let mut analyzer = FreeVarAnalyzer::new();
    match &form.node {
        Form::Function(func) => {
            for clause in &func.clauses {
                analyzer.visit_clause(clause);
            }
        }
        Form::Attribute(_) => analyzer.fail(form.node.kind_name(), form.span),
    }
    analyzer.finish()
}

/// Parse `source` as a snippet and return its free variables.
pub fn free_variables_in_source(source: &str) -> Result<BTreeSet<String>, FragmentError> {
    let tree = parse_snippet(source)?;
    free_variables(&tree)
}

struct FreeVarAnalyzer {
    scopes: ScopeTracker<Span>,
    free: BTreeSet<String>,
    /// First unclassifiable node. Once set, traversal stops descending.
    error: Option<FragmentError>,
}

impl FreeVarAnalyzer {
    fn new() -> Self {
        Self { scopes: ScopeTracker::with_initial_scope(), free: BTreeSet::new(), error: None }
    }

    fn finish(self) -> Result<BTreeSet<String>, FragmentError> {
        match self.error {
            Some(err) => Err(err),
            None => {
                debug!(free = self.free.len(), "free variable analysis done");
                Ok(self.free)
            }
        }
    }

    fn fail(&mut self, node_kind: &str, span: Span) {
        if self.error.is_none() {
            self.error = Some(FragmentError::analysis(node_kind, span));
        }
    }

    /// Run `f` inside a fresh frame.
    fn scoped(&mut self, f: impl FnOnce(&mut Self)) {
        self.scopes.push_scope();
        trace!(depth = self.scopes.depth(), "push frame");
        f(self);
        self.scopes.pop_scope();
    }

    fn reference(&mut self, name: &str, span: Span) {
        if name == "_" || self.scopes.contains(name) {
            return;
        }
        trace!(name, line = span.line, "free variable");
        self.free.insert(name.to_string());
        self.scopes.insert(name.to_string(), span);
    }

    fn bind(&mut self, name: &str, span: Span) {
        if name != "_" && !self.scopes.contains(name) {
            self.scopes.insert(name.to_string(), span);
        }
    }

    fn bind_pattern(&mut self, pattern: &Spanned<Expr>) {
        PatternBinder { analyzer: self }.visit_expr(pattern);
    }

    fn visit_body(&mut self, body: &[Spanned<Expr>]) {
        for expr in body {
            self.visit_expr(expr);
        }
    }
}

impl Visitor for FreeVarAnalyzer {
    fn visit_expr(&mut self, expr: &Spanned<Expr>) {
        if self.error.is_some() {
            return;
        }
        match &expr.node {
            Expr::Var(name) => self.reference(name, expr.span),
            Expr::Match { pattern, value } => {
                self.visit_expr(value);
                self.bind_pattern(pattern);
            }
            Expr::Block(body) => self.scoped(|a| a.visit_body(body)),
            Expr::Receive { clauses, after } => {
                for clause in clauses {
                    self.visit_clause(clause);
                }
                if let Some(after) = after {
                    self.visit_expr(&after.timeout);
                    self.scoped(|a| a.visit_body(&after.body));
                }
            }
            Expr::Try { body, of_clauses, catch_clauses, after } => {
                // `of` clauses see what the body bound
                self.scoped(|a| {
                    a.visit_body(body);
                    for clause in of_clauses {
                        a.visit_clause(clause);
                    }
                });
                for clause in catch_clauses {
                    self.visit_clause(clause);
                }
                self.scoped(|a| a.visit_body(after));
            }
            Expr::ListComp { template, qualifiers } | Expr::BinComp { template, qualifiers } => {
                self.scoped(|a| {
                    for qualifier in qualifiers {
                        a.visit_qualifier(qualifier);
                    }
                    a.visit_expr(template);
                });
            }
            Expr::Fun { name, clauses } => self.scoped(|a| {
                if let Some(name) = name {
                    a.bind(name, expr.span);
                }
                for clause in clauses {
                    a.visit_clause(clause);
                }
            }),
            Expr::Macro { .. } => self.fail(expr.node.kind_name(), expr.span),
            _ => walk_expr(self, expr),
        }
    }

    fn visit_clause(&mut self, clause: &Spanned<Clause>) {
        if self.error.is_some() {
            return;
        }
        self.scoped(|a| {
            for pattern in &clause.node.patterns {
                a.bind_pattern(pattern);
            }
            for guard in &clause.node.guards {
                a.visit_body(guard);
            }
            a.visit_body(&clause.node.body);
        });
    }

    fn visit_qualifier(&mut self, qualifier: &Qualifier) {
        match qualifier {
            Qualifier::Generator { pattern, source } | Qualifier::BinGenerator { pattern, source } => {
                self.visit_expr(source);
                self.bind_pattern(pattern);
            }
            Qualifier::Filter(expr) => self.visit_expr(expr),
        }
    }
}

/// Walks a pattern, binding its variables. Binary segment sizes and map
/// keys are expressions even inside patterns, so they go back to the
/// analyzer as references.
struct PatternBinder<'a> {
    analyzer: &'a mut FreeVarAnalyzer,
}

impl Visitor for PatternBinder<'_> {
    fn visit_expr(&mut self, expr: &Spanned<Expr>) {
        if self.analyzer.error.is_some() {
            return;
        }
        match &expr.node {
            Expr::Var(name) => self.analyzer.bind(name, expr.span),
            Expr::Binary(elements) => {
                for element in elements {
                    self.visit_expr(&element.value);
                    if let Some(size) = &element.size {
                        self.analyzer.visit_expr(size);
                    }
                }
            }
            Expr::Map { base, fields } => {
                if let Some(base) = base {
                    self.analyzer.visit_expr(base);
                }
                for field in fields {
                    self.analyzer.visit_expr(&field.key);
                    self.visit_expr(&field.value);
                }
            }
            Expr::Macro { .. } => self.analyzer.fail(expr.node.kind_name(), expr.span),
            _ => walk_expr(self, expr),
        }
    }
}
