//! Syntax tree visitor infrastructure
//!
//! Two visitor traits with matching walk functions:
//!
//! - `Visitor`: shared-reference traversal for analysis passes
//!   (the free-variable analyzer is one)
//! - `VisitMut`: mutable traversal for in-place rewrites (`erase_spans`)
//!
//! ## Usage
//!
//! Implement the trait for your pass, overriding only the methods you need.
//! Call the matching `walk_*` function inside an override to keep the
//! default recursion; omit it to prune traversal at that node.
//!
//! ```rust
//! use erlscope::visit::{Visitor, walk_expr};
//! use erlscope::parser::ast::Expr;
//! use erlscope::span::Spanned;
//! use std::collections::BTreeSet;
//!
//! struct AtomCollector {
//!     atoms: BTreeSet<String>,
//! }
//!
//! impl Visitor for AtomCollector {
//!     fn visit_expr(&mut self, expr: &Spanned<Expr>) {
//!         if let Expr::Atom(name) = &expr.node {
//!             self.atoms.insert(name.clone());
//!         }
//!         walk_expr(self, expr);
//!     }
//! }
//! ```
//!
//! Default traversal visits children in source order.

pub mod scope_tracker;

use crate::parser::ast::*;
use crate::span::{Span, Spanned};

// ============================================================================
// Visitor Trait (Read-Only)
// ============================================================================

/// Read-only tree visitor. Default implementations recurse into all children.
pub trait Visitor: Sized {
    fn visit_form(&mut self, form: &Spanned<Form>) {
        walk_form(self, form);
    }

    fn visit_clause(&mut self, clause: &Spanned<Clause>) {
        walk_clause(self, clause);
    }

    fn visit_expr(&mut self, expr: &Spanned<Expr>) {
        walk_expr(self, expr);
    }

    fn visit_qualifier(&mut self, qualifier: &Qualifier) {
        walk_qualifier(self, qualifier);
    }
}

// ============================================================================
// Walk Functions (Read-Only)
// ============================================================================

pub fn walk_form<V: Visitor>(v: &mut V, form: &Spanned<Form>) {
    match &form.node {
        Form::Function(func) => {
            for clause in &func.clauses {
                v.visit_clause(clause);
            }
        }
        Form::Attribute(attr) => {
            if let AttributeValue::Exprs(args) = &attr.value {
                for arg in args {
                    v.visit_expr(arg);
                }
            }
        }
    }
}

pub fn walk_clause<V: Visitor>(v: &mut V, clause: &Spanned<Clause>) {
    for pattern in &clause.node.patterns {
        v.visit_expr(pattern);
    }
    for guard in &clause.node.guards {
        for test in guard {
            v.visit_expr(test);
        }
    }
    for expr in &clause.node.body {
        v.visit_expr(expr);
    }
}

pub fn walk_qualifier<V: Visitor>(v: &mut V, qualifier: &Qualifier) {
    match qualifier {
        Qualifier::Generator { pattern, source } | Qualifier::BinGenerator { pattern, source } => {
            v.visit_expr(pattern);
            v.visit_expr(source);
        }
        Qualifier::Filter(expr) => v.visit_expr(expr),
    }
}

pub fn walk_expr<V: Visitor>(v: &mut V, expr: &Spanned<Expr>) {
    match &expr.node {
        // Leaves
        Expr::Integer(_)
        | Expr::Float(_)
        | Expr::Char(_)
        | Expr::String(_)
        | Expr::Atom(_)
        | Expr::Var(_)
        | Expr::RecordIndex { .. } => {}

        Expr::Tuple(elements) | Expr::Block(elements) => {
            for element in elements {
                v.visit_expr(element);
            }
        }
        Expr::List { elements, tail } => {
            for element in elements {
                v.visit_expr(element);
            }
            if let Some(tail) = tail {
                v.visit_expr(tail);
            }
        }
        Expr::Binary(elements) => {
            for element in elements {
                v.visit_expr(&element.value);
                if let Some(size) = &element.size {
                    v.visit_expr(size);
                }
            }
        }
        Expr::Map { base, fields } => {
            if let Some(base) = base {
                v.visit_expr(base);
            }
            for field in fields {
                v.visit_expr(&field.key);
                v.visit_expr(&field.value);
            }
        }
        Expr::Record { base, fields, .. } => {
            if let Some(base) = base {
                v.visit_expr(base);
            }
            for field in fields {
                v.visit_expr(&field.value);
            }
        }
        Expr::RecordAccess { base, .. } => v.visit_expr(base),
        Expr::Match { pattern, value } => {
            v.visit_expr(pattern);
            v.visit_expr(value);
        }
        Expr::BinOp { lhs, rhs, .. } => {
            v.visit_expr(lhs);
            v.visit_expr(rhs);
        }
        Expr::UnaryOp { operand, .. } => v.visit_expr(operand),
        Expr::Catch(inner) => v.visit_expr(inner),
        Expr::Call { function, args } => {
            v.visit_expr(function);
            for arg in args {
                v.visit_expr(arg);
            }
        }
        Expr::Remote { module, function } => {
            v.visit_expr(module);
            v.visit_expr(function);
        }
        Expr::Case { subject, clauses } => {
            v.visit_expr(subject);
            for clause in clauses {
                v.visit_clause(clause);
            }
        }
        Expr::If(clauses) | Expr::Fun { clauses, .. } => {
            for clause in clauses {
                v.visit_clause(clause);
            }
        }
        Expr::Receive { clauses, after } => {
            for clause in clauses {
                v.visit_clause(clause);
            }
            if let Some(after) = after {
                v.visit_expr(&after.timeout);
                for expr in &after.body {
                    v.visit_expr(expr);
                }
            }
        }
        Expr::Try { body, of_clauses, catch_clauses, after } => {
            for expr in body {
                v.visit_expr(expr);
            }
            for clause in of_clauses.iter().chain(catch_clauses) {
                v.visit_clause(clause);
            }
            for expr in after {
                v.visit_expr(expr);
            }
        }
        Expr::ListComp { template, qualifiers } | Expr::BinComp { template, qualifiers } => {
            v.visit_expr(template);
            for qualifier in qualifiers {
                v.visit_qualifier(qualifier);
            }
        }
        Expr::FunRef { module, function, arity } => {
            if let Some(module) = module {
                v.visit_expr(module);
            }
            v.visit_expr(function);
            v.visit_expr(arity);
        }
        Expr::Macro { args, .. } => {
            for arg in args.iter().flatten() {
                v.visit_expr(arg);
            }
        }
    }
}

// ============================================================================
// VisitMut Trait (Mutable)
// ============================================================================

/// Mutable tree visitor. `visit_span_mut` is called for every span in the
/// tree, including those on names.
pub trait VisitMut: Sized {
    fn visit_form_mut(&mut self, form: &mut Spanned<Form>) {
        walk_form_mut(self, form);
    }

    fn visit_clause_mut(&mut self, clause: &mut Spanned<Clause>) {
        walk_clause_mut(self, clause);
    }

    fn visit_expr_mut(&mut self, expr: &mut Spanned<Expr>) {
        walk_expr_mut(self, expr);
    }

    fn visit_span_mut(&mut self, _span: &mut Span) {}
}

// ============================================================================
// Walk Functions (Mutable)
// ============================================================================

pub fn walk_form_mut<V: VisitMut>(v: &mut V, form: &mut Spanned<Form>) {
    v.visit_span_mut(&mut form.span);
    match &mut form.node {
        Form::Function(func) => {
            v.visit_span_mut(&mut func.name.span);
            for clause in &mut func.clauses {
                v.visit_clause_mut(clause);
            }
        }
        Form::Attribute(attr) => {
            v.visit_span_mut(&mut attr.name.span);
            if let AttributeValue::Exprs(args) = &mut attr.value {
                for arg in args {
                    v.visit_expr_mut(arg);
                }
            }
        }
    }
}

pub fn walk_clause_mut<V: VisitMut>(v: &mut V, clause: &mut Spanned<Clause>) {
    v.visit_span_mut(&mut clause.span);
    let clause = &mut clause.node;
    for expr in clause.patterns.iter_mut().chain(clause.guards.iter_mut().flatten()) {
        v.visit_expr_mut(expr);
    }
    for expr in &mut clause.body {
        v.visit_expr_mut(expr);
    }
}

fn walk_qualifier_mut<V: VisitMut>(v: &mut V, qualifier: &mut Qualifier) {
    match qualifier {
        Qualifier::Generator { pattern, source } | Qualifier::BinGenerator { pattern, source } => {
            v.visit_expr_mut(pattern);
            v.visit_expr_mut(source);
        }
        Qualifier::Filter(expr) => v.visit_expr_mut(expr),
    }
}

pub fn walk_expr_mut<V: VisitMut>(v: &mut V, expr: &mut Spanned<Expr>) {
    v.visit_span_mut(&mut expr.span);
    match &mut expr.node {
        Expr::Integer(_)
        | Expr::Float(_)
        | Expr::Char(_)
        | Expr::String(_)
        | Expr::Atom(_)
        | Expr::Var(_)
        | Expr::RecordIndex { .. } => {}

        Expr::Tuple(elements) | Expr::Block(elements) => {
            for element in elements {
                v.visit_expr_mut(element);
            }
        }
        Expr::List { elements, tail } => {
            for element in elements {
                v.visit_expr_mut(element);
            }
            if let Some(tail) = tail {
                v.visit_expr_mut(tail);
            }
        }
        Expr::Binary(elements) => {
            for element in elements {
                v.visit_expr_mut(&mut element.value);
                if let Some(size) = &mut element.size {
                    v.visit_expr_mut(size);
                }
            }
        }
        Expr::Map { base, fields } => {
            if let Some(base) = base {
                v.visit_expr_mut(base);
            }
            for field in fields {
                v.visit_expr_mut(&mut field.key);
                v.visit_expr_mut(&mut field.value);
            }
        }
        Expr::Record { base, fields, .. } => {
            if let Some(base) = base {
                v.visit_expr_mut(base);
            }
            for field in fields {
                v.visit_span_mut(&mut field.name.span);
                v.visit_expr_mut(&mut field.value);
            }
        }
        Expr::RecordAccess { base, .. } => v.visit_expr_mut(base),
        Expr::Match { pattern, value } => {
            v.visit_expr_mut(pattern);
            v.visit_expr_mut(value);
        }
        Expr::BinOp { lhs, rhs, .. } => {
            v.visit_expr_mut(lhs);
            v.visit_expr_mut(rhs);
        }
        Expr::UnaryOp { operand, .. } => v.visit_expr_mut(operand),
        Expr::Catch(inner) => v.visit_expr_mut(inner),
        Expr::Call { function, args } => {
            v.visit_expr_mut(function);
            for arg in args {
                v.visit_expr_mut(arg);
            }
        }
        Expr::Remote { module, function } => {
            v.visit_expr_mut(module);
            v.visit_expr_mut(function);
        }
        Expr::Case { subject, clauses } => {
            v.visit_expr_mut(subject);
            for clause in clauses {
                v.visit_clause_mut(clause);
            }
        }
        Expr::If(clauses) | Expr::Fun { clauses, .. } => {
            for clause in clauses {
                v.visit_clause_mut(clause);
            }
        }
        Expr::Receive { clauses, after } => {
            for clause in clauses {
                v.visit_clause_mut(clause);
            }
            if let Some(after) = after {
                v.visit_expr_mut(&mut after.timeout);
                for expr in &mut after.body {
                    v.visit_expr_mut(expr);
                }
            }
        }
        Expr::Try { body, of_clauses, catch_clauses, after } => {
            for expr in body {
                v.visit_expr_mut(expr);
            }
            for clause in of_clauses.iter_mut().chain(catch_clauses.iter_mut()) {
                v.visit_clause_mut(clause);
            }
            for expr in after {
                v.visit_expr_mut(expr);
            }
        }
        Expr::ListComp { template, qualifiers } | Expr::BinComp { template, qualifiers } => {
            v.visit_expr_mut(template);
            for qualifier in qualifiers {
                walk_qualifier_mut(v, qualifier);
            }
        }
        Expr::FunRef { module, function, arity } => {
            if let Some(module) = module {
                v.visit_expr_mut(module);
            }
            v.visit_expr_mut(function);
            v.visit_expr_mut(arity);
        }
        Expr::Macro { args, .. } => {
            for arg in args.iter_mut().flatten() {
                v.visit_expr_mut(arg);
            }
        }
    }
}

// ============================================================================
// Span erasure
// ============================================================================

struct SpanEraser;

impl VisitMut for SpanEraser {
    fn visit_span_mut(&mut self, span: &mut Span) {
        *span = Span::dummy();
    }
}

/// Reset every span in `forms` to `Span::dummy()`, leaving only structure.
/// Two parses of differently formatted text compare equal afterwards.
pub fn erase_spans(forms: &mut [Spanned<Form>]) {
    for form in forms {
        SpanEraser.visit_form_mut(form);
    }
}

/// [`erase_spans`] for a single expression tree.
pub fn erase_expr_spans(expr: &mut Spanned<Expr>) {
    SpanEraser.visit_expr_mut(expr);
}
