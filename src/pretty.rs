use crate::lexer::Token;
use crate::lexer::token::{format_atom, format_char, format_float, format_string};
use crate::parser::ast::*;
use crate::parser::{MATCH_BINDING_POWER, binop_binding_power};
use crate::span::Spanned;

/// Pretty-print declarations back into Erlang source that parses to the
/// same tree.
pub fn pretty_print_forms(forms: &[Spanned<Form>]) -> String {
    let mut pp = PrettyPrinter::new();
    for (i, form) in forms.iter().enumerate() {
        if i > 0 && matches!(form.node, Form::Function(_)) {
            pp.newline();
        }
        pp.emit_form(&form.node);
        pp.newline();
    }
    pp.buf
}

/// Pretty-print a single expression without a terminator.
pub fn pretty_print_expr(expr: &Spanned<Expr>) -> String {
    let mut pp = PrettyPrinter::new();
    pp.emit_expr(&expr.node);
    pp.buf
}

struct PrettyPrinter {
    buf: String,
    indent: usize,
}

impl PrettyPrinter {
    fn new() -> Self {
        Self { buf: String::new(), indent: 0 }
    }

    fn write(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    fn newline(&mut self) {
        self.buf.push('\n');
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.buf.push_str("    ");
        }
    }

    fn indent(&mut self) {
        self.indent += 1;
    }

    fn dedent(&mut self) {
        self.indent -= 1;
    }

    fn line(&mut self) {
        self.newline();
        self.write_indent();
    }

    fn comma_separated(&mut self, exprs: &[Spanned<Expr>]) {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.emit_expr(&expr.node);
        }
    }

    // ── Forms ────────────────────────────────────────────────────────

    fn emit_form(&mut self, form: &Form) {
        match form {
            Form::Function(func) => {
                for (i, clause) in func.clauses.iter().enumerate() {
                    if i > 0 {
                        self.write(";");
                        self.newline();
                    }
                    self.write(&format_atom(&func.name.node));
                    self.emit_clause(&clause.node);
                }
                self.write(".");
            }
            Form::Attribute(attr) => {
                self.write("-");
                self.write(&format_atom(&attr.name.node));
                match &attr.value {
                    AttributeValue::Exprs(args) if args.is_empty() => {}
                    AttributeValue::Exprs(args) => {
                        self.write("(");
                        self.comma_separated(args);
                        self.write(")");
                    }
                    AttributeValue::Tokens(tokens) => self.emit_raw_tokens(tokens),
                }
                self.write(".");
            }
        }
    }

    /// Tokens are space separated. A `.` keeps both neighbours tight so it
    /// cannot relex as a terminator.
    fn emit_raw_tokens(&mut self, tokens: &[Token]) {
        let mut prev_dot = false;
        for tok in tokens {
            let is_dot = matches!(tok, Token::Dot);
            if !prev_dot && !is_dot {
                self.write(" ");
            }
            self.write(&tok.to_string());
            prev_dot = is_dot;
        }
    }

    // ── Clauses ──────────────────────────────────────────────────────

    /// `(Patterns) when Guards -> Body`
    fn emit_clause(&mut self, clause: &Clause) {
        self.write("(");
        self.comma_separated(&clause.patterns);
        self.write(")");
        self.emit_guards_and_body(clause);
    }

    fn emit_guards_and_body(&mut self, clause: &Clause) {
        if !clause.guards.is_empty() {
            self.write(" when ");
            self.emit_guard_seq(&clause.guards);
        }
        self.write(" ->");
        self.emit_body(&clause.body);
    }

    fn emit_guard_seq(&mut self, guards: &[Vec<Spanned<Expr>>]) {
        for (i, guard) in guards.iter().enumerate() {
            if i > 0 {
                self.write("; ");
            }
            self.comma_separated(guard);
        }
    }

    fn emit_body(&mut self, body: &[Spanned<Expr>]) {
        self.indent();
        for (i, expr) in body.iter().enumerate() {
            if i > 0 {
                self.write(",");
            }
            self.line();
            self.emit_expr(&expr.node);
        }
        self.dedent();
    }

    /// Clauses of `case`, `receive`, `try ... of`, `if`, each on its own line.
    fn emit_clause_list(&mut self, clauses: &[Spanned<Clause>], emit_head: impl Fn(&mut Self, &Clause)) {
        self.indent();
        for (i, clause) in clauses.iter().enumerate() {
            if i > 0 {
                self.write(";");
            }
            self.line();
            emit_head(self, &clause.node);
            self.emit_guards_and_body(&clause.node);
        }
        self.dedent();
    }

    fn emit_cr_head(&mut self, clause: &Clause) {
        self.comma_separated(&clause.patterns);
    }

    fn emit_catch_head(&mut self, clause: &Clause) {
        for (i, pattern) in clause.patterns.iter().enumerate() {
            if i > 0 {
                self.write(":");
            }
            self.emit_expr(&pattern.node);
        }
    }

    // ── Expressions ──────────────────────────────────────────────────

    fn emit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Integer(n) => self.write(&n.to_string()),
            Expr::Float(f) => self.write(&format_float(*f)),
            Expr::Char(c) => self.write(&format_char(*c)),
            Expr::String(s) => self.write(&format_string(s)),
            Expr::Atom(a) => self.write(&format_atom(a)),
            Expr::Var(v) => self.write(v),
            Expr::Tuple(elements) => {
                self.write("{");
                self.comma_separated(elements);
                self.write("}");
            }
            Expr::List { elements, tail } => {
                self.write("[");
                self.comma_separated(elements);
                if let Some(tail) = tail {
                    self.write(" | ");
                    self.emit_expr(&tail.node);
                }
                self.write("]");
            }
            Expr::Binary(elements) => {
                self.write("<<");
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.emit_bin_element(element);
                }
                self.write(">>");
            }
            Expr::Map { base, fields } => {
                if let Some(base) = base {
                    self.emit_postfix_base(&base.node);
                }
                self.write("#{");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.emit_expr(&field.key.node);
                    self.write(match field.op {
                        MapOp::Assoc => " => ",
                        MapOp::Exact => " := ",
                    });
                    self.emit_expr(&field.value.node);
                }
                self.write("}");
            }
            Expr::Record { base, name, fields } => {
                if let Some(base) = base {
                    self.emit_postfix_base(&base.node);
                }
                self.write("#");
                self.write(&format_atom(name));
                self.write("{");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    if field.name.node == "_" {
                        self.write("_");
                    } else {
                        self.write(&format_atom(&field.name.node));
                    }
                    self.write(" = ");
                    self.emit_expr(&field.value.node);
                }
                self.write("}");
            }
            Expr::RecordIndex { name, field } => {
                self.write("#");
                self.write(&format_atom(name));
                self.write(".");
                self.write(&format_atom(field));
            }
            Expr::RecordAccess { base, name, field } => {
                self.emit_postfix_base(&base.node);
                self.write("#");
                self.write(&format_atom(name));
                self.write(".");
                self.write(&format_atom(field));
            }
            Expr::Match { pattern, value } => {
                self.emit_infix(MATCH_BINDING_POWER, false, &pattern.node, " = ", &value.node);
            }
            Expr::BinOp { op, lhs, rhs } => {
                let sep = format!(" {} ", op.as_str());
                self.emit_infix(binop_binding_power(*op), op.is_comparison(), &lhs.node, &sep, &rhs.node);
            }
            Expr::UnaryOp { op, operand } => {
                // the space keeps `- -X` from lexing as `--`
                self.write(op.as_str());
                self.write(" ");
                let wrap = matches!(operand.node, Expr::Match { .. } | Expr::BinOp { .. } | Expr::Catch(_));
                self.emit_wrapped(&operand.node, wrap);
            }
            Expr::Call { function, args } => {
                match &function.node {
                    Expr::Remote { module, function } => {
                        self.emit_postfix_base(&module.node);
                        self.write(":");
                        self.emit_bare_primary(&function.node);
                    }
                    other => self.emit_postfix_base(other),
                }
                self.write("(");
                self.comma_separated(args);
                self.write(")");
            }
            Expr::Remote { module, function } => {
                self.emit_postfix_base(&module.node);
                self.write(":");
                self.emit_bare_primary(&function.node);
            }
            Expr::Block(body) => {
                self.write("begin");
                self.emit_body(body);
                self.line();
                self.write("end");
            }
            Expr::Case { subject, clauses } => {
                self.write("case ");
                self.emit_expr(&subject.node);
                self.write(" of");
                self.emit_clause_list(clauses, Self::emit_cr_head);
                self.line();
                self.write("end");
            }
            Expr::If(clauses) => {
                self.write("if");
                self.indent();
                for (i, clause) in clauses.iter().enumerate() {
                    if i > 0 {
                        self.write(";");
                    }
                    self.line();
                    self.emit_guard_seq(&clause.node.guards);
                    self.write(" ->");
                    self.emit_body(&clause.node.body);
                }
                self.dedent();
                self.line();
                self.write("end");
            }
            Expr::Receive { clauses, after } => {
                self.write("receive");
                self.emit_clause_list(clauses, Self::emit_cr_head);
                if let Some(after) = after {
                    self.line();
                    self.write("after");
                    self.indent();
                    self.line();
                    self.emit_expr(&after.timeout.node);
                    self.write(" ->");
                    self.emit_body(&after.body);
                    self.dedent();
                }
                self.line();
                self.write("end");
            }
            Expr::Try { body, of_clauses, catch_clauses, after } => {
                self.write("try");
                self.emit_body(body);
                if !of_clauses.is_empty() {
                    self.line();
                    self.write("of");
                    self.emit_clause_list(of_clauses, Self::emit_cr_head);
                }
                if !catch_clauses.is_empty() {
                    self.line();
                    self.write("catch");
                    self.emit_clause_list(catch_clauses, Self::emit_catch_head);
                }
                if !after.is_empty() {
                    self.line();
                    self.write("after");
                    self.emit_body(after);
                }
                self.line();
                self.write("end");
            }
            Expr::Catch(inner) => {
                self.write("catch ");
                self.emit_expr(&inner.node);
            }
            Expr::ListComp { template, qualifiers } => {
                self.write("[");
                self.emit_expr(&template.node);
                self.write(" || ");
                self.emit_qualifiers(qualifiers);
                self.write("]");
            }
            Expr::BinComp { template, qualifiers } => {
                self.write("<<");
                self.emit_wrapped(&template.node, !is_bin_primary(&template.node));
                self.write(" || ");
                self.emit_qualifiers(qualifiers);
                self.write(">>");
            }
            Expr::Fun { name, clauses } => {
                self.write("fun");
                self.indent();
                for (i, clause) in clauses.iter().enumerate() {
                    if i > 0 {
                        self.write(";");
                        self.line();
                    } else {
                        self.write(" ");
                    }
                    if let Some(name) = name {
                        self.write(name);
                    }
                    self.emit_clause(&clause.node);
                }
                self.dedent();
                self.line();
                self.write("end");
            }
            Expr::FunRef { module, function, arity } => {
                self.write("fun ");
                if let Some(module) = module {
                    self.emit_expr(&module.node);
                    self.write(":");
                }
                self.emit_expr(&function.node);
                self.write("/");
                self.emit_expr(&arity.node);
            }
            Expr::Macro { name, args } => {
                self.write("?");
                if name.starts_with(|c: char| c.is_ascii_uppercase() || c == '_') {
                    self.write(name);
                } else {
                    self.write(&format_atom(name));
                }
                if let Some(args) = args {
                    self.write("(");
                    self.comma_separated(args);
                    self.write(")");
                }
            }
        }
    }

    /// Print `lhs op rhs`, parenthesizing operands that would otherwise
    /// re-associate. Comparisons never chain, so a comparison operand of a
    /// comparison is always wrapped.
    fn emit_infix(&mut self, (lbp, rbp): (u8, u8), comparison: bool, lhs: &Expr, op: &str, rhs: &Expr) {
        let wrap_lhs = match operator_binding_power(lhs) {
            Some((_, child_rbp)) => child_rbp <= lbp || (comparison && is_comparison(lhs)),
            None => matches!(lhs, Expr::Catch(_)),
        };
        let wrap_rhs = match operator_binding_power(rhs) {
            Some((child_lbp, _)) => child_lbp < rbp,
            None => matches!(rhs, Expr::Catch(_)),
        };
        self.emit_wrapped(lhs, wrap_lhs);
        self.write(op);
        self.emit_wrapped(rhs, wrap_rhs);
    }

    fn emit_wrapped(&mut self, expr: &Expr, wrap: bool) {
        if wrap {
            self.write("(");
            self.emit_expr(expr);
            self.write(")");
        } else {
            self.emit_expr(expr);
        }
    }

    /// Callee, record/map base, or remote module.
    fn emit_postfix_base(&mut self, expr: &Expr) {
        let wrap = matches!(
            expr,
            Expr::Match { .. } | Expr::BinOp { .. } | Expr::UnaryOp { .. } | Expr::Catch(_)
        );
        self.emit_wrapped(expr, wrap);
    }

    /// Positions the grammar fills with a single primary and no postfix.
    fn emit_bare_primary(&mut self, expr: &Expr) {
        self.emit_wrapped(expr, !is_bin_primary(expr));
    }

    fn emit_bin_element(&mut self, element: &BinElement) {
        self.emit_bare_primary(&element.value.node);
        if let Some(size) = &element.size {
            self.write(":");
            self.emit_bare_primary(&size.node);
        }
        for (i, ty) in element.types.iter().enumerate() {
            self.write(if i == 0 { "/" } else { "-" });
            self.write(&format_atom(&ty.name));
            if let Some(arg) = ty.arg {
                self.write(":");
                self.write(&arg.to_string());
            }
        }
    }

    fn emit_qualifiers(&mut self, qualifiers: &[Qualifier]) {
        for (i, qualifier) in qualifiers.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            match qualifier {
                Qualifier::Generator { pattern, source } => {
                    self.emit_expr(&pattern.node);
                    self.write(" <- ");
                    self.emit_expr(&source.node);
                }
                Qualifier::BinGenerator { pattern, source } => {
                    self.emit_expr(&pattern.node);
                    self.write(" <= ");
                    self.emit_expr(&source.node);
                }
                Qualifier::Filter(expr) => self.emit_expr(&expr.node),
            }
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn operator_binding_power(expr: &Expr) -> Option<(u8, u8)> {
    match expr {
        Expr::Match { .. } => Some(MATCH_BINDING_POWER),
        Expr::BinOp { op, .. } => Some(binop_binding_power(*op)),
        _ => None,
    }
}

fn is_comparison(expr: &Expr) -> bool {
    matches!(expr, Expr::BinOp { op, .. } if op.is_comparison())
}

fn is_bin_primary(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Var(_) | Expr::Integer(_) | Expr::Float(_) | Expr::Char(_) | Expr::String(_) | Expr::Atom(_)
    )
}
