//! Pretty-printed trees parse back to the same tree.

use erlscope::parse_declaration_sequence;
use erlscope::parser::ast::{BinOp, Clause, Expr, Form, Function, UnaryOp};
use erlscope::pretty::pretty_print_forms;
use erlscope::span::Spanned;
use erlscope::visit::erase_spans;
use proptest::prelude::*;

const BINOPS: [BinOp; 27] = [
    BinOp::Send, BinOp::Orelse, BinOp::Andalso,
    BinOp::Eq, BinOp::Neq, BinOp::ExactEq, BinOp::ExactNeq,
    BinOp::Lt, BinOp::LtEq, BinOp::Gt, BinOp::GtEq,
    BinOp::Append, BinOp::Subtract,
    BinOp::Add, BinOp::Sub, BinOp::Bor, BinOp::Bxor, BinOp::Bsl, BinOp::Bsr, BinOp::Or, BinOp::Xor,
    BinOp::Mul, BinOp::Div, BinOp::IntDiv, BinOp::Rem, BinOp::Band, BinOp::And,
];

fn sp(expr: Expr) -> Spanned<Expr> {
    Spanned::dummy(expr)
}

fn arb_atom() -> impl Strategy<Value = String> {
    // spaces and reserved words force quoting
    "[a-z][a-zA-Z0-9_ ]{0,6}"
}

fn arb_var() -> impl Strategy<Value = String> {
    "[A-Z][a-zA-Z0-9_]{0,5}"
}

/// Literals are non-negative: `-1` parses as a negation.
fn arb_leaf() -> impl Strategy<Value = Expr> {
    prop_oneof![
        (0i64..10_000).prop_map(|n| Expr::Integer(n.into())),
        arb_atom().prop_map(Expr::Atom),
        arb_var().prop_map(Expr::Var),
        "[a-zA-Z0-9 ]{0,8}".prop_map(Expr::String),
        proptest::char::range('a', 'z').prop_map(Expr::Char),
    ]
}

fn arb_expr() -> impl Strategy<Value = Expr> {
    arb_leaf().prop_recursive(4, 48, 4, |inner| {
        let callee = prop_oneof![arb_atom().prop_map(Expr::Atom), arb_var().prop_map(Expr::Var)];
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4)
                .prop_map(|es| Expr::Tuple(es.into_iter().map(sp).collect())),
            (prop::collection::vec(inner.clone(), 0..3), prop::option::of(inner.clone())).prop_map(
                |(es, tail)| {
                    // `[ | T]` does not exist
                    let tail = if es.is_empty() { None } else { tail.map(|t| Box::new(sp(t))) };
                    Expr::List { elements: es.into_iter().map(sp).collect(), tail }
                }
            ),
            (prop::sample::select(BINOPS.to_vec()), inner.clone(), inner.clone()).prop_map(|(op, l, r)| {
                Expr::BinOp { op, lhs: Box::new(sp(l)), rhs: Box::new(sp(r)) }
            }),
            (
                prop::sample::select(vec![UnaryOp::Plus, UnaryOp::Neg, UnaryOp::Bnot, UnaryOp::Not]),
                inner.clone()
            )
                .prop_map(|(op, e)| Expr::UnaryOp { op, operand: Box::new(sp(e)) }),
            (inner.clone(), inner.clone()).prop_map(|(p, v)| Expr::Match {
                pattern: Box::new(sp(p)),
                value: Box::new(sp(v)),
            }),
            (callee, prop::collection::vec(inner.clone(), 0..3)).prop_map(|(f, args)| Expr::Call {
                function: Box::new(sp(f)),
                args: args.into_iter().map(sp).collect(),
            }),
            (arb_atom(), arb_atom(), prop::collection::vec(inner.clone(), 0..3)).prop_map(|(m, f, args)| {
                let remote = Expr::Remote {
                    module: Box::new(sp(Expr::Atom(m))),
                    function: Box::new(sp(Expr::Atom(f))),
                };
                Expr::Call { function: Box::new(sp(remote)), args: args.into_iter().map(sp).collect() }
            }),
            inner.prop_map(|e| Expr::Catch(Box::new(sp(e)))),
        ]
    })
}

fn wrap(body: Vec<Expr>) -> Vec<Spanned<Form>> {
    let clause = Clause { patterns: Vec::new(), guards: Vec::new(), body: body.into_iter().map(sp).collect() };
    let function = Function { name: Spanned::dummy("f".to_string()), arity: 0, clauses: vec![Spanned::dummy(clause)] };
    vec![Spanned::dummy(Form::Function(function))]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_pretty_print_roundtrip(body in prop::collection::vec(arb_expr(), 1..4)) {
        let mut expected = wrap(body);
        let printed = pretty_print_forms(&expected);
        let mut reparsed = match parse_declaration_sequence(&printed) {
            Ok(forms) => forms,
            Err(e) => return Err(TestCaseError::fail(format!("{e}\n--- printed ---\n{printed}"))),
        };
        erase_spans(&mut expected);
        erase_spans(&mut reparsed);
        prop_assert_eq!(expected, reparsed, "printed:\n{}", printed);
    }
}
