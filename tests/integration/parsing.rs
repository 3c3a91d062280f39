use erlscope::parser::ast::{AttributeValue, Expr, Form};
use erlscope::pretty::{pretty_print_expr, pretty_print_forms};
use erlscope::visit::{erase_expr_spans, erase_spans};
use erlscope::{parse_declaration_sequence, parse_snippet};

const COUNTER: &str = r#"%% A small counter server.
-module(counter).
-export([start/0, incr/1, loop/1]).
-record(state, {count = 0 :: non_neg_integer(), name}).
-spec start() -> pid().

start() ->
    spawn(fun() -> loop(#state{}) end).

incr(Pid) ->
    Pid ! {incr, self()},
    receive
        {count, N} when is_integer(N) -> {ok, N}
    after 1000 ->
        {error, timeout}
    end.

loop(#state{count = C} = S) ->
    receive
        {incr, From} ->
            From ! {count, C + 1},
            loop(S#state{count = C + 1});
        stop ->
            ok
    end.
"#;

fn functions(forms: &[erlscope::span::Spanned<Form>]) -> Vec<(&str, usize)> {
    forms.iter().filter_map(|f| f.node.name_arity()).collect()
}

#[test]
fn module_forms_in_order() {
    let forms = parse_declaration_sequence(COUNTER).unwrap();
    assert_eq!(forms.len(), 7);
    assert_eq!(functions(&forms), vec![("start", 0), ("incr", 1), ("loop", 1)]);
    assert_eq!(forms.iter().filter(|f| f.node.kind_name() == "attribute").count(), 4);
}

#[test]
fn form_lines_follow_source() {
    let forms = parse_declaration_sequence(COUNTER).unwrap();
    let lines: Vec<u32> = forms.iter().map(|f| f.span.line).collect();
    assert_eq!(lines, vec![2, 3, 4, 5, 7, 10, 18]);
}

#[test]
fn type_attributes_keep_tokens() {
    let forms = parse_declaration_sequence(COUNTER).unwrap();
    let Form::Attribute(spec) = &forms[3].node else { panic!("expected attribute") };
    assert_eq!(spec.name.node, "spec");
    let AttributeValue::Tokens(tokens) = &spec.value else { panic!("expected raw tokens") };
    let text: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
    assert_eq!(text, vec!["start", "(", ")", "->", "pid", "(", ")"]);
}

#[test]
fn module_pretty_print_roundtrip() {
    let mut original = parse_declaration_sequence(COUNTER).unwrap();
    let printed = pretty_print_forms(&original);
    let mut reparsed = parse_declaration_sequence(&printed)
        .unwrap_or_else(|e| panic!("reparse failed: {e}\n{printed}"));
    erase_spans(&mut original);
    erase_spans(&mut reparsed);
    assert_eq!(original, reparsed);
}

#[test]
fn pretty_print_is_idempotent() {
    let once = pretty_print_forms(&parse_declaration_sequence(COUNTER).unwrap());
    let twice = pretty_print_forms(&parse_declaration_sequence(&once).unwrap());
    assert_eq!(once, twice);
}

#[test]
fn snippet_pretty_print_roundtrip() {
    let mut original = parse_snippet("X = #{a => [1, 2 | T]}, <<X:4, 0:4>>, - (A + B)").unwrap();
    let printed = pretty_print_expr(&original);
    let mut reparsed = parse_snippet(&printed).unwrap();
    erase_expr_spans(&mut original);
    erase_expr_spans(&mut reparsed);
    let Expr::Block(mut inner) = reparsed.node else { panic!("expected block") };
    assert_eq!(inner.remove(0), original);
}

#[test]
fn big_integers_survive_pretty_print() {
    let src = "limit() -> 123456789012345678901234567890 + 16#FFFF_FFFF_FFFF_FFFF_FFFF.";
    let printed = pretty_print_forms(&parse_declaration_sequence(src).unwrap());
    assert_eq!(printed, "limit() ->\n    123456789012345678901234567890 + 16#FFFFFFFFFFFFFFFFFFFF.\n");
}

#[test]
fn one_bad_form_rejects_all() {
    let err = parse_declaration_sequence("a() -> ok.\nb() -> .\nc() -> ok.").unwrap_err();
    assert!(err.is_parse());
    assert_eq!(err.line(), Some(2));
}

#[test]
fn unbalanced_bracket_swallows_terminators() {
    // the `.` inside an open bracket does not end the form
    let err = parse_declaration_sequence("a() -> [1.\nb() -> ok.").unwrap_err();
    assert!(err.is_parse());
}

#[test]
fn preprocessor_conditionals() {
    let forms = parse_declaration_sequence("-ifdef(TEST).\n-define(LOG, true).\n-else.\n-endif.").unwrap();
    assert_eq!(forms.len(), 4);
}

#[test]
fn operator_precedence_shapes() {
    let expr = parse_snippet("A orelse B andalso C == D + E * F").unwrap();
    let Expr::Block(body) = expr.node else { panic!("expected block") };
    let Expr::BinOp { op, rhs, .. } = &body[0].node else { panic!("expected op") };
    assert_eq!(op.as_str(), "orelse");
    let Expr::BinOp { op, .. } = &rhs.node else { panic!("expected op") };
    assert_eq!(op.as_str(), "andalso");
}
