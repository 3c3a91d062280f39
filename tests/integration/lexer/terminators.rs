// Category 1: Terminators
//
// A `.` ends a form only when followed by whitespace, a comment, or the end
// of input. Everywhere else it is the record/field dot.

use super::*;

#[test]
fn dot_at_end_of_input() {
    assert_tokens("ok.", &[atom("ok"), Token::Terminator]);
}

#[test]
fn dot_before_newline() {
    assert_tokens("a.\nb.", &[atom("a"), Token::Terminator, atom("b"), Token::Terminator]);
}

#[test]
fn dot_before_tab() {
    assert_tokens("a.\tb", &[atom("a"), Token::Terminator, atom("b")]);
}

#[test]
fn record_field_dot() {
    assert_tokens(
        "R#rec.field",
        &[var("R"), Token::Hash, atom("rec"), Token::Dot, atom("field")],
    );
}

#[test]
fn record_index_then_terminator() {
    assert_tokens(
        "#rec.field.",
        &[Token::Hash, atom("rec"), Token::Dot, atom("field"), Token::Terminator],
    );
}

#[test]
fn dot_before_paren_is_not_terminator() {
    let tokens = lex_ok("a.(");
    assert_eq!(tokens[1].0, Token::Dot);
}

#[test]
fn integer_then_terminator() {
    // `1.` is not a float: a float needs digits after the point
    assert_tokens("1.", &[Token::Integer(1.into()), Token::Terminator]);
}

#[test]
fn dot_dot_and_ellipsis() {
    assert_tokens("a .. b ...", &[atom("a"), Token::DotDot, atom("b"), Token::DotDotDot]);
}

#[test]
fn terminator_displays_as_dot() {
    assert_eq!(Token::Terminator.to_string(), ".");
}
