// Category 6: Comments

use super::*;

#[test]
fn comment_only() {
    assert_tokens("% nothing here", &[]);
}

#[test]
fn trailing_comment() {
    assert_tokens("X % the value", &[var("X")]);
}

#[test]
fn comment_after_dot_makes_terminator() {
    assert_tokens("ok.% end", &[atom("ok"), Token::Terminator]);
}

#[test]
fn percent_inside_string_is_not_comment() {
    assert_tokens("\"100%\"", &[Token::String("100%".into())]);
}

#[test]
fn comment_lines_are_counted() {
    assert_eq!(token_lines("%% header\n%% more\nX", 1), vec![3]);
}
