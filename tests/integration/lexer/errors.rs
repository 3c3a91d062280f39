// Category 7: Errors
//
// Any malformed token rejects the whole fragment with a line number.

use super::*;

#[test]
fn unterminated_string() {
    lex_fails("X = \"abc");
}

#[test]
fn unterminated_quoted_atom() {
    lex_fails("'abc");
}

#[test]
fn bad_escape_in_string() {
    lex_fails(r#""\x{}""#);
}

#[test]
fn lone_dollar() {
    lex_fails("$");
}

#[test]
fn unexpected_character() {
    lex_fails("X ~ Y");
}

#[test]
fn error_reports_line() {
    let err = lex("ok,\n\nX = \"open").unwrap_err();
    assert!(err.is_lex());
    assert_eq!(err.line(), Some(3));
}

#[test]
fn error_after_start_line_offset() {
    let err = tokenize("a\n~", 10).unwrap_err();
    assert_eq!(err.line(), Some(11));
}

#[test]
fn unexpected_character_message() {
    let err = lex("§").unwrap_err();
    assert!(err.to_string().contains("unexpected character"), "{err}");
}
