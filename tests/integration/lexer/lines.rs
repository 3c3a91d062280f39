// Category 8: Line tracking

use super::*;

#[test]
fn single_line() {
    assert_eq!(token_lines("a, b, c", 1), vec![1, 1, 1, 1, 1]);
}

#[test]
fn newlines_advance_line() {
    assert_eq!(token_lines("a\nb\n\nc", 1), vec![1, 2, 4]);
}

#[test]
fn start_line_offsets_everything() {
    assert_eq!(token_lines("a\nb", 7), vec![7, 8]);
}

#[test]
fn end_line_counts_trailing_newlines() {
    let (_, end) = tokenize("a\nb\n\n", 1).unwrap();
    assert_eq!(end, 4);
}

#[test]
fn end_line_of_empty_input_is_start_line() {
    let (tokens, end) = tokenize("", 12).unwrap();
    assert!(tokens.is_empty());
    assert_eq!(end, 12);
}

#[test]
fn lex_starts_at_line_one() {
    let tokens = lex_ok("\n\nx");
    assert_eq!(tokens[0].1, Span::new(2, 3, 3));
}

#[test]
fn crlf_counts_once() {
    assert_eq!(token_lines("a\r\nb", 1), vec![1, 2]);
}
