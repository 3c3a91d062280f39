// Lexer test suite
//
// Categories:
// - terminators: `.` as form terminator vs record/field dot
// - numbers: integers, based integers, floats
// - literals: strings, quoted atoms, character literals and escapes
// - names: atoms, variables, reserved words
// - operators: multi-char operators and maximal munch
// - comments: `%` comments and their interaction with terminators
// - errors: malformed input rejects the whole fragment
// - lines: line tracking and start-line offsets

use erlscope::lexer::{IntLit, Token, lex, tokenize};
use erlscope::span::Span;

/// Lex source and expect success
pub fn lex_ok(source: &str) -> Vec<(Token, Span)> {
    let result = lex(source).expect("lexing should succeed");
    result.into_iter().map(|t| (t.node, t.span)).collect()
}

/// Lex source and expect failure
pub fn lex_fails(source: &str) {
    assert!(lex(source).is_err(), "lexing should fail for: {}", source);
}

/// Assert tokens match expected kinds (ignoring spans)
pub fn assert_tokens(source: &str, expected: &[Token]) {
    let tokens = lex_ok(source);
    let actual: Vec<Token> = tokens.iter().map(|(t, _)| t.clone()).collect();
    assert_eq!(
        actual, expected,
        "Token mismatch for source: {}\nExpected: {:?}\nActual: {:?}",
        source, expected, actual
    );
}

/// Lines of every token, in order
pub fn token_lines(source: &str, start_line: u32) -> Vec<u32> {
    let (tokens, _) = tokenize(source, start_line).expect("lexing should succeed");
    tokens.iter().map(|t| t.span.line).collect()
}

pub fn atom(name: &str) -> Token {
    Token::Atom(name.to_string())
}

pub fn var(name: &str) -> Token {
    Token::Var(name.to_string())
}

pub fn int(value: i64) -> Token {
    Token::Integer(IntLit::Small(value))
}

pub fn big(text: &str) -> Token {
    Token::Integer(IntLit::Big(text.to_string()))
}

mod terminators;
mod literals;
mod comments;
mod errors;
mod lines;
