// Category 3: Strings, quoted atoms and character literals

use super::*;

#[test]
fn empty_string() {
    assert_tokens(r#""""#, &[Token::String(String::new())]);
}

#[test]
fn string_escapes() {
    assert_tokens(r#""a\nb\t\"c\"""#, &[Token::String("a\nb\t\"c\"".into())]);
}

#[test]
fn string_octal_and_hex_escapes() {
    assert_tokens(r#""\101\x42\x{43}""#, &[Token::String("ABC".into())]);
}

#[test]
fn string_control_escape() {
    assert_tokens(r#""\^a""#, &[Token::String("\u{1}".into())]);
}

#[test]
fn string_spans_lines() {
    let tokens = lex_ok("\"a\nb\" x");
    assert_eq!(tokens[0].0, Token::String("a\nb".into()));
    assert_eq!(tokens[1].1.line, 2);
}

#[test]
fn quoted_atom() {
    assert_tokens("'hello world'", &[atom("hello world")]);
}

#[test]
fn quoted_atom_with_escaped_quote() {
    assert_tokens(r"'it\'s'", &[atom("it's")]);
}

#[test]
fn quoted_keyword_is_atom() {
    assert_tokens("'case'", &[atom("case")]);
}

#[test]
fn char_literals() {
    assert_tokens(
        r"$a $\n $\s $\\ $\x41",
        &[
            Token::Char('a'),
            Token::Char('\n'),
            Token::Char(' '),
            Token::Char('\\'),
            Token::Char('A'),
        ],
    );
}

#[test]
fn char_literal_of_quote() {
    assert_tokens("$\"", &[Token::Char('"')]);
}

#[test]
fn literal_display_relexes() {
    let tokens = [
        Token::String("tab\there \"q\"".into()),
        atom("Needs Quotes"),
        atom("if"),
        Token::Char('\t'),
        Token::Char(' '),
    ];
    for tok in tokens {
        assert_tokens(&tok.to_string(), &[tok.clone()]);
    }
}
