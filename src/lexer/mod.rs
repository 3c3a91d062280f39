pub mod token;
pub use token::{is_keyword, IntLit, Token};

use logos::Logos;
use tracing::trace;

use crate::span::{Span, Spanned};
use crate::diagnostics::FragmentError;

/// Tokenize `source` starting at line 1.
pub fn lex(source: &str) -> Result<Vec<Spanned<Token>>, FragmentError> {
    tokenize(source, 1).map(|(tokens, _)| tokens)
}

/// Tokenize `source` whose first character sits on `start_line`.
///
/// Returns the tokens together with the line reached after the whole input
/// was consumed. Any malformed literal rejects the entire input.
pub fn tokenize(source: &str, start_line: u32) -> Result<(Vec<Spanned<Token>>, u32), FragmentError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);
    let mut line = start_line;
    let mut counted = 0;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        line = line.saturating_add(count_newlines(&source[counted..span.start]));
        counted = span.start;
        let tok_span = Span::new(span.start, span.end, line);
        match result {
            Ok(Token::Comment) => continue,
            // `.` followed by whitespace, a comment or end of input ends a form
            Ok(Token::Dot) if ends_form(&source[span.end..]) => {
                tokens.push(Spanned::new(Token::Terminator, tok_span));
            }
            Ok(tok) => tokens.push(Spanned::new(tok, tok_span)),
            Err(()) => return Err(describe_error(source, span.start, line)),
        }
    }

    let end_line = line.saturating_add(count_newlines(&source[counted..]));
    trace!(tokens = tokens.len(), start_line, end_line, "tokenized");
    Ok((tokens, end_line))
}

fn count_newlines(text: &str) -> u32 {
    u32::try_from(text.bytes().filter(|b| *b == b'\n').count()).unwrap_or(u32::MAX)
}

fn ends_form(rest: &str) -> bool {
    rest.chars().next().is_none_or(|c| c.is_whitespace() || c == '%')
}

fn describe_error(source: &str, start: usize, line: u32) -> FragmentError {
    let rest = &source[start..];
    let Some(first) = rest.chars().next() else {
        return FragmentError::lex("unexpected end of input", Span::new(start, start, line));
    };
    let (reason, end) = match first {
        '"' | '\'' => {
            let what = if first == '"' { "string" } else { "quoted atom" };
            match closing_quote(rest, first) {
                None => (format!("unterminated {what}"), source.len()),
                Some(len) => (format!("malformed escape sequence in {what}"), start + len),
            }
        }
        '$' => {
            let len = rest.chars().take(2).map(char::len_utf8).sum::<usize>();
            ("malformed character literal".to_string(), start + len)
        }
        c if c.is_ascii_digit() => {
            let len = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '#' | '_' | '.')))
                .unwrap_or(rest.len());
            ("malformed number literal".to_string(), start + len)
        }
        c => (format!("unexpected character '{c}'"), start + c.len_utf8()),
    };
    FragmentError::lex(reason, Span::new(start, end, line))
}

/// Byte length of a quoted literal including both quotes, if it is closed.
fn closing_quote(rest: &str, quote: char) -> Option<usize> {
    let mut chars = rest.char_indices().skip(1);
    while let Some((idx, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == quote {
            return Some(idx + c.len_utf8());
        }
    }
    None
}
