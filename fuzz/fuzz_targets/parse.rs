#![no_main]
use arbitrary::Arbitrary;
use erlscope::lexer::Token;
use erlscope::span::{Span, Spanned};
use libfuzzer_sys::fuzz_target;

/// Minimal fuzzing-friendly token representation
#[derive(Arbitrary, Debug)]
enum FuzzToken {
    Atom,
    Var,
    Underscore,
    Integer,
    String,
    Plus,
    Minus,
    Star,
    Eq,
    EqEq,
    Lt,
    Bang,
    Question,
    Hash,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LtLt,
    GtGt,
    Comma,
    Semicolon,
    Colon,
    Pipe,
    PipePipe,
    Arrow,
    LArrow,
    Dot,
    Terminator,
    Case,
    Of,
    End,
    Fun,
    Receive,
    After,
    Try,
    Catch,
    When,
    Begin,
    If,
}

impl FuzzToken {
    fn to_token(&self, offset: usize, line: u32) -> Spanned<Token> {
        let token = match self {
            FuzzToken::Atom => Token::Atom("a".into()),
            FuzzToken::Var => Token::Var("X".into()),
            FuzzToken::Underscore => Token::Var("_".into()),
            FuzzToken::Integer => Token::Integer(1.into()),
            FuzzToken::String => Token::String("s".into()),
            FuzzToken::Plus => Token::Plus,
            FuzzToken::Minus => Token::Minus,
            FuzzToken::Star => Token::Star,
            FuzzToken::Eq => Token::Eq,
            FuzzToken::EqEq => Token::EqEq,
            FuzzToken::Lt => Token::Lt,
            FuzzToken::Bang => Token::Bang,
            FuzzToken::Question => Token::Question,
            FuzzToken::Hash => Token::Hash,
            FuzzToken::LParen => Token::LParen,
            FuzzToken::RParen => Token::RParen,
            FuzzToken::LBrace => Token::LBrace,
            FuzzToken::RBrace => Token::RBrace,
            FuzzToken::LBracket => Token::LBracket,
            FuzzToken::RBracket => Token::RBracket,
            FuzzToken::LtLt => Token::LtLt,
            FuzzToken::GtGt => Token::GtGt,
            FuzzToken::Comma => Token::Comma,
            FuzzToken::Semicolon => Token::Semicolon,
            FuzzToken::Colon => Token::Colon,
            FuzzToken::Pipe => Token::Pipe,
            FuzzToken::PipePipe => Token::PipePipe,
            FuzzToken::Arrow => Token::Arrow,
            FuzzToken::LArrow => Token::LArrow,
            FuzzToken::Dot => Token::Dot,
            FuzzToken::Terminator => Token::Terminator,
            FuzzToken::Case => Token::Case,
            FuzzToken::Of => Token::Of,
            FuzzToken::End => Token::End,
            FuzzToken::Fun => Token::Fun,
            FuzzToken::Receive => Token::Receive,
            FuzzToken::After => Token::After,
            FuzzToken::Try => Token::Try,
            FuzzToken::Catch => Token::Catch,
            FuzzToken::When => Token::When,
            FuzzToken::Begin => Token::Begin,
            FuzzToken::If => Token::If,
        };
        Spanned::new(token, Span::new(offset, offset + 1, line))
    }
}

#[derive(Arbitrary, Debug)]
struct FuzzTokens {
    tokens: Vec<FuzzToken>,
}

fuzz_target!(|input: FuzzTokens| {
    let tokens: Vec<Spanned<Token>> = input
        .tokens
        .iter()
        .enumerate()
        .map(|(i, t)| t.to_token(i, 1 + i as u32 / 8))
        .collect();

    // Both entry points should return Ok or Err, never panic; whatever
    // parses must also survive analysis.
    if let Ok(block) = erlscope::parse_expression_sequence(&tokens) {
        let _ = erlscope::free_variables(&block);
    }
    if let Ok(forms) = erlscope::parser::parse_declaration_tokens(&tokens) {
        for form in &forms {
            let _ = erlscope::free_variables_in_form(form);
        }
    }
});
