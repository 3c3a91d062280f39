use std::iter::Peekable;
use std::str::Chars;

use logos::Logos;
use serde::Serialize;

#[derive(Logos, Debug, Clone, PartialEq, Serialize)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    // Reserved words
    #[token("after")]
    After,
    #[token("and")]
    And,
    #[token("andalso")]
    Andalso,
    #[token("band")]
    Band,
    #[token("begin")]
    Begin,
    #[token("bnot")]
    Bnot,
    #[token("bor")]
    Bor,
    #[token("bsl")]
    Bsl,
    #[token("bsr")]
    Bsr,
    #[token("bxor")]
    Bxor,
    #[token("case")]
    Case,
    #[token("catch")]
    Catch,
    #[token("div")]
    Div,
    #[token("end")]
    End,
    #[token("fun")]
    Fun,
    #[token("if")]
    If,
    #[token("not")]
    Not,
    #[token("of")]
    Of,
    #[token("or")]
    Or,
    #[token("orelse")]
    Orelse,
    #[token("receive")]
    Receive,
    #[token("rem")]
    Rem,
    #[token("try")]
    Try,
    #[token("when")]
    When,
    #[token("xor")]
    Xor,

    // Literals
    #[regex(r"[0-9]+(_[0-9]+)*", |lex| IntLit::decimal(&lex.slice().replace('_', "")))]
    #[regex(r"[0-9]+#[0-9a-zA-Z]+(_[0-9a-zA-Z]+)*", |lex| IntLit::based(&lex.slice().replace('_', "")))]
    Integer(IntLit),

    #[regex(r"[0-9]+(_[0-9]+)*\.[0-9]+(_[0-9]+)*([eE][+-]?[0-9]+)?", |lex| lex.slice().replace('_', "").parse::<f64>().ok())]
    Float(f64),

    #[regex(r"\$(\\([0-7]{1,3}|x[0-9a-fA-F]{2}|x\{[0-9a-fA-F]+\}|\^[a-zA-Z@_]|[^0-7x^])|[^\\])", |lex| char_literal(lex.slice()))]
    Char(char),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape(&s[1..s.len() - 1])
    })]
    String(String),

    // Names
    #[regex(r"[a-z][a-zA-Z0-9_@]*", |lex| lex.slice().to_string())]
    #[regex(r"'([^'\\]|\\.)*'", |lex| {
        let s = lex.slice();
        unescape(&s[1..s.len() - 1])
    })]
    Atom(String),

    #[regex(r"[A-Z_][a-zA-Z0-9_@]*", |lex| lex.slice().to_string())]
    Var(String),

    // Operators
    #[token("+")]
    Plus,
    #[token("++")]
    PlusPlus,
    #[token("-")]
    Minus,
    #[token("--")]
    MinusMinus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("=")]
    Eq,
    #[token("==")]
    EqEq,
    #[token("/=")]
    SlashEq,
    #[token("=:=")]
    EqColonEq,
    #[token("=/=")]
    EqSlashEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=<")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("!")]
    Bang,
    #[token("?")]
    Question,
    #[token("#")]
    Hash,

    // Punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("<<")]
    LtLt,
    #[token(">>")]
    GtGt,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("::")]
    ColonColon,
    #[token(":=")]
    ColonEq,
    #[token("|")]
    Pipe,
    #[token("||")]
    PipePipe,
    #[token("->")]
    Arrow,
    #[token("=>")]
    FatArrow,
    #[token("<-")]
    LArrow,
    #[token("<=")]
    LDoubleArrow,
    #[token("...")]
    DotDotDot,
    #[token("..")]
    DotDot,
    #[token(".")]
    Dot,

    /// A `.` followed by whitespace, a comment, or end of input. Never produced
    /// by logos directly; `lex` rewrites `Dot` into this.
    Terminator,

    // Comments (skip)
    #[regex(r"%[^\n]*")]
    Comment,
}

/// Returns true if the given string is a reserved word.
pub fn is_keyword(s: &str) -> bool {
    matches!(s, "after" | "and" | "andalso" | "band" | "begin" | "bnot" | "bor" | "bsl"
        | "bsr" | "bxor" | "case" | "catch" | "div" | "end" | "fun" | "if" | "not" | "of"
        | "or" | "orelse" | "receive" | "rem" | "try" | "when" | "xor")
}

/// Integer literal value. Integers have no size limit, so values outside
/// `i64` keep their digits as written, minus separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum IntLit {
    Small(i64),
    /// Normalized source text: `123456789012345678901234567890` or `16#FFFFFFFFFFFFFFFFFF`.
    Big(String),
}

impl IntLit {
    /// `digits` must be plain decimal digits.
    fn decimal(digits: &str) -> Self {
        match digits.parse::<i64>() {
            Ok(n) => IntLit::Small(n),
            Err(_) => IntLit::Big(digits.trim_start_matches('0').to_string()),
        }
    }

    /// `Base#Digits`; `None` when the base is out of range or a digit does
    /// not belong to it.
    fn based(s: &str) -> Option<Self> {
        let (base, digits) = s.split_once('#')?;
        let base: u32 = base.parse().ok()?;
        if !(2..=36).contains(&base) || !digits.chars().all(|c| c.is_digit(base)) {
            return None;
        }
        Some(match i64::from_str_radix(digits, base) {
            Ok(n) => IntLit::Small(n),
            Err(_) => IntLit::Big(format!("{base}#{digits}")),
        })
    }
}

impl From<i64> for IntLit {
    fn from(n: i64) -> Self {
        IntLit::Small(n)
    }
}

impl std::fmt::Display for IntLit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntLit::Small(n) => write!(f, "{n}"),
            IntLit::Big(text) => f.write_str(text),
        }
    }
}

fn char_literal(s: &str) -> Option<char> {
    let decoded = unescape(&s[1..])?;
    let mut chars = decoded.chars();
    let c = chars.next()?;
    if chars.next().is_some() { None } else { Some(c) }
}

/// Decode the escape sequences of a quoted literal body.
pub(crate) fn unescape(raw: &str) -> Option<String> {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            result.push(unescape_one(&mut chars)?);
        } else {
            result.push(c);
        }
    }
    Some(result)
}

fn unescape_one(chars: &mut Peekable<Chars<'_>>) -> Option<char> {
    let c = chars.next()?;
    let decoded = match c {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\u{0B}',
        'b' => '\u{08}',
        'f' => '\u{0C}',
        'e' => '\u{1B}',
        's' => ' ',
        'd' => '\u{7F}',
        '0'..='7' => {
            let mut value = c.to_digit(8)?;
            for _ in 0..2 {
                match chars.peek() {
                    Some(&d) if d.is_digit(8) => {
                        value = value * 8 + d.to_digit(8)?;
                        chars.next();
                    }
                    _ => break,
                }
            }
            char::from_u32(value)?
        }
        'x' => {
            if chars.peek() == Some(&'{') {
                chars.next();
                let mut value: u32 = 0;
                let mut digits = 0;
                loop {
                    let d = chars.next()?;
                    if d == '}' {
                        break;
                    }
                    value = value.checked_mul(16)?.checked_add(d.to_digit(16)?)?;
                    digits += 1;
                }
                if digits == 0 {
                    return None;
                }
                char::from_u32(value)?
            } else {
                let hi = chars.next()?.to_digit(16)?;
                let lo = chars.next()?.to_digit(16)?;
                char::from_u32(hi * 16 + lo)?
            }
        }
        '^' => {
            let ctl = chars.next()?;
            char::from_u32(ctl as u32 & 0x1F)?
        }
        other => other,
    };
    Some(decoded)
}

/// Render an atom so that it lexes back to the same atom.
pub fn format_atom(name: &str) -> String {
    let mut chars = name.chars();
    let plain = matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '@')
        && !is_keyword(name);
    if plain {
        name.to_string()
    } else {
        format!("'{}'", escape_text(name, '\''))
    }
}

/// Render a string literal body with its quotes.
pub fn format_string(s: &str) -> String {
    format!("\"{}\"", escape_text(s, '"'))
}

/// Render a character literal (`$a`, `$\n`, ...).
pub fn format_char(c: char) -> String {
    match c {
        ' ' => "$\\s".to_string(),
        '\\' => "$\\\\".to_string(),
        _ => format!("${}", escape_text(&c.to_string(), '\0')),
    }
}

/// Render a float so it lexes back as a float (never `1` or `1e20`).
pub fn format_float(f: f64) -> String {
    let s = format!("{f:?}");
    match s.find('e') {
        Some(idx) if !s[..idx].contains('.') => format!("{}.0{}", &s[..idx], &s[idx..]),
        _ => s,
    }
}

fn escape_text(s: &str, quote: char) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{{{:X}}}", c as u32)),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::After => write!(f, "after"),
            Token::And => write!(f, "and"),
            Token::Andalso => write!(f, "andalso"),
            Token::Band => write!(f, "band"),
            Token::Begin => write!(f, "begin"),
            Token::Bnot => write!(f, "bnot"),
            Token::Bor => write!(f, "bor"),
            Token::Bsl => write!(f, "bsl"),
            Token::Bsr => write!(f, "bsr"),
            Token::Bxor => write!(f, "bxor"),
            Token::Case => write!(f, "case"),
            Token::Catch => write!(f, "catch"),
            Token::Div => write!(f, "div"),
            Token::End => write!(f, "end"),
            Token::Fun => write!(f, "fun"),
            Token::If => write!(f, "if"),
            Token::Not => write!(f, "not"),
            Token::Of => write!(f, "of"),
            Token::Or => write!(f, "or"),
            Token::Orelse => write!(f, "orelse"),
            Token::Receive => write!(f, "receive"),
            Token::Rem => write!(f, "rem"),
            Token::Try => write!(f, "try"),
            Token::When => write!(f, "when"),
            Token::Xor => write!(f, "xor"),
            Token::Integer(n) => write!(f, "{n}"),
            Token::Float(n) => write!(f, "{}", format_float(*n)),
            Token::Char(c) => write!(f, "{}", format_char(*c)),
            Token::String(s) => write!(f, "{}", format_string(s)),
            Token::Atom(a) => write!(f, "{}", format_atom(a)),
            Token::Var(v) => write!(f, "{v}"),
            Token::Plus => write!(f, "+"),
            Token::PlusPlus => write!(f, "++"),
            Token::Minus => write!(f, "-"),
            Token::MinusMinus => write!(f, "--"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Eq => write!(f, "="),
            Token::EqEq => write!(f, "=="),
            Token::SlashEq => write!(f, "/="),
            Token::EqColonEq => write!(f, "=:="),
            Token::EqSlashEq => write!(f, "=/="),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::LtEq => write!(f, "=<"),
            Token::GtEq => write!(f, ">="),
            Token::Bang => write!(f, "!"),
            Token::Question => write!(f, "?"),
            Token::Hash => write!(f, "#"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LtLt => write!(f, "<<"),
            Token::GtGt => write!(f, ">>"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::Colon => write!(f, ":"),
            Token::ColonColon => write!(f, "::"),
            Token::ColonEq => write!(f, ":="),
            Token::Pipe => write!(f, "|"),
            Token::PipePipe => write!(f, "||"),
            Token::Arrow => write!(f, "->"),
            Token::FatArrow => write!(f, "=>"),
            Token::LArrow => write!(f, "<-"),
            Token::LDoubleArrow => write!(f, "<="),
            Token::DotDotDot => write!(f, "..."),
            Token::DotDot => write!(f, ".."),
            Token::Dot => write!(f, "."),
            Token::Terminator => write!(f, "."),
            Token::Comment => write!(f, "comment"),
        }
    }
}
