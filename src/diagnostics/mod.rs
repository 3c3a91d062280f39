use crate::span::Span;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FragmentError {
    #[error("Lex error on line {}: {reason}", span.line)]
    Lex { reason: String, span: Span },

    #[error("Parse error on line {} in {expected}: {reason}", span.line)]
    Parse { expected: String, reason: String, span: Span },

    #[error("Analysis error: cannot classify {node_kind} node")]
    Analysis { node_kind: String, span: Span },

    #[error("I/O error: {msg}")]
    Io { msg: String, path: PathBuf },

    #[error("Config error: {msg}")]
    Config { msg: String, path: PathBuf },
}

impl FragmentError {
    pub fn lex(reason: impl Into<String>, span: Span) -> Self {
        Self::Lex { reason: reason.into(), span }
    }

    pub fn parse(expected: impl Into<String>, reason: impl Into<String>, span: Span) -> Self {
        Self::Parse { expected: expected.into(), reason: reason.into(), span }
    }

    pub fn analysis(node_kind: impl Into<String>, span: Span) -> Self {
        Self::Analysis { node_kind: node_kind.into(), span }
    }

    pub fn io(msg: impl Into<String>, path: PathBuf) -> Self {
        Self::Io { msg: msg.into(), path }
    }

    pub fn config(msg: impl Into<String>, path: PathBuf) -> Self {
        Self::Config { msg: msg.into(), path }
    }

    /// Source line the error points at, when it has one.
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::Lex { span, .. } | Self::Parse { span, .. } | Self::Analysis { span, .. } => {
                Some(span.line)
            }
            Self::Io { .. } | Self::Config { .. } => None,
        }
    }

    pub fn is_lex(&self) -> bool {
        matches!(self, Self::Lex { .. })
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    pub fn is_analysis(&self) -> bool {
        matches!(self, Self::Analysis { .. })
    }
}

/// Render a FragmentError with ariadne for nice terminal output.
pub fn render_error(source: &str, err: &FragmentError) {
    use ariadne::{Label, Report, ReportKind, Source};

    match err {
        FragmentError::Lex { span, .. }
        | FragmentError::Parse { span, .. }
        | FragmentError::Analysis { span, .. }
            if span.end <= source.len() =>
        {
            let kind_str = match err {
                FragmentError::Lex { .. } => "lex",
                FragmentError::Parse { .. } => "parse",
                _ => "analysis",
            };
            let label = match err {
                FragmentError::Lex { reason, .. } | FragmentError::Parse { reason, .. } => {
                    reason.clone()
                }
                FragmentError::Analysis { node_kind, .. } => {
                    format!("cannot classify {node_kind} node")
                }
                _ => unreachable!(),
            };
            let printed = Report::build(ReportKind::Error, (), span.start)
                .with_message(format!("{kind_str} error"))
                .with_label(Label::new(span.start..span.end).with_message(label))
                .finish()
                .eprint(Source::from(source));
            if printed.is_err() {
                eprintln!("error: {err}");
            }
        }
        FragmentError::Io { msg, path } => {
            eprintln!("error[io]: {msg}");
            eprintln!("  --> {}", path.display());
        }
        FragmentError::Config { msg, path } => {
            eprintln!("error[config]: {msg}");
            eprintln!("  --> {}", path.display());
        }
        _ => eprintln!("error: {err}"),
    }
}
