use thiserror::Error;
use tracing::debug;

use crate::parser::ast::Form;
use crate::span::Spanned;

/// A declaration list cut around one function.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub before: Vec<Spanned<Form>>,
    pub matched: Spanned<Form>,
    pub after: Vec<Spanned<Form>>,
}

impl Split {
    /// Reassemble `before ++ [matched] ++ after`.
    pub fn into_declarations(self) -> Vec<Spanned<Form>> {
        let mut forms = self.before;
        forms.reserve(self.after.len() + 1);
        forms.push(self.matched);
        forms.extend(self.after);
        forms
    }
}

/// No function with the requested name and arity. An expected outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no function {name}/{arity}")]
pub struct NotFound {
    pub name: String,
    pub arity: usize,
}

/// Partition `declarations` around the first function named `name` with
/// `arity` parameters. Later functions with the same identity stay in
/// `after`.
pub fn split_at(
    mut declarations: Vec<Spanned<Form>>,
    name: &str,
    arity: usize,
) -> Result<Split, NotFound> {
    let Some(index) = declarations
        .iter()
        .position(|form| form.node.name_arity() == Some((name, arity)))
    else {
        debug!(name, arity, "no matching declaration");
        return Err(NotFound { name: name.to_string(), arity });
    };

    debug!(name, arity, index, total = declarations.len(), "split declarations");
    let after = declarations.split_off(index + 1);
    let Some(matched) = declarations.pop() else {
        return Err(NotFound { name: name.to_string(), arity });
    };
    Ok(Split { before: declarations, matched, after })
}
