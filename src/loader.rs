use std::path::{Path, PathBuf};

use tracing::debug;

use crate::diagnostics::FragmentError;
use crate::parser::ast::Form;
use crate::parser::parse_declaration_sequence;
use crate::span::Spanned;

/// Supplies the declaration list of a compiled unit.
///
/// Callers treat the result as a valid declaration sequence and do not
/// check it again.
pub trait DeclarationSource {
    fn load_declarations(&self, unit: &str) -> Result<Vec<Spanned<Form>>, FragmentError>;
}

/// Loads `<dir>/<unit>.erl` and parses it.
#[derive(Debug, Clone)]
pub struct SourceDirLoader {
    dir: PathBuf,
}

impl SourceDirLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, unit: &str) -> PathBuf {
        self.dir.join(format!("{unit}.erl"))
    }
}

impl DeclarationSource for SourceDirLoader {
    fn load_declarations(&self, unit: &str) -> Result<Vec<Spanned<Form>>, FragmentError> {
        let path = self.path_for(unit);
        let source = std::fs::read_to_string(&path)
            .map_err(|e| FragmentError::io(format!("could not read unit '{unit}': {e}"), path.clone()))?;
        debug!(unit, path = %path.display(), bytes = source.len(), "loading declarations");
        parse_declaration_sequence(&source)
    }
}
