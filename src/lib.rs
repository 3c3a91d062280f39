pub mod span;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod visit;
pub mod free_vars;
pub mod split;
pub mod loader;
pub mod pretty;
pub mod config;

pub use diagnostics::FragmentError;
pub use free_vars::{free_variables, free_variables_in_form, free_variables_in_source};
pub use lexer::{lex, tokenize};
pub use loader::{DeclarationSource, SourceDirLoader};
pub use parser::{parse_declaration_sequence, parse_expression_sequence, parse_snippet, parse_snippet_at};
pub use split::{NotFound, Split, split_at};

