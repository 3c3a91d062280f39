mod common;
use common::source_dir;

use erlscope::{DeclarationSource, FragmentError, SourceDirLoader, split_at};

#[test]
fn loads_and_parses_unit() {
    let dir = source_dir(&[("greet.erl", "-module(greet).\nhello(Name) -> {hello, Name}.\n")]);
    let forms = SourceDirLoader::new(dir.path()).load_declarations("greet").unwrap();
    assert_eq!(forms.len(), 2);
    assert_eq!(forms[1].node.name_arity(), Some(("hello", 1)));
}

#[test]
fn loaded_declarations_feed_split() {
    let dir = source_dir(&[("m.erl", "a() -> 1.\nb() -> 2.\nc() -> 3.\n")]);
    let forms = SourceDirLoader::new(dir.path()).load_declarations("m").unwrap();
    let split = split_at(forms, "b", 0).unwrap();
    assert_eq!(split.before.len(), 1);
    assert_eq!(split.after.len(), 1);
}

#[test]
fn unreadable_unit_is_io_error() {
    let dir = source_dir(&[]);
    let err = SourceDirLoader::new(dir.path()).load_declarations("absent").unwrap_err();
    assert!(matches!(err, FragmentError::Io { .. }));
    assert!(err.to_string().contains("absent"), "{err}");
}

#[test]
fn malformed_unit_is_parse_error() {
    let dir = source_dir(&[("bad.erl", "-module(bad).\nf() -> \n")]);
    let err = SourceDirLoader::new(dir.path()).load_declarations("bad").unwrap_err();
    assert!(err.is_parse());
}

/// Any in-memory source works through the trait.
struct Fixed(&'static str);

impl DeclarationSource for Fixed {
    fn load_declarations(
        &self,
        _unit: &str,
    ) -> Result<Vec<erlscope::span::Spanned<erlscope::parser::ast::Form>>, FragmentError> {
        erlscope::parse_declaration_sequence(self.0)
    }
}

#[test]
fn trait_objects_are_interchangeable() {
    let dir = source_dir(&[("u.erl", "f() -> ok.\n")]);
    let sources: Vec<Box<dyn DeclarationSource>> =
        vec![Box::new(SourceDirLoader::new(dir.path())), Box::new(Fixed("f() -> ok.\n"))];
    let loaded: Vec<_> = sources.iter().map(|s| s.load_declarations("u").unwrap().len()).collect();
    assert_eq!(loaded, vec![1, 1]);
}
