use erlscope::parser::ast::Form;
use erlscope::span::Spanned;
use erlscope::{NotFound, free_variables_in_form, parse_declaration_sequence, split_at};

const MODULE: &str = "\
-module(shapes).
-export([area/1, area/2, perimeter/1]).

area({square, S}) -> S * S;
area({circle, R}) -> math:pi() * R * R.

area(W, H) -> W * H.

-spec perimeter(term()) -> number().
perimeter({square, S}) -> 4 * S.
";

fn forms() -> Vec<Spanned<Form>> {
    parse_declaration_sequence(MODULE).unwrap()
}

fn names(forms: &[Spanned<Form>]) -> Vec<String> {
    forms
        .iter()
        .map(|f| match f.node.name_arity() {
            Some((name, arity)) => format!("{name}/{arity}"),
            None => format!("-{}", f.node.kind_name()),
        })
        .collect()
}

#[test]
fn split_around_multi_clause_function() {
    let split = split_at(forms(), "area", 1).unwrap();
    assert_eq!(names(&split.before), vec!["-attribute", "-attribute"]);
    assert_eq!(split.matched.node.name_arity(), Some(("area", 1)));
    assert_eq!(names(&split.after), vec!["area/2", "-attribute", "perimeter/1"]);
}

#[test]
fn split_same_name_other_arity() {
    let split = split_at(forms(), "area", 2).unwrap();
    assert_eq!(split.before.len(), 3);
    assert_eq!(split.after.len(), 2);
}

#[test]
fn split_keeps_every_declaration() {
    let original = forms();
    for (name, arity) in [("area", 1), ("area", 2), ("perimeter", 1)] {
        let split = split_at(original.clone(), name, arity).unwrap();
        assert_eq!(split.before.len() + 1 + split.after.len(), original.len());
        assert_eq!(split.into_declarations(), original);
    }
}

#[test]
fn matched_function_is_closed() {
    let split = split_at(forms(), "area", 1).unwrap();
    assert!(free_variables_in_form(&split.matched).unwrap().is_empty());
}

#[test]
fn missing_function() {
    let err = split_at(forms(), "volume", 1).unwrap_err();
    assert_eq!(err, NotFound { name: "volume".into(), arity: 1 });
}

#[test]
fn spec_attribute_is_not_a_function() {
    assert!(split_at(forms(), "spec", 1).is_err());
}
