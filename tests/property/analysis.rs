//! Invariants of the free-variable analyzer and the splitter.

use std::collections::BTreeSet;

use erlscope::{free_variables_in_source, parse_declaration_sequence, split_at};
use proptest::prelude::*;

fn arb_var() -> impl Strategy<Value = String> {
    prop_oneof![Just("_".to_string()), "[A-Z][a-z0-9]{0,3}"]
}

/// `(name, arity)` pairs, rendered as one-clause functions.
fn arb_declarations() -> impl Strategy<Value = Vec<(String, usize)>> {
    prop::collection::vec(("[a-c]", 0usize..3), 1..8)
}

fn render(decls: &[(String, usize)]) -> String {
    decls
        .iter()
        .map(|(name, arity)| {
            let params: Vec<String> = (0..*arity).map(|i| format!("P{i}")).collect();
            format!("{name}({}) -> ok.\n", params.join(", "))
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every named variable of a plain tuple is free; `_` never is.
    #[test]
    fn prop_tuple_variables_are_free(vars in prop::collection::vec(arb_var(), 1..8)) {
        let source = format!("{{{}}}", vars.join(", "));
        let free = free_variables_in_source(&source).unwrap();
        let expected: BTreeSet<String> = vars.into_iter().filter(|v| v != "_").collect();
        prop_assert_eq!(free, expected);
    }

    /// Binding every variable as a fun parameter closes the expression.
    #[test]
    fn prop_fun_parameters_close_body(vars in prop::collection::vec(arb_var(), 1..6)) {
        let source = format!("fun({}) -> {{{}}} end", vars.join(", "), vars.join(", "));
        prop_assert!(free_variables_in_source(&source).unwrap().is_empty());
    }

    /// A match binds its pattern only after its value is analyzed.
    #[test]
    fn prop_match_value_is_free(vars in prop::collection::vec(arb_var(), 1..6)) {
        let tuple = format!("{{{}}}", vars.join(", "));
        let source = format!("{tuple} = {tuple}, {tuple}");
        let free = free_variables_in_source(&source).unwrap();
        let expected: BTreeSet<String> = vars.into_iter().filter(|v| v != "_").collect();
        prop_assert_eq!(free, expected);
    }

    /// Splitting at any present function keeps every declaration in order.
    #[test]
    fn prop_split_reconstructs(decls in arb_declarations(), pick in any::<prop::sample::Index>()) {
        let forms = parse_declaration_sequence(&render(&decls)).unwrap();
        let (name, arity) = &decls[pick.index(decls.len())];
        let first = decls.iter().position(|(n, a)| n == name && a == arity).unwrap();

        let split = split_at(forms.clone(), name, *arity).unwrap();
        prop_assert_eq!(split.before.len(), first);
        prop_assert_eq!(split.matched.node.name_arity(), Some((name.as_str(), *arity)));
        prop_assert_eq!(split.into_declarations(), forms);
    }

    /// Absent identities are reported, never panics.
    #[test]
    fn prop_split_absent(decls in arb_declarations()) {
        let forms = parse_declaration_sequence(&render(&decls)).unwrap();
        prop_assert!(split_at(forms, "zzz", 0).is_err());
    }
}
