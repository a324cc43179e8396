//! Property-based tests (spec §8 "Universal invariants" and "Round trips
//! and laws"), using `proptest` the way `sravinet-aisp-open-core`'s
//! `property_testing_semantic.rs` does: a small recipe enum is the
//! `Strategy` value, interpreted into real domain terms inside the test
//! body rather than generating the hash-consed terms directly (a
//! `TermManager` is needed to build them, and strategies must be pure).

use ldlf2dfa::explicit::automaton::Automata;
use ldlf2dfa::explicit::Interpretation;
use ldlf2dfa::nnf::nnf;
use ldlf2dfa::term::{Ldlf, Symbol, TermManager};
use ldlf2dfa::{legacy, to_dfa};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Atom {
    A,
    B,
}

#[derive(Debug, Clone)]
enum Recipe {
    True,
    False,
    Not(Box<Recipe>),
    And(Box<Recipe>, Box<Recipe>),
    Or(Box<Recipe>, Box<Recipe>),
    Diamond(Atom, Box<Recipe>),
    Box_(Atom, Box<Recipe>),
    DiamondStar(Atom, Box<Recipe>),
}

fn arb_atom() -> impl Strategy<Value = Atom> {
    prop_oneof![Just(Atom::A), Just(Atom::B)]
}

fn arb_recipe(depth: u32) -> BoxedStrategy<Recipe> {
    if depth == 0 {
        prop_oneof![Just(Recipe::True), Just(Recipe::False)].boxed()
    } else {
        let smaller = arb_recipe(depth - 1);
        prop_oneof![
            Just(Recipe::True),
            Just(Recipe::False),
            smaller.clone().prop_map(|r| Recipe::Not(Box::new(r))),
            (arb_recipe(depth - 1), arb_recipe(depth - 1))
                .prop_map(|(a, b)| Recipe::And(Box::new(a), Box::new(b))),
            (arb_recipe(depth - 1), arb_recipe(depth - 1))
                .prop_map(|(a, b)| Recipe::Or(Box::new(a), Box::new(b))),
            (arb_atom(), smaller.clone()).prop_map(|(a, r)| Recipe::Diamond(a, Box::new(r))),
            (arb_atom(), smaller.clone()).prop_map(|(a, r)| Recipe::Box_(a, Box::new(r))),
            (arb_atom(), smaller).prop_map(|(a, r)| Recipe::DiamondStar(a, Box::new(r))),
        ]
        .boxed()
    }
}

fn build(m: &TermManager, a: Symbol, b: Symbol, recipe: &Recipe) -> Ldlf {
    let sym = |atom: &Atom| match atom {
        Atom::A => a,
        Atom::B => b,
    };
    match recipe {
        Recipe::True => m.ldlf_true(),
        Recipe::False => m.ldlf_false(),
        Recipe::Not(r) => m.ldlf_not(build(m, a, b, r)),
        Recipe::And(x, y) => m.ldlf_and(vec![build(m, a, b, x), build(m, a, b, y)]),
        Recipe::Or(x, y) => m.ldlf_or(vec![build(m, a, b, x), build(m, a, b, y)]),
        Recipe::Diamond(atom, r) => {
            let regex = m.regex_prop(m.prop_atom(sym(atom)));
            m.ldlf_diamond(regex, build(m, a, b, r))
        }
        Recipe::Box_(atom, r) => {
            let regex = m.regex_prop(m.prop_atom(sym(atom)));
            m.ldlf_box(regex, build(m, a, b, r))
        }
        Recipe::DiamondStar(atom, r) => {
            let regex = m.regex_star(m.regex_prop(m.prop_atom(sym(atom))));
            m.ldlf_diamond(regex, build(m, a, b, r))
        }
    }
}

/// Mirrors `translator::alphabet_of` (private there) so tests can pin the
/// exact alphabet/order `to_dfa` will use, to compare against `legacy`'s
/// explicitly-alphabet-parameterized strategies on equal footing.
fn alphabet_of(m: &TermManager, phi: &Ldlf) -> Vec<Symbol> {
    use ldlf2dfa::term::{AtomKind, LdlfKind, PropKind, RegexKind};

    fn walk_ldlf(phi: &Ldlf, out: &mut Vec<Symbol>) {
        match phi.kind() {
            LdlfKind::True | LdlfKind::False => {}
            LdlfKind::And(xs) | LdlfKind::Or(xs) => xs.iter().for_each(|x| walk_ldlf(x, out)),
            LdlfKind::Not(x) | LdlfKind::F(x) | LdlfKind::T(x) | LdlfKind::Q(x) => walk_ldlf(x, out),
            LdlfKind::Diamond(r, x) | LdlfKind::Box(r, x) => {
                walk_regex(r, out);
                walk_ldlf(x, out);
            }
        }
    }
    fn walk_regex(r: &ldlf2dfa::term::Regex, out: &mut Vec<Symbol>) {
        match r.kind() {
            RegexKind::PropRegex(p) => walk_prop(p, out),
            RegexKind::Test(psi) => walk_ldlf(psi, out),
            RegexKind::Seq(rs) | RegexKind::Union(rs) => rs.iter().for_each(|x| walk_regex(x, out)),
            RegexKind::Star(r0) => walk_regex(r0, out),
        }
    }
    fn walk_prop(p: &ldlf2dfa::term::Prop, out: &mut Vec<Symbol>) {
        match p.kind() {
            PropKind::True | PropKind::False => {}
            PropKind::Atom(AtomKind::Sym(s)) => out.push(*s),
            PropKind::Atom(AtomKind::Quoted(l)) => walk_ldlf(l, out),
            PropKind::Not(x) => walk_prop(x, out),
            PropKind::And(xs) | PropKind::Or(xs) => xs.iter().for_each(|x| walk_prop(x, out)),
        }
    }

    let mut syms = Vec::new();
    walk_ldlf(phi, &mut syms);
    syms.sort_by_key(|s| m.symbol_name(*s));
    syms.dedup();
    syms
}

fn all_traces_up_to(alphabet_len: usize, max_len: usize) -> Vec<Vec<Interpretation>> {
    let letters = Interpretation::all(alphabet_len);
    let mut traces = vec![vec![]];
    let mut frontier = vec![vec![]];
    for _ in 0..max_len {
        let mut next = Vec::new();
        for prefix in &frontier {
            for letter in &letters {
                let mut t = prefix.clone();
                t.push(*letter);
                traces.push(t.clone());
                next.push(t);
            }
        }
        frontier = next;
    }
    traces
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// `make(x) == make(x)`: building the same recipe twice from one
    /// manager yields pointer-equal (hash-consed) terms.
    #[test]
    fn hash_consing_is_idempotent(recipe in arb_recipe(4)) {
        let m = TermManager::new();
        let a = m.symbol("a");
        let b = m.symbol("b");
        let x = build(&m, a, b, &recipe);
        let y = build(&m, a, b, &recipe);
        prop_assert_eq!(x, y);
    }

    /// `nnf` is idempotent: a second pass changes nothing.
    #[test]
    fn nnf_is_idempotent(recipe in arb_recipe(4)) {
        let m = TermManager::new();
        let a = m.symbol("a");
        let b = m.symbol("b");
        let phi = build(&m, a, b, &recipe);
        let n1 = nnf(&m, &phi);
        let n2 = nnf(&m, &n1);
        prop_assert_eq!(n1, n2);
    }

    /// `L(NNF(phi)) = L(phi)`, checked over every trace of length <= 3
    /// over the formula's own alphabet.
    #[test]
    fn nnf_preserves_language(recipe in arb_recipe(3)) {
        let m = TermManager::new();
        let a = m.symbol("a");
        let b = m.symbol("b");
        let phi = build(&m, a, b, &recipe);
        let n = nnf(&m, &phi);

        let alphabet = alphabet_of(&m, &phi).len().max(alphabet_of(&m, &n).len());
        let d_phi = to_dfa(&m, &phi).unwrap();
        let d_n = to_dfa(&m, &n).unwrap();
        for trace in all_traces_up_to(alphabet.max(1), 3) {
            prop_assert_eq!(d_phi.accepts(&trace), d_n.accepts(&trace));
        }
    }

    /// `L(toDFA(not phi)) = Sigma* \ L(toDFA(phi))`.
    #[test]
    fn negation_complements_the_language(recipe in arb_recipe(3)) {
        let m = TermManager::new();
        let a = m.symbol("a");
        let b = m.symbol("b");
        let phi = build(&m, a, b, &recipe);
        let not_phi = m.ldlf_not(phi.clone());

        let alphabet = alphabet_of(&m, &phi).len().max(alphabet_of(&m, &not_phi).len()).max(1);
        let d_phi = to_dfa(&m, &phi).unwrap();
        let d_not = to_dfa(&m, &not_phi).unwrap();
        for trace in all_traces_up_to(alphabet, 3) {
            prop_assert_ne!(d_phi.accepts(&trace), d_not.accepts(&trace));
        }
    }

    /// The compositional strategy agrees with the delta-driven NFA legacy
    /// oracle on every trace of length <= 3 (spec's cross-strategy
    /// equivalence anchor). Recipes here never nest `Test` inside `Star`,
    /// so `legacy` never raises `NotImplemented`.
    #[test]
    fn compositional_agrees_with_legacy_delta_nfa(recipe in arb_recipe(3)) {
        let m = TermManager::new();
        let a = m.symbol("a");
        let b = m.symbol("b");
        let phi = build(&m, a, b, &recipe);
        let alphabet = alphabet_of(&m, &phi);

        let compositional = to_dfa(&m, &phi).unwrap();
        let legacy_dfa = legacy::delta_nfa_to_dfa(&m, &phi, &alphabet).expect("no Star/Test nesting in recipes");

        for trace in all_traces_up_to(alphabet.len().max(1), 3) {
            prop_assert_eq!(compositional.accepts(&trace), legacy_dfa.run(&trace));
        }
    }

    /// Same cross-check against the brute-force SAT-enumeration oracle.
    #[test]
    fn compositional_agrees_with_legacy_sat_enumeration(recipe in arb_recipe(3)) {
        let m = TermManager::new();
        let a = m.symbol("a");
        let b = m.symbol("b");
        let phi = build(&m, a, b, &recipe);
        let alphabet = alphabet_of(&m, &phi);

        let compositional = to_dfa(&m, &phi).unwrap();
        let legacy_dfa = legacy::sat_enumeration_to_dfa(&m, &phi, &alphabet).expect("no Star/Test nesting in recipes");

        for trace in all_traces_up_to(alphabet.len().max(1), 3) {
            prop_assert_eq!(compositional.accepts(&trace), legacy_dfa.run(&trace));
        }
    }
}
