//! Generator-driven fuzzing of the invariants `tests/properties.rs` checks
//! on hand-curated recipes, at the larger scale and depth `generator::Generator`
//! allows, mirroring the teacher's own `#[ignore]`d `test_generator`.

use ldlf2dfa::explicit::automaton::Automata;
use ldlf2dfa::generator::new_generator;
use ldlf2dfa::nnf::nnf;
use ldlf2dfa::term::TermManager;
use ldlf2dfa::{legacy, to_dfa};

fn short_traces(n_vars: usize, max_len: usize) -> Vec<Vec<ldlf2dfa::explicit::Interpretation>> {
    let letters = ldlf2dfa::explicit::Interpretation::all(n_vars);
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

#[test]
fn small_scale_generation_agrees_with_legacy_oracle() {
    let m = TermManager::new();
    let alphabet = vec![m.symbol("a"), m.symbol("b")];
    let mut gen = new_generator(alphabet.clone(), 3);

    for i in 0..30 {
        let phi = gen.run(&m);
        let legacy_dfa = match legacy::delta_nfa_to_dfa(&m, &phi, &alphabet) {
            Ok(d) => d,
            Err(ldlf2dfa::Error::NotImplemented { .. }) => continue,
            Err(e) => panic!("formula {}: unexpected error {:?}", i, e),
        };
        let compositional = to_dfa(&m, &phi).expect("depth-3 generated formulas stay within the aux-bit budget");
        for trace in short_traces(alphabet.len(), 2) {
            assert_eq!(
                compositional.accepts(&trace),
                legacy_dfa.run(&trace),
                "formula {} disagrees with legacy oracle on trace {:?}",
                i,
                trace
            );
        }
    }
}

/// Mirrors the teacher's own `test_generator`: depth 20, `#[ignore]`d
/// because a tree that deep makes symbolic DFA construction impractical,
/// not because the generator itself misbehaves. Only checks the one
/// invariant that stays cheap at this depth.
#[test]
#[ignore]
fn large_scale_generation_keeps_nnf_idempotent() {
    let m = TermManager::new();
    let alphabet = vec![m.symbol("a"), m.symbol("b"), m.symbol("c")];
    let mut gen = new_generator(alphabet, 20);

    for i in 0..10 {
        let phi = gen.run(&m);
        let n1 = nnf(&m, &phi);
        let n2 = nnf(&m, &n1);
        assert_eq!(n1, n2, "formula {}: nnf should be idempotent", i);
    }
}
