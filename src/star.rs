//! The general Kleene-star construction (C6), spec.md §4.5: the 2AFA-to-DFA
//! bit-projection reduction.
//!
//! `lib/src/to_dfa/strategies/compositional/star.cpp` builds a two-way
//! alternating automaton by enumerating the prime implicants of a delta
//! variant, allocating CUDD bits for the existential/universal choices
//! baked into each implicant, and wiring a MONA `dfaSetup` transition table
//! from the result. This module follows the same shape directly against
//! [`crate::dfa::DfaContext`]'s auxiliary-bit pool instead of CUDD:
//!
//! - [`crate::delta::delta_symbolic`] expands a macrostate one step without
//!   consulting a concrete interpretation, leaving a [`crate::term::Prop`]
//!   over the formula's atomic propositions and `Quoted` continuations —
//!   the 2AFA's one-step transition formula.
//! - [`crate::prop::prime_implicants`] reduces that formula to its minimal
//!   disjunction of conjunctions: each implicant is an *existential*
//!   branch (one of several ways the transition can be satisfied), and
//!   within an implicant every `Quoted` literal is a *universal* conjunct
//!   (all of them must hold over the rest of the trace simultaneously).
//! - Both dimensions are compiled onto fresh auxiliary bits exactly the
//!   way CUDD bits would be allocated: one block addresses "which
//!   implicant", a second addresses "which conjunct within it", and the
//!   automaton built over the expanded alphabet is collapsed back with
//!   [`crate::dfa::Dfa::universal_project`] (conjuncts) then
//!   [`crate::dfa::Dfa::project`] (implicants) — universal before
//!   existential, since the implicant choice is the outer quantifier.
//!
//! The outer state space remains the reachable set of derivative formulas
//! (a macrostate is the `Ldlf` formula that must hold over the rest of the
//! trace, same as `delta.cpp`'s own `State` objects), but every
//! transition out of one macrostate is now computed symbolically via the
//! above instead of by grouping `ctx.all_interpretations()` one letter at
//! a time.

use crate::delta::{delta_symbolic, is_epsilon_accepting, quoted_leaves};
use crate::dfa::{Dfa, DfaContext};
use crate::error::{Error, Result};
use crate::nnf::nnf;
use crate::prop::{prime_implicants, quoted_identity, VarKey};
use crate::term::{Ldlf, Symbol, TermManager};
use std::collections::{HashMap, VecDeque};

/// One parsed prime implicant of a macrostate's one-step transition
/// formula: the alphabet literals that must hold (the edge guard) and the
/// resolved next-macrostates that must *all* hold simultaneously (the
/// universal conjuncts), polarity already folded in (a negative `Quoted`
/// literal becomes the NNF of its negation).
struct ParsedImplicant {
    alpha_lits: Vec<(Symbol, bool)>,
    conts: Vec<Ldlf>,
}

/// Build the automaton for `phi` via the prime-implicant / aux-bit
/// reduction described in the module doc.
pub fn build(m: &TermManager, ctx: &DfaContext, phi: &Ldlf) -> Result<Dfa> {
    log::debug!("[Start] building via prime-implicant bit projection");

    let mut index: HashMap<Ldlf, usize> = HashMap::new();
    let mut macrostates: Vec<Ldlf> = Vec::new();
    let mut parsed: Vec<Vec<ParsedImplicant>> = Vec::new();
    let mut queue: VecDeque<Ldlf> = VecDeque::new();

    let root = intern(phi, &mut index, &mut macrostates, &mut parsed, &mut queue);

    let mut max_implicants = 1usize;
    let mut max_conts = 0usize;

    while let Some(state_phi) = queue.pop_front() {
        let from = index[&state_phi];
        let g = delta_symbolic(m, &state_phi, false);
        let pis = prime_implicants(m, &g);

        let mut leaves = Vec::new();
        quoted_leaves(&g, &mut leaves);
        let leaf_by_hash: HashMap<u64, Ldlf> =
            leaves.iter().map(|l| (quoted_identity(l), l.clone())).collect();

        max_implicants = max_implicants.max(pis.len());

        let mut entries = Vec::with_capacity(pis.len());
        for implicant in &pis {
            let mut alpha_lits = Vec::new();
            let mut conts = Vec::new();
            for (key, pol) in implicant {
                match key {
                    VarKey::Sym(s) => alpha_lits.push((*s, *pol)),
                    VarKey::QuotedHash(h) => {
                        let leaf = leaf_by_hash
                            .get(h)
                            .expect("quoted_leaves collects every quoted atom appearing in g")
                            .clone();
                        let next = if *pol { leaf } else { nnf(m, &m.ldlf_not(leaf)) };
                        intern(&next, &mut index, &mut macrostates, &mut parsed, &mut queue);
                        conts.push(next);
                    }
                }
            }
            max_conts = max_conts.max(conts.len());
            entries.push(ParsedImplicant { alpha_lits, conts });
        }
        parsed[from] = entries;
    }

    let eb = bits_to_address(max_implicants.max(1));
    let ub = bits_to_address(max_conts);
    if eb + ub > ctx.max_aux_bits() {
        return Err(Error::CapacityExceeded {
            n_bits: (eb + ub) as u32,
            requested_states: max_implicants.saturating_mul(max_conts.max(1)),
        });
    }

    let mut builder = Dfa::builder(ctx);
    for state_phi in &macrostates {
        builder.add_state(is_epsilon_accepting(m, state_phi));
    }
    let pad_accept = builder.add_state(true);
    builder.add_edge(pad_accept, ctx.mk_true(), pad_accept)?;

    for (from, entries) in parsed.iter().enumerate() {
        for (i, entry) in entries.iter().enumerate() {
            let alpha_guard = entry
                .alpha_lits
                .iter()
                .try_fold(ctx.mk_true(), |acc, (s, pol)| -> Result<_> {
                    let lit = ctx.mk_var(*s)?;
                    let lit = if *pol { lit } else { lit.not() };
                    Ok(acc.and(&lit))
                })?;
            let existential_point = ctx.mk_aux_point(0, eb, i);
            let prefix = alpha_guard.and(&existential_point);

            for j in 0..(1usize << ub) {
                let universal_point = ctx.mk_aux_point(eb, ub, j);
                let guard = prefix.and(&universal_point);
                if guard.is_false() {
                    continue;
                }
                let target = if j < entry.conts.len() {
                    index[&entry.conts[j]]
                } else {
                    pad_accept
                };
                builder.add_edge(from, guard, target)?;
            }
        }
    }

    let mut raw = builder.finish(root);
    for bit in eb..eb + ub {
        raw = raw.universal_project(bit);
    }
    for bit in 0..eb {
        raw = raw.project(bit);
    }
    let result = raw.minimize();
    log::debug!("[Done] built automaton with {} states", result.n_states());
    Ok(result)
}

fn intern(
    phi: &Ldlf,
    index: &mut HashMap<Ldlf, usize>,
    macrostates: &mut Vec<Ldlf>,
    parsed: &mut Vec<Vec<ParsedImplicant>>,
    queue: &mut VecDeque<Ldlf>,
) -> usize {
    *index.entry(phi.clone()).or_insert_with(|| {
        macrostates.push(phi.clone());
        parsed.push(Vec::new());
        queue.push_back(phi.clone());
        macrostates.len() - 1
    })
}

/// The number of auxiliary bits needed to address `n` distinct choices
/// (`0` for `n <= 1`, `ceil(log2(n))` otherwise).
fn bits_to_address(n: usize) -> usize {
    if n <= 1 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explicit::Interpretation;
    use crate::nnf::nnf;

    #[test]
    fn diamond_a_true_accepts_any_trace_starting_with_a() {
        // <a>tt is satisfied as soon as the first symbol is `a`; tt is
        // trivially satisfied from then on, so longer traces still match
        // (LDLf's diamond does not require consuming the whole word).
        let m = TermManager::new();
        let a = m.symbol("a");
        let ctx = DfaContext::new(&m, &[a]);
        let r = m.regex_prop(m.prop_atom(a));
        let phi = m.ldlf_diamond(r, m.ldlf_true());
        let d = build(&m, &ctx, &phi).unwrap();

        assert!(d.accepts(&[Interpretation::from_bits(&[true])]));
        assert!(!d.accepts(&[Interpretation::from_bits(&[false])]));
        assert!(!d.accepts(&[]));
        assert!(d.accepts(&[
            Interpretation::from_bits(&[true]),
            Interpretation::from_bits(&[true])
        ]));
    }

    #[test]
    fn diamond_star_a_then_end_is_the_regex_a_star_language() {
        // <a*>end, with end = [true]ff, anchors the star to the very end
        // of the trace: this is the textbook "every symbol is `a`"
        // language, unlike a bare `<a*>tt` which (since a Kleene star
        // always admits its own empty iteration) would be a tautology.
        let m = TermManager::new();
        let a = m.symbol("a");
        let ctx = DfaContext::new(&m, &[a]);
        let end = m.ldlf_box(m.regex_prop(m.prop_true()), m.ldlf_false());
        let r = m.regex_star(m.regex_prop(m.prop_atom(a)));
        let phi = m.ldlf_diamond(r, end);
        let d = build(&m, &ctx, &phi).unwrap();

        let yes = Interpretation::from_bits(&[true]);
        let no = Interpretation::from_bits(&[false]);
        assert!(d.accepts(&[]));
        assert!(d.accepts(&[yes]));
        assert!(d.accepts(&[yes, yes, yes]));
        assert!(!d.accepts(&[no]));
        assert!(!d.accepts(&[yes, no]));
        assert!(!d.accepts(&[no, yes]));
    }

    #[test]
    fn box_star_false_is_unsatisfiable_by_any_trace() {
        // [rho*]ff always has the trivial zero-iteration match of the
        // star available (unlike a plain one-step regex), so it forces
        // `ff` to hold right away and is never satisfied, on any trace.
        let m = TermManager::new();
        let a = m.symbol("a");
        let ctx = DfaContext::new(&m, &[a]);
        let r = m.regex_star(m.regex_prop(m.prop_atom(a)));
        let phi = nnf(&m, &m.ldlf_box(r, m.ldlf_false()));
        let d = build(&m, &ctx, &phi).unwrap();

        assert!(!d.accepts(&[]));
        assert!(!d.accepts(&[Interpretation::from_bits(&[true])]));
        assert!(!d.accepts(&[Interpretation::from_bits(&[false])]));
    }

    #[test]
    fn box_star_true_is_satisfied_by_any_trace() {
        let m = TermManager::new();
        let a = m.symbol("a");
        let ctx = DfaContext::new(&m, &[a]);
        let r = m.regex_star(m.regex_prop(m.prop_atom(a)));
        let phi = nnf(&m, &m.ldlf_box(r, m.ldlf_true()));
        let d = build(&m, &ctx, &phi).unwrap();

        assert!(d.accepts(&[]));
        assert!(d.accepts(&[Interpretation::from_bits(&[true])]));
        assert!(d.accepts(&[Interpretation::from_bits(&[false])]));
    }

    #[test]
    fn test_regex_is_a_zero_width_guard_on_the_same_step() {
        // <p?;q>tt ≡ <p>tt ∧ <q>tt: the zero-width test and the one-step
        // `q` regex both constrain the very same first symbol, so the
        // trace's first interpretation must satisfy both `p` and `q`.
        let m = TermManager::new();
        let p = m.symbol("p");
        let q = m.symbol("q");
        let ctx = DfaContext::new(&m, &[p, q]);
        let psi_p = m.ldlf_diamond(m.regex_prop(m.prop_atom(p)), m.ldlf_true());
        let test = m.regex_test(psi_p);
        let seq = m.regex_seq(vec![test, m.regex_prop(m.prop_atom(q))]).unwrap();
        let phi = m.ldlf_diamond(seq, m.ldlf_true());
        let d = build(&m, &ctx, &phi).unwrap();

        assert!(d.accepts(&[Interpretation::from_bits(&[true, true])]));
        assert!(!d.accepts(&[Interpretation::from_bits(&[true, false])]));
        assert!(!d.accepts(&[Interpretation::from_bits(&[false, true])]));
        assert!(!d.accepts(&[]));
    }

    #[test]
    fn and_of_two_diamonds_needs_a_universal_conjunct() {
        // <a>tt ∧ <b>end: delta_symbolic's one-step formula for this
        // macrostate is `(Quoted(tt) ∧ a) ∧ (Quoted(end) ∧ b)`, whose
        // single prime implicant carries two *distinct* `Quoted` literals
        // (tt and end are different formulas, unlike two diamonds sharing
        // the same continuation) that must hold simultaneously — the
        // universal-conjunct bit family is genuinely exercised here, not
        // just the existential one.
        let m = TermManager::new();
        let a = m.symbol("a");
        let b = m.symbol("b");
        let ctx = DfaContext::new(&m, &[a, b]);
        let end = m.ldlf_box(m.regex_prop(m.prop_true()), m.ldlf_false());
        let diamond_a = m.ldlf_diamond(m.regex_prop(m.prop_atom(a)), m.ldlf_true());
        let diamond_b = m.ldlf_diamond(m.regex_prop(m.prop_atom(b)), end);
        let phi = m.ldlf_and(vec![diamond_a, diamond_b]);
        let d = build(&m, &ctx, &phi).unwrap();

        let ab = Interpretation::from_bits(&[true, true]);
        assert!(d.accepts(&[ab.clone()]));
        assert!(!d.accepts(&[ab.clone(), ab]));
        assert!(!d.accepts(&[Interpretation::from_bits(&[true, false])]));
        assert!(!d.accepts(&[]));
    }
}
