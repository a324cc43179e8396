//! The compositional LDLf → DFA translator (C5), spec.md §4.4.
//!
//! `to_dfa` is the single public entry point: it fixes the alphabet,
//! normalizes to NNF, and recurses over the formula's top-level Boolean
//! structure, composing sub-automata with [`Dfa::product`]/[`Dfa::negation`]
//! exactly as the regex/formula visitor pair in the original source does.
//! Every `Diamond`/`Box` leaf is handed to [`crate::star::build`], which
//! implements the 2AFA-to-DFA bit-projection reduction (see `src/star.rs`'s
//! module doc); this translator only ever composes at `And`/`Or`/`Not`.

use crate::dfa::{Dfa, DfaContext};
use crate::error::Result;
use crate::nnf::nnf;
use crate::star;
use crate::term::{AtomKind, Ldlf, LdlfKind, Prop, PropKind, Regex, RegexKind, Symbol, TermManager};
use std::collections::BinaryHeap;

/// Translate `phi` into a minimized symbolic DFA over the alphabet of
/// propositional atoms occurring in it, in alphabetic order (spec.md §4.4
/// step 2).
pub fn to_dfa(m: &TermManager, phi: &Ldlf) -> Result<Dfa> {
    log::info!("[Start] translating formula to dfa");
    let phi = nnf(m, phi);
    let alphabet = alphabet_of(m, &phi);
    log::trace!(
        "alphabet: {:?}",
        alphabet.iter().map(|s| m.symbol_name(*s)).collect::<Vec<_>>()
    );
    let ctx = DfaContext::new(m, &alphabet);
    let dfa = translate(m, &ctx, &phi)?.minimize();
    log::info!("[Done] translated formula to dfa with {} states", dfa.n_states());
    Ok(dfa)
}

fn alphabet_of(m: &TermManager, phi: &Ldlf) -> Vec<Symbol> {
    let mut syms = Vec::new();
    collect_ldlf(phi, &mut syms);
    syms.sort_by_key(|s| m.symbol_name(*s));
    syms.dedup();
    syms
}

fn collect_ldlf(phi: &Ldlf, out: &mut Vec<Symbol>) {
    match phi.kind() {
        LdlfKind::True | LdlfKind::False => {}
        LdlfKind::And(xs) | LdlfKind::Or(xs) => xs.iter().for_each(|x| collect_ldlf(x, out)),
        LdlfKind::Not(x) | LdlfKind::F(x) | LdlfKind::T(x) | LdlfKind::Q(x) => collect_ldlf(x, out),
        LdlfKind::Diamond(r, x) | LdlfKind::Box(r, x) => {
            collect_regex(r, out);
            collect_ldlf(x, out);
        }
    }
}

fn collect_regex(r: &Regex, out: &mut Vec<Symbol>) {
    match r.kind() {
        RegexKind::PropRegex(p) => collect_prop(p, out),
        RegexKind::Test(psi) => collect_ldlf(psi, out),
        RegexKind::Seq(rs) | RegexKind::Union(rs) => rs.iter().for_each(|x| collect_regex(x, out)),
        RegexKind::Star(r0) => collect_regex(r0, out),
    }
}

fn collect_prop(p: &Prop, out: &mut Vec<Symbol>) {
    match p.kind() {
        PropKind::True | PropKind::False => {}
        PropKind::Atom(AtomKind::Sym(s)) => out.push(*s),
        PropKind::Atom(AtomKind::Quoted(l)) => collect_ldlf(l, out),
        PropKind::Not(x) => collect_prop(x, out),
        PropKind::And(xs) | PropKind::Or(xs) => xs.iter().for_each(|x| collect_prop(x, out)),
    }
}

pub(crate) fn translate(m: &TermManager, ctx: &DfaContext, phi: &Ldlf) -> Result<Dfa> {
    match phi.kind() {
        LdlfKind::True => Ok(Dfa::accept_all(ctx)),
        LdlfKind::False => Ok(Dfa::reject_all(ctx)),
        LdlfKind::And(xs) => fold_by_state_count(m, ctx, xs, true),
        LdlfKind::Or(xs) => fold_by_state_count(m, ctx, xs, false),
        LdlfKind::Not(x) => Ok(translate(m, ctx, x)?.negation().minimize()),
        LdlfKind::Diamond(_, _) | LdlfKind::Box(_, _) => star::build(m, ctx, phi),
        LdlfKind::F(_) | LdlfKind::T(_) | LdlfKind::Q(_) => {
            unreachable!("F/T/Q only ever appear inside delta, never in a translated formula")
        }
    }
}

/// Fold `children` through [`Dfa::product`] (AND for `And`, OR for `Or`),
/// minimizing after each step and exiting early on the absorbing sink; the
/// merge order is smallest-state-count-first, mirroring spec.md §4.4's
/// "priority queue keyed by state count" heuristic — combining small
/// automata first keeps intermediate product sizes down before
/// minimization gets a chance to shrink them back.
fn fold_by_state_count(m: &TermManager, ctx: &DfaContext, xs: &[Ldlf], is_and: bool) -> Result<Dfa> {
    let sink_is_absorbing = |phi: &Ldlf| match phi.kind() {
        LdlfKind::False => is_and,
        LdlfKind::True => !is_and,
        _ => false,
    };
    if xs.iter().any(sink_is_absorbing) {
        return Ok(if is_and {
            Dfa::reject_all(ctx)
        } else {
            Dfa::accept_all(ctx)
        });
    }

    let mut heap: BinaryHeap<SmallestFirst> = BinaryHeap::with_capacity(xs.len());
    for x in xs {
        heap.push(SmallestFirst(translate(m, ctx, x)?));
    }

    while heap.len() > 1 {
        let a = heap.pop().expect("len > 1").0;
        let b = heap.pop().expect("len > 1").0;
        log::debug!(
            "combining automata of {} and {} states ({} left)",
            a.n_states(),
            b.n_states(),
            heap.len()
        );
        let combined = if is_and {
            a.product(&b, |x, y| x && y)
        } else {
            a.product(&b, |x, y| x || y)
        };
        heap.push(SmallestFirst(combined.minimize()));
    }
    Ok(heap.pop().expect("xs is non-empty after flattening").0)
}

/// Wraps a [`Dfa`] so a max-heap ([`BinaryHeap`]) pops the *smallest*
/// automaton first.
struct SmallestFirst(Dfa);

impl PartialEq for SmallestFirst {
    fn eq(&self, other: &Self) -> bool {
        self.0.n_states() == other.0.n_states()
    }
}
impl Eq for SmallestFirst {}
impl PartialOrd for SmallestFirst {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for SmallestFirst {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other.0.n_states().cmp(&self.0.n_states())
    }
}
