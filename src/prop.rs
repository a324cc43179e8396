//! Propositional core (C2): evaluation, NNF on plain propositional
//! formulas, CNF, model enumeration and prime-implicant enumeration.
//!
//! `Prop` atoms can themselves be quoted LDLf formulas (see
//! [`crate::term::AtomKind::Quoted`]); `eval`/`models` treat a quoted atom
//! exactly like any other named atom — callers supply its truth value
//! through the same `assignment` map, keyed by [`QuotedKey`].

use crate::term::{AtomKind, Prop, PropKind, Symbol, TermManager};
use std::collections::BTreeMap;

/// A key identifying one propositional variable: either a named symbol or
/// a quoted subformula, keyed by its hash-consed identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VarKey {
    Sym(Symbol),
    QuotedHash(u64),
}

fn var_key(atom: &AtomKind) -> VarKey {
    match atom {
        AtomKind::Sym(s) => VarKey::Sym(*s),
        AtomKind::Quoted(q) => VarKey::QuotedHash(quoted_identity(q)),
    }
}

pub(crate) fn quoted_identity(q: &crate::term::Ldlf) -> u64 {
    // Pointer value is stable and unique per hash-consed term for the
    // lifetime of the manager that produced it.
    q as *const _ as u64
}

/// Evaluate `p` under `assignment`. Atoms missing from `assignment` are
/// treated as false.
pub fn eval(p: &Prop, assignment: &BTreeMap<VarKey, bool>) -> bool {
    match p.kind() {
        PropKind::True => true,
        PropKind::False => false,
        PropKind::Atom(a) => *assignment.get(&var_key(a)).unwrap_or(&false),
        PropKind::Not(x) => !eval(x, assignment),
        PropKind::And(xs) => xs.iter().all(|x| eval(x, assignment)),
        PropKind::Or(xs) => xs.iter().any(|x| eval(x, assignment)),
    }
}

/// Collect the set of variables occurring in `p`.
pub fn vars(p: &Prop, out: &mut std::collections::BTreeSet<VarKey>) {
    match p.kind() {
        PropKind::True | PropKind::False => {}
        PropKind::Atom(a) => {
            out.insert(var_key(a));
        }
        PropKind::Not(x) => vars(x, out),
        PropKind::And(xs) | PropKind::Or(xs) => xs.iter().for_each(|x| vars(x, out)),
    }
}

/// Negation normal form on a plain propositional formula: push `Not`
/// inward until it only wraps atoms.
pub fn nnf(m: &TermManager, p: &Prop) -> Prop {
    nnf_rec(m, p, false)
}

fn nnf_rec(m: &TermManager, p: &Prop, negate: bool) -> Prop {
    match p.kind() {
        PropKind::True => {
            if negate {
                m.prop_false()
            } else {
                m.prop_true()
            }
        }
        PropKind::False => {
            if negate {
                m.prop_true()
            } else {
                m.prop_false()
            }
        }
        PropKind::Atom(_) => {
            if negate {
                m.prop_not(p.clone())
            } else {
                p.clone()
            }
        }
        PropKind::Not(x) => nnf_rec(m, x, !negate),
        PropKind::And(xs) => {
            let children = xs.iter().map(|x| nnf_rec(m, x, negate)).collect();
            if negate {
                m.prop_or(children)
            } else {
                m.prop_and(children)
            }
        }
        PropKind::Or(xs) => {
            let children = xs.iter().map(|x| nnf_rec(m, x, negate)).collect();
            if negate {
                m.prop_and(children)
            } else {
                m.prop_or(children)
            }
        }
    }
}

/// A conjunctive-normal-form representation: a conjunction of clauses,
/// each clause a disjunction of literals (`(var, polarity)`).
pub type Clause = Vec<(VarKey, bool)>;

/// Tseitin-free CNF via distribution; fine for the small, already-NNF
/// formulas this crate builds (delta expansions, one-step guards) — not
/// meant for arbitrary-size input.
pub fn cnf(m: &TermManager, p: &Prop) -> Vec<Clause> {
    let n = nnf(m, p);
    cnf_rec(&n)
}

fn cnf_rec(p: &Prop) -> Vec<Clause> {
    match p.kind() {
        PropKind::True => vec![],
        PropKind::False => vec![vec![]],
        PropKind::Atom(a) => vec![vec![(var_key(a), true)]],
        PropKind::Not(x) => match x.kind() {
            PropKind::Atom(a) => vec![vec![(var_key(a), false)]],
            _ => unreachable!("nnf guarantees Not only wraps atoms"),
        },
        PropKind::And(xs) => xs.iter().flat_map(cnf_rec).collect(),
        PropKind::Or(xs) => {
            let per_child: Vec<Vec<Clause>> = xs.iter().map(cnf_rec).collect();
            cross_product_or(&per_child)
        }
    }
}

fn cross_product_or(per_child: &[Vec<Clause>]) -> Vec<Clause> {
    per_child.iter().fold(vec![vec![]], |acc, clauses| {
        let mut out = Vec::with_capacity(acc.len() * clauses.len().max(1));
        for a in &acc {
            for c in clauses {
                let mut merged = a.clone();
                merged.extend(c.iter().cloned());
                out.push(merged);
            }
        }
        out
    })
}

/// Enumerate every model (full assignment to `vars(p)`) satisfying `p`.
/// Exponential in the number of variables; used only on small
/// delta-expansion formulas and in tests.
pub fn models(m: &TermManager, p: &Prop) -> Vec<BTreeMap<VarKey, bool>> {
    let mut var_set = std::collections::BTreeSet::new();
    vars(p, &mut var_set);
    let vars: Vec<VarKey> = var_set.into_iter().collect();
    let mut out = Vec::new();
    let n = vars.len();
    for mask in 0u64..(1u64 << n) {
        let assignment: BTreeMap<VarKey, bool> = vars
            .iter()
            .enumerate()
            .map(|(i, v)| (*v, mask & (1 << i) != 0))
            .collect();
        if eval(p, &assignment) {
            out.push(assignment);
        }
    }
    let _ = m;
    out
}

/// A prime implicant: a minimal conjunction of literals implying `p`.
pub type Implicant = Vec<(VarKey, bool)>;

/// Enumerate the prime implicants of `p` by shrinking every satisfying
/// model: for each model, drop each literal in turn and keep the model
/// shrunk whenever the partial assignment still forces `p` true under
/// every completion (i.e. it is an implicant), then discard any
/// implicant that is a superset of another (keeping only minimal ones).
///
/// This is the brute-force analogue of CUDD's `Cudd_FirstPrime`/
/// `NextPrime`; the source drives the same computation off a BDD
/// representation, which scales to far larger variable counts than the
/// explicit-assignment approach below. This crate uses it only on the
/// small formulas produced by [`crate::delta`], where the variable count
/// is bounded by the number of distinct `<alpha>psi` / test / `Q`
/// sub-terms reachable from one state — in practice a handful.
pub fn prime_implicants(m: &TermManager, p: &Prop) -> Vec<Implicant> {
    let mut var_set = std::collections::BTreeSet::new();
    vars(p, &mut var_set);
    let all_vars: Vec<VarKey> = var_set.into_iter().collect();

    let implies = |partial: &[(VarKey, bool)]| -> bool {
        let fixed: BTreeMap<VarKey, bool> = partial.iter().cloned().collect();
        let free: Vec<VarKey> = all_vars
            .iter()
            .filter(|v| !fixed.contains_key(v))
            .cloned()
            .collect();
        let k = free.len();
        for mask in 0u64..(1u64 << k) {
            let mut full = fixed.clone();
            for (i, v) in free.iter().enumerate() {
                full.insert(*v, mask & (1 << i) != 0);
            }
            if !eval(p, &full) {
                return false;
            }
        }
        true
    };

    let mut implicants: Vec<Implicant> = Vec::new();
    for model in models(m, p) {
        let mut literals: Vec<(VarKey, bool)> = model.into_iter().collect();
        let mut i = 0;
        while i < literals.len() {
            let candidate: Vec<_> = literals
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, l)| *l)
                .collect();
            if implies(&candidate) {
                literals = candidate;
            } else {
                i += 1;
            }
        }
        literals.sort();
        implicants.push(literals);
    }
    implicants.sort();
    implicants.dedup();

    // Drop non-minimal implicants (supersets of another implicant).
    let minimal: Vec<Implicant> = implicants
        .iter()
        .filter(|cand| {
            !implicants.iter().any(|other| {
                other != *cand
                    && other.len() < cand.len()
                    && other.iter().all(|lit| cand.contains(lit))
            })
        })
        .cloned()
        .collect();
    minimal
}

/// Rewrite every atom of `p` through `replace`, re-canonicalizing `And`/
/// `Or`/`Not` as the manager's constructors always do. `replace` returns
/// `None` to leave an atom untouched.
///
/// Used to drive one step of a derivative-based automaton construction:
/// [`crate::delta`] and [`crate::star`] both compute a successor
/// "macrostate" by substituting each `Quoted` leaf of a `Prop` with the
/// result of expanding it one more step.
pub fn substitute_atoms(m: &TermManager, p: &Prop, replace: &mut dyn FnMut(&AtomKind) -> Option<Prop>) -> Prop {
    match p.kind() {
        PropKind::True => m.prop_true(),
        PropKind::False => m.prop_false(),
        PropKind::Atom(a) => replace(a).unwrap_or_else(|| p.clone()),
        PropKind::Not(x) => m.prop_not(substitute_atoms(m, x, replace)),
        PropKind::And(xs) => {
            let children = xs.iter().map(|x| substitute_atoms(m, x, replace)).collect();
            m.prop_and(children)
        }
        PropKind::Or(xs) => {
            let children = xs.iter().map(|x| substitute_atoms(m, x, replace)).collect();
            m.prop_or(children)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_and_or_not() {
        let m = TermManager::new();
        let a = m.prop_atom(m.symbol("a"));
        let b = m.prop_atom(m.symbol("b"));
        let f = m.prop_and(vec![a.clone(), m.prop_not(b.clone())]);
        let mut asg = BTreeMap::new();
        asg.insert(VarKey::Sym(m.symbol("a")), true);
        asg.insert(VarKey::Sym(m.symbol("b")), false);
        assert!(eval(&f, &asg));
    }

    #[test]
    fn nnf_pushes_negation_to_atoms() {
        let m = TermManager::new();
        let a = m.prop_atom(m.symbol("a"));
        let b = m.prop_atom(m.symbol("b"));
        let and_ab = m.prop_and(vec![a.clone(), b.clone()]);
        let negated = m.prop_not(and_ab);
        let n = nnf(&m, &negated);
        match n.kind() {
            PropKind::Or(xs) => assert_eq!(xs.len(), 2),
            _ => panic!("De Morgan should produce an Or"),
        }
    }

    #[test]
    fn models_of_a_or_b_has_three_models() {
        let m = TermManager::new();
        let a = m.prop_atom(m.symbol("a"));
        let b = m.prop_atom(m.symbol("b"));
        let f = m.prop_or(vec![a, b]);
        assert_eq!(models(&m, &f).len(), 3);
    }

    #[test]
    fn prime_implicants_of_a_or_b_are_single_literals() {
        let m = TermManager::new();
        let a = m.prop_atom(m.symbol("a"));
        let b = m.prop_atom(m.symbol("b"));
        let f = m.prop_or(vec![a, b]);
        let pis = prime_implicants(&m, &f);
        assert_eq!(pis.len(), 2);
        assert!(pis.iter().all(|pi| pi.len() == 1));
    }

    #[test]
    fn substitute_atoms_rewrites_and_recanonicalizes() {
        let m = TermManager::new();
        let a = m.prop_atom(m.symbol("a"));
        let b = m.prop_atom(m.symbol("b"));
        let f = m.prop_and(vec![a, b.clone()]);
        let rewritten = substitute_atoms(&m, &f, &mut |atom| match atom {
            AtomKind::Sym(s) if *s == m.symbol("a") => Some(m.prop_true()),
            _ => None,
        });
        assert_eq!(rewritten, b);
    }
}
