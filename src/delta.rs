//! The one-step LDLf expansion, `delta` (C4.6 / spec.md §4.6).
//!
//! Two flavours are kept, matching the two call sites named in spec.md:
//!
//! - [`delta`] is the *concrete* variant: given a real [`Interpretation`]
//!   (or none, for an end-of-trace / `epsilon` query) it evaluates every
//!   propositional guard immediately and leaves only `Quoted(Ldlf)` atoms
//!   standing for "the formula that must hold over the rest of the
//!   trace". It drives both retained eager strategies in [`crate::legacy`].
//! - [`delta_symbolic`] never consults a concrete interpretation: atomic
//!   guards are kept as literal propositional conjuncts in the result
//!   Prop. It is the building block for the general star procedure
//!   ([`crate::star`]), which instead enumerates the prime implicants of
//!   the returned formula to recover a 2AFA transition structure.
//!
//! Both are transcriptions of `DeltaVisitor`/`DeltaSymbolicVisitor` in the
//! original source (`lib/src/to_dfa/delta.cpp`,
//! `lib/src/to_dfa/delta_symbolic.cpp`): the `And`/`Or` and regex-shape
//! dispatch is identical between the two; only the `PropRegex` leaf and
//! the `epsilon` constants for `Box` differ.

use crate::explicit::Interpretation;
use crate::prop;
use crate::term::{AtomKind, Ldlf, LdlfKind, Prop, Regex, RegexKind, Symbol, TermManager};
use std::collections::BTreeMap;

/// Evaluate a purely propositional guard (the argument of a `PropRegex`)
/// against a concrete interpretation, using `var_order` to map each
/// symbol to its bit index (the alphabet fixed once per translation, see
/// spec.md §4.4 step 2).
fn eval_guard(p: &Prop, interp: &Interpretation, var_order: &[Symbol]) -> bool {
    let mut vars = std::collections::BTreeSet::new();
    prop::vars(p, &mut vars);
    let mut asg = BTreeMap::new();
    for v in vars {
        if let prop::VarKey::Sym(s) = v {
            let idx = var_order
                .iter()
                .position(|x| *x == s)
                .expect("PropRegex guards only mention alphabet symbols");
            asg.insert(v, interp.get(idx));
        }
    }
    prop::eval(p, &asg)
}

/// Strips `F`/`T` wrappers recursively while leaving `Q` untouched
/// (`ExpandVisitor` in the original source).
pub fn expand_placeholders(m: &TermManager, phi: &Ldlf) -> Ldlf {
    match phi.kind() {
        LdlfKind::True => m.ldlf_true(),
        LdlfKind::False => m.ldlf_false(),
        LdlfKind::F(x) | LdlfKind::T(x) => expand_placeholders(m, x),
        LdlfKind::Q(_) => phi.clone(),
        LdlfKind::And(xs) => {
            m.ldlf_and(xs.iter().map(|x| expand_placeholders(m, x)).collect())
        }
        LdlfKind::Or(xs) => m.ldlf_or(xs.iter().map(|x| expand_placeholders(m, x)).collect()),
        LdlfKind::Not(x) => m.ldlf_not(expand_placeholders(m, x)),
        LdlfKind::Diamond(r, x) => {
            m.ldlf_diamond(expand_placeholders_regex(m, r), expand_placeholders(m, x))
        }
        LdlfKind::Box(r, x) => {
            m.ldlf_box(expand_placeholders_regex(m, r), expand_placeholders(m, x))
        }
    }
}

fn expand_placeholders_regex(m: &TermManager, r: &Regex) -> Regex {
    match r.kind() {
        RegexKind::PropRegex(p) => m.regex_prop(p.clone()),
        RegexKind::Test(psi) => m.regex_test(expand_placeholders(m, psi)),
        RegexKind::Seq(rs) => m
            .regex_seq(rs.iter().map(|x| expand_placeholders_regex(m, x)).collect())
            .expect("arity preserved"),
        RegexKind::Union(rs) => m
            .regex_union(rs.iter().map(|x| expand_placeholders_regex(m, x)).collect())
            .expect("arity preserved"),
        RegexKind::Star(r0) => m.regex_star(expand_placeholders_regex(m, r0)),
    }
}

/// `delta(phi, ε) = ⊤ iff ε ∈ L(phi)` (spec.md §8). `delta_symbolic` at
/// `epsilon = true` is provably atom-free (every `PropRegex` leaf
/// short-circuits to a constant before any atom is introduced), so
/// evaluating it against an empty assignment is sound.
pub fn is_epsilon_accepting(m: &TermManager, phi: &Ldlf) -> bool {
    let p = delta_symbolic(m, phi, true);
    prop::eval(&p, &BTreeMap::new())
}

/// The concrete one-step expansion, §4.6, used by [`crate::legacy`].
///
/// `interp` is `Some((sigma, var_order))` for an ordinary step, `None`
/// for an end-of-trace (`epsilon`) query; `epsilon` must be `true`
/// exactly when `interp` is `None`.
pub fn delta(m: &TermManager, phi: &Ldlf, interp: Option<(&Interpretation, &[Symbol])>, epsilon: bool) -> Prop {
    match phi.kind() {
        LdlfKind::True => m.prop_true(),
        LdlfKind::False => m.prop_false(),
        LdlfKind::And(xs) => {
            let children = xs.iter().map(|x| delta(m, x, interp, epsilon)).collect();
            m.prop_and(children)
        }
        LdlfKind::Or(xs) => {
            let children = xs.iter().map(|x| delta(m, x, interp, epsilon)).collect();
            m.prop_or(children)
        }
        LdlfKind::Not(_) => unreachable!("delta is only ever called on NNF formulas"),
        LdlfKind::F(_) => m.prop_false(),
        LdlfKind::T(_) => m.prop_true(),
        LdlfKind::Q(x) => delta(m, x, interp, epsilon),
        LdlfKind::Diamond(r, psi) => delta_diamond(m, r, psi, interp, epsilon),
        LdlfKind::Box(r, psi) => delta_box(m, r, psi, interp, epsilon),
    }
}

fn quote(m: &TermManager, psi: &Ldlf) -> Prop {
    m.prop_quoted(expand_placeholders(m, psi))
}

fn delta_diamond(
    m: &TermManager,
    r: &Regex,
    psi: &Ldlf,
    interp: Option<(&Interpretation, &[Symbol])>,
    epsilon: bool,
) -> Prop {
    match r.kind() {
        RegexKind::PropRegex(alpha) => {
            if epsilon {
                return m.prop_false();
            }
            let (sigma, order) = interp.expect("non-epsilon delta needs a concrete interpretation");
            if eval_guard(alpha, sigma, order) {
                quote(m, psi)
            } else {
                m.prop_false()
            }
        }
        RegexKind::Test(test_body) => {
            let regex_delta = delta(m, test_body, interp, epsilon);
            let ldlf_delta = delta(m, psi, interp, epsilon);
            m.prop_and(vec![regex_delta, ldlf_delta])
        }
        RegexKind::Union(rs) => {
            let args = rs
                .iter()
                .map(|ri| {
                    let d = m.ldlf_diamond(ri.clone(), psi.clone());
                    delta(m, &d, interp, epsilon)
                })
                .collect();
            m.prop_or(args)
        }
        RegexKind::Seq(rs) => {
            let (head, tail) = split_seq(m, rs);
            let inner = m.ldlf_diamond(tail, psi.clone());
            let next = m.ldlf_diamond(head, inner);
            delta(m, &next, interp, epsilon)
        }
        RegexKind::Star(r0) => {
            let phi1 = delta(m, psi, interp, epsilon);
            let whole = m.ldlf_diamond(r.clone(), psi.clone());
            let f_marker = m.ldlf_f(whole);
            let next = m.ldlf_diamond(r0.clone(), f_marker);
            let phi2 = delta(m, &next, interp, epsilon);
            m.prop_or(vec![phi1, phi2])
        }
    }
}

fn delta_box(
    m: &TermManager,
    r: &Regex,
    psi: &Ldlf,
    interp: Option<(&Interpretation, &[Symbol])>,
    epsilon: bool,
) -> Prop {
    match r.kind() {
        RegexKind::PropRegex(alpha) => {
            if epsilon {
                return m.prop_true();
            }
            let (sigma, order) = interp.expect("non-epsilon delta needs a concrete interpretation");
            if eval_guard(alpha, sigma, order) {
                quote(m, psi)
            } else {
                m.prop_true()
            }
        }
        RegexKind::Test(test_body) => {
            let negated = crate::nnf::nnf(m, &m.ldlf_not(test_body.clone()));
            let regex_delta = delta(m, &negated, interp, epsilon);
            let ldlf_delta = delta(m, psi, interp, epsilon);
            m.prop_or(vec![regex_delta, ldlf_delta])
        }
        RegexKind::Union(rs) => {
            let args = rs
                .iter()
                .map(|ri| {
                    let b = m.ldlf_box(ri.clone(), psi.clone());
                    delta(m, &b, interp, epsilon)
                })
                .collect();
            m.prop_and(args)
        }
        RegexKind::Seq(rs) => {
            let (head, tail) = split_seq(m, rs);
            let inner = m.ldlf_box(tail, psi.clone());
            let next = m.ldlf_box(head, inner);
            delta(m, &next, interp, epsilon)
        }
        RegexKind::Star(r0) => {
            let phi1 = delta(m, psi, interp, epsilon);
            let whole = m.ldlf_box(r.clone(), psi.clone());
            let t_marker = m.ldlf_t(whole);
            let next = m.ldlf_box(r0.clone(), t_marker);
            let phi2 = delta(m, &next, interp, epsilon);
            m.prop_and(vec![phi1, phi2])
        }
    }
}

/// The symbolic variant (no concrete interpretation ever): `PropRegex`
/// leaves keep their guard as a literal conjunct instead of evaluating
/// it, so the result still mentions the formula's propositional atoms.
pub fn delta_symbolic(m: &TermManager, phi: &Ldlf, epsilon: bool) -> Prop {
    match phi.kind() {
        LdlfKind::True => m.prop_true(),
        LdlfKind::False => m.prop_false(),
        LdlfKind::And(xs) => {
            let children = xs.iter().map(|x| delta_symbolic(m, x, epsilon)).collect();
            m.prop_and(children)
        }
        LdlfKind::Or(xs) => {
            let children = xs.iter().map(|x| delta_symbolic(m, x, epsilon)).collect();
            m.prop_or(children)
        }
        LdlfKind::Not(_) => unreachable!("delta_symbolic is only ever called on NNF formulas"),
        LdlfKind::F(_) => m.prop_false(),
        LdlfKind::T(_) => m.prop_true(),
        LdlfKind::Q(x) => delta_symbolic(m, x, epsilon),
        LdlfKind::Diamond(r, psi) => delta_symbolic_diamond(m, r, psi, epsilon),
        LdlfKind::Box(r, psi) => delta_symbolic_box(m, r, psi, epsilon),
    }
}

fn delta_symbolic_diamond(m: &TermManager, r: &Regex, psi: &Ldlf, epsilon: bool) -> Prop {
    match r.kind() {
        RegexKind::PropRegex(alpha) => {
            if epsilon {
                return m.prop_false();
            }
            m.prop_and(vec![quote(m, psi), alpha.clone()])
        }
        RegexKind::Test(test_body) => {
            let regex_delta = delta_symbolic(m, test_body, epsilon);
            let ldlf_delta = delta_symbolic(m, psi, epsilon);
            m.prop_and(vec![regex_delta, ldlf_delta])
        }
        RegexKind::Union(rs) => {
            let args = rs
                .iter()
                .map(|ri| delta_symbolic(m, &m.ldlf_diamond(ri.clone(), psi.clone()), epsilon))
                .collect();
            m.prop_or(args)
        }
        RegexKind::Seq(rs) => {
            let (head, tail) = split_seq(m, rs);
            let inner = m.ldlf_diamond(tail, psi.clone());
            delta_symbolic(m, &m.ldlf_diamond(head, inner), epsilon)
        }
        RegexKind::Star(_) => {
            let phi1 = delta_symbolic(m, psi, epsilon);
            let whole = m.ldlf_diamond(r.clone(), psi.clone());
            let f_marker = m.ldlf_f(whole);
            let r0 = match r.kind() {
                RegexKind::Star(inner) => inner.clone(),
                _ => unreachable!(),
            };
            let next = m.ldlf_diamond(r0, f_marker);
            let phi2 = delta_symbolic(m, &next, epsilon);
            m.prop_or(vec![phi1, phi2])
        }
    }
}

fn delta_symbolic_box(m: &TermManager, r: &Regex, psi: &Ldlf, epsilon: bool) -> Prop {
    match r.kind() {
        RegexKind::PropRegex(alpha) => {
            if epsilon {
                return m.prop_true();
            }
            m.prop_or(vec![quote(m, psi), m.prop_not(alpha.clone())])
        }
        RegexKind::Test(test_body) => {
            let negated = crate::nnf::nnf(m, &m.ldlf_not(test_body.clone()));
            let regex_delta = delta_symbolic(m, &negated, epsilon);
            let ldlf_delta = delta_symbolic(m, psi, epsilon);
            m.prop_or(vec![regex_delta, ldlf_delta])
        }
        RegexKind::Union(rs) => {
            let args = rs
                .iter()
                .map(|ri| delta_symbolic(m, &m.ldlf_box(ri.clone(), psi.clone()), epsilon))
                .collect();
            m.prop_and(args)
        }
        RegexKind::Seq(rs) => {
            let (head, tail) = split_seq(m, rs);
            let inner = m.ldlf_box(tail, psi.clone());
            delta_symbolic(m, &m.ldlf_box(head, inner), epsilon)
        }
        RegexKind::Star(_) => {
            let phi1 = delta_symbolic(m, psi, epsilon);
            let whole = m.ldlf_box(r.clone(), psi.clone());
            let t_marker = m.ldlf_t(whole);
            let r0 = match r.kind() {
                RegexKind::Star(inner) => inner.clone(),
                _ => unreachable!(),
            };
            let next = m.ldlf_box(r0, t_marker);
            let phi2 = delta_symbolic(m, &next, epsilon);
            m.prop_and(vec![phi1, phi2])
        }
    }
}

/// Split `Seq([r0, r1, ..., rn])` into `(r0, Seq([r1..rn]))`, collapsing
/// the tail to a bare regex when only one remains.
fn split_seq(m: &TermManager, rs: &[Regex]) -> (Regex, Regex) {
    debug_assert!(rs.len() >= 2, "Seq always has at least two children once built");
    let head = rs[0].clone();
    let tail = if rs.len() == 2 {
        rs[1].clone()
    } else {
        m.regex_seq(rs[1..].to_vec()).expect("non-empty tail")
    };
    (head, tail)
}

/// Advance `phi` by one concrete symbol: the derivative-automaton
/// transition function used by [`crate::star`] and [`crate::legacy`].
///
/// `delta`'s result is always pure over `Quoted`/`True`/`False` — a bare
/// `Sym` atom only ever appears inside a `PropRegex` guard, and concrete
/// mode evaluates every guard away immediately, so [`prop_quoted_to_ldlf`]
/// never hits the cases it can't handle.
pub fn step(m: &TermManager, phi: &Ldlf, sigma: &Interpretation, order: &[Symbol]) -> Ldlf {
    let p = delta(m, phi, Some((sigma, order)), false);
    prop_quoted_to_ldlf(m, &p)
}

/// Converts a delta result known to be pure over `Quoted`/`True`/`False`
/// back into an `Ldlf` formula, the inverse of `quote`/`expand_placeholders`.
fn prop_quoted_to_ldlf(m: &TermManager, p: &Prop) -> Ldlf {
    use crate::term::PropKind;
    match p.kind() {
        PropKind::True => m.ldlf_true(),
        PropKind::False => m.ldlf_false(),
        PropKind::Atom(AtomKind::Quoted(l)) => l.clone(),
        PropKind::Atom(AtomKind::Sym(_)) => {
            unreachable!("concrete delta evaluates every PropRegex guard away")
        }
        PropKind::Not(_) => unreachable!("concrete delta never negates a Quoted atom"),
        PropKind::And(xs) => {
            m.ldlf_and(xs.iter().map(|x| prop_quoted_to_ldlf(m, x)).collect())
        }
        PropKind::Or(xs) => m.ldlf_or(xs.iter().map(|x| prop_quoted_to_ldlf(m, x)).collect()),
    }
}

/// Collects every distinct `Quoted` leaf reachable from a delta-produced
/// `Prop`, used by [`crate::legacy`] to evaluate `epsilon`-acceptance of a
/// composite macrostate.
pub fn quoted_leaves(p: &Prop, out: &mut Vec<Ldlf>) {
    use crate::term::PropKind;
    match p.kind() {
        PropKind::True | PropKind::False => {}
        PropKind::Atom(AtomKind::Sym(_)) => {}
        PropKind::Atom(AtomKind::Quoted(l)) => {
            if !out.contains(l) {
                out.push(l.clone());
            }
        }
        PropKind::Not(x) => quoted_leaves(x, out),
        PropKind::And(xs) | PropKind::Or(xs) => xs.iter().for_each(|x| quoted_leaves(x, out)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsilon_accepting_of_true_and_diamond() {
        let m = TermManager::new();
        assert!(is_epsilon_accepting(&m, &m.ldlf_true()));
        assert!(!is_epsilon_accepting(&m, &m.ldlf_false()));

        let a = m.regex_prop(m.prop_atom(m.symbol("a")));
        let diamond = m.ldlf_diamond(a.clone(), m.ldlf_true());
        assert!(!is_epsilon_accepting(&m, &diamond));

        let boxed = m.ldlf_box(a, m.ldlf_true());
        assert!(is_epsilon_accepting(&m, &boxed));
    }

    #[test]
    fn delta_of_diamond_a_under_a_quotes_continuation() {
        let m = TermManager::new();
        let sym_a = m.symbol("a");
        let order = vec![sym_a];
        let r = m.regex_prop(m.prop_atom(sym_a));
        let phi = m.ldlf_diamond(r, m.ldlf_true());

        let sigma_true = Interpretation::from_bits(&[true]);
        let result = delta(&m, &phi, Some((&sigma_true, &order)), false);
        let mut leaves = Vec::new();
        quoted_leaves(&result, &mut leaves);
        assert_eq!(leaves.len(), 1);
        assert!(is_epsilon_accepting(&m, &leaves[0]));

        let sigma_false = Interpretation::from_bits(&[false]);
        let result2 = delta(&m, &phi, Some((&sigma_false, &order)), false);
        assert_eq!(*result2.kind(), crate::term::PropKind::False);
    }

    #[test]
    fn step_of_diamond_a_true_under_a_reaches_true() {
        let m = TermManager::new();
        let sym_a = m.symbol("a");
        let order = vec![sym_a];
        let r = m.regex_prop(m.prop_atom(sym_a));
        let phi = m.ldlf_diamond(r, m.ldlf_true());

        let sigma_true = Interpretation::from_bits(&[true]);
        let next = step(&m, &phi, &sigma_true, &order);
        assert_eq!(*next.kind(), LdlfKind::True);
        assert!(is_epsilon_accepting(&m, &next));
    }
}
