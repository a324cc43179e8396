//! LTLf -> LDLf lowering (C3), per spec.md §4.2:
//!
//! ```text
//! Xφ   ≡ <true>(φ ∧ ¬end)         Wφ   ≡ [true](φ ∨ end)
//! αUβ  ≡ <(α?;true)*>(β ∧ ¬end)   αRβ  ≡ [(¬α?;true)*](β ∨ end)
//! Fφ   ≡ <true*>(φ ∧ ¬end)        Gφ   ≡ [true*](φ ∨ end)
//! a    ≡ <a>tt                    end  ≡ [true]ff
//! ```
//!
//! Boolean connectives map verbatim; negation is pushed back to the atoms
//! by a final [`crate::nnf::nnf`] pass, matching "negation is pushed back"
//! in spec.md.

use crate::nnf::nnf;
use crate::term::{Ldlf, Ltlf, LtlfKind, TermManager};

/// `[true]ff`: true at the end of the trace, false everywhere else.
fn end(m: &TermManager) -> Ldlf {
    let true_regex = m.regex_prop(m.prop_true());
    m.ldlf_box(true_regex, m.ldlf_false())
}

fn not_end(m: &TermManager) -> Ldlf {
    m.ldlf_not(end(m))
}

/// Lower an LTLf formula to an equivalent LDLf one, already in NNF.
pub fn to_ldlf(m: &TermManager, phi: &Ltlf) -> Ldlf {
    nnf(m, &to_ldlf_rec(m, phi))
}

fn to_ldlf_rec(m: &TermManager, phi: &Ltlf) -> Ldlf {
    match phi.kind() {
        LtlfKind::True => m.ldlf_true(),
        LtlfKind::False => m.ldlf_false(),
        LtlfKind::Atom(s) => {
            let r = m.regex_prop(m.prop_atom(*s));
            m.ldlf_diamond(r, m.ldlf_true())
        }
        LtlfKind::And(xs) => {
            let children = xs.iter().map(|x| to_ldlf_rec(m, x)).collect();
            m.ldlf_and(children)
        }
        LtlfKind::Or(xs) => {
            let children = xs.iter().map(|x| to_ldlf_rec(m, x)).collect();
            m.ldlf_or(children)
        }
        LtlfKind::Not(x) => m.ldlf_not(to_ldlf_rec(m, x)),
        LtlfKind::Next(x) => {
            let true_regex = m.regex_prop(m.prop_true());
            let body = m.ldlf_and(vec![to_ldlf_rec(m, x), not_end(m)]);
            m.ldlf_diamond(true_regex, body)
        }
        LtlfKind::WeakNext(x) => {
            let true_regex = m.regex_prop(m.prop_true());
            let body = m.ldlf_or(vec![to_ldlf_rec(m, x), end(m)]);
            m.ldlf_box(true_regex, body)
        }
        LtlfKind::Until(a, b) => {
            let star = until_release_star(m, a, false);
            let body = m.ldlf_and(vec![to_ldlf_rec(m, b), not_end(m)]);
            m.ldlf_diamond(star, body)
        }
        LtlfKind::Release(a, b) => {
            let star = until_release_star(m, a, true);
            let body = m.ldlf_or(vec![to_ldlf_rec(m, b), end(m)]);
            m.ldlf_box(star, body)
        }
        LtlfKind::Eventually(x) => {
            let star = m.regex_star(m.regex_prop(m.prop_true()));
            let body = m.ldlf_and(vec![to_ldlf_rec(m, x), not_end(m)]);
            m.ldlf_diamond(star, body)
        }
        LtlfKind::Always(x) => {
            let star = m.regex_star(m.regex_prop(m.prop_true()));
            let body = m.ldlf_or(vec![to_ldlf_rec(m, x), end(m)]);
            m.ldlf_box(star, body)
        }
    }
}

/// Builds `(alpha?;true)*`, negating `alpha` first when lowering `Release`.
fn until_release_star(m: &TermManager, alpha: &Ltlf, negate_alpha: bool) -> crate::term::Regex {
    let alpha_ldlf = to_ldlf_rec(m, alpha);
    let test_arg = if negate_alpha {
        m.ldlf_not(alpha_ldlf)
    } else {
        alpha_ldlf
    };
    let test = m.regex_test(test_arg);
    let true_regex = m.regex_prop(m.prop_true());
    let seq = m
        .regex_seq(vec![test, true_regex])
        .expect("two-element Seq is always well-formed");
    m.regex_star(seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{LdlfKind, RegexKind};

    #[test]
    fn atom_lowers_to_diamond_tt() {
        let m = TermManager::new();
        let a = m.symbol("a");
        let phi = m.ltlf_atom(a);
        let l = to_ldlf(&m, &phi);
        match l.kind() {
            LdlfKind::Diamond(r, body) => {
                assert_eq!(*body.kind(), LdlfKind::True);
                assert!(matches!(r.kind(), RegexKind::PropRegex(_)));
            }
            other => panic!("expected Diamond, got {:?}", other),
        }
    }

    #[test]
    fn until_lowers_to_diamond_over_star() {
        let m = TermManager::new();
        let a = m.ltlf_atom(m.symbol("a"));
        let b = m.ltlf_atom(m.symbol("b"));
        let u = m.ltlf_until(a, b);
        let l = to_ldlf(&m, &u);
        match l.kind() {
            LdlfKind::Diamond(r, _) => assert!(matches!(r.kind(), RegexKind::Star(_))),
            other => panic!("expected Diamond over Star, got {:?}", other),
        }
    }

    #[test]
    fn release_lowers_to_box_over_star() {
        let m = TermManager::new();
        let a = m.ltlf_atom(m.symbol("a"));
        let b = m.ltlf_atom(m.symbol("b"));
        let r = m.ltlf_release(a, b);
        let l = to_ldlf(&m, &r);
        assert!(matches!(l.kind(), LdlfKind::Box(_, _)));
    }
}
