//! End-to-end scenario table, spec §8 "End-to-end scenarios": one row per
//! formula/trace/expected-verdict triple, run through the compositional
//! strategy (`star::build`, the same engine `translator::to_dfa` uses for
//! every `Diamond`/`Box` leaf).
//!
//! Trace strings encode bits left-to-right in the same order as
//! [`Interpretation::from_bits`] (leftmost char = lowest index). The
//! two-variable rows put `b` at index 0 and `a` at index 1, matching the
//! spec's own encoding note ("bit for a is high-index, bit for b is
//! low-index") — the reverse of `translator::to_dfa`'s own alphabetic
//! ordering, which is why these tests build their `DfaContext` directly
//! instead of going through `to_dfa`.

use ldlf2dfa::dfa::DfaContext;
use ldlf2dfa::explicit::Interpretation;
use ldlf2dfa::nnf::nnf;
use ldlf2dfa::{star, TermManager};

fn trace(strs: &[&str]) -> Vec<Interpretation> {
    strs.iter()
        .map(|s| Interpretation::from_bits(&s.chars().map(|c| c == '1').collect::<Vec<_>>()))
        .collect()
}

#[test]
fn row1_diamond_a_accepts_a() {
    let m = TermManager::new();
    let a = m.symbol("a");
    let ctx = DfaContext::new(&m, &[a]);
    let phi = m.ldlf_diamond(m.regex_prop(m.prop_atom(a)), m.ldlf_true());
    let d = star::build(&m, &ctx, &nnf(&m, &phi)).unwrap();
    assert!(d.accepts(&trace(&["1"])));
}

#[test]
fn row2_diamond_a_rejects_not_a() {
    let m = TermManager::new();
    let a = m.symbol("a");
    let ctx = DfaContext::new(&m, &[a]);
    let phi = m.ldlf_diamond(m.regex_prop(m.prop_atom(a)), m.ldlf_true());
    let d = star::build(&m, &ctx, &nnf(&m, &phi)).unwrap();
    assert!(!d.accepts(&trace(&["0"])));
}

fn box_a_seq_b_ff(m: &TermManager) -> (DfaContext, ldlf2dfa::Ldlf) {
    let a = m.symbol("a");
    let b = m.symbol("b");
    let ctx = DfaContext::new(m, &[b, a]);
    let seq = m
        .regex_seq(vec![m.regex_prop(m.prop_atom(a)), m.regex_prop(m.prop_atom(b))])
        .unwrap();
    let phi = m.ldlf_box(seq, m.ldlf_false());
    (ctx, phi)
}

#[test]
fn row3_box_a_seq_b_ff_rejects_when_the_sequence_matches() {
    let m = TermManager::new();
    let (ctx, phi) = box_a_seq_b_ff(&m);
    let d = star::build(&m, &ctx, &nnf(&m, &phi)).unwrap();
    assert!(!d.accepts(&trace(&["01", "10"])));
}

#[test]
fn row4_box_a_seq_b_ff_accepts_when_the_sequence_does_not_match() {
    let m = TermManager::new();
    let (ctx, phi) = box_a_seq_b_ff(&m);
    let d = star::build(&m, &ctx, &nnf(&m, &phi)).unwrap();
    assert!(d.accepts(&trace(&["01", "01"])));
}

#[test]
fn row5_diamond_true_star_eventually_a_not_end() {
    let m = TermManager::new();
    let a = m.symbol("a");
    let ctx = DfaContext::new(&m, &[a]);
    let diamond_a = m.ldlf_diamond(m.regex_prop(m.prop_atom(a)), m.ldlf_true());
    let end = m.ldlf_box(m.regex_prop(m.prop_true()), m.ldlf_false());
    let not_end = m.ldlf_not(end);
    let body = m.ldlf_and(vec![diamond_a, not_end]);
    let star_true = m.regex_star(m.regex_prop(m.prop_true()));
    let phi = m.ldlf_diamond(star_true, body);

    let d = star::build(&m, &ctx, &nnf(&m, &phi)).unwrap();
    assert!(d.accepts(&trace(&["0", "0", "1"])));
}

#[test]
fn row6_diamond_a_test_star_eventually_b_not_end() {
    let m = TermManager::new();
    let a = m.symbol("a");
    let b = m.symbol("b");
    let ctx = DfaContext::new(&m, &[b, a]);

    let diamond_a = m.ldlf_diamond(m.regex_prop(m.prop_atom(a)), m.ldlf_true());
    let test = m.regex_test(diamond_a);
    let true_regex = m.regex_prop(m.prop_true());
    let seq = m.regex_seq(vec![test, true_regex]).unwrap();
    let star = m.regex_star(seq);

    let diamond_b = m.ldlf_diamond(m.regex_prop(m.prop_atom(b)), m.ldlf_true());
    let end = m.ldlf_box(m.regex_prop(m.prop_true()), m.ldlf_false());
    let not_end = m.ldlf_not(end);
    let body = m.ldlf_and(vec![diamond_b, not_end]);
    let phi = m.ldlf_diamond(star, body);

    let d = star::build(&m, &ctx, &nnf(&m, &phi)).unwrap();
    assert!(d.accepts(&trace(&["01", "01", "10"])));
}

#[test]
fn row7_ltlf_until_lowered() {
    let m = TermManager::new();
    let a = m.symbol("a");
    let b = m.symbol("b");
    let ctx = DfaContext::new(&m, &[b, a]);
    let u = m.ltlf_until(m.ltlf_atom(a), m.ltlf_atom(b));
    let phi = ldlf2dfa::ltlf::to_ldlf(&m, &u);

    let d = star::build(&m, &ctx, &phi).unwrap();
    assert!(d.accepts(&trace(&["10"])));
}

#[test]
fn row8_ltlf_release_lowered() {
    let m = TermManager::new();
    let a = m.symbol("a");
    let b = m.symbol("b");
    let ctx = DfaContext::new(&m, &[b, a]);
    let r = m.ltlf_release(m.ltlf_atom(a), m.ltlf_atom(b));
    let phi = ldlf2dfa::ltlf::to_ldlf(&m, &r);

    let d = star::build(&m, &ctx, &phi).unwrap();
    assert!(d.accepts(&trace(&["10", "10"])));
}
