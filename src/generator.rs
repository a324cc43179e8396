//! Random, depth-bounded LDLf formula generation (C10), mirroring the
//! teacher's `generator.rs`: a recursive `gen_*` family carrying a
//! remaining-depth budget and a weighted constructor choice drawn from a
//! `rand::rngs::ThreadRng`. Used by the generator-driven property tests
//! in `tests/generator/mod.rs` to fuzz the invariants of spec.md §8 at
//! larger scale than the fixed scenario table.

use crate::term::{Ldlf, Prop, Regex, Symbol, TermManager};
use rand::prelude::*;

#[derive(Debug)]
pub struct Generator {
    alphabet: Vec<Symbol>,
    max_depth: u8,
    rng: ThreadRng,
}

pub fn new_generator(alphabet: Vec<Symbol>, max_depth: u8) -> Generator {
    Generator {
        alphabet,
        max_depth,
        rng: rand::thread_rng(),
    }
}

impl Generator {
    pub fn with_max_depth(mut self, max_depth: u8) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn symbol(&mut self) -> Symbol {
        let n = self.rng.gen_range(0, self.alphabet.len());
        self.alphabet[n]
    }

    /// A random propositional formula over the generator's alphabet.
    pub fn gen_prop(&mut self, m: &TermManager, depth: u8) -> Prop {
        if depth == 0 {
            return m.prop_atom(self.symbol());
        }
        const TOTAL: u8 = 5;
        match self.rng.gen_range(0, TOTAL) {
            0 => m.prop_true(),
            1 => m.prop_false(),
            2 => {
                let x = self.gen_prop(m, depth - 1);
                m.prop_not(x)
            }
            3 => {
                let xs = vec![self.gen_prop(m, depth - 1), self.gen_prop(m, depth - 1)];
                m.prop_and(xs)
            }
            _ => {
                let xs = vec![self.gen_prop(m, depth - 1), self.gen_prop(m, depth - 1)];
                m.prop_or(xs)
            }
        }
    }

    /// A random regular expression over the generator's alphabet.
    pub fn gen_regex(&mut self, m: &TermManager, depth: u8) -> Regex {
        if depth == 0 {
            return m.regex_prop(self.gen_prop(m, 0));
        }
        const TOTAL: u8 = 5;
        match self.rng.gen_range(0, TOTAL) {
            0 => m.regex_prop(self.gen_prop(m, depth - 1)),
            1 => {
                let psi = self.gen_ldlf(m, depth - 1);
                m.regex_test(psi)
            }
            2 => {
                let rs = vec![self.gen_regex(m, depth - 1), self.gen_regex(m, depth - 1)];
                m.regex_seq(rs).expect("two-element Seq is always well-formed")
            }
            3 => {
                let rs = vec![self.gen_regex(m, depth - 1), self.gen_regex(m, depth - 1)];
                m.regex_union(rs).expect("two-element Union is always well-formed")
            }
            _ => {
                let r = self.gen_regex(m, depth - 1);
                m.regex_star(r)
            }
        }
    }

    /// A random LDLf formula, bounded by `depth` (or the generator's own
    /// `max_depth` when called directly via [`Generator::run`]).
    pub fn gen_ldlf(&mut self, m: &TermManager, depth: u8) -> Ldlf {
        if depth == 0 {
            // LDLf has no bare atomic proposition of its own; `<p>tt` is
            // the shallowest formula that mentions one.
            let r = m.regex_prop(self.gen_prop(m, 0));
            return m.ldlf_diamond(r, m.ldlf_true());
        }
        const TOTAL: u8 = 7;
        match self.rng.gen_range(0, TOTAL) {
            0 => m.ldlf_true(),
            1 => m.ldlf_false(),
            2 => {
                let xs = vec![self.gen_ldlf(m, depth - 1), self.gen_ldlf(m, depth - 1)];
                m.ldlf_and(xs)
            }
            3 => {
                let xs = vec![self.gen_ldlf(m, depth - 1), self.gen_ldlf(m, depth - 1)];
                m.ldlf_or(xs)
            }
            4 => {
                let x = self.gen_ldlf(m, depth - 1);
                m.ldlf_not(x)
            }
            5 => {
                let r = self.gen_regex(m, depth - 1);
                let psi = self.gen_ldlf(m, depth - 1);
                m.ldlf_diamond(r, psi)
            }
            _ => {
                let r = self.gen_regex(m, depth - 1);
                let psi = self.gen_ldlf(m, depth - 1);
                m.ldlf_box(r, psi)
            }
        }
    }

    /// Generates one random formula using the generator's own depth
    /// budget, mirroring the teacher's `Generator::run`.
    pub fn run(&mut self, m: &TermManager) -> Ldlf {
        let depth = self.max_depth;
        self.gen_ldlf(m, depth)
    }
}
