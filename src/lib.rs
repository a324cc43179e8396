//! Translation of LDLf/LTLf formulas on finite traces into minimized,
//! symbolic finite-state automata.
//!
//! A formula is built once through a [`term::TermManager`] (hash-consed,
//! so structurally equal subterms always share one allocation), optionally
//! lowered from LTLf via [`ltlf::to_ldlf`], then handed to
//! [`translator::to_dfa`] for the compositional BDD-backed construction
//! (spec §4.4) or to [`legacy`] for one of the two eager reference
//! strategies kept around to cross-check it. [`mona`] reads and writes the
//! resulting automaton in the MONA DFA file format for interop with other
//! tools, and [`generator`] drives the property tests with random formulas.

pub mod delta;
pub mod dfa;
pub mod error;
pub mod explicit;
pub mod generator;
pub mod legacy;
pub mod ltlf;
pub mod mona;
pub mod nnf;
pub mod prop;
pub mod star;
pub mod term;
pub mod translator;

use crate::explicit::Interpretation;

/// The observable contract shared by every DFA value this crate produces,
/// symbolic ([`dfa::Dfa`]) or explicit-state ([`mona::MonaDfa`]) — spec §6
/// "Output DFA". Callers that only need to run a trace through a result
/// never need to know which strategy built it.
pub trait DfaView {
    fn n_states(&self) -> usize;
    fn n_variables(&self) -> usize;
    fn variable_names(&self) -> Vec<String>;
    fn initial(&self) -> usize;
    fn is_final(&self, state: usize) -> bool;

    /// `None` when no transition is defined for `symbol` at `state` (an
    /// implicit reject, see [`dfa::Dfa::complete`]).
    fn successor(&self, state: usize, symbol: &Interpretation) -> Option<usize>;

    fn accepts(&self, trace: &[Interpretation]) -> bool {
        let mut state = Some(self.initial());
        for sigma in trace {
            state = state.and_then(|s| self.successor(s, sigma));
            if state.is_none() {
                return false;
            }
        }
        state.map(|s| self.is_final(s)).unwrap_or(false)
    }
}

pub use error::{Error, Result};
pub use term::{Ldlf, Ltlf, Prop, Regex, Symbol, TermManager};
pub use translator::to_dfa;
