//! Generic, alphabet-agnostic DFA/NFA toolkit, carried over from a plain
//! automaton-manipulation library and reused here as the engine behind the
//! two eager translation strategies in [`crate::legacy`].
//!
//! Everything in this module is oblivious to LDLf/LTLf; it manipulates
//! automata over an arbitrary alphabet `V: Eq + Hash + Display + Copy +
//! Clone + Debug (+ Ord)`. The symbolic, BDD-backed DFA used by the
//! compositional translator lives in [`crate::dfa`] instead.

pub mod automaton;
pub mod dfa;
pub mod interpretation;
pub mod nfa;

pub use automaton::{Automata, FromRawError};
pub use dfa::{ToDfa, DFA};
pub use interpretation::Interpretation;
pub use nfa::{ToNfa, NFA};
