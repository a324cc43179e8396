use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Operations common to DFAs and NFAs: running a word, reachability/emptiness
/// queries and the structural transformations (negate, complete, trim, ...).
pub trait Automata<V: Eq + Hash + Display + Copy + Clone + Debug, Rhs = Self> {
    fn run(&self, v: &[V]) -> bool;

    fn is_complete(&self) -> bool;
    fn is_reachable(&self) -> bool;
    fn is_coreachable(&self) -> bool;
    fn is_trimmed(&self) -> bool;
    fn is_empty(&self) -> bool;
    fn is_full(&self) -> bool;

    fn negate(self) -> Rhs;
    fn complete(self) -> Rhs;
    fn make_reachable(self) -> Rhs;
    fn make_coreachable(self) -> Rhs;
    fn trim(self) -> Rhs;
    fn reverse(self) -> Rhs;
}

/// Errors raised by the `from_raw` validated constructors of [`DFA`] and [`NFA`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FromRawError<V: Debug> {
    #[error("initial state {0} is out of range")]
    InvalidInitial(usize),
    #[error("final state {0} is out of range")]
    InvalidFinal(usize),
    #[error("letter {0:?} is not part of the declared alphabet")]
    UnknownLetter(V),
    #[error("transition from state {0} on {1:?} leads to out-of-range state {2}")]
    InvalidTransition(usize, V, usize),
}
