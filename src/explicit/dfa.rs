use crate::explicit::automaton::Automata;
use crate::explicit::automaton::FromRawError;
use crate::explicit::nfa::{ToNfa, NFA};
use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// <https://en.wikipedia.org/wiki/Deterministic_finite_automaton>
#[derive(Debug, Clone)]
pub struct DFA<V: Eq + Hash + Display + Copy + Clone + Debug + Ord> {
    pub(crate) alphabet: HashSet<V>,
    pub(crate) initial: usize,
    pub(crate) finals: HashSet<usize>,
    pub(crate) transitions: Vec<HashMap<V, usize>>,
}

/// An interface for structs that can be converted into a DFA.
pub trait ToDfa<V: Eq + Hash + Display + Copy + Clone + Debug + Ord> {
    fn to_dfa(&self) -> DFA<V>;
}

impl<V: Eq + Hash + Display + Copy + Clone + Debug + Ord> DFA<V> {
    /// Export to dotfile in dots/automaton/i.dot
    pub fn write_dot(&self, n: u8) -> Result<(), std::io::Error> {
        self.to_nfa().write_dot(n)
    }

    /// Returns an empty automaton with the given alphabet.
    pub fn new_empty(alphabet: &HashSet<V>) -> DFA<V> {
        DFA {
            alphabet: alphabet.clone(),
            initial: 0,
            finals: HashSet::new(),
            transitions: vec![HashMap::new()],
        }
    }

    /// Returns an automaton built from the raw arguments.
    pub fn from_raw(
        alphabet: HashSet<V>,
        initial: usize,
        finals: HashSet<usize>,
        transitions: Vec<HashMap<V, usize>>,
    ) -> Result<Self, FromRawError<V>> {
        let len = transitions.len();

        if initial >= len {
            return Err(FromRawError::InvalidInitial(initial));
        }

        if let Some(state) = finals.iter().find(|&&state| state >= len) {
            return Err(FromRawError::InvalidFinal(*state));
        }

        for (state, map) in transitions.iter().enumerate() {
            if let Some(&letter) = map.keys().find(|&x| !alphabet.contains(x)) {
                return Err(FromRawError::UnknownLetter(letter));
            }

            if let Some((&letter, &destination)) =
                map.iter().find(|(_, &destination)| destination >= len)
            {
                return Err(FromRawError::InvalidTransition(state, letter, destination));
            }
        }

        Ok(DFA {
            alphabet,
            initial,
            finals,
            transitions,
        })
    }
}

impl<V: Eq + Hash + Display + Copy + Clone + Debug + Ord> Automata<V> for DFA<V> {
    fn run(&self, v: &[V]) -> bool {
        let mut actual = self.initial;
        for l in v {
            if let Some(t) = self.transitions[actual].get(l) {
                actual = *t;
            } else {
                return false;
            }
        }
        self.finals.contains(&actual)
    }

    fn is_complete(&self) -> bool {
        for map in &self.transitions {
            for v in &self.alphabet {
                if !map.contains_key(&v) {
                    return false;
                }
            }
        }

        true
    }

    fn is_reachable(&self) -> bool {
        let mut stack = vec![self.initial];
        let mut acc = HashSet::new();
        acc.insert(self.initial);
        while let Some(e) = stack.pop() {
            for v in self.transitions[e].values() {
                if !acc.contains(&v) {
                    acc.insert(*v);
                    stack.push(*v);
                }
            }
        }
        acc.len() == self.transitions.len()
    }

    fn is_coreachable(&self) -> bool {
        self.to_nfa().is_coreachable()
    }

    fn is_trimmed(&self) -> bool {
        self.to_nfa().is_trimmed()
    }

    fn is_empty(&self) -> bool {
        self.to_nfa().is_empty()
    }

    fn is_full(&self) -> bool {
        self.to_nfa().is_full()
    }

    fn negate(mut self) -> DFA<V> {
        self = self.complete();
        self.finals = (0..self.transitions.len())
            .filter(|x| !self.finals.contains(&x))
            .collect();
        self
    }

    fn complete(mut self) -> DFA<V> {
        if self.is_complete() {
            return self;
        }

        let l = self.transitions.len();
        self.transitions.push(HashMap::new());
        for map in &mut self.transitions {
            for v in &self.alphabet {
                if !map.contains_key(&v) {
                    map.insert(*v, l);
                }
            }
        }

        self
    }

    fn make_reachable(self) -> DFA<V> {
        self.to_nfa().make_reachable().to_dfa()
    }

    fn make_coreachable(self) -> DFA<V> {
        self.to_nfa().make_coreachable().to_dfa()
    }

    fn trim(self) -> DFA<V> {
        self.to_nfa().trim().to_dfa()
    }

    fn reverse(self) -> DFA<V> {
        self.to_nfa().reverse().to_dfa()
    }
}

impl<V: Eq + Hash + Display + Copy + Clone + Debug + Ord> ToDfa<V> for DFA<V> {
    fn to_dfa(&self) -> DFA<V> {
        self.clone()
    }
}

impl<V: Eq + Hash + Display + Copy + Clone + Debug + Ord> ToNfa<V> for DFA<V> {
    fn to_nfa(&self) -> NFA<V> {
        let mut initials = HashSet::new();
        initials.insert(self.initial);
        let mut transitions = Vec::new();
        for map in &self.transitions {
            transitions.push(map.iter().map(|(k, v)| (*k, vec![*v])).collect());
        }
        NFA {
            alphabet: self.alphabet.clone(),
            initials,
            finals: self.finals.clone(),
            transitions,
        }
    }
}
