use crate::explicit::{
    automaton::{Automata, FromRawError},
    dfa::{ToDfa, DFA},
};
use std::{
    collections::{BTreeSet, HashMap, HashSet, VecDeque},
    fmt::{Debug, Display},
    hash::Hash,
    iter::{repeat, FromIterator},
    ops::BitOr,
};

/// <https://en.wikipedia.org/wiki/Nondeterministic_finite_automaton>
#[derive(Debug, Clone)]
pub struct NFA<V: Eq + Hash + Display + Copy + Clone + Debug + Ord> {
    pub(crate) alphabet: HashSet<V>,
    pub(crate) initials: HashSet<usize>,
    pub(crate) finals: HashSet<usize>,
    pub(crate) transitions: Vec<HashMap<V, Vec<usize>>>,
}

/// An interface for structs that can be converted into a NFA.
pub trait ToNfa<V: Eq + Hash + Display + Copy + Clone + Debug + Ord> {
    fn to_nfa(&self) -> NFA<V>;
}

/* IMPLEMENTATION OF NFA */

impl<V: Eq + Hash + Display + Copy + Clone + Debug + Ord> NFA<V> {
    fn small_to_dfa<T: Eq + Hash + Copy + BitOr<Output = T>, C: Fn(usize) -> T>(
        &self,
        zero: T,
        shift: C,
    ) -> DFA<V> {
        let mut map = HashMap::new();
        let mut stack = VecDeque::new();

        let mut dfa = DFA::new_empty(&self.alphabet);

        let i: T = self.initials.iter().fold(zero, |acc, x| acc | shift(*x));
        if self.initials.iter().any(|x| self.finals.contains(x)) {
            dfa.finals.insert(0);
        }

        map.insert(i, 0);
        stack.push_back((i, HashSet::from_iter(self.initials.clone().into_iter())));

        while let Some((elem, iter)) = stack.pop_front() {
            let elem_num = *map.get(&elem).unwrap();
            for v in &self.alphabet {
                let mut it = HashSet::new();
                for state in &iter {
                    if let Some(transitions) = self.transitions[*state].get(&v) {
                        for t in transitions {
                            it.insert(*t);
                        }
                    }
                }
                if it.is_empty() {
                    continue;
                }

                let other = it.iter().fold(zero, |acc, x| acc | shift(*x));
                let entry = map.entry(other);
                let val = entry.or_insert_with(|| {
                    let l = dfa.transitions.len();
                    if it.iter().any(|x| self.finals.contains(x)) {
                        dfa.finals.insert(l);
                    }
                    stack.push_back((other, it));
                    dfa.transitions.push(HashMap::new());
                    l
                });

                dfa.transitions[elem_num].insert(*v, *val);
            }
        }

        dfa
    }

    fn big_to_dfa(&self) -> DFA<V> {
        let mut map: HashMap<BTreeSet<usize>, usize> = HashMap::new();
        let mut stack = VecDeque::new();

        let mut dfa = DFA::new_empty(&self.alphabet);

        let initial: BTreeSet<usize> = self.initials.iter().copied().collect();
        map.insert(initial.clone(), 0);
        stack.push_back(initial);

        if self.initials.iter().any(|x| self.finals.contains(x)) {
            dfa.finals.insert(0);
        }

        while let Some(set) = stack.pop_front() {
            let num = *map.get(&set).unwrap();
            for v in &self.alphabet {
                let mut it = HashSet::new();
                for s in &set {
                    if let Some(transitions) = self.transitions[*s].get(&v) {
                        for t in transitions {
                            it.insert(*t);
                        }
                    }
                }
                if it.is_empty() {
                    continue;
                }

                let other = it.iter().fold(BTreeSet::new(), |mut acc, x| {
                    acc.insert(*x);
                    acc
                });
                if !map.contains_key(&other) {
                    let l = dfa.transitions.len();
                    map.insert(other.clone(), l);
                    if it.iter().any(|x| self.finals.contains(x)) {
                        dfa.finals.insert(l);
                    }
                    stack.push_back(other.clone());
                    dfa.transitions.push(HashMap::new());
                }
                dfa.transitions[num].insert(*v, *map.get(&other).unwrap());
            }
        }

        dfa
    }

    /// Returns a string containing the dot description of the automaton
    pub fn to_dot(&self) -> String {
        let mut ret = String::new();
        ret.push_str("digraph {");

        if !self.finals.is_empty() {
            ret.push_str("    node [shape = doublecircle];");
            for e in &self.finals {
                ret.push_str(&format!(" S_{}", e));
            }
            ret.push_str(";");
        }

        if !self.initials.is_empty() {
            ret.push_str("    node [shape = point];");
            for e in &self.initials {
                ret.push_str(&format!(" I_{}", e));
            }
            ret.push_str(";");
        }

        ret.push_str("    node [shape = circle];");
        let mut tmp_map = HashMap::new();
        for (i, map) in self.transitions.iter().enumerate() {
            if map.is_empty() {
                ret.push_str(&format!("    S_{};", i));
            }
            for (k, v) in map {
                for e in v {
                    tmp_map.entry(e).or_insert_with(Vec::new).push(k);
                }
            }
            for (e, v) in tmp_map.drain() {
                let mut vs = v.into_iter().fold(String::new(), |mut acc, x| {
                    acc.push_str(&x.to_string());
                    acc.push_str(", ");
                    acc
                });
                vs.pop();
                vs.pop();
                ret.push_str(&format!("    S_{} -> S_{} [label = \"{}\"];", i, e, vs));
            }
        }

        for e in &self.initials {
            ret.push_str(&format!("    I_{} -> S_{};", e, e));
        }

        ret.push_str("}");

        ret
    }

    /// Writes the dot description to `dots/automatonN.dot`, grounded on the
    /// teacher's own `NFA::write_dot`; used only by test-only call sites
    /// inspecting a legacy-strategy automaton by hand, never by the
    /// compositional translator's own path.
    pub fn write_dot(&self, n: u8) -> Result<(), std::io::Error> {
        use std::fs::File;
        use std::io::Write;
        use std::path::Path;

        let name = format!("dots/automaton{}.dot", n);
        let name = Path::new(&name);
        let mut file = File::create(name)?;
        file.write_all(self.to_dot().as_bytes())
    }

    /// Returns an automaton built from the raw arguments.
    pub fn from_raw(
        alphabet: HashSet<V>,
        initials: HashSet<usize>,
        finals: HashSet<usize>,
        transitions: Vec<HashMap<V, Vec<usize>>>,
    ) -> Result<Self, FromRawError<V>> {
        let len = transitions.len();

        if let Some(state) = initials.iter().find(|&&state| state >= len) {
            return Err(FromRawError::InvalidInitial(*state));
        }

        if let Some(state) = finals.iter().find(|&&state| state >= len) {
            return Err(FromRawError::InvalidFinal(*state));
        }

        for (state, map) in transitions.iter().enumerate() {
            if let Some(&letter) = map.keys().find(|&x| !alphabet.contains(x)) {
                return Err(FromRawError::UnknownLetter(letter));
            }

            for (&letter, destinations) in map {
                if let Some(&destination) = destinations.iter().find(|&&x| x >= len) {
                    return Err(FromRawError::InvalidTransition(state, letter, destination));
                }
            }
        }

        Ok(NFA {
            alphabet,
            initials,
            finals,
            transitions,
        })
    }
}

impl<V: Eq + Hash + Display + Copy + Clone + Debug + Ord> ToDfa<V> for NFA<V> {
    fn to_dfa(&self) -> DFA<V> {
        if self.is_empty() {
            DFA::new_empty(&self.alphabet)
        } else if self.transitions.len() < 32 {
            self.small_to_dfa(0 as u32, |x| 1 << x)
        } else if self.transitions.len() < 64 {
            self.small_to_dfa(0 as u64, |x| 1 << x)
        } else if self.transitions.len() < 128 {
            self.small_to_dfa(0 as u128, |x| 1 << x)
        } else {
            self.big_to_dfa()
        }
    }
}

impl<V: Eq + Hash + Display + Copy + Clone + Debug + Ord> ToNfa<V> for NFA<V> {
    fn to_nfa(&self) -> NFA<V> {
        self.clone()
    }
}

impl<V: Eq + Hash + Display + Copy + Clone + Debug + Ord> Automata<V> for NFA<V> {
    fn run(&self, v: &[V]) -> bool {
        if self.initials.is_empty() {
            return false;
        }

        let mut actuals = self.initials.clone();
        let mut next = HashSet::new();

        for l in v {
            for st in &actuals {
                if let Some(tr) = self.transitions[*st].get(l) {
                    for t in tr {
                        next.insert(*t);
                    }
                }
            }

            std::mem::swap(&mut actuals, &mut next);
            if actuals.is_empty() {
                return false;
            }
            next.clear();
        }

        actuals.iter().any(|x| self.finals.contains(x))
    }

    fn is_complete(&self) -> bool {
        if self.initials.is_empty() {
            return false;
        }

        for m in &self.transitions {
            for v in &self.alphabet {
                if match m.get(v) {
                    None => true,
                    Some(v) => v.is_empty(),
                } {
                    return false;
                }
            }
        }
        true
    }

    fn is_reachable(&self) -> bool {
        let mut acc: HashSet<usize> = self.initials.clone().into_iter().collect();
        let mut stack: Vec<usize> = self.initials.iter().cloned().collect();
        while let Some(e) = stack.pop() {
            for v in self.transitions[e].values() {
                for t in v {
                    if !acc.contains(t) {
                        acc.insert(*t);
                        stack.push(*t);
                    }
                }
            }
        }
        acc.len() == self.transitions.len()
    }

    fn is_coreachable(&self) -> bool {
        self.clone().reverse().is_reachable()
    }

    fn is_trimmed(&self) -> bool {
        self.is_reachable() && self.is_coreachable()
    }

    fn is_empty(&self) -> bool {
        if !self.initials.is_disjoint(&self.finals) {
            return false;
        }

        let mut acc: HashSet<usize> = self.initials.clone().into_iter().collect();
        let mut stack: Vec<usize> = self.initials.clone().into_iter().collect();

        while let Some(e) = stack.pop() {
            for v in self.transitions[e].values() {
                for t in v {
                    if self.finals.contains(t) {
                        return false;
                    }
                    if !acc.contains(t) {
                        acc.insert(*t);
                        stack.push(*t);
                    }
                }
            }
        }
        true
    }

    fn is_full(&self) -> bool {
        if self.initials.is_disjoint(&self.finals) {
            return false;
        }

        let mut acc: HashSet<usize> = self.initials.clone().into_iter().collect();
        let mut stack: Vec<usize> = self.initials.clone().into_iter().collect();

        while let Some(e) = stack.pop() {
            for v in self.transitions[e].values() {
                for t in v {
                    if !self.finals.contains(t) {
                        return false;
                    }
                    if !acc.contains(t) {
                        acc.insert(*t);
                        stack.push(*t);
                    }
                }
            }
        }
        true
    }

    fn negate(self) -> NFA<V> {
        self.to_dfa().negate().to_nfa()
    }

    fn complete(mut self) -> NFA<V> {
        if self.is_complete() {
            return self;
        }

        let l = self.transitions.len();
        self.transitions.push(HashMap::new());
        for m in &mut self.transitions {
            for v in &self.alphabet {
                let t = m.entry(*v).or_insert_with(Vec::new);
                if t.is_empty() {
                    t.push(l);
                }
            }
        }

        if self.initials.is_empty() {
            self.initials.insert(l);
        }

        self
    }

    fn make_reachable(mut self) -> NFA<V> {
        let mut acc: HashSet<usize> = self.initials.clone().into_iter().collect();
        let mut stack: Vec<usize> = self.initials.iter().cloned().collect();
        while let Some(e) = stack.pop() {
            for v in self.transitions[e].values() {
                for t in v {
                    if !acc.contains(t) {
                        acc.insert(*t);
                        stack.push(*t);
                    }
                }
            }
        }

        let mut map = HashMap::new();
        let mut ind = 0;
        let l = self.transitions.len();
        for i in 0..l {
            if acc.contains(&i) {
                map.insert(i, ind);
                self.transitions.swap(i, ind);
                ind += 1;
            }
        }
        self.transitions.truncate(ind);

        self.finals = self
            .finals
            .iter()
            .filter(|x| acc.contains(&x))
            .map(|x| *map.get(x).unwrap())
            .collect();
        // no need to filter the initials since they are reachable
        self.initials = self.initials.iter().map(|x| *map.get(x).unwrap()).collect();
        for m in &mut self.transitions {
            for v in m.values_mut() {
                for t in v {
                    *t = *map.get(t).unwrap();
                }
            }
        }

        self
    }

    fn make_coreachable(self) -> NFA<V> {
        self.reverse().make_reachable().reverse()
    }

    fn trim(self) -> NFA<V> {
        self.make_reachable().make_coreachable()
    }

    fn reverse(mut self) -> NFA<V> {
        let mut transitions: Vec<_> = repeat(HashMap::new())
            .take(self.transitions.len())
            .collect();

        for i in 0..self.transitions.len() {
            for (k, v) in &self.transitions[i] {
                for e in v {
                    transitions[*e].entry(*k).or_insert_with(Vec::new).push(i);
                }
            }
        }

        self.transitions = transitions;
        std::mem::swap(&mut self.initials, &mut self.finals);
        self
    }
}

