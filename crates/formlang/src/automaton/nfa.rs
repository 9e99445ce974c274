//! Nondeterministic finite automata with epsilon moves.

use crate::automaton::dfa::Dfa;
use crate::automaton::subset_construction::subset_construction;
use crate::error::{Error, Result};
use crate::state::State;
use crate::symbol::{Label, Terminal};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A Nondeterministic Finite Automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Nfa {
    states: BTreeSet<State>,
    /// Terminal symbols; epsilon is never part of the alphabet.
    alphabet: BTreeSet<Terminal>,
    /// Transitions: source -> label -> set of destinations.
    transitions: BTreeMap<State, BTreeMap<Label, BTreeSet<State>>>,
    start: State,
    accepting: BTreeSet<State>,
}

impl Nfa {
    /// Create an NFA with a single, non-accepting start state.
    pub fn new(start: State) -> Self {
        Self {
            states: BTreeSet::from([start.clone()]),
            alphabet: BTreeSet::new(),
            transitions: BTreeMap::new(),
            start,
            accepting: BTreeSet::new(),
        }
    }

    /// Build an NFA from caller-supplied sets, checking every invariant.
    pub fn from_parts(
        states: impl IntoIterator<Item = State>,
        alphabet: impl IntoIterator<Item = Terminal>,
        transitions: impl IntoIterator<Item = (State, Label, State)>,
        start: State,
        accepting: impl IntoIterator<Item = State>,
    ) -> Result<Self> {
        let mut nfa = Self {
            states: states.into_iter().collect(),
            alphabet: alphabet.into_iter().collect(),
            transitions: BTreeMap::new(),
            start,
            accepting: accepting.into_iter().collect(),
        };
        for (source, label, destination) in transitions {
            nfa.transitions
                .entry(source)
                .or_default()
                .entry(label)
                .or_default()
                .insert(destination);
        }
        nfa.validate()?;
        Ok(nfa)
    }

    pub fn add_state(&mut self, state: State) {
        self.states.insert(state);
    }

    pub fn add_symbol(&mut self, symbol: Terminal) {
        self.alphabet.insert(symbol);
    }

    /// Add a transition, declaring its states and symbol.
    pub fn add_transition(&mut self, source: State, label: impl Into<Label>, destination: State) {
        let label = label.into();
        if let Label::Terminal(symbol) = &label {
            self.alphabet.insert(symbol.clone());
        }
        self.states.insert(source.clone());
        self.states.insert(destination.clone());
        self.transitions
            .entry(source)
            .or_default()
            .entry(label)
            .or_default()
            .insert(destination);
    }

    pub fn add_epsilon_transition(&mut self, source: State, destination: State) {
        self.add_transition(source, Label::Epsilon, destination);
    }

    pub fn add_accepting(&mut self, state: State) {
        self.states.insert(state.clone());
        self.accepting.insert(state);
    }

    pub fn states(&self) -> &BTreeSet<State> {
        &self.states
    }

    pub fn alphabet(&self) -> &BTreeSet<Terminal> {
        &self.alphabet
    }

    pub fn start(&self) -> &State {
        &self.start
    }

    pub fn accepting(&self) -> &BTreeSet<State> {
        &self.accepting
    }

    /// Destinations of `source` on `label`.
    pub fn targets(&self, source: &State, label: &Label) -> Option<&BTreeSet<State>> {
        self.transitions.get(source)?.get(label)
    }

    /// Get all transitions as an iterator.
    pub fn transitions(&self) -> impl Iterator<Item = (&State, &Label, &State)> + '_ {
        self.transitions.iter().flat_map(|(source, row)| {
            row.iter().flat_map(move |(label, destinations)| {
                destinations.iter().map(move |destination| (source, label, destination))
            })
        })
    }

    /// Check the structural invariants of the automaton.
    pub fn validate(&self) -> Result<()> {
        if !self.states.contains(&self.start) {
            return Err(Error::malformed(format!(
                "start state {} is not a state",
                self.start
            )));
        }
        if let Some(state) = self.accepting.iter().find(|s| !self.states.contains(*s)) {
            return Err(Error::malformed(format!(
                "accepting state {state} is not a state"
            )));
        }
        for (source, label, destination) in self.transitions() {
            for state in [source, destination] {
                if !self.states.contains(state) {
                    return Err(Error::malformed(format!(
                        "transition {source} -{label}-> {destination} uses undeclared state {state}"
                    )));
                }
            }
            if let Label::Terminal(symbol) = label {
                if !self.alphabet.contains(symbol) {
                    return Err(Error::malformed(format!(
                        "transition {source} -{label}-> {destination} uses symbol {symbol} outside the alphabet"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Compute the epsilon closure of a set of states using DFS.
    pub fn epsilon_closure(&self, states: &BTreeSet<State>) -> BTreeSet<State> {
        let mut closure = BTreeSet::new();
        let mut stack: Vec<&State> = states.iter().collect();

        while let Some(state) = stack.pop() {
            if !closure.insert(state.clone()) {
                continue;
            }
            if let Some(destinations) = self.targets(state, &Label::Epsilon) {
                stack.extend(destinations.iter().filter(|d| !closure.contains(*d)));
            }
        }

        closure
    }

    /// States reached from `states` by one `symbol` move, without closure.
    pub fn move_on(&self, states: &BTreeSet<State>, symbol: &Terminal) -> BTreeSet<State> {
        let label = Label::from(symbol);
        states
            .iter()
            .filter_map(|state| self.targets(state, &label))
            .flatten()
            .cloned()
            .collect()
    }

    /// Whether the automaton accepts `word`.
    pub fn accepts<'a>(&self, word: impl IntoIterator<Item = &'a Terminal>) -> bool {
        let mut current = self.epsilon_closure(&BTreeSet::from([self.start.clone()]));

        for symbol in word {
            current = self.epsilon_closure(&self.move_on(&current, symbol));
            if current.is_empty() {
                return false;
            }
        }

        !current.is_disjoint(&self.accepting)
    }

    /// Check if the NFA accepts no string at all.
    pub fn is_language_empty(&self) -> bool {
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([&self.start]);

        while let Some(state) = queue.pop_front() {
            if !visited.insert(state) {
                continue;
            }
            if self.accepting.contains(state) {
                return false;
            }
            for destinations in self.transitions.get(state).into_iter().flat_map(BTreeMap::values) {
                queue.extend(destinations.iter().filter(|d| !visited.contains(*d)));
            }
        }

        true
    }

    /// Convert to an equivalent DFA by subset construction.
    pub fn to_dfa(&self) -> Result<Dfa> {
        self.validate()?;
        subset_construction(self)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// One terminal per character.
    pub(crate) fn word(text: &str) -> Vec<Terminal> {
        text.chars().map(Terminal::from).collect()
    }

    pub(crate) fn s(name: &str) -> State {
        State::from(name)
    }

    pub(crate) fn t(c: char) -> Terminal {
        Terminal::from(c)
    }

    pub(crate) fn states(names: &[&str]) -> BTreeSet<State> {
        names.iter().copied().map(State::from).collect()
    }

    #[test]
    fn test_builder_declares_states_and_symbols() {
        let mut nfa = Nfa::new(s("q0"));
        nfa.add_transition(s("q0"), t('a'), s("q1"));
        nfa.add_epsilon_transition(s("q1"), s("q2"));
        nfa.add_accepting(s("q2"));

        assert_eq!(nfa.states(), &states(&["q0", "q1", "q2"]));
        assert_eq!(nfa.alphabet(), &BTreeSet::from([t('a')]));
        assert_eq!(nfa.transitions().count(), 2);
        assert!(nfa.validate().is_ok());
    }

    #[test]
    fn test_from_parts_rejects_dangling_state() {
        let result = Nfa::from_parts(
            [s("q0")],
            [t('a')],
            [(s("q0"), Label::from(t('a')), s("q1"))],
            s("q0"),
            [],
        );
        assert!(matches!(result, Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_from_parts_rejects_symbol_outside_alphabet() {
        let result = Nfa::from_parts(
            [s("q0"), s("q1")],
            [t('a')],
            [(s("q0"), Label::from(t('b')), s("q1"))],
            s("q0"),
            [s("q1")],
        );
        assert!(matches!(result, Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_from_parts_rejects_foreign_start_and_accepting() {
        let start = Nfa::from_parts([s("q0")], [], [], s("x"), []);
        assert!(matches!(start, Err(Error::MalformedInput(_))));

        let accepting = Nfa::from_parts([s("q0")], [], [], s("q0"), [s("x")]);
        assert!(matches!(accepting, Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_epsilon_closure() {
        let mut nfa = Nfa::new(s("0"));
        // 0 -ε-> 1 -ε-> 2, 2 -ε-> 0, 2 -a-> 3
        nfa.add_epsilon_transition(s("0"), s("1"));
        nfa.add_epsilon_transition(s("1"), s("2"));
        nfa.add_epsilon_transition(s("2"), s("0"));
        nfa.add_transition(s("2"), t('a'), s("3"));

        assert_eq!(
            nfa.epsilon_closure(&states(&["0"])),
            states(&["0", "1", "2"])
        );
        assert_eq!(nfa.epsilon_closure(&states(&["3"])), states(&["3"]));
        assert!(nfa.epsilon_closure(&BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_move_on() {
        let mut nfa = Nfa::new(s("0"));
        // 0 -a-> 1, 0 -a-> 2, 1 -ε-> 3
        nfa.add_transition(s("0"), t('a'), s("1"));
        nfa.add_transition(s("0"), t('a'), s("2"));
        nfa.add_epsilon_transition(s("1"), s("3"));

        let reached = nfa.move_on(&states(&["0"]), &t('a'));
        assert_eq!(reached, states(&["1", "2"]));
        assert_eq!(nfa.epsilon_closure(&reached), states(&["1", "2", "3"]));
        assert!(nfa.move_on(&states(&["0"]), &t('b')).is_empty());
    }

    #[test]
    fn test_accepts() {
        // (ab)* with an epsilon back edge.
        let mut nfa = Nfa::new(s("0"));
        nfa.add_transition(s("0"), t('a'), s("1"));
        nfa.add_transition(s("1"), t('b'), s("2"));
        nfa.add_epsilon_transition(s("2"), s("0"));
        nfa.add_accepting(s("0"));

        assert!(nfa.accepts(&word("")));
        assert!(nfa.accepts(&word("ab")));
        assert!(nfa.accepts(&word("abab")));
        assert!(!nfa.accepts(&word("a")));
        assert!(!nfa.accepts(&word("aba")));
        assert!(!nfa.accepts(&word("c")));
    }

    #[test]
    fn test_to_dfa_rejects_malformed_input() {
        let mut nfa = Nfa::new(s("q0"));
        nfa.add_transition(s("q0"), t('a'), s("q1"));
        nfa.add_accepting(s("q1"));

        let mut undeclared = nfa.clone();
        undeclared.states.remove(&s("q1"));
        assert!(matches!(undeclared.to_dfa(), Err(Error::MalformedInput(_))));

        let mut foreign = nfa.clone();
        foreign.alphabet.clear();
        assert!(matches!(foreign.to_dfa(), Err(Error::MalformedInput(_))));
        assert!(matches!(crate::nfa_to_dfa(&foreign), Err(Error::MalformedInput(_))));

        let mut ghost = nfa;
        ghost.accepting.insert(s("ghost"));
        assert!(matches!(crate::nfa_to_dfa(&ghost), Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_is_language_empty() {
        let mut nfa = Nfa::new(s("0"));
        nfa.add_accepting(s("1"));
        // No transitions - no path from 0 to 1.
        assert!(nfa.is_language_empty());

        nfa.add_epsilon_transition(s("0"), s("1"));
        assert!(!nfa.is_language_empty());
    }
}
