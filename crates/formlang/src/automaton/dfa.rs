//! Deterministic Finite Automaton (DFA) implementation with partition
//! refinement minimization.

use crate::automaton::nfa::Nfa;
use crate::automaton::partition::Partition;
use crate::error::{Error, Result};
use crate::state::{State, StateArena, StateId};
use crate::symbol::Terminal;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A Deterministic Finite Automaton.
///
/// The transition function is partial: a missing transition rejects.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Dfa {
    states: BTreeSet<State>,
    alphabet: BTreeSet<Terminal>,
    /// Transitions: source -> symbol -> destination
    transitions: BTreeMap<State, BTreeMap<Terminal, State>>,
    start: State,
    accepting: BTreeSet<State>,
}

impl Dfa {
    /// Create a DFA with a single, non-accepting start state.
    pub fn new(start: State) -> Self {
        Self {
            states: BTreeSet::from([start.clone()]),
            alphabet: BTreeSet::new(),
            transitions: BTreeMap::new(),
            start,
            accepting: BTreeSet::new(),
        }
    }

    /// Build a DFA from caller-supplied sets, checking every invariant.
    ///
    /// Two transitions out of the same state on the same symbol must agree.
    pub fn from_parts(
        states: impl IntoIterator<Item = State>,
        alphabet: impl IntoIterator<Item = Terminal>,
        transitions: impl IntoIterator<Item = (State, Terminal, State)>,
        start: State,
        accepting: impl IntoIterator<Item = State>,
    ) -> Result<Self> {
        let mut dfa = Self {
            states: states.into_iter().collect(),
            alphabet: alphabet.into_iter().collect(),
            transitions: BTreeMap::new(),
            start,
            accepting: accepting.into_iter().collect(),
        };
        for (source, symbol, destination) in transitions {
            let row = dfa.transitions.entry(source.clone()).or_default();
            if let Some(existing) = row.get(&symbol) {
                if existing != &destination {
                    return Err(Error::malformed(format!(
                        "state {source} has two transitions on {symbol}: {existing} and {destination}"
                    )));
                }
                continue;
            }
            row.insert(symbol, destination);
        }
        dfa.validate()?;
        Ok(dfa)
    }

    pub fn add_state(&mut self, state: State) {
        self.states.insert(state);
    }

    pub fn add_symbol(&mut self, symbol: Terminal) {
        self.alphabet.insert(symbol);
    }

    /// Add a transition, declaring its states and symbol. Returns the
    /// destination it replaced, if any.
    pub fn add_transition(
        &mut self,
        source: State,
        symbol: Terminal,
        destination: State,
    ) -> Option<State> {
        self.alphabet.insert(symbol.clone());
        self.states.insert(source.clone());
        self.states.insert(destination.clone());
        self.transitions
            .entry(source)
            .or_default()
            .insert(symbol, destination)
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

    pub fn is_accepting(&self, state: &State) -> bool {
        self.accepting.contains(state)
    }

    /// Get the transition from a state on a symbol.
    pub fn transition(&self, source: &State, symbol: &Terminal) -> Option<&State> {
        self.transitions.get(source)?.get(symbol)
    }

    /// Get all transitions as an iterator.
    pub fn transitions(&self) -> impl Iterator<Item = (&State, &Terminal, &State)> + '_ {
        self.transitions.iter().flat_map(|(source, row)| {
            row.iter()
                .map(move |(symbol, destination)| (source, symbol, destination))
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
        for (source, symbol, destination) in self.transitions() {
            for state in [source, destination] {
                if !self.states.contains(state) {
                    return Err(Error::malformed(format!(
                        "transition {source} -{symbol}-> {destination} uses undeclared state {state}"
                    )));
                }
            }
            if !self.alphabet.contains(symbol) {
                return Err(Error::malformed(format!(
                    "transition {source} -{symbol}-> {destination} uses symbol {symbol} outside the alphabet"
                )));
            }
        }
        Ok(())
    }

    /// Whether the automaton accepts `word`.
    pub fn accepts<'a>(&self, word: impl IntoIterator<Item = &'a Terminal>) -> bool {
        let mut current = &self.start;
        for symbol in word {
            match self.transition(current, symbol) {
                Some(next) => current = next,
                None => return false,
            }
        }
        self.is_accepting(current)
    }

    /// Find all states reachable from the start state.
    pub fn reachable_states(&self) -> BTreeSet<&State> {
        let mut reachable = BTreeSet::new();
        let mut queue = VecDeque::from([&self.start]);

        while let Some(state) = queue.pop_front() {
            if !reachable.insert(state) {
                continue;
            }
            for next in self.transitions.get(state).into_iter().flat_map(BTreeMap::values) {
                if !reachable.contains(next) {
                    queue.push_back(next);
                }
            }
        }

        reachable
    }

    pub fn has_unreachable_states(&self) -> bool {
        self.reachable_states().len() < self.states.len()
    }

    /// A copy of the automaton restricted to the states reachable from the
    /// start. The alphabet is kept whole.
    pub fn remove_unreachable_states(&self) -> Result<Dfa> {
        self.validate()?;
        let reachable = self.reachable_states();
        let keep = |state: &State| reachable.contains(state);

        Ok(Dfa {
            states: self.states.iter().filter(|&s| keep(s)).cloned().collect(),
            alphabet: self.alphabet.clone(),
            transitions: self
                .transitions
                .iter()
                .filter(|(source, _)| keep(*source))
                .map(|(source, row)| (source.clone(), row.clone()))
                .collect(),
            start: self.start.clone(),
            accepting: self.accepting.iter().filter(|&s| keep(s)).cloned().collect(),
        })
    }

    /// Reachable states that can also reach an accepting state. The start
    /// state is always included.
    fn live_states(&self) -> BTreeSet<&State> {
        let reachable = self.reachable_states();

        let mut predecessors: BTreeMap<&State, Vec<&State>> = BTreeMap::new();
        for (source, _, destination) in self.transitions() {
            predecessors.entry(destination).or_default().push(source);
        }

        let mut productive = BTreeSet::new();
        let mut stack: Vec<&State> = self.accepting.iter().collect();
        while let Some(state) = stack.pop() {
            if !productive.insert(state) {
                continue;
            }
            if let Some(sources) = predecessors.get(state) {
                stack.extend(sources.iter().filter(|s| !productive.contains(*s)));
            }
        }

        let mut live: BTreeSet<&State> = reachable.intersection(&productive).copied().collect();
        live.insert(&self.start);
        live
    }

    /// Check if the DFA accepts no string at all.
    pub fn is_language_empty(&self) -> bool {
        self.reachable_states()
            .iter()
            .all(|state| !self.is_accepting(state))
    }

    /// The same automaton viewed as an NFA without ε-transitions.
    pub fn to_nfa(&self) -> Nfa {
        let mut nfa = Nfa::new(self.start.clone());
        for state in &self.states {
            nfa.add_state(state.clone());
        }
        for symbol in &self.alphabet {
            nfa.add_symbol(symbol.clone());
        }
        for (source, symbol, destination) in self.transitions() {
            nfa.add_transition(source.clone(), symbol, destination.clone());
        }
        for state in &self.accepting {
            nfa.add_accepting(state.clone());
        }
        nfa
    }

    /// Minimize the DFA by partition refinement.
    ///
    /// Dead and unreachable states are dropped first, so the result is the
    /// smallest partial DFA for the language. Each state of the result is the
    /// smallest member of its equivalence class, which makes minimization of
    /// a minimal DFA return an equal DFA.
    pub fn minimize(&self) -> Result<Dfa> {
        self.validate()?;

        let live: Vec<&State> = self.live_states().into_iter().collect();
        let arena = StateArena::new(live.iter().copied());
        let alphabet: Vec<&Terminal> = self.alphabet.iter().collect();
        debug!(
            "Minimizing DFA: {} states, {} live, {} symbols",
            self.states.len(),
            live.len(),
            alphabet.len()
        );

        // Successor of every live state on every symbol; None is the dead sink.
        let successors: Vec<Vec<Option<StateId>>> = live
            .iter()
            .map(|state| {
                alphabet
                    .iter()
                    .map(|symbol| {
                        self.transition(state, symbol)
                            .and_then(|target| arena.id(target))
                    })
                    .collect()
            })
            .collect();

        let mut partition = Partition::new(live.len(), |id| self.is_accepting(live[id as usize]));
        let passes = partition.refine_until_stable(|id, p| {
            successors[id as usize]
                .iter()
                .map(|target| target.map(|t| p.block_of(t)))
                .collect::<Vec<_>>()
        });

        // Block members ascend, so the first one is the smallest state.
        let representative = |id: StateId| {
            let block = &partition.blocks()[partition.block_of(id)];
            live[block[0] as usize]
        };

        let start = arena
            .id(&self.start)
            .map(representative)
            .ok_or_else(|| Error::malformed(format!("start state {} is not live", self.start)))?;
        let mut minimized = Dfa::new(start.clone());
        for symbol in &alphabet {
            minimized.add_symbol((*symbol).clone());
        }

        for block in partition.blocks() {
            let first = block[0];
            let source = live[first as usize];
            minimized.add_state(source.clone());
            if self.is_accepting(source) {
                minimized.add_accepting(source.clone());
            }
            for (symbol, target) in alphabet.iter().zip(&successors[first as usize]) {
                if let Some(target) = target {
                    minimized.add_transition(
                        source.clone(),
                        (*symbol).clone(),
                        representative(*target).clone(),
                    );
                }
            }
        }

        debug!(
            "Minimized DFA: {} states after {} refinement passes",
            minimized.states.len(),
            passes
        );
        Ok(minimized)
    }

    /// Whether the parts of both automata reachable from their starts are
    /// equal up to renaming states. Alphabets must be equal.
    pub fn is_isomorphic(&self, other: &Dfa) -> bool {
        if self.alphabet != other.alphabet {
            return false;
        }

        let mut forward: BTreeMap<&State, &State> = BTreeMap::new();
        let mut backward: BTreeMap<&State, &State> = BTreeMap::new();
        let mut queue = VecDeque::from([(&self.start, &other.start)]);
        forward.insert(&self.start, &other.start);
        backward.insert(&other.start, &self.start);

        while let Some((left, right)) = queue.pop_front() {
            if self.is_accepting(left) != other.is_accepting(right) {
                return false;
            }
            for symbol in &self.alphabet {
                match (self.transition(left, symbol), other.transition(right, symbol)) {
                    (None, None) => {}
                    (Some(l), Some(r)) => match (forward.get(l), backward.get(r)) {
                        (None, None) => {
                            forward.insert(l, r);
                            backward.insert(r, l);
                            queue.push_back((l, r));
                        }
                        (Some(&mapped), Some(&back)) if mapped == r && back == l => {}
                        _ => return false,
                    },
                    _ => return false,
                }
            }
        }

        true
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::automaton::nfa::tests::{s, states, t, word};

    /// DFA over {0, 1} for words ending in "01". `q3` duplicates `q0` and the
    /// dead state `d` is unreachable.
    pub(crate) fn ends_in_01() -> Dfa {
        let mut dfa = Dfa::new(s("q0"));
        dfa.add_transition(s("q0"), t('0'), s("q1"));
        dfa.add_transition(s("q0"), t('1'), s("q0"));
        dfa.add_transition(s("q1"), t('0'), s("q1"));
        dfa.add_transition(s("q1"), t('1'), s("q2"));
        dfa.add_transition(s("q2"), t('0'), s("q1"));
        dfa.add_transition(s("q2"), t('1'), s("q3"));
        dfa.add_transition(s("q3"), t('0'), s("q1"));
        dfa.add_transition(s("q3"), t('1'), s("q0"));
        dfa.add_transition(s("d"), t('0'), s("d"));
        dfa.add_transition(s("d"), t('1'), s("d"));
        dfa.add_accepting(s("q2"));
        dfa
    }

    #[test]
    fn test_dfa_basic() {
        let mut dfa = Dfa::new(s("0"));
        assert_eq!(dfa.add_transition(s("0"), t('a'), s("1")), None);
        assert_eq!(dfa.add_transition(s("0"), t('b'), s("2")), None);
        dfa.add_accepting(s("1"));

        assert_eq!(dfa.states(), &states(&["0", "1", "2"]));
        assert_eq!(dfa.transition(&s("0"), &t('a')), Some(&s("1")));
        assert_eq!(dfa.transition(&s("0"), &t('b')), Some(&s("2")));
        assert_eq!(dfa.transition(&s("1"), &t('a')), None);
        assert!(dfa.is_accepting(&s("1")));
        assert!(dfa.validate().is_ok());

        assert!(dfa.accepts(&word("a")));
        assert!(!dfa.accepts(&word("b")));
        assert!(!dfa.accepts(&word("aa")));
        assert!(!dfa.accepts(&word("")));
    }

    #[test]
    fn test_from_parts_rejects_conflicting_transitions() {
        let result = Dfa::from_parts(
            [s("q0"), s("q1")],
            [t('a')],
            [(s("q0"), t('a'), s("q0")), (s("q0"), t('a'), s("q1"))],
            s("q0"),
            [],
        );
        assert!(matches!(result, Err(Error::MalformedInput(_))));

        let repeated = Dfa::from_parts(
            [s("q0")],
            [t('a')],
            [(s("q0"), t('a'), s("q0")), (s("q0"), t('a'), s("q0"))],
            s("q0"),
            [s("q0")],
        );
        assert!(repeated.is_ok());
    }

    #[test]
    fn test_from_parts_rejects_undeclared_parts() {
        let dangling = Dfa::from_parts(
            [s("q0")],
            [t('a')],
            [(s("q0"), t('a'), s("q1"))],
            s("q0"),
            [],
        );
        assert!(matches!(dangling, Err(Error::MalformedInput(_))));

        let symbol = Dfa::from_parts(
            [s("q0")],
            [t('a')],
            [(s("q0"), t('b'), s("q0"))],
            s("q0"),
            [],
        );
        assert!(matches!(symbol, Err(Error::MalformedInput(_))));

        let start = Dfa::from_parts([s("q0")], [], [], s("x"), []);
        assert!(matches!(start, Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_reachable_states() {
        let dfa = ends_in_01();

        let reachable = dfa.reachable_states();
        assert_eq!(reachable.len(), 4);
        assert!(!reachable.contains(&s("d")));
        assert!(dfa.has_unreachable_states());

        let trimmed = dfa.remove_unreachable_states().unwrap();
        assert_eq!(trimmed.states(), &states(&["q0", "q1", "q2", "q3"]));
        assert!(!trimmed.has_unreachable_states());
        assert_eq!(trimmed.alphabet(), dfa.alphabet());
        assert!(trimmed.validate().is_ok());
    }

    #[test]
    fn test_dfa_minimization() {
        let dfa = ends_in_01();

        let minimized = dfa.minimize().unwrap();

        // q3 behaves like q0 and d is unreachable.
        assert_eq!(minimized.states(), &states(&["q0", "q1", "q2"]));
        assert_eq!(minimized.start(), &s("q0"));
        assert_eq!(minimized.accepting(), &states(&["q2"]));
        assert_eq!(minimized.transition(&s("q2"), &t('1')), Some(&s("q0")));
        assert_eq!(minimized.transitions().count(), 6);

        for text in ["01", "001", "1101", "0101", "", "0", "011", "010"] {
            assert_eq!(dfa.accepts(&word(text)), minimized.accepts(&word(text)), "{text:?}");
        }
    }

    #[test]
    fn test_minimize_is_idempotent() {
        let once = ends_in_01().minimize().unwrap();
        let twice = once.minimize().unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_minimize_drops_dead_states() {
        // q1 can never accept.
        let mut dfa = Dfa::new(s("q0"));
        dfa.add_transition(s("q0"), t('a'), s("q1"));
        dfa.add_transition(s("q0"), t('b'), s("q2"));
        dfa.add_transition(s("q1"), t('a'), s("q1"));
        dfa.add_accepting(s("q2"));

        let minimized = dfa.minimize().unwrap();

        assert_eq!(minimized.states(), &states(&["q0", "q2"]));
        assert_eq!(minimized.transition(&s("q0"), &t('a')), None);
        assert_eq!(minimized.alphabet(), dfa.alphabet());
    }

    #[test]
    fn test_minimize_empty_language() {
        let mut dfa = Dfa::new(s("q0"));
        dfa.add_transition(s("q0"), t('a'), s("q1"));
        dfa.add_transition(s("q1"), t('a'), s("q0"));
        assert!(dfa.is_language_empty());

        let minimized = dfa.minimize().unwrap();

        assert_eq!(minimized.states(), &states(&["q0"]));
        assert!(minimized.accepting().is_empty());
        assert_eq!(minimized.transitions().count(), 0);
    }

    #[test]
    fn test_minimize_merges_accepting_states() {
        // a* with the accepting loop unrolled over three states.
        let mut dfa = Dfa::new(s("p"));
        dfa.add_transition(s("p"), t('a'), s("q"));
        dfa.add_transition(s("q"), t('a'), s("r"));
        dfa.add_transition(s("r"), t('a'), s("p"));
        for name in ["p", "q", "r"] {
            dfa.add_accepting(s(name));
        }

        let minimized = dfa.minimize().unwrap();

        assert_eq!(minimized.states(), &states(&["p"]));
        assert_eq!(minimized.transition(&s("p"), &t('a')), Some(&s("p")));
        assert!(minimized.is_accepting(&s("p")));
    }

    #[test]
    fn test_minimize_rejects_malformed_input() {
        let mut dfa = ends_in_01();
        dfa.accepting.insert(s("ghost"));
        assert!(matches!(dfa.minimize(), Err(Error::MalformedInput(_))));
        assert!(matches!(
            dfa.remove_unreachable_states(),
            Err(Error::MalformedInput(_))
        ));
    }

    #[test]
    fn test_dfa_to_nfa_rejects_malformed_input() {
        let mut dfa = ends_in_01();
        dfa.alphabet.remove(&t('1'));
        assert!(matches!(crate::dfa_to_nfa(&dfa), Err(Error::MalformedInput(_))));

        let mut dfa = ends_in_01();
        dfa.start = s("ghost");
        assert!(matches!(crate::dfa_to_nfa(&dfa), Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_to_nfa() {
        let dfa = ends_in_01();
        let nfa = dfa.to_nfa();

        assert_eq!(nfa.states(), dfa.states());
        assert_eq!(nfa.alphabet(), dfa.alphabet());
        assert_eq!(nfa.start(), dfa.start());
        assert_eq!(nfa.accepting(), dfa.accepting());
        assert_eq!(nfa.transitions().count(), dfa.transitions().count());
        assert!(nfa.transitions().all(|(_, label, _)| !label.is_epsilon()));
        for text in ["01", "1101", "10", ""] {
            assert_eq!(nfa.accepts(&word(text)), dfa.accepts(&word(text)));
        }
    }

    #[test]
    fn test_is_isomorphic() {
        let minimized = ends_in_01().minimize().unwrap();

        let mut renamed = Dfa::new(s("a"));
        renamed.add_transition(s("a"), t('0'), s("b"));
        renamed.add_transition(s("a"), t('1'), s("a"));
        renamed.add_transition(s("b"), t('0'), s("b"));
        renamed.add_transition(s("b"), t('1'), s("c"));
        renamed.add_transition(s("c"), t('0'), s("b"));
        renamed.add_transition(s("c"), t('1'), s("a"));
        renamed.add_accepting(s("c"));

        assert!(minimized.is_isomorphic(&renamed));
        assert!(renamed.is_isomorphic(&minimized));

        renamed.add_accepting(s("a"));
        assert!(!minimized.is_isomorphic(&renamed));
    }

    #[test]
    fn test_is_isomorphic_rejects_merged_targets() {
        // Same shape from the start, but `left` keeps two distinct targets
        // where `right` reuses one.
        let mut left = Dfa::new(s("0"));
        left.add_transition(s("0"), t('a'), s("1"));
        left.add_transition(s("0"), t('b'), s("2"));
        let mut right = Dfa::new(s("0"));
        right.add_transition(s("0"), t('a'), s("1"));
        right.add_transition(s("0"), t('b'), s("1"));

        assert!(!left.is_isomorphic(&right));
        assert!(!right.is_isomorphic(&left));
    }
}
