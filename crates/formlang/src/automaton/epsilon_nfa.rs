//! Indexed epsilon-NFA used by subset construction.
//!
//! States and symbols of an [`Nfa`] are renumbered densely so that state sets
//! become bit sets and transition lookups become integer-keyed.

use crate::automaton::nfa::Nfa;
use crate::error::{Error, Result};
use crate::state::{State, StateArena, StateId, StateSet};
use crate::symbol::{EPSILON, Label, SymbolId, Terminal, is_epsilon};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub(crate) struct EpsilonNfa {
    /// Dense numbering of the states, in ascending state order.
    states: StateArena,
    /// Alphabet in ascending order; a symbol's id is its position.
    alphabet: Vec<Terminal>,
    start: StateId,
    final_states: StateSet,
    /// Transitions: (source, symbol) -> set of destination states.
    /// For epsilon transitions, symbol == EPSILON.
    transitions: HashMap<(StateId, SymbolId), StateSet>,
}

impl EpsilonNfa {
    /// Renumber `nfa`. Fails if it references undeclared states or symbols.
    pub(crate) fn from_nfa(nfa: &Nfa) -> Result<Self> {
        let states = StateArena::new(nfa.states());
        let alphabet: Vec<Terminal> = nfa.alphabet().iter().cloned().collect();
        let symbol_ids: HashMap<&Terminal, SymbolId> = alphabet
            .iter()
            .enumerate()
            .map(|(i, symbol)| (symbol, i as SymbolId))
            .collect();
        let lookup = |state: &State| {
            states
                .id(state)
                .ok_or_else(|| Error::malformed(format!("state {state} is not declared")))
        };

        let start = lookup(nfa.start())?;
        let mut final_states = StateSet::with_capacity(states.len());
        for state in nfa.accepting() {
            final_states.insert(lookup(state)?);
        }

        let mut transitions: HashMap<(StateId, SymbolId), StateSet> = HashMap::new();
        for (source, label, destination) in nfa.transitions() {
            let symbol = match label {
                Label::Epsilon => EPSILON,
                Label::Terminal(t) => *symbol_ids.get(t).ok_or_else(|| {
                    Error::malformed(format!("symbol {t} is not in the alphabet"))
                })?,
            };
            transitions
                .entry((lookup(source)?, symbol))
                .or_insert_with(|| StateSet::with_capacity(states.len()))
                .insert(lookup(destination)?);
        }

        Ok(Self {
            states,
            alphabet,
            start,
            final_states,
            transitions,
        })
    }

    pub(crate) fn num_states(&self) -> usize {
        self.states.len()
    }

    pub(crate) fn start(&self) -> StateId {
        self.start
    }

    pub(crate) fn final_states(&self) -> &StateSet {
        &self.final_states
    }

    pub(crate) fn alphabet(&self) -> &[Terminal] {
        &self.alphabet
    }

    /// Get the epsilon closure of a set of states.
    pub(crate) fn epsilon_closure(&self, states: &StateSet) -> StateSet {
        let mut closure = StateSet::with_capacity(self.num_states());
        let mut stack: Vec<StateId> = states.iter().collect();

        while let Some(s) = stack.pop() {
            if closure.contains(s) {
                continue;
            }
            closure.insert(s);

            if let Some(destinations) = self.transitions.get(&(s, EPSILON)) {
                stack.extend(destinations.iter().filter(|&d| !closure.contains(d)));
            }
        }

        closure
    }

    /// Get the states reachable from a set of states on a given symbol.
    /// Returns the epsilon closure of the reached states.
    pub(crate) fn move_on_symbol(&self, states: &StateSet, symbol: SymbolId) -> StateSet {
        debug_assert!(!is_epsilon(symbol), "use epsilon_closure for epsilon moves");

        let mut reached = StateSet::with_capacity(self.num_states());
        for state in states.iter() {
            if let Some(destinations) = self.transitions.get(&(state, symbol)) {
                reached.union_with(destinations);
            }
        }

        self.epsilon_closure(&reached)
    }

    /// The canonical DFA state for a set of NFA states.
    pub(crate) fn subset_state(&self, set: &StateSet) -> State {
        State::Subset(
            set.iter()
                .filter_map(|id| self.states.state(id))
                .cloned()
                .collect(),
        )
    }
}
