//! Subset construction algorithm for converting ε-NFA to DFA.

use crate::automaton::dfa::Dfa;
use crate::automaton::epsilon_nfa::EpsilonNfa;
use crate::automaton::nfa::Nfa;
use crate::error::Result;
use crate::state::{State, StateId, StateSet};
use crate::symbol::SymbolId;
use indexmap::IndexMap;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Convert an epsilon-NFA to a DFA using the powerset construction algorithm.
///
/// Every DFA state is [`State::Subset`] of the NFA states it stands for, so
/// equal NFAs always produce equal DFAs. Symbols with no successor subset get
/// no transition.
pub fn subset_construction(nfa: &Nfa) -> Result<Dfa> {
    let nfa = EpsilonNfa::from_nfa(nfa)?;
    debug!(
        "Subset construction over {} NFA states, {} symbols",
        nfa.num_states(),
        nfa.alphabet().len()
    );

    // Discovered subsets, keyed by their sorted state ids.
    let mut discovered: IndexMap<Vec<StateId>, State> = IndexMap::new();

    // Initial DFA state is the epsilon closure of the NFA start state
    let initial = nfa.epsilon_closure(&StateSet::singleton(nfa.start(), nfa.num_states()));
    let initial_state = nfa.subset_state(&initial);

    let mut dfa = Dfa::new(initial_state.clone());
    for symbol in nfa.alphabet() {
        dfa.add_symbol(symbol.clone());
    }
    if initial.intersects(nfa.final_states()) {
        dfa.add_accepting(initial_state.clone());
    }

    discovered.insert(initial.to_vec(), initial_state.clone());
    let mut worklist = VecDeque::from([(initial, initial_state)]);

    while let Some((current, source)) = worklist.pop_front() {
        for (id, symbol) in nfa.alphabet().iter().enumerate() {
            let next = nfa.move_on_symbol(&current, id as SymbolId);
            if next.is_empty() {
                continue;
            }

            let key = next.to_vec();
            let target = match discovered.get(&key) {
                Some(existing) => existing.clone(),
                None => {
                    let state = nfa.subset_state(&next);
                    trace!("DFA state #{}: {} NFA states", discovered.len(), next.len());
                    if next.intersects(nfa.final_states()) {
                        dfa.add_accepting(state.clone());
                    }
                    discovered.insert(key, state.clone());
                    worklist.push_back((next, state.clone()));
                    state
                }
            };

            dfa.add_transition(source.clone(), symbol.clone(), target);
        }
    }

    debug!("Subset construction produced {} DFA states", discovered.len());
    Ok(dfa)
}
