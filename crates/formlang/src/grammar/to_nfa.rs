//! Right-linear grammar to NFA conversion.

use super::{Grammar, display_body};
use crate::automaton::Nfa;
use crate::error::{Error, Result};
use crate::state::State;
use crate::symbol::{Nonterminal, Symbol, Terminal};
use tracing::debug;

/// The accepting state every terminal-only production ends in.
const FINAL: State = State::Fresh(0);

fn nonterminal_state(nonterminal: &Nonterminal) -> State {
    State::named(nonterminal.as_str())
}

/// Split a right-linear body into its terminal prefix and optional tail.
fn split_right_linear(body: &[Symbol]) -> Option<(Vec<&Terminal>, Option<&Nonterminal>)> {
    let (prefix, tail) = match body.split_last() {
        Some((Symbol::Nonterminal(n), rest)) => (rest, Some(n)),
        _ => (body, None),
    };
    let terminals = prefix
        .iter()
        .map(Symbol::as_terminal)
        .collect::<Option<Vec<_>>>()?;
    Some((terminals, tail))
}

impl Grammar {
    /// Build an NFA accepting the language of a right-linear grammar.
    ///
    /// Each nonterminal `A` becomes the state `Named(A)`. A production
    /// `A -> t1 .. tk B` becomes a chain of fresh states on `t1 .. tk` ending
    /// at `Named(B)`; without the tail nonterminal the chain ends at the final
    /// state `Fresh(0)`. `A -> ε` makes `Named(A)` accepting and the unit
    /// production `A -> B` becomes an ε-transition.
    pub fn to_nfa(&self) -> Result<Nfa> {
        self.validate()?;

        let mut nfa = Nfa::new(nonterminal_state(&self.start));
        for nonterminal in &self.nonterminals {
            nfa.add_state(nonterminal_state(nonterminal));
        }
        for terminal in &self.terminals {
            nfa.add_symbol(terminal.clone());
        }
        nfa.add_accepting(FINAL);

        let mut next_fresh = 1;
        for (head, body) in self.productions() {
            let source = nonterminal_state(head);
            let Some((terminals, tail)) = split_right_linear(body) else {
                return Err(Error::NotRegularGrammar {
                    head: head.clone(),
                    body: display_body(body),
                });
            };
            let end = tail.map_or(FINAL, nonterminal_state);

            match terminals.split_last() {
                None => match tail {
                    Some(_) => nfa.add_epsilon_transition(source, end),
                    None => nfa.add_accepting(source),
                },
                Some((last, chain)) => {
                    let mut current = source;
                    for terminal in chain {
                        let fresh = State::Fresh(next_fresh);
                        next_fresh += 1;
                        nfa.add_transition(current, *terminal, fresh.clone());
                        current = fresh;
                    }
                    nfa.add_transition(current, *last, end);
                }
            }
        }

        debug!(
            "Grammar to NFA: {} productions, {} states",
            self.production_count(),
            nfa.states().len()
        );
        Ok(nfa)
    }
}
