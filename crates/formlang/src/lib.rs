//! Grammars and finite automata.
//!
//! The crate converts between right-linear grammars, NFAs and DFAs and
//! minimizes DFAs and context-free grammars:
//!
//! ```text
//! Grammar --to_nfa--> Nfa --to_dfa--> Dfa --minimize--> Dfa --to_nfa--> Nfa
//! ```
//!
//! Every conversion is a pure function: it validates its input, never mutates
//! it, and returns a new value or an [`Error`].

mod automaton;
mod error;
mod grammar;
mod state;
mod symbol;

pub use automaton::{Dfa, Nfa, Partition};
pub use error::{Error, Result};
pub use grammar::{Grammar, GrammarClass};
pub use state::{State, StateId};
pub use symbol::{Label, Nonterminal, Symbol, Terminal};

/// Build an NFA for a right-linear grammar.
pub fn grammar_to_nfa(grammar: &Grammar) -> Result<Nfa> {
    grammar.to_nfa()
}

/// Determinize an NFA by subset construction.
pub fn nfa_to_dfa(nfa: &Nfa) -> Result<Dfa> {
    nfa.to_dfa()
}

/// Minimize a DFA by partition refinement.
pub fn minimize_dfa(dfa: &Dfa) -> Result<Dfa> {
    dfa.minimize()
}

/// View a DFA as an NFA without ε-transitions.
pub fn dfa_to_nfa(dfa: &Dfa) -> Result<Nfa> {
    dfa.validate()?;
    Ok(dfa.to_nfa())
}

/// Remove useless symbols and unit productions from a grammar.
pub fn minimize_grammar(grammar: &Grammar) -> Result<Grammar> {
    grammar.minimize()
}
