//! Finite automata.
//!
//! This module provides:
//! - Epsilon-NFAs with closure and move operations
//! - Subset construction (NFA to DFA conversion)
//! - DFA minimization by partition refinement
//! - DFA to NFA conversion

pub(crate) mod dfa;
mod epsilon_nfa;
pub(crate) mod nfa;
mod partition;
mod subset_construction;

pub use dfa::Dfa;
pub use nfa::Nfa;
pub use partition::Partition;
