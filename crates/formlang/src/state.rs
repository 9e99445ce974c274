//! State types for automata.

use fixedbitset::FixedBitSet;
use indexmap::IndexSet;
use std::collections::BTreeSet;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An automaton state identifier.
///
/// States are opaque values compared structurally. The derived ordering is
/// total, which gives every set of states a canonical form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum State {
    /// A caller-chosen name.
    Named(String),
    /// A state generated during grammar to NFA conversion.
    Fresh(u32),
    /// A set of states, produced by subset construction.
    Subset(BTreeSet<State>),
}

impl State {
    pub fn named(name: impl Into<String>) -> Self {
        State::Named(name.into())
    }

    pub fn subset(states: impl IntoIterator<Item = State>) -> Self {
        State::Subset(states.into_iter().collect())
    }

    /// The underlying states of a subset state.
    pub fn members(&self) -> Option<&BTreeSet<State>> {
        match self {
            State::Subset(members) => Some(members),
            _ => None,
        }
    }
}

impl From<&str> for State {
    fn from(name: &str) -> Self {
        State::named(name)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Named(name) => f.write_str(name),
            State::Fresh(n) => write!(f, "#{n}"),
            State::Subset(members) => {
                f.write_str("{")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{member}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// A dense state index, valid within one [`StateArena`].
pub type StateId = u32;

/// Assigns dense indices to the states of one automaton.
///
/// States are interned in the order given; when that order is ascending,
/// index order and state order agree.
#[derive(Debug, Clone, Default)]
pub(crate) struct StateArena {
    states: IndexSet<State>,
}

impl StateArena {
    pub(crate) fn new<'a>(states: impl IntoIterator<Item = &'a State>) -> Self {
        Self {
            states: states.into_iter().cloned().collect(),
        }
    }

    pub(crate) fn id(&self, state: &State) -> Option<StateId> {
        self.states.get_index_of(state).map(|i| i as StateId)
    }

    pub(crate) fn state(&self, id: StateId) -> Option<&State> {
        self.states.get_index(id as usize)
    }

    pub(crate) fn len(&self) -> usize {
        self.states.len()
    }
}

/// A set of states implemented using a fixed-size bit set for efficiency.
#[derive(Clone, PartialEq, Eq, Hash)]
pub(crate) struct StateSet {
    bits: FixedBitSet,
}

impl StateSet {
    /// Create a new empty state set with the given capacity.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: FixedBitSet::with_capacity(capacity),
        }
    }

    /// Create a state set containing a single state.
    pub(crate) fn singleton(state: StateId, capacity: usize) -> Self {
        let mut set = Self::with_capacity(capacity);
        set.insert(state);
        set
    }

    pub(crate) fn insert(&mut self, state: StateId) {
        let idx = state as usize;
        if idx >= self.bits.len() {
            self.bits.grow(idx + 1);
        }
        self.bits.insert(idx);
    }

    pub(crate) fn contains(&self, state: StateId) -> bool {
        let idx = state as usize;
        idx < self.bits.len() && self.bits.contains(idx)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.bits.is_clear()
    }

    pub(crate) fn len(&self) -> usize {
        self.bits.count_ones(..)
    }

    /// Iterate over all states in ascending order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = StateId> + '_ {
        self.bits.ones().map(|i| i as StateId)
    }

    /// Union this set with another, modifying self in place.
    pub(crate) fn union_with(&mut self, other: &StateSet) {
        if other.bits.len() > self.bits.len() {
            self.bits.grow(other.bits.len());
        }
        self.bits.union_with(&other.bits);
    }

    pub(crate) fn intersects(&self, other: &StateSet) -> bool {
        self.bits.intersection(&other.bits).next().is_some()
    }

    /// Canonical representation for hashing (as a sorted vec).
    pub(crate) fn to_vec(&self) -> Vec<StateId> {
        self.iter().collect()
    }
}

impl fmt::Debug for StateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<StateId> for StateSet {
    fn from_iter<I: IntoIterator<Item = StateId>>(iter: I) -> Self {
        let mut set = Self::with_capacity(0);
        for state in iter {
            set.insert(state);
        }
        set
    }
}
