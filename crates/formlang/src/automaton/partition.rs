//! Partition refinement over dense state indices.
//!
//! A [`Partition`] splits the states `0..n` into disjoint blocks. Refinement
//! is Moore-style: every pass computes a signature for all states against the
//! current partition at once and splits each block by signature. Because a
//! signature always includes the state's current block, blocks only ever
//! split, and a pass that produces no new block is a fixpoint.

use crate::state::StateId;
use indexmap::IndexMap;
use std::hash::Hash;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Block index of every state.
    block_of: Vec<usize>,
    /// Members of every block, ascending. Blocks are ordered by first member.
    blocks: Vec<Vec<StateId>>,
}

impl Partition {
    /// Create the initial partition of `len` states, grouping states with
    /// equal keys into the same block.
    pub fn new<K: Hash + Eq>(len: usize, key: impl Fn(StateId) -> K) -> Self {
        Self::from_keys((0..len as StateId).map(key))
    }

    fn from_keys<K: Hash + Eq>(keys: impl IntoIterator<Item = K>) -> Self {
        let mut index: IndexMap<K, usize> = IndexMap::new();
        let mut block_of = Vec::new();
        let mut blocks: Vec<Vec<StateId>> = Vec::new();

        for (state, key) in keys.into_iter().enumerate() {
            let fresh = index.len();
            let block = *index.entry(key).or_insert(fresh);
            if block == blocks.len() {
                blocks.push(Vec::new());
            }
            blocks[block].push(state as StateId);
            block_of.push(block);
        }

        Self { block_of, blocks }
    }

    /// Run one refinement pass. Returns whether any block was split.
    pub fn refine<K: Hash + Eq>(&mut self, signature: impl Fn(StateId, &Partition) -> K) -> bool {
        let keys: Vec<(usize, K)> = (0..self.block_of.len())
            .map(|state| (self.block_of[state], signature(state as StateId, self)))
            .collect();
        let refined = Self::from_keys(keys);
        let split = refined.blocks.len() > self.blocks.len();
        *self = refined;
        split
    }

    /// Refine until a pass splits nothing. Returns the number of passes run,
    /// including the final stable one.
    pub fn refine_until_stable<K: Hash + Eq>(
        &mut self,
        signature: impl Fn(StateId, &Partition) -> K,
    ) -> usize {
        let mut passes = 1;
        while self.refine(&signature) {
            trace!("Partition pass {}: {} blocks", passes, self.blocks.len());
            passes += 1;
        }
        passes
    }

    /// The block index of a state.
    pub fn block_of(&self, state: StateId) -> usize {
        self.block_of[state as usize]
    }

    pub fn blocks(&self) -> &[Vec<StateId>] {
        &self.blocks
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn are_equivalent(&self, a: StateId, b: StateId) -> bool {
        self.block_of(a) == self.block_of(b)
    }
}
