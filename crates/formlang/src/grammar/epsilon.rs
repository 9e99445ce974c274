//! Nullable nonterminals and ε-production removal.

use super::Grammar;
use crate::error::Result;
use crate::symbol::{Nonterminal, Symbol};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Every variant of `body` obtained by omitting some subset of its nullable
/// occurrences.
fn expand_nullable(body: &[Symbol], nullable: &BTreeSet<Nonterminal>) -> Vec<Vec<Symbol>> {
    let mut variants = vec![Vec::new()];
    for symbol in body {
        let optional = symbol.as_nonterminal().is_some_and(|n| nullable.contains(n));
        let without = if optional { variants.clone() } else { Vec::new() };
        for variant in &mut variants {
            variant.push(symbol.clone());
        }
        variants.extend(without);
    }
    variants
}

impl Grammar {
    /// Nonterminals that derive the empty string.
    pub fn nullable_nonterminals(&self) -> BTreeSet<Nonterminal> {
        let mut nullable = BTreeSet::new();

        loop {
            let mut changed = false;
            for (head, body) in self.productions() {
                if nullable.contains(head) {
                    continue;
                }
                let vanishes = body
                    .iter()
                    .all(|symbol| symbol.as_nonterminal().is_some_and(|n| nullable.contains(n)));
                if vanishes {
                    nullable.insert(head.clone());
                    changed = true;
                }
            }
            if !changed {
                return nullable;
            }
        }
    }

    /// Eliminate ε-productions while preserving the language.
    ///
    /// When the start symbol is nullable, a fresh start symbol `S'` with
    /// `S' -> S | ε` is introduced, so the empty string stays in the language.
    pub fn remove_epsilon_productions(&self) -> Result<Grammar> {
        self.validate()?;
        let nullable = self.nullable_nonterminals();
        let mut productions: BTreeMap<Nonterminal, BTreeSet<Vec<Symbol>>> = BTreeMap::new();

        for (head, body) in self.productions() {
            for variant in expand_nullable(body, &nullable) {
                let trivial = matches!(variant.as_slice(), [Symbol::Nonterminal(n)] if n == head);
                if !variant.is_empty() && !trivial {
                    productions.entry(head.clone()).or_default().insert(variant);
                }
            }
        }

        let mut nonterminals = self.nonterminals.clone();
        let mut start = self.start.clone();
        if nullable.contains(&self.start) {
            let fresh = self.fresh_nonterminal(&self.start);
            productions.insert(
                fresh.clone(),
                BTreeSet::from([vec![Symbol::Nonterminal(self.start.clone())], Vec::new()]),
            );
            nonterminals.insert(fresh.clone());
            start = fresh;
        }

        debug!(
            "Removed ε-productions: {} nullable nonterminals",
            nullable.len()
        );

        Ok(Grammar {
            nonterminals,
            terminals: self.terminals.clone(),
            start,
            productions,
        })
    }

    /// A nonterminal named after `base` that is not used by the grammar.
    fn fresh_nonterminal(&self, base: &Nonterminal) -> Nonterminal {
        let mut name = base.as_str().to_owned();
        loop {
            name.push('\'');
            let taken = self.nonterminals.contains(&Nonterminal::new(name.as_str()))
                || self.terminals.iter().any(|t| t.as_str() == name);
            if !taken {
                return Nonterminal::new(name);
            }
        }
    }
}
