//! Removal of useless symbols and unit productions.

use super::Grammar;
use crate::error::{Error, Result};
use crate::symbol::{Nonterminal, Symbol, Terminal};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

/// The nonterminal of a unit body `A -> B`.
fn as_unit(body: &[Symbol]) -> Option<&Nonterminal> {
    match body {
        [Symbol::Nonterminal(n)] => Some(n),
        _ => None,
    }
}

impl Grammar {
    /// Nonterminals that derive some terminal string.
    pub(crate) fn generating_nonterminals(&self) -> BTreeSet<Nonterminal> {
        let mut generating = BTreeSet::new();

        loop {
            let mut changed = false;
            for (head, body) in self.productions() {
                if generating.contains(head) {
                    continue;
                }
                let derives = body.iter().all(|symbol| match symbol {
                    Symbol::Terminal(_) => true,
                    Symbol::Nonterminal(n) => generating.contains(n),
                });
                if derives {
                    generating.insert(head.clone());
                    changed = true;
                }
            }
            if !changed {
                return generating;
            }
        }
    }

    /// Whether the start symbol derives at least one terminal string.
    pub fn generates_language(&self) -> bool {
        self.generating_nonterminals().contains(&self.start)
    }

    /// Drop every symbol that cannot be reached from the start symbol, along
    /// with the productions of unreachable nonterminals.
    pub fn remove_unreachable_symbols(&self) -> Result<Grammar> {
        self.validate()?;
        Ok(self.reachable_part())
    }

    /// Drop every nonterminal that derives no terminal string, and every
    /// production mentioning one.
    ///
    /// Fails with [`Error::EmptyLanguage`] when the start symbol itself is
    /// non-generating, including when it has no productions at all.
    pub fn remove_non_generating_symbols(&self) -> Result<Grammar> {
        self.validate()?;
        self.generating_part()
    }

    /// Replace every unit production `A -> B` by the non-unit bodies of all
    /// nonterminals unit-reachable from `A`.
    pub fn remove_unit_productions(&self) -> Result<Grammar> {
        self.validate()?;
        Ok(self.inline_unit_productions())
    }

    fn reachable_part(&self) -> Grammar {
        let mut nonterminals = BTreeSet::from([self.start.clone()]);
        let mut terminals: BTreeSet<Terminal> = BTreeSet::new();
        let mut stack = vec![&self.start];

        while let Some(head) = stack.pop() {
            for body in self.bodies(head).into_iter().flatten() {
                for symbol in body {
                    match symbol {
                        Symbol::Terminal(t) => {
                            terminals.insert(t.clone());
                        }
                        Symbol::Nonterminal(n) => {
                            if nonterminals.insert(n.clone()) {
                                stack.push(n);
                            }
                        }
                    }
                }
            }
        }

        let productions = self
            .productions
            .iter()
            .filter(|(head, _)| nonterminals.contains(*head))
            .map(|(head, bodies)| (head.clone(), bodies.clone()))
            .collect();

        trace!(
            "Unreachable pass kept {} of {} nonterminals",
            nonterminals.len(),
            self.nonterminals.len()
        );

        Grammar {
            nonterminals,
            terminals,
            start: self.start.clone(),
            productions,
        }
    }

    fn generating_part(&self) -> Result<Grammar> {
        let generating = self.generating_nonterminals();
        if !generating.contains(&self.start) {
            return Err(Error::EmptyLanguage(self.start.clone()));
        }

        let mut productions: BTreeMap<Nonterminal, BTreeSet<Vec<Symbol>>> = BTreeMap::new();
        for (head, body) in self.productions() {
            let keep = generating.contains(head)
                && body
                    .iter()
                    .filter_map(Symbol::as_nonterminal)
                    .all(|n| generating.contains(n));
            if keep {
                productions
                    .entry(head.clone())
                    .or_default()
                    .insert(body.to_vec());
            }
        }

        trace!(
            "Non-generating pass kept {} of {} nonterminals",
            generating.len(),
            self.nonterminals.len()
        );

        Ok(Grammar {
            nonterminals: generating,
            terminals: self.terminals.clone(),
            start: self.start.clone(),
            productions,
        })
    }

    fn inline_unit_productions(&self) -> Grammar {
        let mut productions: BTreeMap<Nonterminal, BTreeSet<Vec<Symbol>>> = BTreeMap::new();

        for head in &self.nonterminals {
            // Unit closure of `head`, including itself.
            let mut closure = BTreeSet::from([head]);
            let mut stack = vec![head];
            while let Some(current) = stack.pop() {
                for body in self.bodies(current).into_iter().flatten() {
                    if let Some(next) = as_unit(body) {
                        if closure.insert(next) {
                            stack.push(next);
                        }
                    }
                }
            }

            let bodies: BTreeSet<Vec<Symbol>> = closure
                .iter()
                .flat_map(|member| self.bodies(member).into_iter().flatten())
                .filter(|body| as_unit(body).is_none())
                .cloned()
                .collect();
            if !bodies.is_empty() {
                productions.insert(head.clone(), bodies);
            }
        }

        Grammar {
            nonterminals: self.nonterminals.clone(),
            terminals: self.terminals.clone(),
            start: self.start.clone(),
            productions,
        }
    }

    /// Remove useless symbols and unit productions.
    ///
    /// Passes run in a fixed order: non-generating symbols, unreachable
    /// symbols, unit productions, then unreachable symbols again, since
    /// inlining unit productions can orphan nonterminals.
    pub fn minimize(&self) -> Result<Grammar> {
        self.validate()?;
        debug!(
            "Minimizing grammar: {} nonterminals, {} productions",
            self.nonterminals.len(),
            self.production_count()
        );

        let minimized = self
            .generating_part()?
            .reachable_part()
            .inline_unit_productions()
            .reachable_part();

        debug!(
            "Minimized grammar: {} nonterminals, {} productions",
            minimized.nonterminals.len(),
            minimized.production_count()
        );
        Ok(minimized)
    }
}
