//! Context-free grammars.
//!
//! A [`Grammar`] is a value: every transformation in this module returns a
//! new grammar and leaves its input untouched.

mod epsilon;
mod minimize;
mod to_nfa;

use crate::error::{Error, Result};
use crate::symbol::{Nonterminal, Symbol, Terminal};
use std::collections::{BTreeMap, BTreeSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Shape of a grammar's productions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarClass {
    /// Every body is `t1 .. tk` or `t1 .. tk B`.
    RightLinear,
    /// Every body is `t1 .. tk` or `B t1 .. tk`, and some body is not
    /// right-linear.
    LeftLinear,
    /// Any other context-free grammar.
    ContextFree,
}

/// A context-free grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Grammar {
    nonterminals: BTreeSet<Nonterminal>,
    terminals: BTreeSet<Terminal>,
    start: Nonterminal,
    /// Bodies of every head. Heads without bodies have no entry.
    productions: BTreeMap<Nonterminal, BTreeSet<Vec<Symbol>>>,
}

impl Grammar {
    /// Create a grammar with only a start symbol and no productions.
    pub fn new(start: impl Into<Nonterminal>) -> Self {
        let start = start.into();
        Self {
            nonterminals: BTreeSet::from([start.clone()]),
            terminals: BTreeSet::new(),
            start,
            productions: BTreeMap::new(),
        }
    }

    /// Build a grammar from caller-supplied sets, checking every invariant.
    pub fn from_parts(
        nonterminals: impl IntoIterator<Item = Nonterminal>,
        terminals: impl IntoIterator<Item = Terminal>,
        start: Nonterminal,
        productions: impl IntoIterator<Item = (Nonterminal, Vec<Symbol>)>,
    ) -> Result<Self> {
        let mut grammar = Self {
            nonterminals: nonterminals.into_iter().collect(),
            terminals: terminals.into_iter().collect(),
            start,
            productions: BTreeMap::new(),
        };
        for (head, body) in productions {
            grammar.productions.entry(head).or_default().insert(body);
        }
        grammar.validate()?;
        Ok(grammar)
    }

    pub fn add_nonterminal(&mut self, nonterminal: impl Into<Nonterminal>) {
        self.nonterminals.insert(nonterminal.into());
    }

    pub fn add_terminal(&mut self, terminal: impl Into<Terminal>) {
        self.terminals.insert(terminal.into());
    }

    /// Add `head -> body`, declaring every symbol it mentions.
    pub fn add_production(
        &mut self,
        head: impl Into<Nonterminal>,
        body: impl IntoIterator<Item = Symbol>,
    ) {
        let head = head.into();
        let body: Vec<Symbol> = body.into_iter().collect();
        for symbol in &body {
            match symbol {
                Symbol::Terminal(t) => {
                    self.terminals.insert(t.clone());
                }
                Symbol::Nonterminal(n) => {
                    self.nonterminals.insert(n.clone());
                }
            }
        }
        self.nonterminals.insert(head.clone());
        self.productions.entry(head).or_default().insert(body);
    }

    pub fn nonterminals(&self) -> &BTreeSet<Nonterminal> {
        &self.nonterminals
    }

    pub fn terminals(&self) -> &BTreeSet<Terminal> {
        &self.terminals
    }

    pub fn start(&self) -> &Nonterminal {
        &self.start
    }

    /// The bodies of `head`, if it has any.
    pub fn bodies(&self, head: &Nonterminal) -> Option<&BTreeSet<Vec<Symbol>>> {
        self.productions.get(head)
    }

    /// All productions as `(head, body)` pairs, in canonical order.
    pub fn productions(&self) -> impl Iterator<Item = (&Nonterminal, &[Symbol])> + '_ {
        self.productions
            .iter()
            .flat_map(|(head, bodies)| bodies.iter().map(move |body| (head, body.as_slice())))
    }

    pub fn production_count(&self) -> usize {
        self.productions.values().map(BTreeSet::len).sum()
    }

    pub fn contains_production(&self, head: &Nonterminal, body: &[Symbol]) -> bool {
        self.productions
            .get(head)
            .is_some_and(|bodies| bodies.contains(body))
    }

    /// Check the structural invariants of the grammar.
    pub fn validate(&self) -> Result<()> {
        if !self.nonterminals.contains(&self.start) {
            return Err(Error::malformed(format!(
                "start symbol {} is not a nonterminal",
                self.start
            )));
        }

        if let Some(terminal) = self
            .terminals
            .iter()
            .find(|t| self.nonterminals.contains(&Nonterminal::new(t.as_str())))
        {
            return Err(Error::malformed(format!(
                "{terminal} is both a terminal and a nonterminal"
            )));
        }

        for (head, body) in self.productions() {
            if !self.nonterminals.contains(head) {
                return Err(Error::malformed(format!(
                    "production head {head} is not a nonterminal"
                )));
            }
            for symbol in body {
                let declared = match symbol {
                    Symbol::Terminal(t) => self.terminals.contains(t),
                    Symbol::Nonterminal(n) => self.nonterminals.contains(n),
                };
                if !declared {
                    return Err(Error::malformed(format!(
                        "symbol {symbol} in {head} -> {} is not declared",
                        display_body(body)
                    )));
                }
            }
        }

        Ok(())
    }

    /// Classify the grammar by the shape of its productions.
    pub fn classify(&self) -> GrammarClass {
        let (right, left) = self
            .productions()
            .map(|(_, body)| linearity(body))
            .fold((true, true), |(right, left), (r, l)| (right && r, left && l));

        if right {
            GrammarClass::RightLinear
        } else if left {
            GrammarClass::LeftLinear
        } else {
            GrammarClass::ContextFree
        }
    }
}

/// Whether a body is right-linear and whether it is left-linear.
fn linearity(body: &[Symbol]) -> (bool, bool) {
    let positions: Vec<usize> = body
        .iter()
        .enumerate()
        .filter(|(_, symbol)| !symbol.is_terminal())
        .map(|(i, _)| i)
        .collect();

    match positions.as_slice() {
        [] => (true, true),
        [i] => (*i + 1 == body.len(), *i == 0),
        _ => (false, false),
    }
}

pub(crate) fn display_body(body: &[Symbol]) -> String {
    if body.is_empty() {
        return "ε".to_string();
    }
    body.iter()
        .map(Symbol::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
