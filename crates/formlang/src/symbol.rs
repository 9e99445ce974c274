//! Symbol types for grammars and automaton transitions.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A terminal symbol. Automaton alphabets are sets of terminals.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Terminal(String);

impl Terminal {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Terminal {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<char> for Terminal {
    fn from(c: char) -> Self {
        Self(c.to_string())
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A nonterminal symbol of a grammar.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Nonterminal(String);

impl Nonterminal {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Nonterminal {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Nonterminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A grammar symbol, tagged as terminal or nonterminal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Symbol {
    Terminal(Terminal),
    Nonterminal(Nonterminal),
}

impl Symbol {
    pub fn terminal(name: impl Into<String>) -> Self {
        Symbol::Terminal(Terminal::new(name))
    }

    pub fn nonterminal(name: impl Into<String>) -> Self {
        Symbol::Nonterminal(Nonterminal::new(name))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }

    pub fn as_terminal(&self) -> Option<&Terminal> {
        match self {
            Symbol::Terminal(t) => Some(t),
            Symbol::Nonterminal(_) => None,
        }
    }

    pub fn as_nonterminal(&self) -> Option<&Nonterminal> {
        match self {
            Symbol::Terminal(_) => None,
            Symbol::Nonterminal(n) => Some(n),
        }
    }
}

impl From<Terminal> for Symbol {
    fn from(t: Terminal) -> Self {
        Symbol::Terminal(t)
    }
}

impl From<Nonterminal> for Symbol {
    fn from(n: Nonterminal) -> Self {
        Symbol::Nonterminal(n)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Terminal(t) => t.fmt(f),
            Symbol::Nonterminal(n) => n.fmt(f),
        }
    }
}

/// Label of an NFA transition: a terminal, or the silent epsilon move.
///
/// Epsilon exists only here; it is never a grammar symbol and never part of
/// an alphabet.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Label {
    Epsilon,
    Terminal(Terminal),
}

impl Label {
    pub fn is_epsilon(&self) -> bool {
        matches!(self, Label::Epsilon)
    }

    pub fn as_terminal(&self) -> Option<&Terminal> {
        match self {
            Label::Epsilon => None,
            Label::Terminal(t) => Some(t),
        }
    }
}

impl From<Terminal> for Label {
    fn from(t: Terminal) -> Self {
        Label::Terminal(t)
    }
}

impl From<&Terminal> for Label {
    fn from(t: &Terminal) -> Self {
        Label::Terminal(t.clone())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Epsilon => f.write_str("ε"),
            Label::Terminal(t) => t.fmt(f),
        }
    }
}

/// Dense symbol index used by the indexed automata.
pub(crate) type SymbolId = u32;

/// Symbol index reserved for epsilon transitions.
pub(crate) const EPSILON: SymbolId = u32::MAX;

#[inline]
pub(crate) fn is_epsilon(symbol: SymbolId) -> bool {
    symbol == EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epsilon() {
        assert!(is_epsilon(EPSILON));
        assert!(!is_epsilon(0));
        assert!(!is_epsilon(100));
        assert!(Label::Epsilon.is_epsilon());
        assert!(!Label::from(Terminal::from('a')).is_epsilon());
    }

    #[test]
    fn test_symbol_tagging() {
        let a = Symbol::terminal("a");
        let s = Symbol::nonterminal("S");

        assert!(a.is_terminal());
        assert!(!s.is_terminal());
        assert_eq!(a.as_terminal(), Some(&Terminal::from("a")));
        assert_eq!(s.as_nonterminal(), Some(&Nonterminal::from("S")));
        // Same name, different tag.
        assert_ne!(Symbol::terminal("x"), Symbol::nonterminal("x"));
    }

    #[test]
    fn test_epsilon_orders_first() {
        assert!(Label::Epsilon < Label::from(Terminal::from("a")));
        assert_eq!(Label::Epsilon.to_string(), "ε");
    }
}
