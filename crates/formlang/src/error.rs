//! Error types shared by every conversion.

use crate::symbol::Nonterminal;

/// Errors reported by the conversions and minimizations of this crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A structural invariant of the input does not hold.
    #[error("malformed input: {0}")]
    MalformedInput(String),
    /// A production cannot be expressed by a right-linear automaton.
    #[error("production {head} -> {body} is not right-linear")]
    NotRegularGrammar { head: Nonterminal, body: String },
    /// The start symbol derives no terminal string.
    ///
    /// This is a legitimate outcome for some callers; it is never reported for
    /// malformed input.
    #[error("start symbol {0} generates no terminal string")]
    EmptyLanguage(Nonterminal),
}

impl Error {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedInput(message.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
