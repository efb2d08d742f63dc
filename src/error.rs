//! Error types for the prefix tables.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by fallible table operations.
///
/// Lookups never fail: a key that cannot be stored is simply absent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A key character has no child slot in a [`WideTrie`](crate::WideTrie).
    #[error("character {ch:?} at position {index} is outside the alphabet of {radix} characters")]
    CharOutOfAlphabet {
        /// The offending character.
        ch: char,
        /// Character (not byte) position within the key.
        index: usize,
        /// Alphabet size of the trie.
        radix: usize,
    },
}
