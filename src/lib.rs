//! # prefix-tables
//!
//! String-keyed symbol tables backed by prefix trees.
//!
//! Two representations share one contract ([`SymbolTable`]):
//!
//! - [`WideTrie`]: one child slot per alphabet character. Branching is a
//!   single array index, but every node pays for `R` links.
//! - [`TernarySearchTree`]: one character per node with less/equal/greater
//!   children. Roughly three links per node, at the cost of comparisons.
//!
//! Both support exact lookup, prefix enumeration, wildcard matching and
//! longest-prefix queries.
//!
//! ## Example
//!
//! ```rust
//! use prefix_tables::TernarySearchTree;
//!
//! let mut tst: TernarySearchTree<u32> = TernarySearchTree::new();
//! tst.insert("app", 1);
//! tst.insert("applic", 2);
//! tst.insert("appl", 3);
//!
//! assert_eq!(tst.longest_prefix_of("application"), "applic");
//! assert_eq!(tst.keys_with_prefix("app").collect::<Vec<_>>(), ["app", "appl", "applic"]);
//! assert_eq!(tst.keys_that_match("app."), ["appl"]);
//! assert_eq!(tst.get("ap"), None);
//! ```
//!
//! The wide trie has the same surface, except that insertion can fail for
//! characters outside its alphabet:
//!
//! ```rust
//! use prefix_tables::{Error, WideTrie};
//!
//! let mut trie: WideTrie<u32> = WideTrie::new();
//! trie.insert("appl", 3)?;
//! assert_eq!(trie.get("appl"), Some(&3));
//! assert!(matches!(trie.insert("€", 0), Err(Error::CharOutOfAlphabet { .. })));
//! # Ok::<(), Error>(())
//! ```

#![forbid(unsafe_code)]

mod error;
pub mod tst;
pub mod wide;

pub use error::{Error, Result};
pub use tst::TernarySearchTree;
pub use wide::WideTrie;

// =============================================================================
// Configuration
// =============================================================================

/// Alphabet size of a [`WideTrie`] unless another is chosen (single-byte range).
pub const DEFAULT_RADIX: usize = 256;

/// Pattern character matching any single key character in `keys_that_match`.
pub const WILDCARD: char = '.';

/// The contract shared by both tree representations.
pub trait SymbolTable<V> {
    /// Lazy iterator over stored keys in ascending character order.
    type Keys<'a>: Iterator<Item = String>
    where
        Self: 'a;

    /// Value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<&V>;

    /// Stores `value` under `key`, returning the value it replaces.
    fn insert(&mut self, key: &str, value: V) -> Result<Option<V>>;

    /// Removes `key`, returning its value.
    fn remove(&mut self, key: &str) -> Option<V>;

    /// Number of stored keys.
    fn len(&self) -> usize;

    /// Every stored key starting with `prefix`.
    fn keys_with_prefix<'a>(&'a self, prefix: &str) -> Self::Keys<'a>;

    /// Stored keys of the same length as `pattern` that match it position
    /// by position, [`WILDCARD`] matching any character.
    fn keys_that_match(&self, pattern: &str) -> Vec<String>;

    /// Longest stored key that is a prefix of `s`, or `""`.
    fn longest_prefix_of<'s>(&self, s: &'s str) -> &'s str;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn keys(&self) -> Self::Keys<'_> {
        self.keys_with_prefix("")
    }
}

#[cfg(test)]
mod proptests;
