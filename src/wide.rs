//! Wide (R-way) trie.
//!
//! Every node owns a heap slice of `R` child links indexed by character
//! code, plus an optional value. Branching on a character is a single array
//! index, at the cost of `R` links per node whether or not they are used.
//!
//! Invariant: a retained node either holds a value or has at least one
//! child. [`WideTrie::remove`] prunes nodes that stop satisfying it.

use std::fmt;

use tracing::{debug, trace};

use crate::{Error, Result, SymbolTable, DEFAULT_RADIX, WILDCARD};

type Link<V, const R: usize> = Option<Box<Node<V, R>>>;

#[derive(Clone)]
struct Node<V, const R: usize> {
    value: Option<V>,
    /// Exactly `R` slots, collected on the heap with no stack temporary.
    children: Box<[Link<V, R>]>,
}

impl<V, const R: usize> Node<V, R> {
    fn new() -> Box<Self> {
        Box::new(Self {
            value: None,
            children: (0..R).map(|_| None).collect(),
        })
    }

    #[inline]
    fn child(&self, ch: char) -> Option<&Self> {
        self.children[slot::<R>(ch)?].as_deref()
    }

    /// Neither a value holder nor an ancestor of one.
    fn is_dead(&self) -> bool {
        self.value.is_none() && self.children.iter().all(Option::is_none)
    }
}

/// Child index of `ch`, or `None` when it lies outside the alphabet.
#[inline]
fn slot<const R: usize>(ch: char) -> Option<usize> {
    let idx = ch as usize;
    (idx < R).then_some(idx)
}

/// A symbol table backed by an R-way trie.
///
/// `R` is the alphabet size: a key may only contain characters whose code is
/// below `R`. The default covers the single-byte range.
///
/// ```rust
/// use prefix_tables::WideTrie;
///
/// let mut trie: WideTrie<u32> = WideTrie::new();
/// trie.insert("she", 0)?;
/// trie.insert("shells", 1)?;
/// trie.insert("the", 2)?;
///
/// assert_eq!(trie.keys_with_prefix("sh").collect::<Vec<_>>(), ["she", "shells"]);
/// assert_eq!(trie.keys_that_match(".he"), ["she", "the"]);
/// assert_eq!(trie.longest_prefix_of("shellsort"), "shells");
///
/// assert_eq!(trie.remove("shells"), Some(1));
/// assert_eq!(trie.longest_prefix_of("shellsort"), "she");
/// # Ok::<(), prefix_tables::Error>(())
/// ```
#[derive(Clone)]
pub struct WideTrie<V, const R: usize = DEFAULT_RADIX> {
    root: Link<V, R>,
    len: usize,
}

impl<V, const R: usize> WideTrie<V, R> {
    /// Creates an empty trie.
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    /// Number of stored keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops every node.
    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// Node reached by consuming all of `key`, value holder or not.
    fn find(&self, key: &str) -> Option<&Node<V, R>> {
        let mut node = self.root.as_deref()?;
        for ch in key.chars() {
            node = node.child(ch)?;
        }
        Some(node)
    }

    fn find_mut(&mut self, key: &str) -> Option<&mut Node<V, R>> {
        let mut node = self.root.as_deref_mut()?;
        for ch in key.chars() {
            node = node.children[slot::<R>(ch)?].as_deref_mut()?;
        }
        Some(node)
    }

    /// Value stored under `key`.
    ///
    /// A key that only exists as a branch towards longer keys has no value.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.find(key)?.value.as_ref()
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.find_mut(key)?.value.as_mut()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Stores `value` under `key`, returning the value it replaces.
    ///
    /// The empty key lives in the root node. Fails without touching the trie
    /// if a character of `key` is outside the alphabet.
    pub fn insert(&mut self, key: &str, value: V) -> Result<Option<V>> {
        let outside = key.chars().enumerate().find(|&(_, ch)| slot::<R>(ch).is_none());
        if let Some((index, ch)) = outside {
            debug!(?ch, index, radix = R, "rejecting key outside the trie alphabet");
            return Err(Error::CharOutOfAlphabet { ch, index, radix: R });
        }

        let (root, old) = Self::insert_recursive(self.root.take(), key, value);
        self.root = Some(root);
        if old.is_none() {
            self.len += 1;
        }
        Ok(old)
    }

    /// Takes ownership of a subtree and hands back its rebuilt root.
    ///
    /// Every character of `key` has already been checked against the alphabet.
    fn insert_recursive(link: Link<V, R>, key: &str, value: V) -> (Box<Node<V, R>>, Option<V>) {
        let mut node = link.unwrap_or_else(Node::new);
        let mut chars = key.chars();
        let old = match chars.next() {
            None => node.value.replace(value),
            Some(ch) => {
                let idx = ch as usize;
                let (child, old) =
                    Self::insert_recursive(node.children[idx].take(), chars.as_str(), value);
                node.children[idx] = Some(child);
                old
            }
        };
        (node, old)
    }

    /// Removes `key`, returning its value.
    ///
    /// Nodes left without a value and without children are pruned on the way
    /// back up, so no dead branch outlives the keys that needed it.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let (root, old) = Self::remove_recursive(self.root.take(), key);
        self.root = root;
        if old.is_some() {
            self.len -= 1;
        }
        old
    }

    fn remove_recursive(link: Link<V, R>, key: &str) -> (Link<V, R>, Option<V>) {
        let Some(mut node) = link else {
            return (None, None);
        };

        let mut chars = key.chars();
        let old = match chars.next() {
            None => node.value.take(),
            Some(ch) => match slot::<R>(ch) {
                Some(idx) => {
                    let (child, old) =
                        Self::remove_recursive(node.children[idx].take(), chars.as_str());
                    node.children[idx] = child;
                    old
                }
                None => None,
            },
        };

        if node.is_dead() {
            trace!(suffix = key, "pruning trie node");
            return (None, old);
        }
        (Some(node), old)
    }

    /// All `(key, value)` pairs in ascending character order.
    pub fn iter(&self) -> Iter<'_, V, R> {
        self.iter_prefix("")
    }

    /// `(key, value)` pairs whose key starts with `prefix`.
    pub fn iter_prefix(&self, prefix: &str) -> Iter<'_, V, R> {
        Iter {
            stack: self.find(prefix).map(|node| (node, prefix.len(), None)).into_iter().collect(),
            key: prefix.to_owned(),
        }
    }

    /// All stored keys in ascending character order.
    pub fn keys(&self) -> Keys<'_, V, R> {
        self.keys_with_prefix("")
    }

    /// Stored keys starting with `prefix`. Each call is a fresh traversal.
    pub fn keys_with_prefix(&self, prefix: &str) -> Keys<'_, V, R> {
        Keys {
            inner: self.iter_prefix(prefix),
        }
    }

    /// Stored keys matching `pattern` position by position, where `.`
    /// matches any character. Only keys of the pattern's length match.
    pub fn keys_that_match(&self, pattern: &str) -> Vec<String> {
        self.keys_that_match_with(pattern, WILDCARD)
    }

    /// [`keys_that_match`](Self::keys_that_match) with a caller-chosen wildcard.
    pub fn keys_that_match_with(&self, pattern: &str, wildcard: char) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(root) = self.root.as_deref() {
            let mut key = String::with_capacity(pattern.len());
            Self::collect_matches(root, pattern, wildcard, &mut key, &mut out);
        }
        out
    }

    fn collect_matches(
        node: &Node<V, R>,
        pattern: &str,
        wildcard: char,
        key: &mut String,
        out: &mut Vec<String>,
    ) {
        let mut rest = pattern.chars();
        let Some(next) = rest.next() else {
            if node.value.is_some() {
                out.push(key.clone());
            }
            return;
        };
        let rest = rest.as_str();

        if next == wildcard {
            for (idx, child) in node.children.iter().enumerate() {
                if let (Some(child), Some(ch)) = (child.as_deref(), char::from_u32(idx as u32)) {
                    Self::descend_match(child, ch, rest, wildcard, key, out);
                }
            }
        } else if let Some(child) = node.child(next) {
            Self::descend_match(child, next, rest, wildcard, key, out);
        }
    }

    fn descend_match(
        child: &Node<V, R>,
        ch: char,
        rest: &str,
        wildcard: char,
        key: &mut String,
        out: &mut Vec<String>,
    ) {
        let len = key.len();
        key.push(ch);
        Self::collect_matches(child, rest, wildcard, key, out);
        key.truncate(len);
    }

    /// Longest stored key that is a prefix of `s`; `""` if there is none.
    pub fn longest_prefix_of<'s>(&self, s: &'s str) -> &'s str {
        let Some(mut node) = self.root.as_deref() else {
            return "";
        };

        let mut best = 0;
        for (pos, ch) in s.char_indices() {
            let Some(child) = node.child(ch) else {
                break;
            };
            node = child;
            if node.value.is_some() {
                best = pos + ch.len_utf8();
            }
        }
        &s[..best]
    }
}

impl<V, const R: usize> Default for WideTrie<V, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug, const R: usize> fmt::Debug for WideTrie<V, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, V, const R: usize> IntoIterator for &'a WideTrie<V, R> {
    type Item = (String, &'a V);
    type IntoIter = Iter<'a, V, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V, const R: usize> SymbolTable<V> for WideTrie<V, R> {
    type Keys<'a>
        = Keys<'a, V, R>
    where
        Self: 'a;

    fn get(&self, key: &str) -> Option<&V> {
        WideTrie::get(self, key)
    }

    fn insert(&mut self, key: &str, value: V) -> Result<Option<V>> {
        WideTrie::insert(self, key, value)
    }

    fn remove(&mut self, key: &str) -> Option<V> {
        WideTrie::remove(self, key)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn keys_with_prefix<'a>(&'a self, prefix: &str) -> Self::Keys<'a> {
        WideTrie::keys_with_prefix(self, prefix)
    }

    fn keys_that_match(&self, pattern: &str) -> Vec<String> {
        WideTrie::keys_that_match(self, pattern)
    }

    fn longest_prefix_of<'s>(&self, s: &'s str) -> &'s str {
        WideTrie::longest_prefix_of(self, s)
    }
}

/// Pending node, key length before its character, and the character itself
/// (`None` for the node the traversal starts from).
type Frame<'a, V, const R: usize> = (&'a Node<V, R>, usize, Option<char>);

/// Pre-order traversal of a subtree, children in ascending index order.
pub struct Iter<'a, V, const R: usize = DEFAULT_RADIX> {
    stack: Vec<Frame<'a, V, R>>,
    key: String,
}

impl<'a, V, const R: usize> Iterator for Iter<'a, V, R> {
    type Item = (String, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, depth, ch)) = self.stack.pop() {
            self.key.truncate(depth);
            if let Some(ch) = ch {
                self.key.push(ch);
            }

            let len = self.key.len();
            for (idx, child) in node.children.iter().enumerate().rev() {
                if let (Some(child), Some(ch)) = (child.as_deref(), char::from_u32(idx as u32)) {
                    self.stack.push((child, len, Some(ch)));
                }
            }

            if let Some(value) = node.value.as_ref() {
                return Some((self.key.clone(), value));
            }
        }
        None
    }
}

/// Keys of a [`WideTrie`] subtree.
pub struct Keys<'a, V, const R: usize = DEFAULT_RADIX> {
    inner: Iter<'a, V, R>,
}

impl<V, const R: usize> Iterator for Keys<'_, V, R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.inner.next().map(|(key, _)| key)
    }
}

#[cfg(test)]
impl<V, const R: usize> WideTrie<V, R> {
    /// Asserts the pruning invariant and the entry count.
    pub(crate) fn validate(&self) {
        let mut stack: Vec<&Node<V, R>> = self.root.as_deref().into_iter().collect();
        let mut values = 0usize;
        while let Some(node) = stack.pop() {
            assert!(!node.is_dead(), "valueless childless node must be pruned");
            values += usize::from(node.value.is_some());
            stack.extend(node.children.iter().filter_map(|c| c.as_deref()));
        }
        assert_eq!(values, self.len, "stored values must match WideTrie::len");
    }

    pub(crate) fn node_count(&self) -> usize {
        let mut stack: Vec<&Node<V, R>> = self.root.as_deref().into_iter().collect();
        let mut count = 0;
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter().filter_map(|c| c.as_deref()));
        }
        count
    }
}
