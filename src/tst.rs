//! Ternary search tree.
//!
//! Each node tests one character and has three children: `left` for keys
//! whose character at this depth is smaller, `right` for larger, and `mid`
//! for keys continuing past an equal character. Only `mid` transitions
//! consume a key character.
//!
//! No node represents the empty string, so the empty key is kept in a slot
//! of its own on the tree. Nodes are never pruned: [`TernarySearchTree::remove`]
//! only clears the value, leaving the node in place to route other keys.
//!
//! A `left`/`right` chain is as long as the number of keys branching at one
//! level, not bounded by key length, so no operation recurses along it.

use std::cmp::Ordering::{Equal, Greater, Less};
use std::fmt;
use std::str::Chars;

use tracing::trace;

use crate::{Result, SymbolTable, WILDCARD};

type Link<V> = Option<Box<Node<V>>>;

struct Node<V> {
    ch: char,
    value: Option<V>,
    left: Link<V>,
    mid: Link<V>,
    right: Link<V>,
}

impl<V> Node<V> {
    fn new(ch: char) -> Box<Self> {
        Box::new(Self {
            ch,
            value: None,
            left: None,
            mid: None,
            right: None,
        })
    }
}

/// A symbol table backed by a ternary search tree.
///
/// Any `char` may appear in a key. The tree is not rebalanced, so its shape
/// depends on insertion order; lookups and enumeration order do not.
pub struct TernarySearchTree<V> {
    root: Link<V>,
    empty: Option<V>,
    len: usize,
}

impl<V> TernarySearchTree<V> {
    pub fn new() -> Self {
        Self {
            root: None,
            empty: None,
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        Self::release(self.root.take());
        self.empty = None;
        self.len = 0;
    }

    /// Node holding the last character of a non-empty `key`.
    fn find(&self, key: &str) -> Option<&Node<V>> {
        let mut chars = key.chars();
        let mut ch = chars.next()?;
        let mut node = self.root.as_deref()?;
        loop {
            match ch.cmp(&node.ch) {
                Less => node = node.left.as_deref()?,
                Greater => node = node.right.as_deref()?,
                Equal => match chars.next() {
                    Some(next) => {
                        ch = next;
                        node = node.mid.as_deref()?;
                    }
                    None => return Some(node),
                },
            }
        }
    }

    fn find_mut(&mut self, key: &str) -> Option<&mut Node<V>> {
        let mut chars = key.chars();
        let mut ch = chars.next()?;
        let mut node = self.root.as_deref_mut()?;
        loop {
            match ch.cmp(&node.ch) {
                Less => node = node.left.as_deref_mut()?,
                Greater => node = node.right.as_deref_mut()?,
                Equal => match chars.next() {
                    Some(next) => {
                        ch = next;
                        node = node.mid.as_deref_mut()?;
                    }
                    None => return Some(node),
                },
            }
        }
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&V> {
        if key.is_empty() {
            return self.empty.as_ref();
        }
        self.find(key)?.value.as_ref()
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        if key.is_empty() {
            return self.empty.as_mut();
        }
        self.find_mut(key)?.value.as_mut()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Stores `value` under `key`, returning the value it replaces.
    pub fn insert(&mut self, key: &str, value: V) -> Option<V> {
        let mut chars = key.chars();
        let old = match chars.next() {
            None => self.empty.replace(value),
            Some(first) => Self::insert_at(&mut self.root, first, chars, value),
        };
        if old.is_none() {
            self.len += 1;
        }
        old
    }

    /// Moves a cursor down the links, creating a node tagged with the current
    /// character wherever one is missing. Only `mid` steps consume `rest`.
    fn insert_at(mut link: &mut Link<V>, mut ch: char, mut rest: Chars<'_>, value: V) -> Option<V> {
        loop {
            let node = link.get_or_insert_with(|| Node::new(ch));
            match ch.cmp(&node.ch) {
                Less => link = &mut node.left,
                Greater => link = &mut node.right,
                Equal => match rest.next() {
                    Some(next) => {
                        ch = next;
                        link = &mut node.mid;
                    }
                    None => return node.value.replace(value),
                },
            }
        }
    }

    /// Frees a subtree node by node.
    fn release(link: Link<V>) {
        let mut stack: Vec<Box<Node<V>>> = link.into_iter().collect();
        while let Some(mut node) = stack.pop() {
            let children = [node.left.take(), node.mid.take(), node.right.take()];
            stack.extend(children.into_iter().flatten());
        }
    }

    /// Clears the value stored under `key` and returns it.
    ///
    /// The key's nodes stay in the tree even when nothing below them holds a
    /// value any more; they are only released by [`clear`](Self::clear) or
    /// dropping the tree.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let old = if key.is_empty() {
            self.empty.take()
        } else {
            self.find_mut(key)?.value.take()
        };
        if old.is_some() {
            trace!(key, "cleared value, routing nodes kept");
            self.len -= 1;
        }
        old
    }

    /// All `(key, value)` pairs in ascending character order.
    pub fn iter(&self) -> Iter<'_, V> {
        self.iter_prefix("")
    }

    /// `(key, value)` pairs whose key starts with `prefix`, the prefix
    /// itself first when it is stored.
    pub fn iter_prefix(&self, prefix: &str) -> Iter<'_, V> {
        if prefix.is_empty() {
            return Iter {
                head: self.empty.as_ref().map(|value| (String::new(), value)),
                stack: self
                    .root
                    .as_deref()
                    .map(|root| Frame::Subtree(root, 0))
                    .into_iter()
                    .collect(),
                key: String::new(),
            };
        }

        match self.find(prefix) {
            Some(node) => Iter {
                head: node.value.as_ref().map(|value| (prefix.to_owned(), value)),
                stack: node
                    .mid
                    .as_deref()
                    .map(|mid| Frame::Subtree(mid, prefix.len()))
                    .into_iter()
                    .collect(),
                key: prefix.to_owned(),
            },
            None => Iter {
                head: None,
                stack: Vec::new(),
                key: String::new(),
            },
        }
    }

    pub fn keys(&self) -> Keys<'_, V> {
        self.keys_with_prefix("")
    }

    /// Stored keys starting with `prefix`. Each call is a fresh traversal.
    pub fn keys_with_prefix(&self, prefix: &str) -> Keys<'_, V> {
        Keys {
            inner: self.iter_prefix(prefix),
        }
    }

    /// Stored keys matching `pattern` position by position, where `.`
    /// matches any character. Only keys of the pattern's length match.
    pub fn keys_that_match(&self, pattern: &str) -> Vec<String> {
        self.keys_that_match_with(pattern, WILDCARD)
    }

    pub fn keys_that_match_with(&self, pattern: &str, wildcard: char) -> Vec<String> {
        let mut out = Vec::new();
        let mut chars = pattern.chars();
        match chars.next() {
            None => {
                if self.empty.is_some() {
                    out.push(String::new());
                }
            }
            Some(first) => {
                let mut key = String::with_capacity(pattern.len());
                let mut stack: Vec<MatchFrame<'_, '_, V>> = Vec::new();
                if let Some(root) = self.root.as_deref() {
                    stack.push(MatchFrame::Subtree(root, first, chars.as_str(), 0));
                }

                // Same visiting order as `Iter`: left, the node itself, mid, right.
                while let Some(frame) = stack.pop() {
                    match frame {
                        MatchFrame::Subtree(node, pat, rest, depth) => {
                            let any = pat == wildcard;
                            if any || pat > node.ch {
                                if let Some(right) = node.right.as_deref() {
                                    stack.push(MatchFrame::Subtree(right, pat, rest, depth));
                                }
                            }
                            if any || pat == node.ch {
                                stack.push(MatchFrame::Step(node, rest, depth));
                            }
                            if any || pat < node.ch {
                                if let Some(left) = node.left.as_deref() {
                                    stack.push(MatchFrame::Subtree(left, pat, rest, depth));
                                }
                            }
                        }
                        MatchFrame::Step(node, rest, depth) => {
                            key.truncate(depth);
                            key.push(node.ch);
                            let mut chars = rest.chars();
                            match chars.next() {
                                None => {
                                    if node.value.is_some() {
                                        out.push(key.clone());
                                    }
                                }
                                Some(next) => {
                                    if let Some(mid) = node.mid.as_deref() {
                                        let rest = chars.as_str();
                                        stack.push(MatchFrame::Subtree(mid, next, rest, key.len()));
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        out
    }

    /// Longest stored key that is a prefix of `s`; `""` if there is none.
    pub fn longest_prefix_of<'s>(&self, s: &'s str) -> &'s str {
        let mut best = 0;
        let mut node = self.root.as_deref();
        let mut chars = s.char_indices();
        let mut next = chars.next();
        while let (Some(n), Some((pos, ch))) = (node, next) {
            match ch.cmp(&n.ch) {
                Less => node = n.left.as_deref(),
                Greater => node = n.right.as_deref(),
                Equal => {
                    if n.value.is_some() {
                        best = pos + ch.len_utf8();
                    }
                    node = n.mid.as_deref();
                    next = chars.next();
                }
            }
        }
        &s[..best]
    }
}

impl<V> Default for TernarySearchTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Drop for TernarySearchTree<V> {
    fn drop(&mut self) {
        Self::release(self.root.take());
    }
}

impl<V: Clone> Clone for TernarySearchTree<V> {
    fn clone(&self) -> Self {
        let mut tree = Self {
            root: None,
            empty: self.empty.clone(),
            len: self.len,
        };

        let mut stack: Vec<(&Node<V>, &mut Link<V>)> = Vec::new();
        if let Some(root) = self.root.as_deref() {
            stack.push((root, &mut tree.root));
        }
        while let Some((src, dst)) = stack.pop() {
            let node = dst.insert(Box::new(Node {
                ch: src.ch,
                value: src.value.clone(),
                left: None,
                mid: None,
                right: None,
            }));
            let Node { left, mid, right, .. } = &mut **node;
            for (from, to) in [(&src.left, left), (&src.mid, mid), (&src.right, right)] {
                if let Some(from) = from.as_deref() {
                    stack.push((from, to));
                }
            }
        }
        tree
    }
}

impl<V: fmt::Debug> fmt::Debug for TernarySearchTree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: AsRef<str>, V> Extend<(K, V)> for TernarySearchTree<V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key.as_ref(), value);
        }
    }
}

impl<K: AsRef<str>, V> FromIterator<(K, V)> for TernarySearchTree<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<'a, V> IntoIterator for &'a TernarySearchTree<V> {
    type Item = (String, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V> SymbolTable<V> for TernarySearchTree<V> {
    type Keys<'a>
        = Keys<'a, V>
    where
        Self: 'a;

    fn get(&self, key: &str) -> Option<&V> {
        TernarySearchTree::get(self, key)
    }

    fn insert(&mut self, key: &str, value: V) -> Result<Option<V>> {
        Ok(TernarySearchTree::insert(self, key, value))
    }

    fn remove(&mut self, key: &str) -> Option<V> {
        TernarySearchTree::remove(self, key)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn keys_with_prefix<'a>(&'a self, prefix: &str) -> Self::Keys<'a> {
        TernarySearchTree::keys_with_prefix(self, prefix)
    }

    fn keys_that_match(&self, pattern: &str) -> Vec<String> {
        TernarySearchTree::keys_that_match(self, pattern)
    }

    fn longest_prefix_of<'s>(&self, s: &'s str) -> &'s str {
        TernarySearchTree::longest_prefix_of(self, s)
    }
}

/// Pending wildcard work. `Subtree` tests a subtree against one pattern
/// character with the rest of the pattern after it; `Step` takes the node's
/// own character. `usize` is the key length before this level.
enum MatchFrame<'t, 'p, V> {
    Subtree(&'t Node<V>, char, &'p str, usize),
    Step(&'t Node<V>, &'p str, usize),
}

enum Frame<'a, V> {
    /// Whole subtree, keys continuing the first `usize` bytes of the buffer.
    Subtree(&'a Node<V>, usize),
    /// The node's own character: emit its value, then continue into `mid`.
    Step(&'a Node<V>, usize),
}

/// In-order traversal: left, the node itself, mid, right.
pub struct Iter<'a, V> {
    head: Option<(String, &'a V)>,
    stack: Vec<Frame<'a, V>>,
    key: String,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (String, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(head) = self.head.take() {
            return Some(head);
        }

        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Subtree(node, depth) => {
                    if let Some(right) = node.right.as_deref() {
                        self.stack.push(Frame::Subtree(right, depth));
                    }
                    self.stack.push(Frame::Step(node, depth));
                    if let Some(left) = node.left.as_deref() {
                        self.stack.push(Frame::Subtree(left, depth));
                    }
                }
                Frame::Step(node, depth) => {
                    self.key.truncate(depth);
                    self.key.push(node.ch);
                    if let Some(mid) = node.mid.as_deref() {
                        self.stack.push(Frame::Subtree(mid, self.key.len()));
                    }
                    if let Some(value) = node.value.as_ref() {
                        return Some((self.key.clone(), value));
                    }
                }
            }
        }
        None
    }
}

/// Keys of a [`TernarySearchTree`].
pub struct Keys<'a, V> {
    inner: Iter<'a, V>,
}

impl<V> Iterator for Keys<'_, V> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.inner.next().map(|(key, _)| key)
    }
}

#[cfg(test)]
impl<V> TernarySearchTree<V> {
    pub(crate) fn node_count(&self) -> usize {
        let mut stack: Vec<&Node<V>> = self.root.as_deref().into_iter().collect();
        let mut count = 0;
        while let Some(node) = stack.pop() {
            count += 1;
            for link in [&node.left, &node.mid, &node.right] {
                stack.extend(link.as_deref());
            }
        }
        count
    }

    /// Asserts the ordering invariant of every node and the entry count.
    pub(crate) fn validate(&self) {
        // Exclusive character bounds inherited through `left`/`right` links.
        let mut stack: Vec<(&Node<V>, Option<char>, Option<char>)> = Vec::new();
        stack.extend(self.root.as_deref().map(|root| (root, None, None)));
        let mut values = usize::from(self.empty.is_some());
        while let Some((node, lower, upper)) = stack.pop() {
            assert!(lower.map_or(true, |lo| node.ch > lo), "left/right ordering violated");
            assert!(upper.map_or(true, |hi| node.ch < hi), "left/right ordering violated");
            values += usize::from(node.value.is_some());
            stack.extend(node.left.as_deref().map(|left| (left, lower, Some(node.ch))));
            stack.extend(node.right.as_deref().map(|right| (right, Some(node.ch), upper)));
            stack.extend(node.mid.as_deref().map(|mid| (mid, None, None)));
        }
        assert_eq!(values, self.len, "stored values must match TernarySearchTree::len");
    }
}
