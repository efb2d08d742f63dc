use super::*;

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

fn key_strategy() -> impl Strategy<Value = String> {
    // A four-letter alphabet keeps keys colliding and sharing prefixes.
    "[a-d]{0,6}"
}

fn pattern_strategy() -> impl Strategy<Value = String> {
    "[a-d.]{0,6}"
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 50)]
    Insert(#[proptest(strategy = "key_strategy()")] String, u64),
    #[proptest(weight = 25)]
    Remove(#[proptest(strategy = "key_strategy()")] String),
    #[proptest(weight = 24)]
    Get(#[proptest(strategy = "key_strategy()")] String),
    #[proptest(weight = 1)]
    Clear,
}

fn model_matches(m: &BTreeMap<String, u64>, pattern: &str) -> Vec<String> {
    m.keys()
        .filter(|key| {
            key.chars().count() == pattern.chars().count()
                && key.chars().zip(pattern.chars()).all(|(k, p)| p == WILDCARD || k == p)
        })
        .cloned()
        .collect()
}

fn model_longest_prefix<'s>(m: &BTreeMap<String, u64>, s: &'s str) -> &'s str {
    let len = m
        .keys()
        .filter(|key| s.starts_with(key.as_str()))
        .map(String::len)
        .max()
        .unwrap_or(0);
    &s[..len]
}

/// Replays `ops` on a fresh table and on a `BTreeMap`, comparing every
/// result, then compares the enumeration and query surface.
fn check_against_model<T>(
    ops: Vec<Op>,
    queries: &[String],
) -> std::result::Result<T, TestCaseError>
where
    T: SymbolTable<u64> + Default,
{
    let mut t = T::default();
    let mut m: BTreeMap<String, u64> = BTreeMap::new();

    for op in ops {
        match op {
            Op::Insert(key, value) => {
                let old_t = t.insert(&key, value);
                let old_m = m.insert(key, value);
                prop_assert_eq!(old_t, Ok(old_m));
            }
            Op::Remove(key) => {
                let old_t = t.remove(&key);
                let old_m = m.remove(&key);
                prop_assert_eq!(old_t, old_m);
            }
            Op::Get(key) => {
                prop_assert_eq!(t.get(&key), m.get(&key));
                prop_assert_eq!(t.contains_key(&key), m.contains_key(&key));
            }
            Op::Clear => {
                for key in m.keys() {
                    t.remove(key);
                }
                m.clear();
            }
        }

        prop_assert_eq!(t.len(), m.len());
    }

    let keys: Vec<String> = t.keys().collect();
    let expected: Vec<String> = m.keys().cloned().collect();
    prop_assert_eq!(keys, expected);

    for query in queries {
        let with_prefix: Vec<String> = t.keys_with_prefix(query).collect();
        let expected: Vec<String> =
            m.keys().filter(|k| k.starts_with(query.as_str())).cloned().collect();
        prop_assert_eq!(with_prefix, expected);

        prop_assert_eq!(t.keys_that_match(query), model_matches(&m, query));
        prop_assert_eq!(t.longest_prefix_of(query), model_longest_prefix(&m, query));
    }

    Ok(t)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_wide_trie_equivalence(
        ops in prop::collection::vec(any::<Op>(), 0..=1000),
        queries in prop::collection::vec(pattern_strategy(), 0..=16)
    ) {
        let t: WideTrie<u64> = check_against_model(ops, &queries)?;
        t.validate();
    }

    #[test]
    fn prop_tst_equivalence(
        ops in prop::collection::vec(any::<Op>(), 0..=1000),
        queries in prop::collection::vec(pattern_strategy(), 0..=16)
    ) {
        let t: TernarySearchTree<u64> = check_against_model(ops, &queries)?;
        t.validate();
    }

    #[test]
    fn prop_keys_independent_of_insertion_order(
        keys in prop::collection::btree_set(key_strategy(), 0..=64),
        seed in any::<u64>()
    ) {
        use rand::rngs::StdRng;
        use rand::seq::SliceRandom;
        use rand::SeedableRng;

        let expected: Vec<String> = keys.iter().cloned().collect();
        let mut shuffled = expected.clone();
        shuffled.shuffle(&mut StdRng::seed_from_u64(seed));

        let mut trie: WideTrie<()> = WideTrie::new();
        let mut tst: TernarySearchTree<()> = TernarySearchTree::new();
        for key in &shuffled {
            prop_assert_eq!(trie.insert(key, ()), Ok(None));
            prop_assert_eq!(tst.insert(key, ()), None);
        }

        prop_assert_eq!(trie.keys().collect::<Vec<_>>(), expected.clone());
        prop_assert_eq!(tst.keys().collect::<Vec<_>>(), expected);
    }
}

/// Calls `f` with every ordering of `keys`. Orderings are produced in place
/// by Heap's method, each one a single swap away from the last.
fn each_ordering<'k>(keys: &[&'k str], mut f: impl FnMut(&[&'k str])) {
    let mut order = keys.to_vec();
    let mut swaps = vec![0usize; order.len()];
    f(&order);

    let mut i = 1;
    while i < order.len() {
        if swaps[i] < i {
            let j = if i % 2 == 0 { 0 } else { swaps[i] };
            order.swap(j, i);
            f(&order);
            swaps[i] += 1;
            i = 1;
        } else {
            swaps[i] = 0;
            i += 1;
        }
    }
}

const SMALL_SET: [&str; 6] = ["a", "b", "ab", "abc", "ba", ""];

#[test]
fn exhaustive_insert_order_small_set() {
    let mut sorted = SMALL_SET.map(str::to_owned).to_vec();
    sorted.sort();

    let mut orderings = 0;
    each_ordering(&SMALL_SET, |order| {
        orderings += 1;
        let mut trie: WideTrie<u64> = WideTrie::new();
        let mut tst: TernarySearchTree<u64> = TernarySearchTree::new();
        for (i, key) in order.iter().enumerate() {
            trie.insert(key, i as u64).unwrap();
            tst.insert(key, i as u64);
        }

        trie.validate();
        tst.validate();
        assert_eq!(trie.keys().collect::<Vec<_>>(), sorted);
        assert_eq!(tst.keys().collect::<Vec<_>>(), sorted);
        for key in order {
            assert_eq!(trie.get(key), tst.get(key));
        }
    });
    assert_eq!(orderings, 720);
}

#[test]
fn exhaustive_remove_order_small_set() {
    let mut base: WideTrie<u64> = WideTrie::new();
    for (i, key) in SMALL_SET.iter().enumerate() {
        base.insert(key, i as u64).unwrap();
    }

    let full: TernarySearchTree<u64> =
        SMALL_SET.iter().enumerate().map(|(i, key)| (*key, i as u64)).collect();

    each_ordering(&SMALL_SET, |order| {
        let mut trie = base.clone();
        let mut tst = full.clone();

        for key in order {
            assert_eq!(trie.remove(key), tst.remove(key));
            assert_eq!(trie.len(), tst.len());
            assert_eq!(trie.keys().collect::<Vec<_>>(), tst.keys().collect::<Vec<_>>());
            trie.validate();
            tst.validate();
        }
        assert!(trie.is_empty());
        assert_eq!(trie.node_count(), 0);
    });
}
