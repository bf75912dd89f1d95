//! Prefix index storage
//!
//! A character trie over the prefix text of each key. Every node holds the
//! ids of all records whose text passes through it, so the answer to a
//! prefix query is the id set of the node at the end of the prefix.
//!
//! # Invariants
//!
//! - A node's id set is the union of its children's sets plus the ids whose
//!   text ends at that node
//! - A non-root node with no ids has no children and is pruned from its
//!   parent
//! - The root holds every indexed id, not only the ids of empty texts, and
//!   is never pruned. Every text extends the empty prefix, so the root set
//!   is exactly the answer to `starts_with("")` and the index length.

use std::collections::{BTreeMap, BTreeSet};
use trellis_core::RecordId;

#[derive(Debug, Default)]
struct TrieNode {
    ids: BTreeSet<RecordId>,
    children: BTreeMap<char, TrieNode>,
}

impl TrieNode {
    fn count_nodes(&self) -> usize {
        1 + self.children.values().map(TrieNode::count_nodes).sum::<usize>()
    }
}

/// Character trie mapping prefixes to record ids
#[derive(Debug, Default)]
pub struct PrefixTrie {
    root: TrieNode,
}

impl PrefixTrie {
    /// Create a new empty trie
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `id` under `text`
    ///
    /// The empty string adds the id to the root only.
    pub fn insert(&mut self, text: &str, id: RecordId) {
        let mut node = &mut self.root;
        node.ids.insert(id.clone());
        for c in text.chars() {
            node = node.children.entry(c).or_default();
            node.ids.insert(id.clone());
        }
    }

    /// Remove `id` from the path of `text`, pruning emptied nodes
    ///
    /// Does nothing if the path does not exist, since the id was never
    /// indexed under this text. Returns whether the id was removed.
    pub fn remove(&mut self, text: &str, id: &RecordId) -> bool {
        if self.find(text).map_or(true, |node| !node.ids.contains(id)) {
            return false;
        }

        self.root.ids.remove(id);
        let mut node = &mut self.root;
        for c in text.chars() {
            let emptied = match node.children.get_mut(&c) {
                Some(child) => {
                    child.ids.remove(id);
                    child.ids.is_empty()
                }
                None => break,
            };
            if emptied {
                // Ids aggregate upward, so an empty node heads an empty subtree
                node.children.remove(&c);
                break;
            }
            let Some(next) = node.children.get_mut(&c) else {
                break;
            };
            node = next;
        }
        true
    }

    /// Ids of every record whose text starts with `prefix`, in id order
    pub fn starts_with(&self, prefix: &str) -> Vec<&RecordId> {
        self.find(prefix)
            .map(|node| node.ids.iter().collect())
            .unwrap_or_default()
    }

    fn find(&self, prefix: &str) -> Option<&TrieNode> {
        let mut node = &self.root;
        for c in prefix.chars() {
            node = node.children.get(&c)?;
        }
        Some(node)
    }

    /// Number of indexed ids
    pub fn len(&self) -> usize {
        self.root.ids.len()
    }

    /// Check if the trie is empty
    pub fn is_empty(&self) -> bool {
        self.root.ids.is_empty()
    }

    /// Number of nodes, root included
    pub fn node_count(&self) -> usize {
        self.root.count_nodes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: i64) -> RecordId {
        RecordId::from(n)
    }

    fn names() -> PrefixTrie {
        let mut trie = PrefixTrie::new();
        trie.insert("firat", id(1));
        trie.insert("fidan", id(2));
        trie.insert("faruk", id(3));
        trie
    }

    #[test]
    fn test_starts_with() {
        let trie = names();
        assert_eq!(trie.starts_with("fi"), vec![&id(1), &id(2)]);
        assert_eq!(trie.starts_with("f"), vec![&id(1), &id(2), &id(3)]);
        assert_eq!(trie.starts_with("faruk"), vec![&id(3)]);
        assert!(trie.starts_with("xyz").is_empty());
        assert!(trie.starts_with("farukk").is_empty());
    }

    #[test]
    fn test_empty_prefix_matches_everything() {
        let mut trie = names();
        trie.insert("", id(4));
        assert_eq!(trie.starts_with("").len(), 4);
        assert_eq!(trie.len(), 4);
    }

    #[test]
    fn test_root_aggregates_non_empty_texts() {
        let mut trie = names();
        assert_eq!(trie.len(), 3);
        assert_eq!(trie.starts_with(""), vec![&id(1), &id(2), &id(3)]);

        assert!(trie.remove("fidan", &id(2)));
        assert_eq!(trie.starts_with(""), vec![&id(1), &id(3)]);
        assert_eq!(trie.len(), 2);
    }

    #[test]
    fn test_remove_prunes_unshared_branch() {
        let mut trie = names();
        // root, f, i, then r-a-t, d-a-n, a-r-u-k
        assert_eq!(trie.node_count(), 1 + 1 + 1 + 3 + 3 + 4);

        assert!(trie.remove("firat", &id(1)));
        assert_eq!(trie.node_count(), 1 + 1 + 1 + 3 + 4);
        assert_eq!(trie.starts_with("fi"), vec![&id(2)]);
        assert!(trie.starts_with("fir").is_empty());
    }

    #[test]
    fn test_remove_everything_leaves_bare_root() {
        let mut trie = names();
        assert!(trie.remove("firat", &id(1)));
        assert!(trie.remove("fidan", &id(2)));
        assert!(trie.remove("faruk", &id(3)));
        assert!(trie.is_empty());
        assert_eq!(trie.node_count(), 1);
    }

    #[test]
    fn test_remove_missing_path_is_noop() {
        let mut trie = names();
        assert!(!trie.remove("zeynep", &id(1)));
        assert!(!trie.remove("firat", &id(2)));
        assert_eq!(trie.len(), 3);
        assert_eq!(trie.starts_with("fi").len(), 2);
    }

    #[test]
    fn test_shared_text() {
        let mut trie = PrefixTrie::new();
        trie.insert("ali", id(1));
        trie.insert("ali", id(2));
        trie.insert("al", id(3));
        assert!(trie.remove("ali", &id(1)));
        assert_eq!(trie.starts_with("ali"), vec![&id(2)]);
        assert_eq!(trie.starts_with("al"), vec![&id(2), &id(3)]);
        assert!(trie.remove("ali", &id(2)));
        assert_eq!(trie.node_count(), 3);
        assert_eq!(trie.starts_with("al"), vec![&id(3)]);
    }

    #[test]
    fn test_multibyte_characters() {
        let mut trie = PrefixTrie::new();
        trie.insert("şule", id(1));
        trie.insert("şükrü", id(2));
        assert_eq!(trie.starts_with("ş"), vec![&id(1), &id(2)]);
        assert_eq!(trie.starts_with("şü"), vec![&id(2)]);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn starts_with_matches_filter(
                words in prop::collection::vec("[ab]{0,5}", 0..40),
                removed in prop::collection::vec(any::<bool>(), 40),
                prefix in "[ab]{0,3}",
            ) {
                let mut trie = PrefixTrie::new();
                for (n, word) in words.iter().enumerate() {
                    trie.insert(word, id(n as i64));
                }
                for (n, word) in words.iter().enumerate() {
                    if removed[n] {
                        prop_assert!(trie.remove(word, &id(n as i64)));
                    }
                }

                let found: Vec<RecordId> = trie.starts_with(&prefix).into_iter().cloned().collect();
                let expected: Vec<RecordId> = words
                    .iter()
                    .enumerate()
                    .filter(|(n, w)| !removed[*n] && w.starts_with(prefix.as_str()))
                    .map(|(n, _)| id(n as i64))
                    .collect();
                prop_assert_eq!(found, expected);
            }
        }
    }
}
