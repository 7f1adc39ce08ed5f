//! Visibility filtering of the org tree.
//!
//! The filter never copies nodes. It produces a [`FilteredTree`], a pruned
//! view (roots plus a surviving-children map) over a [`TreeIndex`].

use crate::tree::{NodeId, TreeIndex, TreeNode};
use regex::{Regex, RegexBuilder};
use std::collections::{HashMap, HashSet};
use std::ops::Range;

/// Case-insensitive literal substring matcher.
///
/// Both the filter and the highlighter use this type, so whatever counts as
/// a match is exactly what gets emphasized.
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Regex,
}

impl Matcher {
    /// Build a matcher for `query`.
    ///
    /// Returns `None` for an empty (or whitespace-only) query and for a query
    /// whose escaped pattern fails to compile; callers treat both as
    /// "no filtering".
    pub fn new(query: &str) -> Option<Self> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        match RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
        {
            Ok(regex) => Some(Self { regex }),
            Err(e) => {
                log::warn!("Matcher: query {:?} not usable, filtering disabled: {}", query, e);
                None
            }
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Byte ranges of every non-overlapping match in `text`
    pub fn match_ranges(&self, text: &str) -> Vec<Range<usize>> {
        self.regex.find_iter(text).map(|m| m.range()).collect()
    }
}

/// A pruned view of the tree plus the ids whose titles matched the query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredTree {
    roots: Vec<NodeId>,
    children: HashMap<NodeId, Vec<NodeId>>,
    match_ids: HashSet<NodeId>,
}

impl FilteredTree {
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Surviving children of `id`, in index order (unsorted)
    pub fn children_of(&self, id: &str) -> &[NodeId] {
        self.children
            .get(id)
            .map(|children| children.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.children.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn match_ids(&self) -> &HashSet<NodeId> {
        &self.match_ids
    }

    pub fn is_match(&self, id: &str) -> bool {
        self.match_ids.contains(id)
    }

    /// Materialize the view in nested form
    pub fn to_nodes(&self, index: &TreeIndex) -> Vec<TreeNode> {
        self.roots
            .iter()
            .filter_map(|id| self.rebuild(id, index))
            .collect()
    }

    fn rebuild(&self, id: &NodeId, index: &TreeIndex) -> Option<TreeNode> {
        let record = index.get(id.as_str())?;
        Some(TreeNode {
            id: record.id.clone(),
            title: record.title.clone(),
            kind: record.kind,
            children: self
                .children_of(id.as_str())
                .iter()
                .filter_map(|child| self.rebuild(child, index))
                .collect(),
        })
    }
}

/// Compute the visible portion of the tree.
///
/// - empty query, `show_inactive`: the whole tree
/// - empty query, hiding inactive: inactive nodes without surviving children vanish
/// - query: a node survives if its title matches or a descendant survives;
///   when hiding inactive, an inactive node cannot survive on its own match
/// - query that cannot be compiled: the whole tree
pub fn filter_tree(
    index: &TreeIndex,
    query: &str,
    inactive: &HashSet<NodeId>,
    show_inactive: bool,
) -> FilteredTree {
    let matcher = Matcher::new(query);
    let pruner = Pruner {
        index,
        inactive,
        show_inactive,
        matcher: matcher.as_ref(),
    };

    let mut filtered = FilteredTree::default();
    let mut seen = HashSet::new();

    // an unusable non-empty query means "no filtering" rather than "hide inactive"
    let unfiltered = matcher.is_none() && (show_inactive || !query.trim().is_empty());
    if unfiltered {
        for root in index.root_ids() {
            if pruner.keep_all(root, &mut filtered, &mut seen) {
                filtered.roots.push(root.clone());
            }
        }
    } else {
        for root in index.root_ids() {
            if pruner.prune(root, &mut filtered, &mut seen) {
                filtered.roots.push(root.clone());
            }
        }
    }

    log::debug!(
        "filter_tree: query={:?} show_inactive={} kept {}/{} nodes, {} matches",
        query,
        show_inactive,
        filtered.len(),
        index.len(),
        filtered.match_ids.len()
    );
    filtered
}

struct Pruner<'a> {
    index: &'a TreeIndex,
    inactive: &'a HashSet<NodeId>,
    show_inactive: bool,
    matcher: Option<&'a Matcher>,
}

impl Pruner<'_> {
    fn keep_all(&self, id: &NodeId, filtered: &mut FilteredTree, seen: &mut HashSet<NodeId>) -> bool {
        if !seen.insert(id.clone()) {
            return false;
        }
        let mut kept = Vec::new();
        for child in self.index.children_of(id.as_str()) {
            if self.keep_all(child, filtered, seen) {
                kept.push(child.clone());
            }
        }
        filtered.children.insert(id.clone(), kept);
        true
    }

    /// Returns whether `id` survives; survivors are recorded in `filtered`.
    fn prune(&self, id: &NodeId, filtered: &mut FilteredTree, seen: &mut HashSet<NodeId>) -> bool {
        if !seen.insert(id.clone()) {
            return false;
        }

        let mut kept = Vec::new();
        for child in self.index.children_of(id.as_str()) {
            if self.prune(child, filtered, seen) {
                kept.push(child.clone());
            }
        }

        let is_inactive = self.inactive.contains(id);
        let has_survivors = !kept.is_empty();

        let survives = match self.matcher {
            None => !is_inactive || self.show_inactive || has_survivors,
            Some(matcher) => {
                let own_match = self
                    .index
                    .title(id.as_str())
                    .map(|title| matcher.is_match(title))
                    .unwrap_or(false);
                let counted_match = own_match && (self.show_inactive || !is_inactive);
                if own_match && (counted_match || has_survivors) {
                    filtered.match_ids.insert(id.clone());
                }
                counted_match || has_survivors
            }
        };

        if survives {
            filtered.children.insert(id.clone(), kept);
        }
        survives
    }
}
