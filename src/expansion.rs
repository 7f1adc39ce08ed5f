use crate::filter::Matcher;
use crate::tree::{NodeId, TreeIndex};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionMode {
    Normal,
    Searching,
}

/// What a call to [`ExpansionState::sync_search`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpansionChange {
    Unchanged,
    /// Snapshot taken, these ids were force-expanded
    EnteredSearch { forced: Vec<NodeId> },
    /// Still searching, these previously collapsed ancestors were expanded
    Refreshed { forced: Vec<NodeId> },
    /// Snapshot restored and discarded
    Restored {
        collapsed: Vec<NodeId>,
        expanded: Vec<NodeId>,
    },
}

/// Expanded node ids plus the pre-search snapshot.
#[derive(Debug, Clone, Default)]
pub struct ExpansionState {
    expanded: HashSet<NodeId>,
    snapshot: Option<HashSet<NodeId>>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to `{root_id}` (or nothing), dropping any search snapshot
    pub fn initialize(&mut self, root_id: Option<&NodeId>) {
        self.expanded.clear();
        self.snapshot = None;
        if let Some(root) = root_id {
            self.expanded.insert(root.clone());
        }
    }

    pub fn mode(&self) -> ExpansionMode {
        if self.snapshot.is_some() {
            ExpansionMode::Searching
        } else {
            ExpansionMode::Normal
        }
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn expanded(&self) -> &HashSet<NodeId> {
        &self.expanded
    }

    pub fn expand(&mut self, id: &NodeId) -> bool {
        self.expanded.insert(id.clone())
    }

    pub fn collapse(&mut self, id: &str) -> bool {
        self.expanded.remove(id)
    }

    /// Flip one node; returns whether it is now expanded
    pub fn toggle(&mut self, id: &NodeId) -> bool {
        if self.expanded.remove(id.as_str()) {
            false
        } else {
            self.expanded.insert(id.clone());
            true
        }
    }

    /// Clear everything, including the search snapshot
    pub fn collapse_all(&mut self) {
        self.expanded.clear();
        self.snapshot = None;
    }

    /// Drop ids that no longer exist in `index` (after a reload)
    pub fn retain_known(&mut self, index: &TreeIndex) {
        self.expanded.retain(|id| index.contains(id.as_str()));
        if let Some(snapshot) = self.snapshot.as_mut() {
            snapshot.retain(|id| index.contains(id.as_str()));
        }
    }

    /// Bring the expansion state in line with the live query.
    ///
    /// Entering a search snapshots the current set; while searching the
    /// strict ancestors of every match are expanded (never collapsed);
    /// clearing the query restores the snapshot.
    pub fn sync_search(&mut self, index: &TreeIndex, query: &str) -> ExpansionChange {
        let matcher = Matcher::new(query);
        let searching = !query.trim().is_empty();

        match (searching, self.snapshot.is_some()) {
            (true, false) => {
                self.snapshot = Some(self.expanded.clone());
                let forced = self.force_expand(index, matcher.as_ref());
                log::debug!("Expansion: entered search, forced {} ancestors", forced.len());
                ExpansionChange::EnteredSearch { forced }
            }
            (true, true) => {
                let forced = self.force_expand(index, matcher.as_ref());
                if forced.is_empty() {
                    ExpansionChange::Unchanged
                } else {
                    ExpansionChange::Refreshed { forced }
                }
            }
            (false, true) => {
                let snapshot = self.snapshot.take().unwrap_or_default();
                let mut collapsed: Vec<NodeId> =
                    self.expanded.difference(&snapshot).cloned().collect();
                let mut expanded: Vec<NodeId> =
                    snapshot.difference(&self.expanded).cloned().collect();
                collapsed.sort();
                expanded.sort();

                for id in &collapsed {
                    self.expanded.remove(id.as_str());
                }
                for id in &expanded {
                    self.expanded.insert(id.clone());
                }
                log::debug!(
                    "Expansion: left search, collapsed {} and re-expanded {}",
                    collapsed.len(),
                    expanded.len()
                );
                ExpansionChange::Restored {
                    collapsed,
                    expanded,
                }
            }
            (false, false) => ExpansionChange::Unchanged,
        }
    }

    fn force_expand(&mut self, index: &TreeIndex, matcher: Option<&Matcher>) -> Vec<NodeId> {
        let Some(matcher) = matcher else {
            return Vec::new();
        };
        let mut forced: Vec<NodeId> = required_ancestors(index, matcher)
            .into_iter()
            .filter(|id| self.expanded.insert(id.clone()))
            .collect();
        forced.sort();
        forced
    }
}

/// Strict ancestors of every node whose title matches, on the unfiltered tree.
pub fn required_ancestors(index: &TreeIndex, matcher: &Matcher) -> HashSet<NodeId> {
    let mut required = HashSet::new();
    for id in index.preorder() {
        let matches = index
            .title(id.as_str())
            .map(|title| matcher.is_match(title))
            .unwrap_or(false);
        if matches {
            required.extend(index.ancestors(id.as_str()));
        }
    }
    required
}
