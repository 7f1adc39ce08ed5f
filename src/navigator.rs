//! Navigator controller
//!
//! `NavigatorState` is the single owner of the tree snapshot, the inactive
//! set, expansion, selection, the search query and the inactive toggle.
//! It only changes through [`NavigatorState::handle_event`] and
//! [`NavigatorState::load_snapshot`]; everything the renderer needs is
//! derived on demand by [`NavigatorState::build_view_model`].

use crate::api::TreeSnapshot;
use crate::error::{NavigatorError, Result};
use crate::expansion::{ExpansionChange, ExpansionMode, ExpansionState};
use crate::filter::{filter_tree, FilteredTree, Matcher};
use crate::highlight::first_match;
use crate::move_target::{move_candidates, CandidateOptions, MoveCandidate};
use crate::sort::sort_siblings;
use crate::tree::{NodeId, NodeKind, NodeRecord, TreeIndex};
use std::collections::HashSet;

/// Events that can be sent to the navigator
#[derive(Debug, Clone, PartialEq)]
pub enum NavigatorEvent {
    Select(NodeId),
    NavigateUp,
    NavigateDown,
    NavigateFirst,
    NavigateLast,
    ToggleExpanded(NodeId),
    ExpandSelected,
    CollapseSelected,
    StartSearch,
    UpdateSearchQuery(String),
    EndSearch,
    EndSearchKeepQuery,
    ToggleShowInactive,
    SetShowInactive(bool),
    CollapseAll,
}

/// A visible row in the navigator view
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleItem {
    pub id: NodeId,
    pub title: String,
    pub kind: NodeKind,
    pub depth: usize,
    pub is_selected: bool,
    pub is_expanded: bool,
    pub has_children: bool,
    pub is_inactive: bool,
    pub is_match: bool,
}

/// View model for rendering the navigator
#[derive(Debug, Clone)]
pub struct NavigatorViewModel {
    pub items: Vec<VisibleItem>,
    pub selected_index: Option<usize>,
    pub search_query: String,
    pub is_searching: bool,
    pub show_inactive: bool,
    pub match_count: usize,
}

#[derive(Debug, Default)]
pub struct NavigatorState {
    index: TreeIndex,
    inactive: HashSet<NodeId>,
    root_id: Option<NodeId>,
    expansion: ExpansionState,
    selection: Option<NodeId>,
    query: String,
    editing_search: bool,
    show_inactive: bool,
    loaded: bool,
    scroll_request: Option<NodeId>,
    total: Option<u64>,
    version: Option<serde_json::Value>,
}

impl NavigatorState {
    pub fn new(show_inactive: bool) -> Self {
        Self {
            show_inactive,
            ..Default::default()
        }
    }

    /// Build a navigator already holding `snapshot`
    pub fn with_snapshot(snapshot: TreeSnapshot, show_inactive: bool) -> Self {
        let mut navigator = Self::new(show_inactive);
        navigator.load_snapshot(snapshot);
        navigator
    }

    /// Replace the tree atomically.
    ///
    /// The first load expands `root_id` (or the first root). Later loads keep
    /// the expansion of ids that still exist and clear a vanished selection.
    pub fn load_snapshot(&mut self, snapshot: TreeSnapshot) {
        let index = TreeIndex::build(&snapshot.roots);
        let root_id = snapshot
            .root_id
            .filter(|id| index.contains(id.as_str()))
            .or_else(|| index.root_ids().first().cloned());

        if self.loaded {
            self.expansion.retain_known(&index);
        } else {
            self.expansion.initialize(root_id.as_ref());
            self.loaded = true;
        }

        if let Some(selected) = &self.selection {
            if !index.contains(selected.as_str()) {
                log::info!("Selected node {} vanished after reload", selected);
                self.selection = None;
            }
        }

        log::info!(
            "Navigator: loaded {} nodes ({} inactive)",
            index.len(),
            snapshot.inactive_ids.len()
        );
        self.index = index;
        self.inactive = snapshot.inactive_ids;
        self.root_id = root_id;
        self.total = snapshot.total;
        self.version = snapshot.version;

        if !self.query.trim().is_empty() {
            self.on_query_changed();
        }
    }

    /// Handle an event and return whether the state changed
    pub fn handle_event(&mut self, event: NavigatorEvent) -> Result<bool> {
        let state_before = self.state_key();

        match event {
            NavigatorEvent::Select(id) => {
                if !self.index.contains(id.as_str()) {
                    return Err(NavigatorError::UnknownNode(id));
                }
                self.scroll_request = Some(id.clone());
                self.selection = Some(id);
            }

            NavigatorEvent::NavigateUp => self.step_selection(-1),
            NavigatorEvent::NavigateDown => self.step_selection(1),

            NavigatorEvent::NavigateFirst => {
                let first = self.visible_items().first().map(|item| item.id.clone());
                self.select_visible(first);
            }

            NavigatorEvent::NavigateLast => {
                let last = self.visible_items().last().map(|item| item.id.clone());
                self.select_visible(last);
            }

            NavigatorEvent::ToggleExpanded(id) => {
                if !self.index.contains(id.as_str()) {
                    return Err(NavigatorError::UnknownNode(id));
                }
                if !self.index.children_of(id.as_str()).is_empty() {
                    self.expansion.toggle(&id);
                }
            }

            NavigatorEvent::ExpandSelected => {
                if let Some(selected) = self.selection.clone() {
                    if !self.index.children_of(selected.as_str()).is_empty() {
                        self.expansion.expand(&selected);
                    }
                }
            }

            NavigatorEvent::CollapseSelected => {
                if let Some(selected) = self.selection.clone() {
                    if !self.expansion.collapse(selected.as_str()) {
                        // already collapsed or a leaf: step out to the parent
                        let parent = self.index.parent_of(selected.as_str()).cloned();
                        if parent.is_some() {
                            self.select_visible(parent);
                        }
                    }
                }
            }

            NavigatorEvent::StartSearch => {
                self.editing_search = true;
            }

            NavigatorEvent::UpdateSearchQuery(query) => {
                if self.editing_search && query != self.query {
                    self.query = query;
                    self.on_query_changed();
                }
            }

            NavigatorEvent::EndSearch => {
                self.editing_search = false;
                if !self.query.is_empty() {
                    self.query.clear();
                    self.on_query_changed();
                }
            }

            NavigatorEvent::EndSearchKeepQuery => {
                self.editing_search = false;
            }

            NavigatorEvent::ToggleShowInactive => {
                self.show_inactive = !self.show_inactive;
                self.scroll_to_first_match();
            }

            NavigatorEvent::SetShowInactive(show) => {
                self.show_inactive = show;
                self.scroll_to_first_match();
            }

            NavigatorEvent::CollapseAll => {
                self.expansion.collapse_all();
                self.query.clear();
                self.editing_search = false;
                self.scroll_request = None;
            }
        }

        Ok(self.state_key() != state_before)
    }

    fn state_key(&self) -> (Option<NodeId>, String, bool, bool, Vec<NodeId>) {
        let mut expanded: Vec<NodeId> = self.expansion.expanded().iter().cloned().collect();
        expanded.sort();
        (
            self.selection.clone(),
            self.query.clone(),
            self.editing_search,
            self.show_inactive,
            expanded,
        )
    }

    fn on_query_changed(&mut self) {
        let change = self.expansion.sync_search(&self.index, &self.query);
        match &change {
            ExpansionChange::Unchanged => {}
            other => log::debug!("Navigator: query {:?} -> {:?}", self.query, other),
        }
        self.scroll_request = None;
        self.scroll_to_first_match();
    }

    /// Matches shift whenever the query or the inactive toggle changes
    fn scroll_to_first_match(&mut self) {
        if self.query.trim().is_empty() {
            return;
        }
        let filtered = self.filtered();
        self.scroll_request = first_match(&filtered, &self.index, &self.inactive);
    }

    fn step_selection(&mut self, delta: isize) {
        let items = self.visible_items();
        if items.is_empty() {
            return;
        }
        let current = self
            .selection
            .as_ref()
            .and_then(|sel| items.iter().position(|item| &item.id == sel));

        let next = match current {
            Some(pos) if delta < 0 => pos.saturating_sub(delta.unsigned_abs()),
            Some(pos) => (pos + delta as usize).min(items.len() - 1),
            None if delta < 0 => items.len() - 1,
            None => 0,
        };
        self.select_visible(Some(items[next].id.clone()));
    }

    fn select_visible(&mut self, id: Option<NodeId>) {
        if let Some(id) = id {
            self.scroll_request = Some(id.clone());
            self.selection = Some(id);
        }
    }

    /// The pruned view for the current query and inactive toggle
    pub fn filtered(&self) -> FilteredTree {
        filter_tree(&self.index, &self.query, &self.inactive, self.show_inactive)
    }

    pub fn matcher(&self) -> Option<Matcher> {
        Matcher::new(&self.query)
    }

    /// Rows in rendered order: filtered, sorted per level, expansion-aware
    pub fn visible_items(&self) -> Vec<VisibleItem> {
        let filtered = self.filtered();
        let mut items = Vec::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<(NodeId, usize)> =
            sort_siblings(filtered.roots(), &self.index, &self.inactive)
                .into_iter()
                .rev()
                .map(|id| (id, 0))
                .collect();

        while let Some((id, depth)) = stack.pop() {
            if !seen.insert(id.clone()) {
                continue;
            }
            let Some(record) = self.index.get(id.as_str()) else {
                continue;
            };
            let children = filtered.children_of(id.as_str());
            let is_expanded = self.expansion.is_expanded(id.as_str());

            items.push(VisibleItem {
                title: record.title.clone(),
                kind: record.kind,
                depth,
                is_selected: self.selection.as_ref() == Some(&id),
                is_expanded,
                has_children: !children.is_empty(),
                is_inactive: self.inactive.contains(&id),
                is_match: filtered.is_match(id.as_str()),
                id,
            });

            if is_expanded {
                stack.extend(
                    sort_siblings(children, &self.index, &self.inactive)
                        .into_iter()
                        .rev()
                        .map(|child| (child, depth + 1)),
                );
            }
        }
        items
    }

    pub fn build_view_model(&self) -> NavigatorViewModel {
        let start = std::time::Instant::now();
        let filtered = self.filtered();
        let items = self.visible_items();
        let selected_index = self
            .selection
            .as_ref()
            .and_then(|sel| items.iter().position(|item| &item.id == sel));
        log::debug!(
            "View model: {} rows built in {:?}",
            items.len(),
            start.elapsed()
        );

        NavigatorViewModel {
            items,
            selected_index,
            search_query: self.query.clone(),
            is_searching: self.editing_search,
            show_inactive: self.show_inactive,
            match_count: filtered.match_ids().len(),
        }
    }

    /// Node the view should scroll to, consumed by the renderer
    pub fn take_scroll_request(&mut self) -> Option<NodeId> {
        self.scroll_request.take()
    }

    pub fn move_candidates(&self, moved: &str, options: &CandidateOptions) -> Vec<MoveCandidate> {
        move_candidates(&self.index, moved, &self.inactive, options)
    }

    pub fn selection(&self) -> Option<&NodeId> {
        self.selection.as_ref()
    }

    pub fn selected_record(&self) -> Option<&NodeRecord> {
        self.selection
            .as_ref()
            .and_then(|id| self.index.get(id.as_str()))
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Whether the search box is being edited
    pub fn is_searching(&self) -> bool {
        self.editing_search
    }

    pub fn expansion_mode(&self) -> ExpansionMode {
        self.expansion.mode()
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expansion.is_expanded(id)
    }

    pub fn show_inactive(&self) -> bool {
        self.show_inactive
    }

    pub fn is_inactive(&self, id: &str) -> bool {
        self.inactive.contains(id)
    }

    pub fn index(&self) -> &TreeIndex {
        &self.index
    }

    pub fn inactive_ids(&self) -> &HashSet<NodeId> {
        &self.inactive
    }

    pub fn root_id(&self) -> Option<&NodeId> {
        self.root_id.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn version(&self) -> Option<&serde_json::Value> {
        self.version.as_ref()
    }
}
