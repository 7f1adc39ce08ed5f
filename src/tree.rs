use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Instant;

/// Opaque identifier of an org unit.
///
/// Backend ids may be numeric; they are stringified at the API boundary so
/// every comparison in the navigator is a plain string comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Category of a node. Only affects the icon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Organization,
    Department,
    #[default]
    Unit,
}

impl NodeKind {
    pub fn icon(&self) -> &'static str {
        match self {
            NodeKind::Organization => "◆",
            NodeKind::Department => "■",
            NodeKind::Unit => "•",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Organization => "Organization",
            NodeKind::Department => "Department",
            NodeKind::Unit => "Unit",
        }
    }
}

/// A unit in the hierarchy, in the nested form delivered by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: NodeId,
    pub title: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Create a new tree node without children
    pub fn new(id: impl Into<NodeId>, title: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            children: Vec::new(),
        }
    }

    pub fn organization(id: impl Into<NodeId>, title: impl Into<String>) -> Self {
        Self::new(id, title, NodeKind::Organization)
    }

    pub fn department(id: impl Into<NodeId>, title: impl Into<String>) -> Self {
        Self::new(id, title, NodeKind::Department)
    }

    pub fn unit(id: impl Into<NodeId>, title: impl Into<String>) -> Self {
        Self::new(id, title, NodeKind::Unit)
    }

    /// Append a child node, keeping input order
    pub fn add_child(&mut self, child: TreeNode) {
        self.children.push(child);
    }

    /// Builder-style variant of [`TreeNode::add_child`]
    pub fn with_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Flat per-node data stored in the index. Children live in the index, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    pub id: NodeId,
    pub title: String,
    pub kind: NodeKind,
}

/// Arena-style lookup structures over a tree snapshot.
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    by_id: HashMap<NodeId, NodeRecord>,
    parent_by_id: HashMap<NodeId, Option<NodeId>>,
    children_by_id: HashMap<NodeId, Vec<NodeId>>,
    root_ids: Vec<NodeId>,
    duplicates: Vec<NodeId>,
}

impl TreeIndex {
    /// Build the index with a pre-order traversal of `roots`.
    ///
    /// Duplicate ids are not rejected: the later-visited node wins in every
    /// map and the id is recorded in [`TreeIndex::duplicate_ids`].
    pub fn build(roots: &[TreeNode]) -> Self {
        let start = Instant::now();
        let mut index = Self::default();

        for root in roots {
            index.root_ids.push(root.id.clone());
            index.visit(root, None);
        }

        if !index.duplicates.is_empty() {
            log::warn!(
                "TreeIndex::build: {} duplicate id(s), later nodes win: {:?}",
                index.duplicates.len(),
                index.duplicates
            );
        }
        log::debug!(
            "TreeIndex::build: indexed {} nodes ({} roots) in {:?}",
            index.by_id.len(),
            index.root_ids.len(),
            start.elapsed()
        );

        index
    }

    fn visit(&mut self, node: &TreeNode, parent: Option<&NodeId>) {
        let record = NodeRecord {
            id: node.id.clone(),
            title: node.title.clone(),
            kind: node.kind,
        };
        if self.by_id.insert(node.id.clone(), record).is_some() {
            self.duplicates.push(node.id.clone());
        }
        self.parent_by_id.insert(node.id.clone(), parent.cloned());
        self.children_by_id.insert(
            node.id.clone(),
            node.children.iter().map(|child| child.id.clone()).collect(),
        );

        for child in &node.children {
            self.visit(child, Some(&node.id));
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&NodeRecord> {
        self.by_id.get(id)
    }

    pub fn title(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(|record| record.title.as_str())
    }

    pub fn root_ids(&self) -> &[NodeId] {
        &self.root_ids
    }

    /// Parent of `id`; `None` for roots and unknown ids
    pub fn parent_of(&self, id: &str) -> Option<&NodeId> {
        self.parent_by_id.get(id).and_then(|parent| parent.as_ref())
    }

    /// Immediate children of `id` in input order
    pub fn children_of(&self, id: &str) -> &[NodeId] {
        self.children_by_id
            .get(id)
            .map(|children| children.as_slice())
            .unwrap_or(&[])
    }

    pub fn duplicate_ids(&self) -> &[NodeId] {
        &self.duplicates
    }

    /// Strict ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: &str) -> Vec<NodeId> {
        let mut ancestors = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(id);

        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            // last-write-wins on duplicate ids can close a loop in the parent map
            if !seen.insert(parent.as_str()) {
                break;
            }
            ancestors.push(parent.clone());
            current = self.parent_of(parent.as_str());
        }
        ancestors
    }

    /// Every id reachable from `id` through `children_of`, excluding `id` itself.
    pub fn descendants(&self, id: &str) -> HashSet<NodeId> {
        let mut found = HashSet::new();
        let mut stack: Vec<&NodeId> = self.children_of(id).iter().collect();

        while let Some(current) = stack.pop() {
            if current.as_str() == id || !found.insert(current.clone()) {
                continue;
            }
            stack.extend(self.children_of(current.as_str()));
        }
        found
    }

    /// All ids in pre-order (input order at every level), each at most once
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.by_id.len());
        let mut seen = HashSet::new();
        for root in &self.root_ids {
            self.collect_preorder(root, &mut order, &mut seen);
        }
        order
    }

    fn collect_preorder(&self, id: &NodeId, order: &mut Vec<NodeId>, seen: &mut HashSet<NodeId>) {
        if !seen.insert(id.clone()) {
            return;
        }
        order.push(id.clone());
        for child in self.children_of(id.as_str()) {
            self.collect_preorder(child, order, seen);
        }
    }

    /// Rebuild the nested form from the index
    pub fn to_nodes(&self) -> Vec<TreeNode> {
        let mut seen = HashSet::new();
        self.root_ids
            .iter()
            .filter_map(|id| self.rebuild(id, &mut seen))
            .collect()
    }

    fn rebuild(&self, id: &NodeId, seen: &mut HashSet<NodeId>) -> Option<TreeNode> {
        if !seen.insert(id.clone()) {
            return None;
        }
        let record = self.get(id.as_str())?;
        let children = self
            .children_of(id.as_str())
            .iter()
            .filter_map(|child| self.rebuild(child, seen))
            .collect();
        Some(TreeNode {
            id: record.id.clone(),
            title: record.title.clone(),
            kind: record.kind,
            children,
        })
    }

    /// Root-to-node path of titles, used for the detail pane
    pub fn title_path(&self, id: &str) -> Vec<String> {
        let mut path: Vec<String> = self
            .ancestors(id)
            .iter()
            .rev()
            .filter_map(|ancestor| self.title(ancestor.as_str()).map(str::to_string))
            .collect();
        if let Some(title) = self.title(id) {
            path.push(title.to_string());
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_tree() -> Vec<TreeNode> {
        // Root
        //   DeptX
        //     UnitA
        //     UnitB
        //   DeptY
        vec![TreeNode::organization("root", "Root")
            .with_child(
                TreeNode::department("x", "DeptX")
                    .with_child(TreeNode::unit("a", "UnitA"))
                    .with_child(TreeNode::unit("b", "UnitB")),
            )
            .with_child(TreeNode::department("y", "DeptY"))]
    }

    #[test]
    fn test_build_indexes_every_node() {
        let index = TreeIndex::build(&create_test_tree());

        assert_eq!(index.len(), 5);
        assert_eq!(index.root_ids(), &[NodeId::from("root")]);
        assert_eq!(index.title("a"), Some("UnitA"));
        assert_eq!(index.get("x").unwrap().kind, NodeKind::Department);
        assert!(index.duplicate_ids().is_empty());
    }

    #[test]
    fn test_parent_and_children_maps() {
        let index = TreeIndex::build(&create_test_tree());

        assert_eq!(index.parent_of("root"), None);
        assert_eq!(index.parent_of("a"), Some(&NodeId::from("x")));
        assert_eq!(
            index.children_of("x"),
            &[NodeId::from("a"), NodeId::from("b")]
        );
        assert!(index.children_of("y").is_empty());
        assert!(index.children_of("missing").is_empty());
    }

    #[test]
    fn test_children_keep_input_order() {
        let roots = vec![TreeNode::department("d", "D")
            .with_child(TreeNode::unit("z", "Zeta"))
            .with_child(TreeNode::unit("a", "Alpha"))];
        let index = TreeIndex::build(&roots);

        assert_eq!(index.children_of("d"), &[NodeId::from("z"), NodeId::from("a")]);
    }

    #[test]
    fn test_ancestors_are_strict_and_nearest_first() {
        let index = TreeIndex::build(&create_test_tree());

        assert_eq!(
            index.ancestors("a"),
            vec![NodeId::from("x"), NodeId::from("root")]
        );
        assert!(index.ancestors("root").is_empty());
        assert!(index.ancestors("missing").is_empty());
    }

    #[test]
    fn test_descendants() {
        let index = TreeIndex::build(&create_test_tree());

        let descendants = index.descendants("x");
        assert_eq!(descendants.len(), 2);
        assert!(descendants.contains("a"));
        assert!(descendants.contains("b"));
        assert_eq!(index.descendants("root").len(), 4);
        assert!(index.descendants("y").is_empty());
    }

    #[test]
    fn test_preorder() {
        let index = TreeIndex::build(&create_test_tree());
        let preorder = index.preorder();
        let order: Vec<&str> = preorder.iter().map(|id| id.as_str()).collect();

        assert_eq!(order, vec!["root", "x", "a", "b", "y"]);
    }

    #[test]
    fn test_duplicate_id_later_node_wins() {
        let roots = vec![
            TreeNode::department("d1", "First").with_child(TreeNode::unit("u", "Early")),
            TreeNode::department("d2", "Second").with_child(TreeNode::unit("u", "Late")),
        ];
        let index = TreeIndex::build(&roots);

        assert_eq!(index.len(), 3);
        assert_eq!(index.title("u"), Some("Late"));
        assert_eq!(index.parent_of("u"), Some(&NodeId::from("d2")));
        assert_eq!(index.duplicate_ids(), &[NodeId::from("u")]);
    }

    #[test]
    fn test_duplicate_ids_cannot_loop_traversals() {
        // "a" appears under "b" after "b" was indexed under "a": parent map forms a loop
        let roots = vec![TreeNode::unit("a", "A")
            .with_child(TreeNode::unit("b", "B").with_child(TreeNode::unit("a", "A again")))];
        let index = TreeIndex::build(&roots);

        assert!(index.ancestors("a").len() <= 2);
        assert!(index.descendants("a").len() <= 2);
        assert!(index.preorder().len() <= 2);
    }

    #[test]
    fn test_to_nodes_round_trips_structure() {
        let roots = create_test_tree();
        let index = TreeIndex::build(&roots);

        assert_eq!(index.to_nodes(), roots);
    }

    #[test]
    fn test_title_path() {
        let index = TreeIndex::build(&create_test_tree());

        assert_eq!(index.title_path("b"), vec!["Root", "DeptX", "UnitB"]);
        assert!(index.title_path("missing").is_empty());
    }

    #[test]
    fn test_empty_index() {
        let index = TreeIndex::build(&[]);

        assert!(index.is_empty());
        assert!(index.preorder().is_empty());
        assert!(index.to_nodes().is_empty());
    }
}
