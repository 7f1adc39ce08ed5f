//! Choosing a new parent for a node without creating a cycle.

use crate::error::{NavigatorError, Result};
use crate::filter::Matcher;
use crate::sort::collation_key;
use crate::tree::{NodeId, TreeIndex};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveCandidate {
    pub id: NodeId,
    pub title: String,
}

/// Where a node should end up. `Root` is the synthetic "no parent" choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveTarget {
    Root,
    Parent(NodeId),
}

impl MoveTarget {
    pub fn parent_id(&self) -> Option<&NodeId> {
        match self {
            MoveTarget::Root => None,
            MoveTarget::Parent(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CandidateOptions {
    pub include_inactive: bool,
    /// Case-insensitive substring over title or id; empty keeps everything
    pub filter: String,
}

/// The moved node and everything beneath it
pub fn forbidden_targets(index: &TreeIndex, moved: &str) -> HashSet<NodeId> {
    let mut forbidden = index.descendants(moved);
    forbidden.insert(NodeId::from(moved));
    forbidden
}

/// Eligible new parents for `moved`, sorted by title.
///
/// Returns an empty list when `moved` is not in the tree.
pub fn move_candidates(
    index: &TreeIndex,
    moved: &str,
    inactive: &HashSet<NodeId>,
    options: &CandidateOptions,
) -> Vec<MoveCandidate> {
    if !index.contains(moved) {
        log::debug!("move_candidates: node {} not in tree, no candidates", moved);
        return Vec::new();
    }

    let forbidden = forbidden_targets(index, moved);
    let matcher = Matcher::new(&options.filter);

    let mut candidates: Vec<(String, MoveCandidate)> = index
        .preorder()
        .into_iter()
        .filter(|id| !forbidden.contains(id))
        .filter(|id| options.include_inactive || !inactive.contains(id))
        .filter_map(|id| {
            let title = index.title(id.as_str())?.to_string();
            Some(MoveCandidate { id, title })
        })
        .filter(|candidate| match &matcher {
            Some(matcher) => {
                matcher.is_match(&candidate.title) || matcher.is_match(candidate.id.as_str())
            }
            None => true,
        })
        .map(|candidate| (collation_key(&candidate.title), candidate))
        .collect();

    candidates.sort_by(|a, b| a.0.cmp(&b.0));
    candidates.into_iter().map(|(_, candidate)| candidate).collect()
}

/// Re-check a chosen target right before the move is requested
pub fn validate_move(index: &TreeIndex, moved: &str, target: &MoveTarget) -> Result<()> {
    if !index.contains(moved) {
        return Err(NavigatorError::UnknownNode(NodeId::from(moved)));
    }
    let Some(parent) = target.parent_id() else {
        return Ok(());
    };
    if !index.contains(parent.as_str()) {
        return Err(NavigatorError::UnknownNode(parent.clone()));
    }
    if forbidden_targets(index, moved).contains(parent) {
        return Err(NavigatorError::InvalidMove(format!(
            "{} cannot be moved under itself or one of its descendants",
            index.title(moved).unwrap_or(moved)
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeNode;
    use assert_matches::assert_matches;

    // Root -> [DeptX -> [UnitA, UnitB], DeptY -> [UnitC]]
    fn create_test_index() -> TreeIndex {
        TreeIndex::build(&[TreeNode::organization("root", "Root")
            .with_child(
                TreeNode::department("x", "DeptX")
                    .with_child(TreeNode::unit("a", "UnitA"))
                    .with_child(TreeNode::unit("b", "UnitB")),
            )
            .with_child(TreeNode::department("y", "DeptY").with_child(TreeNode::unit("c", "UnitC")))])
    }

    fn candidate_ids(candidates: &[MoveCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_moving_department_excludes_its_subtree() {
        let index = create_test_index();
        let candidates = move_candidates(&index, "x", &HashSet::new(), &CandidateOptions::default());

        assert_eq!(candidate_ids(&candidates), vec!["y", "root", "c"]);
    }

    #[test]
    fn test_candidates_sorted_by_title() {
        let index = create_test_index();
        let candidates = move_candidates(&index, "c", &HashSet::new(), &CandidateOptions::default());
        let titles: Vec<&str> = candidates.iter().map(|c| c.title.as_str()).collect();

        assert_eq!(titles, vec!["DeptX", "DeptY", "Root", "UnitA", "UnitB"]);
    }

    #[test]
    fn test_inactive_candidates_optional() {
        let index = create_test_index();
        let inactive: HashSet<NodeId> = [NodeId::from("y")].into_iter().collect();

        let hidden = move_candidates(&index, "a", &inactive, &CandidateOptions::default());
        assert!(!candidate_ids(&hidden).contains(&"y"));

        let options = CandidateOptions {
            include_inactive: true,
            ..Default::default()
        };
        let shown = move_candidates(&index, "a", &inactive, &options);
        assert!(candidate_ids(&shown).contains(&"y"));
    }

    #[test]
    fn test_filter_matches_title_or_id() {
        let index = create_test_index();
        let by_title = CandidateOptions {
            filter: "dept".to_string(),
            ..Default::default()
        };
        assert_eq!(
            candidate_ids(&move_candidates(&index, "c", &HashSet::new(), &by_title)),
            vec!["x", "y"]
        );

        let by_id = CandidateOptions {
            filter: "ROOT".to_string(),
            ..Default::default()
        };
        assert_eq!(
            candidate_ids(&move_candidates(&index, "c", &HashSet::new(), &by_id)),
            vec!["root"]
        );
    }

    #[test]
    fn test_unknown_node_yields_no_candidates() {
        let index = create_test_index();
        assert!(move_candidates(&index, "ghost", &HashSet::new(), &CandidateOptions::default()).is_empty());
    }

    #[test]
    fn test_validate_move() {
        let index = create_test_index();

        assert!(validate_move(&index, "x", &MoveTarget::Root).is_ok());
        assert!(validate_move(&index, "x", &MoveTarget::Parent(NodeId::from("y"))).is_ok());
        assert_matches!(
            validate_move(&index, "x", &MoveTarget::Parent(NodeId::from("a"))),
            Err(NavigatorError::InvalidMove(_))
        );
        assert_matches!(
            validate_move(&index, "x", &MoveTarget::Parent(NodeId::from("x"))),
            Err(NavigatorError::InvalidMove(_))
        );
        assert_matches!(
            validate_move(&index, "x", &MoveTarget::Parent(NodeId::from("ghost"))),
            Err(NavigatorError::UnknownNode(_))
        );
        assert_matches!(
            validate_move(&index, "ghost", &MoveTarget::Root),
            Err(NavigatorError::UnknownNode(_))
        );
    }
}
