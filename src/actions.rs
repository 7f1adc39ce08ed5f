use crate::tree::NodeId;
use serde::{Deserialize, Serialize};

/// An action a user can request on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeAction {
    AddChild,
    Rename,
    Move,
    Deactivate,
    Activate,
}

impl NodeAction {
    pub fn label(&self) -> &'static str {
        match self {
            NodeAction::AddChild => "Add child",
            NodeAction::Rename => "Rename",
            NodeAction::Move => "Move",
            NodeAction::Deactivate => "Deactivate",
            NodeAction::Activate => "Activate",
        }
    }
}

/// What the caller lets the user do. Decided outside the navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub add: bool,
    pub rename: bool,
    #[serde(rename = "move")]
    pub move_node: bool,
    pub deactivate: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::all()
    }
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            add: true,
            rename: true,
            move_node: true,
            deactivate: true,
        }
    }

    pub fn read_only() -> Self {
        Self {
            add: false,
            rename: false,
            move_node: false,
            deactivate: false,
        }
    }

    pub fn allows(&self, action: NodeAction) -> bool {
        match action {
            NodeAction::AddChild => self.add,
            NodeAction::Rename => self.rename,
            NodeAction::Move => self.move_node,
            NodeAction::Deactivate | NodeAction::Activate => self.deactivate,
        }
    }

    /// Actions offered for a node, in menu order
    pub fn available_for(&self, is_inactive: bool) -> Vec<NodeAction> {
        let status_action = if is_inactive {
            NodeAction::Activate
        } else {
            NodeAction::Deactivate
        };
        [
            NodeAction::AddChild,
            NodeAction::Rename,
            NodeAction::Move,
            status_action,
        ]
        .into_iter()
        .filter(|action| self.allows(*action))
        .collect()
    }
}

/// An `on_action(node_id, action)` request leaving the navigator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub node_id: NodeId,
    pub action: NodeAction,
}
