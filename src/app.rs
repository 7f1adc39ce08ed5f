use crate::actions::{ActionRequest, Capabilities, NodeAction};
use crate::api::{Mutation, NewUnit, TreeStatus};
use crate::async_task::Task;
use crate::config::{Config, LayoutConfig};
use crate::error::{NavigatorError, Result};
use crate::move_target::{validate_move, CandidateOptions, MoveTarget};
use crate::navigator::NavigatorState;
use crate::theme::{get_theme, Theme};
use crate::tree::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddField {
    Name,
    Code,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalKind {
    Rename {
        input: String,
    },
    Move {
        filter: String,
        include_inactive: bool,
        cursor: usize,
    },
    AddChild {
        name: String,
        code: String,
        field: AddField,
    },
    ConfirmStatus {
        activate: bool,
    },
}

/// An action dialog for one node.
///
/// While `locked` a mutation is in flight: input and close are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal {
    pub node_id: NodeId,
    pub kind: ModalKind,
    pub locked: bool,
    pub error: Option<String>,
}

impl Modal {
    pub fn new(node_id: NodeId, kind: ModalKind) -> Self {
        Self {
            node_id,
            kind,
            locked: false,
            error: None,
        }
    }

    pub fn title(&self) -> &'static str {
        match &self.kind {
            ModalKind::Rename { .. } => "Rename",
            ModalKind::Move { .. } => "Move",
            ModalKind::AddChild { .. } => "Add child unit",
            ModalKind::ConfirmStatus { activate: true } => "Activate",
            ModalKind::ConfirmStatus { activate: false } => "Deactivate",
        }
    }
}

/// One row of the move dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveChoice {
    pub target: MoveTarget,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct UiState {
    pub status_message: String,
    pub is_loading: bool,
    pub force_redraw: bool,
    pub scroll_offset: usize,
    pub viewport_height: usize,
    pub last_error: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            status_message: "Ready".to_string(),
            is_loading: false,
            force_redraw: false,
            scroll_offset: 0,
            viewport_height: 18,
            last_error: None,
        }
    }
}

pub struct App {
    pub navigator: NavigatorState,
    pub ui: UiState,
    pub modal: Option<Modal>,
    pub capabilities: Capabilities,
    pub tree_status: TreeStatus,
    pub layout: LayoutConfig,
    pub theme: Theme,
    pub should_quit: bool,
    fetch_generation: u64,
}

impl App {
    pub fn new(config: &Config) -> Self {
        Self {
            navigator: NavigatorState::new(config.tree.show_inactive),
            ui: UiState::default(),
            modal: None,
            capabilities: config.capabilities,
            tree_status: config.tree.status,
            layout: config.layout.clone(),
            theme: get_theme(),
            should_quit: false,
            fetch_generation: 0,
        }
    }

    /// Start a new fetch generation; results of older ones are discarded
    pub fn request_reload(&mut self) -> Task {
        self.fetch_generation += 1;
        self.ui.is_loading = true;
        log::info!("Requesting tree fetch #{}", self.fetch_generation);
        Task::FetchTree {
            generation: self.fetch_generation,
            status: self.tree_status,
        }
    }

    pub fn fetch_generation(&self) -> u64 {
        self.fetch_generation
    }

    pub fn is_modal_locked(&self) -> bool {
        self.modal.as_ref().map(|m| m.locked).unwrap_or(false)
    }

    /// Actions offered for the selected node under the current capabilities
    pub fn available_actions(&self) -> Vec<NodeAction> {
        match self.navigator.selection() {
            Some(id) => self
                .capabilities
                .available_for(self.navigator.is_inactive(id.as_str())),
            None => Vec::new(),
        }
    }

    /// The `on_action(node_id, action)` entry point: open the matching dialog
    pub fn on_action(&mut self, request: ActionRequest) -> Result<()> {
        let ActionRequest { node_id, action } = request;
        let Some(record) = self.navigator.index().get(node_id.as_str()) else {
            return Err(NavigatorError::UnknownNode(node_id));
        };
        if !self.capabilities.allows(action) {
            return Err(NavigatorError::Generic(format!(
                "{} is not permitted",
                action.label()
            )));
        }
        let is_inactive = self.navigator.is_inactive(node_id.as_str());
        let kind = match action {
            NodeAction::Rename => ModalKind::Rename {
                input: record.title.clone(),
            },
            NodeAction::Move => ModalKind::Move {
                filter: String::new(),
                include_inactive: false,
                cursor: 0,
            },
            NodeAction::AddChild => ModalKind::AddChild {
                name: String::new(),
                code: String::new(),
                field: AddField::Name,
            },
            NodeAction::Deactivate if is_inactive => {
                return Err(NavigatorError::Generic(format!(
                    "{} is already inactive",
                    record.title
                )))
            }
            NodeAction::Activate if !is_inactive => {
                return Err(NavigatorError::Generic(format!(
                    "{} is already active",
                    record.title
                )))
            }
            NodeAction::Deactivate => ModalKind::ConfirmStatus { activate: false },
            NodeAction::Activate => ModalKind::ConfirmStatus { activate: true },
        };
        log::debug!("Opening {:?} dialog for {}", action, node_id);
        self.modal = Some(Modal::new(node_id, kind));
        Ok(())
    }

    /// Open `action` for the current selection, reporting refusals in the status bar
    pub fn open_action_for_selection(&mut self, action: NodeAction) -> bool {
        let Some(node_id) = self.navigator.selection().cloned() else {
            self.ui.status_message = "Select a unit first".to_string();
            return false;
        };
        match self.on_action(ActionRequest { node_id, action }) {
            Ok(()) => true,
            Err(e) => {
                self.ui.status_message = e.user_message();
                false
            }
        }
    }

    /// Close the dialog unless a mutation is in flight
    pub fn close_modal(&mut self) -> bool {
        match &self.modal {
            Some(modal) if modal.locked => false,
            Some(_) => {
                self.modal = None;
                true
            }
            None => false,
        }
    }

    /// Rows of the open move dialog: "no parent" first, then the candidates
    pub fn move_choices(&self) -> Vec<MoveChoice> {
        let Some(Modal {
            node_id,
            kind:
                ModalKind::Move {
                    filter,
                    include_inactive,
                    ..
                },
            ..
        }) = &self.modal
        else {
            return Vec::new();
        };

        let options = CandidateOptions {
            include_inactive: *include_inactive,
            filter: filter.clone(),
        };
        let mut choices = vec![MoveChoice {
            target: MoveTarget::Root,
            label: "(no parent: top level)".to_string(),
        }];
        choices.extend(
            self.navigator
                .move_candidates(node_id.as_str(), &options)
                .into_iter()
                .map(|candidate| MoveChoice {
                    label: candidate.title,
                    target: MoveTarget::Parent(candidate.id),
                }),
        );
        choices
    }

    /// Validate the dialog and turn it into a mutation task.
    ///
    /// Validation failures stay inside the dialog. On success the dialog is
    /// locked until the worker answers.
    pub fn submit_modal(&mut self) -> Option<Task> {
        let modal = self.modal.as_ref()?;
        if modal.locked {
            return None;
        }

        let built = self.build_mutation(modal);
        let modal = self.modal.as_mut()?;
        match built {
            Ok(mutation) => {
                log::info!("Submitting {:?}", mutation);
                modal.locked = true;
                modal.error = None;
                self.ui.status_message = "Saving...".to_string();
                Some(Task::Mutate { mutation })
            }
            Err(e) => {
                modal.error = Some(e.user_message());
                None
            }
        }
    }

    fn build_mutation(&self, modal: &Modal) -> Result<Mutation> {
        let id = modal.node_id.clone();
        let index = self.navigator.index();
        if !index.contains(id.as_str()) {
            return Err(NavigatorError::UnknownNode(id));
        }

        match &modal.kind {
            ModalKind::Rename { input } => {
                let name = input.trim();
                if name.is_empty() {
                    return Err("Name cannot be empty".into());
                }
                Ok(Mutation::Rename {
                    id,
                    name: name.to_string(),
                })
            }
            ModalKind::Move { cursor, .. } => {
                let choice = self
                    .move_choices()
                    .into_iter()
                    .nth(*cursor)
                    .ok_or_else(|| NavigatorError::from("Choose a new parent"))?;
                validate_move(index, id.as_str(), &choice.target)?;
                if index.parent_of(id.as_str()) == choice.target.parent_id() {
                    return Err("The unit is already there".into());
                }
                Ok(Mutation::Move {
                    id,
                    parent: choice.target.parent_id().cloned(),
                })
            }
            ModalKind::AddChild { name, code, .. } => {
                let name = name.trim();
                if name.is_empty() {
                    return Err("Name cannot be empty".into());
                }
                let code = code.trim();
                Ok(Mutation::Create(NewUnit {
                    name: name.to_string(),
                    parent_unit_id: Some(id),
                    code: (!code.is_empty()).then(|| code.to_string()),
                    is_active: true,
                }))
            }
            ModalKind::ConfirmStatus { activate: true } => Ok(Mutation::Activate { id }),
            ModalKind::ConfirmStatus { activate: false } => Ok(Mutation::Deactivate { id }),
        }
    }
}
