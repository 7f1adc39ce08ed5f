//! REST access to the org-unit backend.
//!
//! Every accepted wire shape is mapped into a [`TreeSnapshot`] by
//! [`parse_tree_body`]. Nothing outside this module sees the wire types.

use crate::config::ApiConfig;
use crate::error::{NavigatorError, Result};
use crate::tree::{NodeId, NodeKind, TreeNode};
use futures::future::{BoxFuture, FutureExt};
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Canonical result of a tree fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeSnapshot {
    pub roots: Vec<TreeNode>,
    pub inactive_ids: HashSet<NodeId>,
    pub root_id: Option<NodeId>,
    /// Opaque, shown in the status bar only
    pub total: Option<u64>,
    /// Opaque, shown in the status bar only
    pub version: Option<serde_json::Value>,
}

impl TreeSnapshot {
    pub fn new(roots: Vec<TreeNode>) -> Self {
        Self {
            roots,
            ..Default::default()
        }
    }

    pub fn with_inactive<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        self.inactive_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_root_id(mut self, root_id: impl Into<NodeId>) -> Self {
        self.root_id = Some(root_id.into());
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(serde_json::Number),
}

impl From<WireId> for NodeId {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Text(text) => NodeId::new(text),
            WireId::Number(number) => NodeId::new(number.to_string()),
        }
    }
}

// Every accepted name is its own field; when several are present the first
// usable one in declaration order wins.
#[derive(Debug, Deserialize)]
struct WireNode {
    id: Option<WireId>,
    unit_id: Option<WireId>,
    title: Option<String>,
    name: Option<String>,
    display_name: Option<String>,
    kind: Option<String>,
    #[serde(rename = "type")]
    type_name: Option<String>,
    node_type: Option<String>,
    children: Option<Vec<WireNode>>,
    subunits: Option<Vec<WireNode>>,
    is_active: Option<bool>,
    active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct WireEnvelope {
    items: Option<Vec<WireNode>>,
    nodes: Option<Vec<WireNode>>,
    data: Option<Vec<WireNode>>,
    #[serde(default)]
    inactive_ids: Vec<WireId>,
    root_id: Option<WireId>,
    total: Option<u64>,
    version: Option<serde_json::Value>,
}

/// First non-empty list, else the first one present, else nothing
fn first_list<const N: usize>(lists: [Option<Vec<WireNode>>; N]) -> Vec<WireNode> {
    let mut fallback = None;
    for list in lists.into_iter().flatten() {
        if !list.is_empty() {
            return list;
        }
        if fallback.is_none() {
            fallback = Some(list);
        }
    }
    fallback.unwrap_or_default()
}

fn first_text(texts: [Option<String>; 3]) -> Option<String> {
    texts
        .into_iter()
        .flatten()
        .find(|text| !text.trim().is_empty())
}

fn wire_kind(kind: Option<&str>) -> NodeKind {
    match kind.map(|k| k.trim().to_ascii_lowercase()).as_deref() {
        Some("organization") | Some("org") => NodeKind::Organization,
        Some("department") | Some("dept") => NodeKind::Department,
        _ => NodeKind::Unit,
    }
}

fn normalize_node(node: WireNode, inactive: &mut HashSet<NodeId>) -> Result<TreeNode> {
    let id = match (node.id, node.unit_id) {
        (Some(id), _) | (None, Some(id)) => NodeId::from(id),
        (None, None) => {
            return Err(NavigatorError::Json(serde::de::Error::missing_field("id")));
        }
    };
    if node.is_active.or(node.active) == Some(false) {
        inactive.insert(id.clone());
    }
    let title = first_text([node.title, node.name, node.display_name])
        .unwrap_or_else(|| id.to_string());
    let kind = first_text([node.kind, node.type_name, node.node_type]);

    let mut tree_node = TreeNode::new(id, title, wire_kind(kind.as_deref()));
    for child in first_list([node.children, node.subunits]) {
        tree_node.add_child(normalize_node(child, inactive)?);
    }
    Ok(tree_node)
}

impl WireEnvelope {
    fn normalize(self) -> Result<TreeSnapshot> {
        let items = first_list([self.items, self.nodes, self.data]);

        let mut inactive_ids: HashSet<NodeId> =
            self.inactive_ids.into_iter().map(NodeId::from).collect();
        let roots = items
            .into_iter()
            .map(|node| normalize_node(node, &mut inactive_ids))
            .collect::<Result<Vec<_>>>()?;

        Ok(TreeSnapshot {
            roots,
            inactive_ids,
            root_id: self.root_id.map(NodeId::from),
            total: self.total,
            version: self.version,
        })
    }
}

/// Parse a tree-fetch response body (or a snapshot file) in any accepted shape.
///
/// A top-level array is a bare node list; anything else must be an envelope.
/// Decoding errors keep serde's own message.
pub fn parse_tree_body(body: &str) -> Result<TreeSnapshot> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let envelope = if value.is_array() {
        WireEnvelope {
            items: Some(serde_json::from_value(value)?),
            ..Default::default()
        }
    } else {
        serde_json::from_value(value)?
    };
    let snapshot = envelope.normalize()?;
    log::debug!(
        "Parsed tree body: {} roots, {} inactive ids",
        snapshot.roots.len(),
        snapshot.inactive_ids.len()
    );
    Ok(snapshot)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeStatus {
    Active,
    #[default]
    All,
}

impl TreeStatus {
    pub fn as_query(&self) -> &'static str {
        match self {
            TreeStatus::Active => "active",
            TreeStatus::All => "all",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUnit {
    pub name: String,
    pub parent_unit_id: Option<NodeId>,
    pub code: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Rename { id: NodeId, name: String },
    Move { id: NodeId, parent: Option<NodeId> },
    Deactivate { id: NodeId },
    Activate { id: NodeId },
    Create(NewUnit),
}

/// Method, path segments below the base URL, and JSON body of a mutation
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub body: Option<serde_json::Value>,
}

impl MutationRequest {
    pub fn path(&self) -> String {
        self.segments.join("/")
    }
}

impl Mutation {
    pub fn request(&self) -> MutationRequest {
        let unit = |id: &NodeId, tail: &[&str]| {
            let mut segments = vec!["org-units".to_string(), id.to_string()];
            segments.extend(tail.iter().map(|s| s.to_string()));
            segments
        };

        match self {
            Mutation::Rename { id, name } => MutationRequest {
                method: Method::PATCH,
                segments: unit(id, &[]),
                body: Some(serde_json::json!({ "name": name })),
            },
            Mutation::Move { id, parent } => MutationRequest {
                method: Method::PATCH,
                segments: unit(id, &["move"]),
                body: Some(serde_json::json!({ "parent_unit_id": parent })),
            },
            Mutation::Deactivate { id } => MutationRequest {
                method: Method::PATCH,
                segments: unit(id, &["deactivate"]),
                body: None,
            },
            Mutation::Activate { id } => MutationRequest {
                method: Method::PATCH,
                segments: unit(id, &["activate"]),
                body: None,
            },
            Mutation::Create(new_unit) => MutationRequest {
                method: Method::POST,
                segments: vec!["org-units".to_string()],
                body: Some(serde_json::json!(new_unit)),
            },
        }
    }

    pub fn node_id(&self) -> Option<&NodeId> {
        match self {
            Mutation::Rename { id, .. }
            | Mutation::Move { id, .. }
            | Mutation::Deactivate { id }
            | Mutation::Activate { id } => Some(id),
            Mutation::Create(_) => None,
        }
    }

    /// Past-tense summary for the status bar
    pub fn describe(&self) -> String {
        match self {
            Mutation::Rename { name, .. } => format!("Renamed to \"{}\"", name),
            Mutation::Move { parent: Some(parent), .. } => format!("Moved under {}", parent),
            Mutation::Move { parent: None, .. } => "Moved to top level".to_string(),
            Mutation::Deactivate { id } => format!("Deactivated {}", id),
            Mutation::Activate { id } => format!("Activated {}", id),
            Mutation::Create(new_unit) => format!("Created \"{}\"", new_unit.name),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait OrgUnitApi: Send + Sync {
    fn fetch_tree(&self, status: TreeStatus) -> BoxFuture<'static, Result<TreeSnapshot>>;

    /// Response bodies are ignored; success means "reload".
    fn mutate(&self, mutation: Mutation) -> BoxFuture<'static, Result<()>>;
}

pub struct HttpOrgUnitApi {
    client: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl HttpOrgUnitApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            NavigatorError::Config(format!("invalid api.base_url {:?}: {}", config.base_url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(NavigatorError::Config(format!(
                "api.base_url {:?} cannot carry a path",
                config.base_url
            )));
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("org-navigator/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base,
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    pub fn url<S: AsRef<str>>(&self, segments: &[S]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments.iter().map(|s| s.as_ref()));
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let request = self.client.request(method, url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Turn a non-success response into `NavigatorError::Http`, preferring the
/// server's own `detail`/`message` text.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|json| {
            ["detail", "message", "error"]
                .iter()
                .find_map(|key| json.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

    Err(NavigatorError::Http {
        status: status.as_u16(),
        message,
    })
}

impl OrgUnitApi for HttpOrgUnitApi {
    fn fetch_tree(&self, status: TreeStatus) -> BoxFuture<'static, Result<TreeSnapshot>> {
        let mut url = self.url(&["org-units", "tree"]);
        url.query_pairs_mut().append_pair("status", status.as_query());
        let request = self.request(Method::GET, url);

        async move {
            log::info!("Fetching org-unit tree (status={})", status.as_query());
            let response = check_status(request.send().await?).await?;
            let body = response.text().await?;
            parse_tree_body(&body)
        }
        .boxed()
    }

    fn mutate(&self, mutation: Mutation) -> BoxFuture<'static, Result<()>> {
        let MutationRequest {
            method,
            segments,
            body,
        } = mutation.request();
        let url = self.url(&segments);
        let mut request = self.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        async move {
            log::info!("{} {}", method, segments.join("/"));
            check_status(request.send().await?).await?;
            Ok(())
        }
        .boxed()
    }
}
