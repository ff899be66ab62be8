use crate::graph_state::NodeId;
use crate::permission::Permission;
use crate::validation::Issue;

/// Failures of graph mutations and editor actions.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("node {0} is not part of this graph")]
    InvalidReference(NodeId),
    #[error("node {0} not found")]
    NotFound(NodeId),
    #[error("cannot connect node {0} to itself")]
    SelfConnection(NodeId),
    #[error("invalid value {value} for {field}")]
    InvalidAttribute { field: &'static str, value: f64 },
    #[error("node {0} is locked")]
    Locked(NodeId),
    #[error("no node is selected")]
    NoSelection,
    #[error("missing permission: {0}")]
    Forbidden(Permission),
}

/// Failures reading or writing revision and config files.
#[derive(thiserror::Error, Debug)]
pub enum PersistError {
    #[error("file access failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("revision failed integrity checks: {}", summarize(.0))]
    Invalid(Vec<Issue>),
}

/// Failures reported by the host when fetching a panorama image.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TextureError {
    #[error("panorama could not be fetched: {0}")]
    Fetch(String),
    #[error("panorama could not be decoded: {0}")]
    Decode(String),
}

fn summarize(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
