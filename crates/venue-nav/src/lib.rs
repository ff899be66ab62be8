//! Indoor navigation graph editing and panorama hotspot placement.

pub mod actions;
pub mod analysis;
pub mod cache;
pub mod effects;
pub mod error;
pub mod graph_state;
pub mod hotspot;
pub mod permission;
pub mod projection;
pub mod serialization;
pub mod settings;
pub mod state;
pub mod store;
pub mod texture;
pub mod validation;
pub mod versioned;
pub mod view_state;

pub use actions::Action;
pub use error::{GraphError, PersistError, TextureError};
pub use graph_state::{
    Connection, ConnectionId, NavGraph, Node, NodeId, NodePatch, RevisionId,
};
pub use hotspot::{Hotspot, PanoramaViewer};
pub use permission::Permission;
pub use settings::{GraphSettings, ViewerConfig};
pub use state::State;
pub use store::{Store, StoreEvent};
pub use validation::{Issue, ValidationResult};
