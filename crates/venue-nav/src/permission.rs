use std::collections::HashSet;
use std::fmt;

pub const GRAPH_EDIT: &str = "graph:edit";
pub const REVISION_PUBLISH: &str = "revision:publish";

/// A permission requirement checked against the caller's grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    Single(String),
    /// Satisfied by any member. An empty set is never satisfied.
    AnyOf(Vec<String>),
    /// Satisfied when every member is granted. An empty set always is.
    AllOf(Vec<String>),
}

impl Permission {
    pub fn single(name: &str) -> Self {
        Permission::Single(name.to_owned())
    }

    pub fn is_granted(&self, grants: &HashSet<String>) -> bool {
        match self {
            Permission::Single(name) => grants.contains(name),
            Permission::AnyOf(names) => {
                names.iter().any(|n| grants.contains(n))
            }
            Permission::AllOf(names) => {
                names.iter().all(|n| grants.contains(n))
            }
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::Single(name) => f.write_str(name),
            Permission::AnyOf(names) => {
                write!(f, "any of [{}]", names.join(", "))
            }
            Permission::AllOf(names) => {
                write!(f, "all of [{}]", names.join(", "))
            }
        }
    }
}

/// Grants held by a full editor.
pub fn editor_grants() -> HashSet<String> {
    [GRAPH_EDIT, REVISION_PUBLISH]
        .into_iter()
        .map(str::to_owned)
        .collect()
}

/// Grants of a read-only viewer.
pub fn viewer_grants() -> HashSet<String> {
    HashSet::new()
}
