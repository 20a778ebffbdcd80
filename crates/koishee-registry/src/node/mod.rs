//! Wire model of the etcd v2 keys API.
//!
//! Both snapshot and watch responses share one envelope: an `action` naming
//! what happened and the `node` it happened to. Only the fields the watcher
//! consumes are modelled; unknown fields are ignored.

use serde::Deserialize;

/// Kind of change reported by the registry.
///
/// The registry protocol defines more actions than the watcher dispatches
/// (`create`, `update`, `expire`, `compareAndSwap`, ...). Those are kept as
/// [`Action::Unhandled`] so callers ignore them explicitly rather than
/// misreading them as a registration or removal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Action {
    /// A key was written.
    Set,
    /// A key was removed.
    Delete,
    /// Any other action, carrying its wire name.
    Unhandled(String),
}

impl Action {
    /// Wire name of the action.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Set => "set",
            Self::Delete => "delete",
            Self::Unhandled(name) => name,
        }
    }
}

impl From<String> for Action {
    fn from(name: String) -> Self {
        match name.as_str() {
            "set" => Self::Set,
            "delete" => Self::Delete,
            _ => Self::Unhandled(name),
        }
    }
}

impl From<&str> for Action {
    fn from(name: &str) -> Self {
        Self::from(name.to_owned())
    }
}

/// One key in the registry tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryNode {
    /// Absolute key path.
    #[serde(default)]
    pub key: String,
    /// Stored value; absent for directories and deleted keys.
    #[serde(default)]
    pub value: Option<String>,
    /// Whether the node is a directory.
    #[serde(default)]
    pub dir: bool,
    /// Registry index of the last modification.
    #[serde(default)]
    pub modified_index: u64,
    /// Registry index at which the key was created.
    #[serde(default)]
    pub created_index: u64,
    /// Children of a directory fetched recursively.
    #[serde(default)]
    pub nodes: Vec<RegistryNode>,
}

impl RegistryNode {
    /// Builds a value-bearing node.
    #[must_use]
    pub fn leaf(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Builds a directory node with the given children.
    #[must_use]
    pub fn directory(key: impl Into<String>, nodes: Vec<Self>) -> Self {
        Self {
            key: key.into(),
            dir: true,
            nodes,
            ..Self::default()
        }
    }

    /// Builds a node that carries only a key, as delete notifications do.
    #[must_use]
    pub fn removed(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Sets the modification index.
    #[must_use]
    pub const fn with_modified_index(mut self, index: u64) -> Self {
        self.modified_index = index;
        self
    }

    /// Collects every non-directory node in this subtree, ordered by key.
    ///
    /// A non-directory root is returned on its own.
    #[must_use]
    pub fn leaves(&self) -> Vec<&Self> {
        let mut found = Vec::new();
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            if node.dir {
                pending.extend(node.nodes.iter());
            } else {
                found.push(node);
            }
        }
        found.sort_by(|left, right| left.key.cmp(&right.key));
        found
    }
}

/// A single change delivered by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// What happened.
    pub action: Action,
    /// The node it happened to.
    pub node: RegistryNode,
    /// Node state before the change, when the registry reports it.
    #[serde(default)]
    pub prev_node: Option<RegistryNode>,
}

impl Notification {
    /// Builds a notification without previous-node information.
    #[must_use]
    pub fn new(action: impl Into<Action>, node: RegistryNode) -> Self {
        Self {
            action: action.into(),
            node,
            prev_node: None,
        }
    }
}

/// Recursive view of a subtree at one registry index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    root: RegistryNode,
    index: Option<u64>,
}

impl Snapshot {
    /// Wraps a fetched subtree and the registry index it was read at.
    #[must_use]
    pub const fn new(root: RegistryNode, index: Option<u64>) -> Self {
        Self { root, index }
    }

    /// Root of the fetched subtree.
    #[must_use]
    pub const fn root(&self) -> &RegistryNode {
        &self.root
    }

    /// Registry index the snapshot reflects, when reported.
    #[must_use]
    pub const fn index(&self) -> Option<u64> {
        self.index
    }

    /// Index a watch should resume after so no change is missed.
    ///
    /// Falls back to the highest modification index inside the snapshot when
    /// the registry did not report its global index.
    #[must_use]
    pub fn resume_index(&self) -> Option<u64> {
        self.index.or_else(|| {
            let mut highest = self.root.modified_index;
            let mut pending = vec![&self.root];
            while let Some(node) = pending.pop() {
                highest = highest.max(node.modified_index);
                pending.extend(node.nodes.iter());
            }
            (highest > 0).then_some(highest)
        })
    }
}

#[cfg(test)]
mod tests;
