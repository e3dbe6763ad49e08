pub mod error;
pub mod flatten;
pub mod search;
pub mod super_update;
pub mod tree;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether a tree entry is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// One entry of the library filesystem snapshot.
///
/// Nodes are never mutated in place; a refresh replaces the whole root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Unique, stable identity key. Directory paths never end in a separator.
    pub path: String,
    /// Leaf segment of the path. The synthetic root is named `"root"`.
    pub name: String,
    pub kind: NodeKind,
    /// Children in display order. Only meaningful for directories.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
    /// The scanned record for this file, absent if the file was never scanned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_file: Option<LocalFile>,
    /// Media ids aggregated from descendant files (directories only, informational).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media_ids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl TreeNode {
    /// Creates a file node without a scanned record.
    pub fn file(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            kind: NodeKind::File,
            children: Vec::new(),
            local_file: None,
            media_ids: Vec::new(),
            size: None,
        }
    }

    /// Creates a directory node with the given children.
    pub fn directory(
        path: impl Into<String>,
        name: impl Into<String>,
        children: Vec<TreeNode>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            kind: NodeKind::Directory,
            children,
            local_file: None,
            media_ids: Vec::new(),
            size: None,
        }
    }

    /// Attaches a scanned record to a file node.
    pub fn with_local_file(mut self, local_file: LocalFile) -> Self {
        self.local_file = Some(local_file);
        self
    }

    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// A scanned and tracked media file, as reported by the library service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalFile {
    pub path: String,
    #[serde(default)]
    pub name: String,
    /// `0` means the file is not matched to any media.
    #[serde(default)]
    pub media_id: i64,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub ignored: bool,
    #[serde(default)]
    pub metadata: LocalFileMetadata,
}

impl LocalFile {
    pub fn is_matched(&self) -> bool {
        self.media_id != 0
    }
}

/// Episode information attached to a local file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocalFileMetadata {
    pub episode: u32,
    #[serde(rename = "aniDBEpisode", default)]
    pub anidb_episode: String,
    #[serde(rename = "type")]
    pub file_type: LocalFileType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalFileType {
    #[default]
    Main,
    Special,
    Nc,
}

impl LocalFileType {
    /// Parses the lowercase wire name (`main`, `special`, `nc`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "main" => Some(Self::Main),
            "special" => Some(Self::Special),
            "nc" => Some(Self::Nc),
            _ => None,
        }
    }
}

/// Category filter applied to the explorer tree. `None` at the use site means no filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Filter {
    Unmatched,
    Unlocked,
    Ignored,
    UnknownMedia,
}

/// One displayable row of the flattened tree.
#[derive(Debug, Clone, Copy)]
pub struct FlattenedItem<'a> {
    pub node: &'a TreeNode,
    /// Depth from the root, which sits at 0.
    pub level: usize,
    /// Position in the flattened sequence.
    pub index: usize,
}

/// A complete tree snapshot as delivered by the library service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeSnapshot {
    #[serde(default)]
    pub root: Option<TreeNode>,
    #[serde(default)]
    pub local_files: HashMap<String, LocalFile>,
}

impl TreeSnapshot {
    pub fn new(root: TreeNode, local_files: HashMap<String, LocalFile>) -> Self {
        Self {
            root: Some(root),
            local_files,
        }
    }

    /// Parses a snapshot from the JSON payload of the library service.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }
}

pub use error::CoreError;
pub use flatten::flatten_tree;
pub use search::SearchEngine;
pub use tree::LibrarySummary;
