// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The resolved, immutable config tree.
//!
//! Nodes live in a flat arena indexed by [`NodeId`]. Ids are assigned in
//! pre-order while building, so the root is always `NodeId(0)` and a node's
//! id is smaller than every id in its subtree. Building the same markup twice
//! yields two trees that compare equal.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::config::consts::{NAME_ATTRIBUTE, TO_NAME_ATTRIBUTE};
use crate::schema::AttrValue;

/// Index of a node inside its [`ConfigTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {}", self.0)
    }
}

/// Where a node came from in the source markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    /// 1-based line of the opening tag.
    pub line: usize,
    /// 1-based column of the opening tag.
    pub column: usize,
    /// Path from the root, e.g. `View/Choices[2]/Choice[0]`.
    pub path: String,
}

/// One resolved tag instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigNode {
    pub id: NodeId,
    pub tag_type: String,
    pub attributes: BTreeMap<String, AttrValue>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Character data directly inside the element, trimmed.
    pub text: String,
    pub source: SourceRef,
}

impl ConfigNode {
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    /// Textual form of an attribute, if present.
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(AttrValue::as_str)
    }

    pub fn attr_bool(&self, name: &str) -> Option<bool> {
        self.attributes.get(name).and_then(AttrValue::as_bool)
    }

    pub fn attr_f64(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).and_then(AttrValue::as_f64)
    }

    /// The node's `name` attribute.
    pub fn name(&self) -> Option<&str> {
        self.attr_str(NAME_ATTRIBUTE)
    }

    /// Targets listed in `toName`. A comma separated list is accepted.
    pub fn to_names(&self) -> Vec<&str> {
        self.attr_str(TO_NAME_ATTRIBUTE)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|target| !target.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn path(&self) -> &str {
        &self.source.path
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Non-fatal findings recorded while building a tree.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildWarning {
    UndeclaredAttribute {
        tag: String,
        path: String,
        attribute: String,
    },
    AttributeFellBack {
        tag: String,
        path: String,
        attribute: String,
        value: String,
        default: AttrValue,
    },
    UnknownTagDropped {
        tag: String,
        path: String,
    },
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildWarning::UndeclaredAttribute {
                tag,
                path,
                attribute,
            } => write!(
                f,
                "Undeclared attribute '{}' on <{}> at '{}'",
                attribute, tag, path
            ),
            BuildWarning::AttributeFellBack {
                tag,
                path,
                attribute,
                value,
                default,
            } => write!(
                f,
                "Attribute '{}' on <{}> at '{}' had invalid value '{}', using default '{}'",
                attribute, tag, path, value, default
            ),
            BuildWarning::UnknownTagDropped { tag, path } => {
                write!(f, "Dropped unknown tag <{}> at '{}'", tag, path)
            }
        }
    }
}

/// Immutable tree of resolved tag instances.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigTree {
    nodes: Vec<ConfigNode>,
    names: BTreeMap<String, NodeId>,
    warnings: Vec<BuildWarning>,
}

impl ConfigTree {
    /// Assemble a tree from pre-order nodes. Callers guarantee `nodes` is
    /// non-empty and that names are unique.
    pub(crate) fn from_parts(nodes: Vec<ConfigNode>, warnings: Vec<BuildWarning>) -> Self {
        let names = nodes
            .iter()
            .filter_map(|node| node.name().map(|name| (name.to_string(), node.id)))
            .collect();
        Self {
            nodes,
            names,
            warnings,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> Option<&ConfigNode> {
        self.nodes.get(id.0)
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &ConfigNode> {
        self.node(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|child| self.node(*child))
    }

    /// Lookup by the `name` attribute.
    pub fn by_name(&self, name: &str) -> Option<&ConfigNode> {
        self.names.get(name).and_then(|id| self.node(*id))
    }

    /// All nodes in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &ConfigNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn warnings(&self) -> &[BuildWarning] {
        &self.warnings
    }

    /// Nodes of one tag type, in pre-order.
    pub fn of_type<'a>(&'a self, tag_type: &'a str) -> impl Iterator<Item = &'a ConfigNode> + 'a {
        self.nodes
            .iter()
            .filter(move |node| node.tag_type == tag_type)
    }
}
