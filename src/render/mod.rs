// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Rendering.
//!
//! The renderer walks a config tree and asks each node's registered view to
//! turn the node and its controller state into a [`RenderNode`]. Output
//! depends only on the tree and the states passed in, so rendering the same
//! annotation twice without intervening writes gives identical output.
//! Nodes whose controller has been destroyed render nothing, subtree
//! included.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use serde_json::Value;

use crate::config::{ConfigNode, ConfigTree, NodeId};
use crate::errors::RegistryError;
use crate::flags::FeatureFlags;
use crate::registry::TagRegistry;
use crate::state::AnnotationId;
use crate::traits::ViewContext;

/// Host-agnostic output of one view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderNode {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub props: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderNode>,
}

impl RenderNode {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            name: None,
            props: BTreeMap::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// A render node carrying the config node's tag type and name.
    pub fn for_node(node: &ConfigNode) -> Self {
        let mut rendered = Self::new(&node.tag_type);
        rendered.name = node.name().map(str::to_string);
        rendered
    }

    pub fn with_prop(mut self, key: &str, value: Value) -> Self {
        self.props.insert(key.to_string(), value);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_children(mut self, children: Vec<RenderNode>) -> Self {
        self.children = children;
        self
    }

    /// Indented outline, one node per line.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        self.write_outline(&mut out, 0);
        out
    }

    fn write_outline(&self, out: &mut String, depth: usize) {
        let _ = write!(out, "{}<{}", "  ".repeat(depth), self.tag);
        if let Some(name) = &self.name {
            let _ = write!(out, " name={}", name);
        }
        for (key, value) in &self.props {
            let _ = write!(out, " {}={}", key, value);
        }
        out.push('>');
        if let Some(text) = &self.text {
            let _ = write!(out, " {}", text);
        }
        out.push('\n');
        for child in &self.children {
            child.write_outline(out, depth + 1);
        }
    }
}

/// What the renderer knows about a node's controller.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeState {
    Ready(Value),
    Destroyed,
}

pub struct TreeRenderer<'a> {
    registry: &'a TagRegistry,
    flags: &'a FeatureFlags,
}

impl<'a> TreeRenderer<'a> {
    pub fn new(registry: &'a TagRegistry, flags: &'a FeatureFlags) -> Self {
        Self { registry, flags }
    }

    /// Render the whole tree. Nodes missing from `states` render with a
    /// `null` state. Returns `None` when the root itself is destroyed.
    pub fn render(
        &self,
        tree: &ConfigTree,
        annotation: AnnotationId,
        states: &BTreeMap<NodeId, NodeState>,
    ) -> Result<Option<RenderNode>, RegistryError> {
        if tree.is_empty() {
            return Ok(None);
        }
        self.render_node(tree, tree.root(), annotation, states)
    }

    fn render_node(
        &self,
        tree: &ConfigTree,
        id: NodeId,
        annotation: AnnotationId,
        states: &BTreeMap<NodeId, NodeState>,
    ) -> Result<Option<RenderNode>, RegistryError> {
        let Some(node) = tree.node(id) else {
            return Ok(None);
        };
        let state = match states.get(&id) {
            Some(NodeState::Destroyed) => return Ok(None),
            Some(NodeState::Ready(value)) => value.clone(),
            None => Value::Null,
        };

        let mut children = Vec::with_capacity(node.children.len());
        for child in &node.children {
            if let Some(rendered) = self.render_node(tree, *child, annotation, states)? {
                children.push(rendered);
            }
        }

        let descriptor = self.registry.resolve(&node.tag_type)?;
        let ctx = ViewContext {
            node,
            annotation,
            state: &state,
            flags: self.flags,
        };
        Ok(Some(descriptor.view.render(&ctx, children)))
    }
}
