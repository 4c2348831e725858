// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Layout and presentational tags: `View` and `Header`.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::config::reference;
use crate::config::{ConfigNode, RegionResult};
use crate::errors::ControllerError;
use crate::render::RenderNode;
use crate::state::Action;
use crate::traits::{BehaviorContext, ControllerFactory, TagBehavior, TagView, ViewContext};

/// Attributes of a node as render props.
pub fn attribute_props(node: &ConfigNode) -> BTreeMap<String, Value> {
    node.attributes
        .iter()
        .map(|(key, value)| (key.clone(), Value::from(value)))
        .collect()
}

/// Behavior of tags with no runtime state.
pub struct StaticBehavior;

impl TagBehavior for StaticBehavior {}

pub struct StaticFactory;

impl ControllerFactory for StaticFactory {
    fn create(&self, _node: &ConfigNode) -> Box<dyn TagBehavior> {
        Box::new(StaticBehavior)
    }
}

/// Renders the node's attributes and its children.
pub struct ContainerView;

impl TagView for ContainerView {
    fn render(&self, ctx: &ViewContext<'_>, children: Vec<RenderNode>) -> RenderNode {
        let mut rendered = RenderNode::for_node(ctx.node).with_children(children);
        rendered.props = attribute_props(ctx.node);
        rendered
    }
}

/// Header text comes from `value`, falling back to the element's text.
/// Either may be a data reference.
pub struct HeaderBehavior;

impl TagBehavior for HeaderBehavior {
    fn hydrate(
        &mut self,
        ctx: &BehaviorContext<'_>,
        _results: &[RegionResult],
    ) -> Result<(), ControllerError> {
        let raw = ctx.node.attr_str("value").unwrap_or(&ctx.node.text);
        let text = reference::resolve(raw, ctx.data).unwrap_or(Value::Null);
        ctx.store
            .write(ctx.slice.state, Action::Set(json!({ "text": text })))?;
        Ok(())
    }
}

pub struct HeaderFactory;

impl ControllerFactory for HeaderFactory {
    fn create(&self, _node: &ConfigNode) -> Box<dyn TagBehavior> {
        Box::new(HeaderBehavior)
    }
}

pub struct HeaderView;

impl TagView for HeaderView {
    fn render(&self, ctx: &ViewContext<'_>, _children: Vec<RenderNode>) -> RenderNode {
        let mut rendered = RenderNode::for_node(ctx.node);
        if let Some(size) = ctx.node.attr("size") {
            rendered = rendered.with_prop("size", Value::from(size));
        }
        match ctx.state.get("text") {
            Some(Value::String(text)) => rendered.with_text(text.clone()),
            Some(Value::Null) | None => rendered,
            Some(other) => rendered.with_text(other.to_string()),
        }
    }
}
