// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Object tags: `Image` and `Text`. They show the data being labeled and
//! are the targets of control tags' `toName`.

use serde_json::{json, Value};

use crate::config::reference;
use crate::config::{ConfigNode, RegionResult};
use crate::errors::ControllerError;
use crate::render::RenderNode;
use crate::state::Action;
use crate::traits::{BehaviorContext, ControllerFactory, TagBehavior, TagView, ViewContext};

/// Resolves `value` against the task data once, at hydration.
pub struct ObjectBehavior;

impl TagBehavior for ObjectBehavior {
    fn hydrate(
        &mut self,
        ctx: &BehaviorContext<'_>,
        _results: &[RegionResult],
    ) -> Result<(), ControllerError> {
        let raw = ctx.node.attr_str("value").unwrap_or_default();
        let value = reference::resolve(raw, ctx.data).unwrap_or(Value::Null);
        ctx.store.write(
            ctx.slice.state,
            Action::Set(json!({ "value": value, "source": raw })),
        )?;
        Ok(())
    }
}

pub struct ObjectFactory;

impl ControllerFactory for ObjectFactory {
    fn create(&self, _node: &ConfigNode) -> Box<dyn TagBehavior> {
        Box::new(ObjectBehavior)
    }
}

pub struct ObjectView;

impl TagView for ObjectView {
    fn render(&self, ctx: &ViewContext<'_>, _children: Vec<RenderNode>) -> RenderNode {
        let value = ctx.state.get("value").cloned().unwrap_or(Value::Null);
        RenderNode::for_node(ctx.node).with_prop("value", value)
    }
}
