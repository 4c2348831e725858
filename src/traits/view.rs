// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::any::TypeId;

use serde_json::Value;

use crate::config::ConfigNode;
use crate::flags::FeatureFlags;
use crate::render::RenderNode;
use crate::state::AnnotationId;

/// Inputs to one view call.
pub struct ViewContext<'a> {
    pub node: &'a ConfigNode,
    pub annotation: AnnotationId,
    /// State produced by the node's controller.
    pub state: &'a Value,
    pub flags: &'a FeatureFlags,
}

/// Turns a node and its controller state into a render node.
///
/// Views are pure: the same context and children always render the same
/// output, so a view can be swapped without touching tree building.
pub trait TagView: Send + Sync + 'static {
    fn render(&self, ctx: &ViewContext<'_>, children: Vec<RenderNode>) -> RenderNode;

    fn implementation(&self) -> TypeId {
        TypeId::of::<Self>()
    }
}
