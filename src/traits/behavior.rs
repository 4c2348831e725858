// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-tag runtime behavior.
//!
//! A [`ControllerFactory`] is registered with each tag type. The engine asks
//! it for a fresh [`TagBehavior`] whenever it needs a controller for a
//! (config node, annotation) pair, and drives the behavior through the
//! controller lifecycle. Behaviors never hold on to engine state; everything
//! they may touch is handed to them in a [`BehaviorContext`].

use std::any::TypeId;

use serde_json::{Map, Value};

use crate::config::{ConfigNode, ConfigTree, RegionResult};
use crate::engine::{AnnotationScope, StateSlice};
use crate::errors::ControllerError;
use crate::flags::FeatureFlags;
use crate::state::StateStore;

/// Everything a behavior may read or write during one call.
pub struct BehaviorContext<'a> {
    pub node: &'a ConfigNode,
    pub tree: &'a ConfigTree,
    pub store: &'a StateStore,
    pub annotation: &'a AnnotationScope,
    /// The units this controller owns.
    pub slice: &'a StateSlice,
    pub data: &'a Map<String, Value>,
    pub flags: &'a FeatureFlags,
}

impl BehaviorContext<'_> {
    /// The node's `name`, or its tag type when unnamed.
    pub fn label(&self) -> &str {
        self.node.name().unwrap_or(&self.node.tag_type)
    }
}

/// Commands a control tag accepts from the host.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    CreateResult { value: Value },
    UpdateResult { id: String, value: Value },
    DeleteResult { id: String },
    /// Reorder a result; `before: None` moves it to the end.
    MoveResult { id: String, before: Option<String> },
}

impl ControlCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ControlCommand::CreateResult { .. } => "create_result",
            ControlCommand::UpdateResult { .. } => "update_result",
            ControlCommand::DeleteResult { .. } => "delete_result",
            ControlCommand::MoveResult { .. } => "move_result",
        }
    }
}

/// What a command did, naming the affected result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Created(String),
    Updated(String),
    Deleted(String),
    Moved(String),
    /// The command matched current state and changed nothing.
    Unchanged(String),
}

/// Runtime behavior of one tag instance within one annotation.
///
/// Every method has a default suited to tags with no runtime state, so
/// layout tags implement nothing.
pub trait TagBehavior {
    /// Seed state from the annotation payload. `results` holds the existing
    /// results addressed to this tag.
    fn hydrate(
        &mut self,
        _ctx: &BehaviorContext<'_>,
        _results: &[RegionResult],
    ) -> Result<(), ControllerError> {
        Ok(())
    }

    fn execute(
        &mut self,
        ctx: &BehaviorContext<'_>,
        command: ControlCommand,
    ) -> Result<CommandOutcome, ControllerError> {
        Err(ControllerError::Unsupported(format!(
            "<{}> does not accept {}",
            ctx.node.tag_type,
            command.name()
        )))
    }

    /// Returns a failure message when the tag's constraints are not met.
    fn validate(&self, _ctx: &BehaviorContext<'_>) -> Result<Option<String>, ControllerError> {
        Ok(None)
    }

    /// Results this tag contributes to the annotation payload.
    fn serialize(&self, _ctx: &BehaviorContext<'_>) -> Result<Vec<RegionResult>, ControllerError> {
        Ok(Vec::new())
    }

    /// The state handed to the tag's view when rendering.
    fn view_state(&self, ctx: &BehaviorContext<'_>) -> Result<Value, ControllerError> {
        Ok(ctx.store.read(ctx.slice.state)?)
    }
}

/// Creates behaviors for one tag type.
pub trait ControllerFactory: Send + Sync + 'static {
    fn create(&self, node: &ConfigNode) -> Box<dyn TagBehavior>;

    /// Identifies the implementation, so re-registering the same factory
    /// type can be told apart from registering a different one.
    fn implementation(&self) -> TypeId {
        TypeId::of::<Self>()
    }
}
