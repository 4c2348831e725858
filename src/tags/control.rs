// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Shared machinery of control tags.
//!
//! Every control tag reads and writes results in the annotation's results
//! collection; what differs between them is the shape of a result value.
//! [`ResultControl`] implements the commands once and defers value checks to
//! a [`ResultShape`].

use std::marker::PhantomData;

use serde_json::{json, Value};

use crate::config::{ConfigNode, ConfigTree, RegionResult};
use crate::errors::ControllerError;
use crate::render::RenderNode;
use crate::state::Action;
use crate::tags::layout::attribute_props;
use crate::traits::{
    BehaviorContext, CommandOutcome, ControlCommand, ControllerFactory, TagBehavior, TagView,
    ViewContext,
};

/// Feature flag adding a `count` prop to rendered control tags.
pub const SHOW_REGION_COUNT: &str = "show_region_count";

/// The value shape of one control tag's results.
pub trait ResultShape: Default + Send + Sync + 'static {
    /// The `type` written on results.
    fn result_type(&self) -> &'static str;

    /// Why `value` is not acceptable for `node`, if it is not.
    fn check(&self, node: &ConfigNode, tree: &ConfigTree, value: &Value) -> Result<(), String>;

    /// Whether the tag keeps at most one result; creating another then
    /// replaces the value of the existing one.
    fn single_result(&self) -> bool {
        false
    }

    /// Whether a result carries no answer, for `required` checks.
    fn is_blank(&self, _value: &Value) -> bool {
        false
    }
}

/// Values of the given child type's `value` attribute, in tree order.
pub fn child_values<'a>(tree: &'a ConfigTree, node: &ConfigNode, child_type: &str) -> Vec<&'a str> {
    tree.children(node.id)
        .filter(|child| child.tag_type == child_type)
        .filter_map(|child| child.attr_str("value"))
        .collect()
}

/// Check that `value[key]` is a non-empty list of declared strings.
pub fn check_declared_list(value: &Value, key: &str, declared: &[&str]) -> Result<usize, String> {
    let Some(items) = value.get(key).and_then(Value::as_array) else {
        return Err(format!("'{}' must be a list", key));
    };
    if items.is_empty() {
        return Err(format!("'{}' must not be empty", key));
    }
    for item in items {
        match item.as_str() {
            Some(text) if declared.contains(&text) => {}
            Some(text) => return Err(format!("'{}' is not a declared option", text)),
            None => return Err(format!("'{}' must contain strings", key)),
        }
    }
    Ok(items.len())
}

pub struct ResultControl<S> {
    shape: S,
}

impl<S: ResultShape> ResultControl<S> {
    pub fn new(shape: S) -> Self {
        Self { shape }
    }

    fn check(&self, ctx: &BehaviorContext<'_>, value: &Value) -> Result<(), ControllerError> {
        self.shape
            .check(ctx.node, ctx.tree, value)
            .map_err(|reason| ControllerError::InvalidValue {
                tag: ctx.node.tag_type.clone(),
                name: ctx.label().to_string(),
                reason,
            })
    }

    /// The result `id`, if this tag produced it.
    fn owned(&self, ctx: &BehaviorContext<'_>, id: &str) -> Result<RegionResult, ControllerError> {
        ctx.annotation
            .result(ctx.store, id)?
            .filter(|result| result.from_name == ctx.label())
            .ok_or_else(|| ControllerError::UnknownResult {
                tag: ctx.node.tag_type.clone(),
                name: ctx.label().to_string(),
                id: id.to_string(),
            })
    }

    fn update(
        &self,
        ctx: &BehaviorContext<'_>,
        existing: RegionResult,
        value: Value,
    ) -> Result<CommandOutcome, ControllerError> {
        let item = ctx.store.item(ctx.annotation.results_unit(), &existing.id)?;
        let id = existing.id.clone();
        let updated = RegionResult { value, ..existing };
        let changed = ctx.store.write(item, Action::Set(updated.to_value()))?;
        self.mark_active(ctx, &id)?;
        Ok(if changed {
            CommandOutcome::Updated(id)
        } else {
            CommandOutcome::Unchanged(id)
        })
    }

    fn mark_active(&self, ctx: &BehaviorContext<'_>, id: &str) -> Result<(), ControllerError> {
        ctx.store
            .write(ctx.slice.state, Action::Set(json!({ "active": id })))?;
        Ok(())
    }
}

impl<S: ResultShape> TagBehavior for ResultControl<S> {
    fn hydrate(
        &mut self,
        ctx: &BehaviorContext<'_>,
        results: &[RegionResult],
    ) -> Result<(), ControllerError> {
        for result in results {
            self.check(ctx, &result.value)?;
        }
        ctx.store
            .write(ctx.slice.state, Action::Set(json!({ "active": null })))?;
        Ok(())
    }

    fn execute(
        &mut self,
        ctx: &BehaviorContext<'_>,
        command: ControlCommand,
    ) -> Result<CommandOutcome, ControllerError> {
        let results = ctx.annotation.results_unit();
        match command {
            ControlCommand::CreateResult { value } => {
                self.check(ctx, &value)?;
                if self.shape.single_result() {
                    let existing = ctx.annotation.results_for(ctx.store, ctx.label())?;
                    if let Some(existing) = existing.into_iter().next() {
                        return self.update(ctx, existing, value);
                    }
                }
                let id = ctx.annotation.next_region_id(ctx.store)?;
                let result = RegionResult {
                    id: id.clone(),
                    from_name: ctx.label().to_string(),
                    to_name: ctx.node.to_names().join(","),
                    result_type: self.shape.result_type().to_string(),
                    value,
                };
                ctx.store.write(
                    results,
                    Action::InsertBefore {
                        item: id.clone(),
                        value: result.to_value(),
                        before: None,
                    },
                )?;
                self.mark_active(ctx, &id)?;
                Ok(CommandOutcome::Created(id))
            }
            ControlCommand::UpdateResult { id, value } => {
                self.check(ctx, &value)?;
                let existing = self.owned(ctx, &id)?;
                self.update(ctx, existing, value)
            }
            ControlCommand::DeleteResult { id } => {
                self.owned(ctx, &id)?;
                ctx.store
                    .write(results, Action::Remove { item: id.clone() })?;
                Ok(CommandOutcome::Deleted(id))
            }
            ControlCommand::MoveResult { id, before } => {
                self.owned(ctx, &id)?;
                let changed = ctx.store.write(
                    results,
                    Action::MoveBefore {
                        item: id.clone(),
                        before,
                    },
                )?;
                Ok(if changed {
                    CommandOutcome::Moved(id)
                } else {
                    CommandOutcome::Unchanged(id)
                })
            }
        }
    }

    fn validate(&self, ctx: &BehaviorContext<'_>) -> Result<Option<String>, ControllerError> {
        if ctx.node.attr_bool("required") != Some(true) {
            return Ok(None);
        }
        let answered = ctx
            .annotation
            .results_for(ctx.store, ctx.label())?
            .iter()
            .any(|result| !self.shape.is_blank(&result.value));
        Ok(if answered {
            None
        } else {
            Some(format!("{} is required", ctx.label()))
        })
    }

    fn serialize(&self, ctx: &BehaviorContext<'_>) -> Result<Vec<RegionResult>, ControllerError> {
        Ok(ctx.annotation.results_for(ctx.store, ctx.label())?)
    }

    fn view_state(&self, ctx: &BehaviorContext<'_>) -> Result<Value, ControllerError> {
        let results = match ctx.slice.results {
            Some(unit) => ctx.store.read(unit)?,
            None => Value::Array(Vec::new()),
        };
        let ids: Vec<&str> = results
            .as_array()
            .map(|items| items.iter().filter_map(|r| r["id"].as_str()).collect())
            .unwrap_or_default();
        let selected: Vec<String> = ctx
            .annotation
            .selected(ctx.store)?
            .into_iter()
            .filter(|id| ids.contains(&id.as_str()))
            .collect();
        let local = ctx.store.read(ctx.slice.state)?;
        Ok(json!({
            "results": results,
            "selected": selected,
            "active": local.get("active").cloned().unwrap_or(Value::Null),
        }))
    }
}

/// Factory for a [`ResultControl`] over shape `S`.
pub struct ControlFactory<S> {
    shape: PhantomData<fn() -> S>,
}

impl<S> ControlFactory<S> {
    pub fn new() -> Self {
        Self { shape: PhantomData }
    }
}

impl<S> Default for ControlFactory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ResultShape> ControllerFactory for ControlFactory<S> {
    fn create(&self, _node: &ConfigNode) -> Box<dyn TagBehavior> {
        Box::new(ResultControl::new(S::default()))
    }
}

/// Renders a control tag: its attributes, its result values and which of
/// them are selected.
pub struct ControlView;

impl TagView for ControlView {
    fn render(&self, ctx: &ViewContext<'_>, children: Vec<RenderNode>) -> RenderNode {
        let mut rendered = RenderNode::for_node(ctx.node).with_children(children);
        rendered.props = attribute_props(ctx.node);
        let values: Vec<Value> = ctx.state["results"]
            .as_array()
            .map(|items| items.iter().map(|r| r["value"].clone()).collect())
            .unwrap_or_default();
        if ctx.flags.is_enabled(SHOW_REGION_COUNT, false) {
            rendered = rendered.with_prop("count", json!(values.len()));
        }
        rendered
            .with_prop("values", Value::Array(values))
            .with_prop("selected", ctx.state["selected"].clone())
    }
}

/// An option inside a control tag (`Choice`, `Label`). Knows whether its
/// value is used by any of the parent's results.
pub struct OptionBehavior {
    key: &'static str,
}

impl OptionBehavior {
    pub fn new(key: &'static str) -> Self {
        Self { key }
    }
}

impl TagBehavior for OptionBehavior {
    fn view_state(&self, ctx: &BehaviorContext<'_>) -> Result<Value, ControllerError> {
        let Some(value) = ctx.node.attr_str("value") else {
            return Ok(json!({ "used": false }));
        };
        let parent_name = ctx
            .node
            .parent
            .and_then(|parent| ctx.tree.node(parent))
            .and_then(ConfigNode::name);
        let used = match parent_name {
            Some(parent) => ctx
                .annotation
                .results_for(ctx.store, parent)?
                .iter()
                .filter_map(|result| result.value.get(self.key).and_then(Value::as_array))
                .flatten()
                .any(|item| item.as_str() == Some(value)),
            None => false,
        };
        Ok(json!({ "used": used }))
    }
}

pub struct ChoiceOptionFactory;

impl ControllerFactory for ChoiceOptionFactory {
    fn create(&self, _node: &ConfigNode) -> Box<dyn TagBehavior> {
        Box::new(OptionBehavior::new("choices"))
    }
}

pub struct LabelOptionFactory;

impl ControllerFactory for LabelOptionFactory {
    fn create(&self, _node: &ConfigNode) -> Box<dyn TagBehavior> {
        Box::new(OptionBehavior::new("labels"))
    }
}

pub struct OptionView;

impl TagView for OptionView {
    fn render(&self, ctx: &ViewContext<'_>, _children: Vec<RenderNode>) -> RenderNode {
        let mut rendered = RenderNode::for_node(ctx.node);
        rendered.props = attribute_props(ctx.node);
        rendered.with_prop("used", ctx.state["used"].clone())
    }
}
