// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The labeling session: one config tree and one task, any number of
//! open annotations.
//!
//! Controllers are created lazily, the first time an operation needs the
//! controller of a (node, annotation) pair, and are hydrated and activated
//! on creation. Writes made through the session are followed by a flush,
//! so listeners have seen every change by the time a call returns.

use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::{BuildOptions, ConfigTree, ConfigTreeBuilder, NodeId, RegionResult, Task};
use crate::engine::annotation::AnnotationScope;
use crate::engine::cache::ControllerCache;
use crate::engine::controller::{Controller, ControllerEnv, InstanceCounter};
use crate::errors::EngineError;
use crate::flags::FeatureFlags;
use crate::observability::messages::controller::{AnnotationDestroyed, AnnotationOpened};
use crate::observability::messages::StructuredLog;
use crate::registry::TagRegistry;
use crate::render::{NodeState, RenderNode, TreeRenderer};
use crate::state::{AnnotationId, Listener, StateStore};
use crate::traits::{CommandOutcome, ControlCommand, LogNotifier, RequiredFieldNotifier};

/// A tag whose constraints were not met.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub node: NodeId,
    pub tag: String,
    pub name: String,
    pub message: String,
}

/// Result of [`Session::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Every tag validated; the serialized result payload.
    Submitted(Vec<RegionResult>),
    /// Submission refused; nothing was serialized.
    Blocked(Vec<ValidationFailure>),
}

pub struct Session {
    registry: Arc<TagRegistry>,
    tree: Arc<ConfigTree>,
    task: Task,
    data: Map<String, Value>,
    store: StateStore,
    flags: FeatureFlags,
    notifier: Rc<dyn RequiredFieldNotifier>,
    annotations: BTreeMap<AnnotationId, AnnotationScope>,
    controllers: ControllerCache,
    instances: InstanceCounter,
}

impl Session {
    pub fn new(registry: Arc<TagRegistry>, tree: Arc<ConfigTree>, task: Task) -> Result<Self, EngineError> {
        let data = task.data_record()?;
        Ok(Self {
            registry,
            tree,
            task,
            data,
            store: StateStore::new(),
            flags: FeatureFlags::default(),
            notifier: Rc::new(LogNotifier),
            annotations: BTreeMap::new(),
            controllers: ControllerCache::new(),
            instances: InstanceCounter::new(),
        })
    }

    /// Build the config tree for `task` and open a session over it.
    pub fn from_markup(
        registry: Arc<TagRegistry>,
        markup: &str,
        task: Task,
        options: BuildOptions,
    ) -> Result<Self, EngineError> {
        let data = task.data_record()?;
        let tree = ConfigTreeBuilder::new(&registry)
            .with_options(options)
            .build(markup, &data)?;
        Self::new(registry, Arc::new(tree), task)
    }

    pub fn with_flags(mut self, flags: FeatureFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_notifier(mut self, notifier: Rc<dyn RequiredFieldNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn flags(&self) -> &FeatureFlags {
        &self.flags
    }

    pub fn open_annotation(
        &mut self,
        id: AnnotationId,
        results: Vec<RegionResult>,
        read_only: bool,
    ) -> Result<(), EngineError> {
        if self.annotations.contains_key(&id) {
            return Err(EngineError::AnnotationExists(id.0));
        }
        let scope = AnnotationScope::open(&self.store, id, read_only, &results)?;
        self.annotations.insert(id, scope);
        AnnotationOpened {
            annotation: id.0,
            read_only,
            result_count: results.len(),
        }
        .log();
        Ok(())
    }

    /// Destroy every controller of the annotation, then dispose its state.
    pub fn destroy_annotation(&mut self, id: AnnotationId) -> Result<(), EngineError> {
        if self.annotations.remove(&id).is_none() {
            return Err(EngineError::UnknownAnnotation(id.0));
        }
        let controller_count = self.controllers.clear(&self.store, id);
        let unit_count = self.store.dispose_namespace(id)?;
        AnnotationDestroyed {
            annotation: id.0,
            controller_count,
            unit_count,
        }
        .log();
        Ok(())
    }

    pub fn annotation(&self, id: AnnotationId) -> Result<&AnnotationScope, EngineError> {
        self.annotations
            .get(&id)
            .ok_or(EngineError::UnknownAnnotation(id.0))
    }

    pub fn annotation_ids(&self) -> Vec<AnnotationId> {
        self.annotations.keys().copied().collect()
    }

    /// The controller for `node`, created on first use.
    pub fn controller(&mut self, annotation: AnnotationId, node: NodeId) -> Result<&Controller, EngineError> {
        self.ensure_controller(annotation, node)?;
        self.controllers
            .get(annotation, node)
            .ok_or(EngineError::UnknownNode(node.0))
    }

    /// Destroy one controller. It stays cached as destroyed, so its node
    /// renders nothing until the annotation's controllers are cleared.
    /// Returns false when there was no live controller.
    pub fn destroy_controller(&mut self, annotation: AnnotationId, node: NodeId) -> Result<bool, EngineError> {
        self.annotation(annotation)?;
        match self.controllers.get_mut(annotation, node) {
            Some(controller) if !controller.is_destroyed() => {
                controller.destroy(&self.store);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Destroy and forget every controller of an annotation. Later
    /// operations create fresh ones. Returns how many were live.
    pub fn clear_controllers(&mut self, annotation: AnnotationId) -> Result<usize, EngineError> {
        self.annotation(annotation)?;
        Ok(self.controllers.clear(&self.store, annotation))
    }

    /// Controllers that exist and are not destroyed, across all annotations.
    pub fn live_controller_count(&self) -> usize {
        self.instances.live()
    }

    /// Live controllers of one annotation.
    pub fn live_controllers_in(&self, annotation: AnnotationId) -> Result<usize, EngineError> {
        self.annotation(annotation)?;
        Ok(self.controllers.live_in(annotation))
    }

    /// Run a command against the control tag named `name`.
    pub fn execute(
        &mut self,
        annotation: AnnotationId,
        name: &str,
        command: ControlCommand,
    ) -> Result<CommandOutcome, EngineError> {
        let node = self.node_named(name)?;
        self.ensure_controller(annotation, node)?;
        let scope = self
            .annotations
            .get(&annotation)
            .ok_or(EngineError::UnknownAnnotation(annotation.0))?;
        let env = ControllerEnv {
            tree: &self.tree,
            store: &self.store,
            annotation: scope,
            data: &self.data,
            flags: &self.flags,
        };
        let controller = self
            .controllers
            .get_mut(annotation, node)
            .ok_or(EngineError::UnknownNode(node.0))?;
        let outcome = controller.execute(&env, command)?;
        self.store.flush();
        Ok(outcome)
    }

    /// Validate every tag of the annotation. Each failure is also reported
    /// to the session's notifier.
    pub fn validate(&mut self, annotation: AnnotationId) -> Result<Vec<ValidationFailure>, EngineError> {
        self.ensure_all(annotation)?;
        let scope = self.annotation_scope(annotation)?;
        let env = ControllerEnv {
            tree: &self.tree,
            store: &self.store,
            annotation: scope,
            data: &self.data,
            flags: &self.flags,
        };

        let mut failures = Vec::new();
        for node in self.tree.iter() {
            let Some(controller) = self.controllers.get(annotation, node.id) else {
                continue;
            };
            if controller.is_destroyed() {
                continue;
            }
            if let Some(message) = controller.validate(&env, self.notifier.as_ref())? {
                failures.push(ValidationFailure {
                    node: node.id,
                    tag: node.tag_type.clone(),
                    name: node.name().unwrap_or(&node.tag_type).to_string(),
                    message,
                });
            }
        }
        Ok(failures)
    }

    /// Validate, then serialize. A failed validation blocks submission.
    pub fn submit(&mut self, annotation: AnnotationId) -> Result<SubmitOutcome, EngineError> {
        let failures = self.validate(annotation)?;
        if !failures.is_empty() {
            return Ok(SubmitOutcome::Blocked(failures));
        }
        Ok(SubmitOutcome::Submitted(self.serialize(annotation)?))
    }

    /// Results contributed by every live controller, in the order of the
    /// annotation's results collection.
    pub fn serialize(&mut self, annotation: AnnotationId) -> Result<Vec<RegionResult>, EngineError> {
        self.ensure_all(annotation)?;
        let scope = self.annotation_scope(annotation)?;
        let env = ControllerEnv {
            tree: &self.tree,
            store: &self.store,
            annotation: scope,
            data: &self.data,
            flags: &self.flags,
        };

        let mut contributed: BTreeMap<String, RegionResult> = BTreeMap::new();
        for node in self.tree.iter() {
            let Some(controller) = self.controllers.get(annotation, node.id) else {
                continue;
            };
            if controller.is_destroyed() {
                continue;
            }
            for result in controller.serialize(&env)? {
                contributed.insert(result.id.clone(), result);
            }
        }

        let mut ordered = Vec::with_capacity(contributed.len());
        for result in scope.results(&self.store)? {
            if let Some(serialized) = contributed.remove(&result.id) {
                ordered.push(serialized);
            }
        }
        ordered.extend(contributed.into_values());
        Ok(ordered)
    }

    pub fn select_region(&mut self, annotation: AnnotationId, region: &str) -> Result<bool, EngineError> {
        let changed = self.annotation_scope(annotation)?.select(&self.store, region)?;
        self.store.flush();
        Ok(changed)
    }

    pub fn deselect_region(&mut self, annotation: AnnotationId, region: &str) -> Result<bool, EngineError> {
        let changed = self.annotation_scope(annotation)?.deselect(&self.store, region)?;
        self.store.flush();
        Ok(changed)
    }

    pub fn selected_regions(&self, annotation: AnnotationId) -> Result<Vec<String>, EngineError> {
        Ok(self.annotation_scope(annotation)?.selected(&self.store)?)
    }

    /// Subscribe to the state of the tag named `name`. The subscription
    /// belongs to the tag's controller and ends when it is destroyed.
    pub fn watch(
        &mut self,
        annotation: AnnotationId,
        name: &str,
        listener: Listener,
    ) -> Result<usize, EngineError> {
        let node = self.node_named(name)?;
        self.ensure_controller(annotation, node)?;
        let controller = self
            .controllers
            .get_mut(annotation, node)
            .ok_or(EngineError::UnknownNode(node.0))?;
        Ok(controller.watch(&self.store, listener)?)
    }

    /// Render the annotation. Returns `None` when the root's controller has
    /// been destroyed.
    pub fn render(&mut self, annotation: AnnotationId) -> Result<Option<RenderNode>, EngineError> {
        self.ensure_all(annotation)?;
        let scope = self.annotation_scope(annotation)?;
        let env = ControllerEnv {
            tree: &self.tree,
            store: &self.store,
            annotation: scope,
            data: &self.data,
            flags: &self.flags,
        };

        let mut states = BTreeMap::new();
        for node in self.tree.iter() {
            let state = match self.controllers.get(annotation, node.id) {
                Some(controller) if controller.is_destroyed() => NodeState::Destroyed,
                Some(controller) => NodeState::Ready(controller.view_state(&env)?),
                None => continue,
            };
            states.insert(node.id, state);
        }

        let renderer = TreeRenderer::new(&self.registry, &self.flags);
        Ok(renderer.render(&self.tree, annotation, &states)?)
    }

    /// Deliver pending state notifications.
    pub fn flush(&self) -> usize {
        self.store.flush()
    }

    fn annotation_scope(&self, annotation: AnnotationId) -> Result<&AnnotationScope, EngineError> {
        self.annotations
            .get(&annotation)
            .ok_or(EngineError::UnknownAnnotation(annotation.0))
    }

    fn node_named(&self, name: &str) -> Result<NodeId, EngineError> {
        self.tree
            .by_name(name)
            .map(|node| node.id)
            .ok_or_else(|| EngineError::UnknownTagName(name.to_string()))
    }

    fn ensure_all(&mut self, annotation: AnnotationId) -> Result<(), EngineError> {
        let nodes: Vec<NodeId> = self.tree.iter().map(|node| node.id).collect();
        for node in nodes {
            self.ensure_controller(annotation, node)?;
        }
        Ok(())
    }

    fn ensure_controller(&mut self, annotation: AnnotationId, node: NodeId) -> Result<(), EngineError> {
        if self.controllers.contains(annotation, node) {
            return Ok(());
        }
        let scope = self
            .annotations
            .get(&annotation)
            .ok_or(EngineError::UnknownAnnotation(annotation.0))?;
        let config_node = self.tree.node(node).ok_or(EngineError::UnknownNode(node.0))?;
        let descriptor = self.registry.resolve(&config_node.tag_type)?;
        let env = ControllerEnv {
            tree: &self.tree,
            store: &self.store,
            annotation: scope,
            data: &self.data,
            flags: &self.flags,
        };

        let mut controller =
            Controller::create(&env, config_node, &*descriptor.controller, &self.instances)?;
        if let Err(e) = controller
            .hydrate(&env)
            .and_then(|_| controller.activate())
        {
            controller.destroy(&self.store);
            return Err(e.into());
        }
        self.controllers.insert(controller);
        Ok(())
    }
}
