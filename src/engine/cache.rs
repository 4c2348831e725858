// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

use crate::config::NodeId;
use crate::engine::controller::Controller;
use crate::state::{AnnotationId, StateStore};

/// Controllers keyed by (annotation, node).
///
/// A destroyed controller stays in the cache as a tombstone until the cache
/// is cleared for its annotation, so its node keeps rendering nothing.
#[derive(Debug, Default)]
pub struct ControllerCache {
    controllers: BTreeMap<(AnnotationId, NodeId), Controller>,
}

impl ControllerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, annotation: AnnotationId, node: NodeId) -> Option<&Controller> {
        self.controllers.get(&(annotation, node))
    }

    pub fn get_mut(&mut self, annotation: AnnotationId, node: NodeId) -> Option<&mut Controller> {
        self.controllers.get_mut(&(annotation, node))
    }

    pub fn contains(&self, annotation: AnnotationId, node: NodeId) -> bool {
        self.controllers.contains_key(&(annotation, node))
    }

    pub fn insert(&mut self, controller: Controller) -> &mut Controller {
        self.controllers
            .entry((controller.annotation(), controller.node()))
            .or_insert(controller)
    }

    /// Controllers of one annotation that are not destroyed.
    pub fn live_in(&self, annotation: AnnotationId) -> usize {
        self.controllers
            .range((annotation, NodeId(0))..=(annotation, NodeId(usize::MAX)))
            .filter(|(_, controller)| !controller.is_destroyed())
            .count()
    }

    /// Destroy and drop every controller of `annotation`. Returns how many
    /// were live before the call.
    pub fn clear(&mut self, store: &StateStore, annotation: AnnotationId) -> usize {
        let keys: Vec<(AnnotationId, NodeId)> = self
            .controllers
            .range((annotation, NodeId(0))..=(annotation, NodeId(usize::MAX)))
            .map(|(key, _)| *key)
            .collect();
        let mut live = 0;
        for key in keys {
            if let Some(mut controller) = self.controllers.remove(&key) {
                if !controller.is_destroyed() {
                    live += 1;
                }
                controller.destroy(store);
            }
        }
        live
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}
