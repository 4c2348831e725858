// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Tag controllers.
//!
//! A controller binds one config node to one annotation. It owns the state
//! units it was given at construction and the subscriptions it made, and
//! gives all of them back when destroyed. The per-tag behavior it wraps
//! decides what the tag actually does.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized --hydrate--> Hydrated --activate--> Active
//!        \                       \                    /
//!         `-------------------destroy---------------'--> Destroyed
//! ```
//!
//! Hydration happens exactly once. Only active controllers execute,
//! validate, serialize or render. Destroyed is terminal.

use std::cell::Cell;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::config::{ConfigNode, ConfigTree, NodeId, RegionResult};
use crate::engine::annotation::{decode_results, AnnotationScope};
use crate::errors::{ControllerError, StateError};
use crate::flags::FeatureFlags;
use crate::observability::messages::controller::{
    ControllerCreated, ControllerReleased, UnitReleaseFailed,
};
use crate::observability::messages::StructuredLog;
use crate::state::{AnnotationId, Listener, StateStore, Subscription, UnitId};
use crate::traits::{
    BehaviorContext, CommandOutcome, ControlCommand, ControllerFactory, RequiredFieldNotifier,
    TagBehavior,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Hydrated,
    Active,
    Destroyed,
}

impl Lifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Uninitialized => "uninitialized",
            Lifecycle::Hydrated => "hydrated",
            Lifecycle::Active => "active",
            Lifecycle::Destroyed => "destroyed",
        }
    }
}

/// The state units one controller owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSlice {
    /// Tag-local state, `null` until the behavior hydrates it.
    pub state: UnitId,
    /// Results addressed to this tag, derived from the annotation's results.
    /// Only named tags get one.
    pub results: Option<UnitId>,
}

impl StateSlice {
    fn allocate(
        store: &StateStore,
        annotation: &AnnotationScope,
        node: &ConfigNode,
    ) -> Result<Self, StateError> {
        let namespace = annotation.id();
        let state = store.create_value(namespace, &format!("tag/{}/state", node.id.0), Value::Null)?;
        let results = match node.name() {
            Some(name) => {
                let name = name.to_string();
                let derived = store.create_derived(
                    namespace,
                    &format!("tag/{}/results", node.id.0),
                    &[annotation.results_unit()],
                    move |inputs| {
                        let mine = inputs
                            .first()
                            .map(decode_results)
                            .unwrap_or_default()
                            .into_iter()
                            .filter(|result| result.from_name == name)
                            .map(|result| result.to_value())
                            .collect();
                        Value::Array(mine)
                    },
                );
                match derived {
                    Ok(unit) => Some(unit),
                    Err(e) => {
                        store.dispose(state)?;
                        return Err(e);
                    }
                }
            }
            None => None,
        };
        Ok(Self { state, results })
    }

    pub fn units(&self) -> impl Iterator<Item = UnitId> {
        std::iter::once(self.state).chain(self.results)
    }
}

/// Shared view of everything a controller call may touch besides itself.
pub struct ControllerEnv<'a> {
    pub tree: &'a ConfigTree,
    pub store: &'a StateStore,
    pub annotation: &'a AnnotationScope,
    pub data: &'a Map<String, Value>,
    pub flags: &'a FeatureFlags,
}

/// Counts controllers that exist and are not destroyed.
#[derive(Debug, Clone, Default)]
pub struct InstanceCounter {
    live: Rc<Cell<usize>>,
}

impl InstanceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(&self) -> usize {
        self.live.get()
    }

    fn acquire(&self) -> InstanceToken {
        self.live.set(self.live.get() + 1);
        InstanceToken {
            live: Rc::clone(&self.live),
            released: false,
        }
    }
}

/// Held by each controller; gives its count back once, on destroy or drop.
#[derive(Debug)]
struct InstanceToken {
    live: Rc<Cell<usize>>,
    released: bool,
}

impl InstanceToken {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.live.set(self.live.get().saturating_sub(1));
        }
    }
}

impl Drop for InstanceToken {
    fn drop(&mut self) {
        self.release();
    }
}

pub struct Controller {
    node: NodeId,
    annotation: AnnotationId,
    tag_type: String,
    name: String,
    lifecycle: Lifecycle,
    behavior: Box<dyn TagBehavior>,
    slice: StateSlice,
    subscriptions: Vec<Subscription>,
    token: InstanceToken,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("node", &self.node)
            .field("annotation", &self.annotation)
            .field("tag_type", &self.tag_type)
            .field("lifecycle", &self.lifecycle)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl Controller {
    /// Construct an uninitialized controller for `node`, allocating its
    /// state slice in the annotation's namespace.
    pub(crate) fn create(
        env: &ControllerEnv<'_>,
        node: &ConfigNode,
        factory: &dyn ControllerFactory,
        counter: &InstanceCounter,
    ) -> Result<Self, StateError> {
        let slice = StateSlice::allocate(env.store, env.annotation, node)?;
        let controller = Self {
            node: node.id,
            annotation: env.annotation.id(),
            tag_type: node.tag_type.clone(),
            name: node.name().unwrap_or_default().to_string(),
            lifecycle: Lifecycle::Uninitialized,
            behavior: factory.create(node),
            slice,
            subscriptions: Vec::new(),
            token: counter.acquire(),
        };
        ControllerCreated {
            tag: &controller.tag_type,
            node: node.id.0,
            annotation: controller.annotation.0,
        }
        .log();
        Ok(controller)
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn annotation(&self) -> AnnotationId {
        self.annotation
    }

    pub fn tag_type(&self) -> &str {
        &self.tag_type
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_destroyed(&self) -> bool {
        self.lifecycle == Lifecycle::Destroyed
    }

    pub fn slice(&self) -> StateSlice {
        self.slice
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Seed state from the annotation's existing results.
    pub fn hydrate(&mut self, env: &ControllerEnv<'_>) -> Result<(), ControllerError> {
        match self.lifecycle {
            Lifecycle::Uninitialized => {}
            Lifecycle::Destroyed => return Err(self.destroyed()),
            Lifecycle::Hydrated | Lifecycle::Active => {
                return Err(ControllerError::AlreadyHydrated(self.tag_type.clone()))
            }
        }
        let results = if self.name.is_empty() {
            Vec::new()
        } else {
            env.annotation.results_for(env.store, &self.name)?
        };
        let ctx = context(self.node, &self.tag_type, &self.slice, env)?;
        self.behavior.hydrate(&ctx, &results)?;
        self.lifecycle = Lifecycle::Hydrated;
        Ok(())
    }

    pub fn activate(&mut self) -> Result<(), ControllerError> {
        match self.lifecycle {
            Lifecycle::Hydrated => {
                self.lifecycle = Lifecycle::Active;
                Ok(())
            }
            Lifecycle::Active => Ok(()),
            Lifecycle::Destroyed => Err(self.destroyed()),
            Lifecycle::Uninitialized => Err(self.not_active()),
        }
    }

    pub fn execute(
        &mut self,
        env: &ControllerEnv<'_>,
        command: ControlCommand,
    ) -> Result<CommandOutcome, ControllerError> {
        self.ensure_active()?;
        if env.annotation.is_read_only() {
            return Err(ControllerError::ReadOnlyAnnotation(self.annotation.0));
        }
        let ctx = context(self.node, &self.tag_type, &self.slice, env)?;
        self.behavior.execute(&ctx, command)
    }

    /// Check the tag's constraints, reporting a failure to `notifier`.
    pub fn validate(
        &self,
        env: &ControllerEnv<'_>,
        notifier: &dyn RequiredFieldNotifier,
    ) -> Result<Option<String>, ControllerError> {
        self.ensure_active()?;
        let ctx = context(self.node, &self.tag_type, &self.slice, env)?;
        let failure = self.behavior.validate(&ctx)?;
        if let Some(message) = &failure {
            notifier.required_field(self.annotation, &self.tag_type, ctx.label(), message);
        }
        Ok(failure)
    }

    pub fn serialize(&self, env: &ControllerEnv<'_>) -> Result<Vec<RegionResult>, ControllerError> {
        self.ensure_active()?;
        let ctx = context(self.node, &self.tag_type, &self.slice, env)?;
        self.behavior.serialize(&ctx)
    }

    pub fn view_state(&self, env: &ControllerEnv<'_>) -> Result<Value, ControllerError> {
        self.ensure_active()?;
        let ctx = context(self.node, &self.tag_type, &self.slice, env)?;
        self.behavior.view_state(&ctx)
    }

    /// Subscribe `listener` to every unit this controller owns. The
    /// subscriptions are released when the controller is destroyed.
    pub fn watch(&mut self, store: &StateStore, listener: Listener) -> Result<usize, ControllerError> {
        if self.is_destroyed() {
            return Err(self.destroyed());
        }
        let mut added = 0;
        for unit in self.slice.units() {
            self.subscriptions
                .push(store.subscribe(unit, Rc::clone(&listener))?);
            added += 1;
        }
        Ok(added)
    }

    /// Release subscriptions and state units. Returns how many
    /// subscriptions were released; destroying twice releases nothing.
    pub fn destroy(&mut self, store: &StateStore) -> usize {
        if self.is_destroyed() {
            return 0;
        }
        let released = self.subscriptions.len();
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
        for unit in self.slice.units() {
            match store.dispose(unit) {
                // Already gone when the namespace was disposed first.
                Ok(()) | Err(StateError::UnitDisposed(_)) => {}
                Err(e) => UnitReleaseFailed {
                    tag: &self.tag_type,
                    node: self.node.0,
                    annotation: self.annotation.0,
                    unit: unit.0,
                    error: &e,
                }
                .log(),
            }
        }
        self.token.release();
        self.lifecycle = Lifecycle::Destroyed;
        ControllerReleased {
            tag: &self.tag_type,
            node: self.node.0,
            annotation: self.annotation.0,
            subscriptions: released,
        }
        .log();
        released
    }

    fn ensure_active(&self) -> Result<(), ControllerError> {
        match self.lifecycle {
            Lifecycle::Active => Ok(()),
            Lifecycle::Destroyed => Err(self.destroyed()),
            _ => Err(self.not_active()),
        }
    }

    fn destroyed(&self) -> ControllerError {
        ControllerError::ControllerDestroyed {
            tag: self.tag_type.clone(),
            name: self.name.clone(),
        }
    }

    fn not_active(&self) -> ControllerError {
        ControllerError::NotActive {
            tag: self.tag_type.clone(),
            state: self.lifecycle.as_str(),
        }
    }
}

fn context<'a>(
    node: NodeId,
    tag_type: &str,
    slice: &'a StateSlice,
    env: &'a ControllerEnv<'a>,
) -> Result<BehaviorContext<'a>, ControllerError> {
    let node = env.tree.node(node).ok_or_else(|| {
        ControllerError::Unsupported(format!("{} ({} is not in the config tree)", tag_type, node))
    })?;
    Ok(BehaviorContext {
        node,
        tree: env.tree,
        store: env.store,
        annotation: env.annotation,
        slice,
        data: env.data,
        flags: env.flags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigTreeBuilder;
    use crate::registry::TagRegistry;

    const ANNOTATION: AnnotationId = AnnotationId(1);

    fn tree() -> (TagRegistry, ConfigTree) {
        let registry = TagRegistry::with_builtin_tags().unwrap();
        let tree = ConfigTreeBuilder::new(&registry)
            .build(
                r#"<View><Image name="img" value="plain.jpg"/><Rectangle name="box" toName="img"/></View>"#,
                &Map::new(),
            )
            .unwrap();
        (registry, tree)
    }

    fn rectangle(
        registry: &TagRegistry,
        tree: &ConfigTree,
        store: &StateStore,
        scope: &AnnotationScope,
        counter: &InstanceCounter,
    ) -> Controller {
        let env = ControllerEnv {
            tree,
            store,
            annotation: scope,
            data: &Map::new(),
            flags: &FeatureFlags::default(),
        };
        let node = tree.by_name("box").unwrap();
        let descriptor = registry.resolve("Rectangle").unwrap();
        let mut controller = Controller::create(&env, node, &*descriptor.controller, counter).unwrap();
        controller.hydrate(&env).unwrap();
        controller.activate().unwrap();
        controller
    }

    #[test]
    fn test_destroy_skips_units_already_disposed() {
        let (registry, tree) = tree();
        let store = StateStore::new();
        let scope = AnnotationScope::open(&store, ANNOTATION, false, &[]).unwrap();
        let counter = InstanceCounter::new();
        let mut controller = rectangle(&registry, &tree, &store, &scope, &counter);
        let slice = controller.slice();
        let results = slice.results.unwrap();

        store.dispose(slice.state).unwrap();
        controller.destroy(&store);

        assert!(controller.is_destroyed());
        assert_eq!(counter.live(), 0);
        assert_eq!(store.read(results), Err(StateError::UnitDisposed(results)));
        let key = format!("tag/{}/state", controller.node().0);
        assert_eq!(store.lookup(ANNOTATION, &key), None);
    }

    #[test]
    fn test_destroy_completes_when_units_belong_elsewhere() {
        let (registry, tree) = tree();
        let store = StateStore::new();
        let scope = AnnotationScope::open(&store, ANNOTATION, false, &[]).unwrap();
        let counter = InstanceCounter::new();
        let mut controller = rectangle(&registry, &tree, &store, &scope, &counter);
        let slice = controller.slice();

        // A store that never issued the controller's units.
        controller.destroy(&StateStore::new());

        assert!(controller.is_destroyed());
        assert_eq!(counter.live(), 0);
        assert!(store.read(slice.state).is_ok());
        assert_eq!(controller.destroy(&store), 0);
    }
}
