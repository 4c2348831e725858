// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Tag type registry.
//!
//! Maps a tag type name to everything the engine needs to build, run and
//! render instances of it: capability flags, the allowed-children rule, the
//! attribute schema, a controller factory and a view. The registry starts
//! open, is filled at startup and is then sealed. Tests that need a fresh
//! registry call [`TagRegistry::reset`] or build a new one.

mod descriptor;

pub use descriptor::{Capability, ChildRule, TagDescriptor};

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::RegistryError;
use crate::observability::messages::registry::{
    RegistrationRejected, RegistryStateChanged, TagRegistered,
};
use crate::observability::messages::StructuredLog;
use crate::tags::register_builtin_tags;
use crate::traits::TagView;

#[derive(Default)]
pub struct TagRegistry {
    descriptors: BTreeMap<String, Arc<TagDescriptor>>,
    sealed: bool,
}

impl std::fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagRegistry")
            .field("tags", &self.descriptors.keys().collect::<Vec<_>>())
            .field("sealed", &self.sealed)
            .finish()
    }
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// An open registry holding the built-in tag set.
    pub fn with_builtin_tags() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        register_builtin_tags(&mut registry)?;
        Ok(registry)
    }

    /// Register a tag type.
    ///
    /// Registering a descriptor equivalent to the one already present is a
    /// no-op. A different descriptor under a taken name is rejected, as is
    /// any registration once the registry is sealed.
    pub fn register(&mut self, descriptor: TagDescriptor) -> Result<(), RegistryError> {
        let type_name = descriptor.type_name.clone();
        if self.sealed {
            return Err(self.reject(RegistryError::Sealed(type_name), "registry is sealed"));
        }
        if let Some(existing) = self.descriptors.get(&type_name) {
            if existing.is_equivalent(&descriptor) {
                return Ok(());
            }
            return Err(self.reject(
                RegistryError::DuplicateRegistration(type_name),
                "a different descriptor is already registered",
            ));
        }

        TagRegistered {
            type_name: &type_name,
            capabilities: &descriptor.capability_names(),
        }
        .log();
        self.descriptors.insert(type_name, Arc::new(descriptor));
        Ok(())
    }

    /// Swap the view of a registered tag type. Only allowed before sealing.
    pub fn replace_view(&mut self, type_name: &str, view: Arc<dyn TagView>) -> Result<(), RegistryError> {
        if self.sealed {
            return Err(self.reject(
                RegistryError::Sealed(type_name.to_string()),
                "registry is sealed",
            ));
        }
        let existing = self
            .descriptors
            .get(type_name)
            .ok_or_else(|| RegistryError::UnknownTagType(type_name.to_string()))?;
        let mut replaced = existing.as_ref().clone();
        replaced.view = view;
        self.descriptors
            .insert(type_name.to_string(), Arc::new(replaced));
        Ok(())
    }

    pub fn resolve(&self, type_name: &str) -> Result<&Arc<TagDescriptor>, RegistryError> {
        self.descriptors
            .get(type_name)
            .ok_or_else(|| RegistryError::UnknownTagType(type_name.to_string()))
    }

    pub fn get(&self, type_name: &str) -> Option<&Arc<TagDescriptor>> {
        self.descriptors.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.descriptors.contains_key(type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn seal(&mut self) {
        self.sealed = true;
        RegistryStateChanged {
            transition: "sealed",
            tag_count: self.descriptors.len(),
        }
        .log();
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Drop every registration and reopen the registry.
    pub fn reset(&mut self) {
        self.descriptors.clear();
        self.sealed = false;
        RegistryStateChanged {
            transition: "reset",
            tag_count: 0,
        }
        .log();
    }

    fn reject(&self, error: RegistryError, reason: &str) -> RegistryError {
        let type_name = match &error {
            RegistryError::DuplicateRegistration(name)
            | RegistryError::Sealed(name)
            | RegistryError::UnknownTagType(name) => name.as_str(),
        };
        RegistrationRejected { type_name, reason }.log();
        error
    }
}
