// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::schema::AttributeSchema;
use crate::traits::{ControllerFactory, TagView};

/// Role flags of a tag type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    /// Groups other tags
    Container,
    /// Purely presentational
    Visual,
    /// Displays the data being labeled; a `toName` target
    Object,
    /// Produces results
    Control,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Container => "container",
            Capability::Visual => "visual",
            Capability::Object => "object",
            Capability::Control => "control",
        }
    }
}

/// Which child tag types an element accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildRule {
    Unrestricted,
    /// Only these types. An empty set makes the tag a leaf.
    Only(BTreeSet<String>),
}

impl ChildRule {
    pub fn leaf() -> Self {
        ChildRule::Only(BTreeSet::new())
    }

    pub fn only(types: &[&str]) -> Self {
        ChildRule::Only(types.iter().map(|t| t.to_string()).collect())
    }

    pub fn permits(&self, child: &str) -> bool {
        match self {
            ChildRule::Unrestricted => true,
            ChildRule::Only(allowed) => allowed.contains(child),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, ChildRule::Only(allowed) if allowed.is_empty())
    }
}

/// Everything the engine knows about one tag type.
#[derive(Clone)]
pub struct TagDescriptor {
    pub type_name: String,
    pub capabilities: BTreeSet<Capability>,
    pub children: ChildRule,
    pub schema: AttributeSchema,
    pub controller: Arc<dyn ControllerFactory>,
    pub view: Arc<dyn TagView>,
}

impl std::fmt::Debug for TagDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagDescriptor")
            .field("type_name", &self.type_name)
            .field("capabilities", &self.capabilities)
            .field("children", &self.children)
            .field("schema", &self.schema)
            .finish()
    }
}

impl TagDescriptor {
    /// A leaf tag with no capabilities and no attributes.
    pub fn new(
        type_name: &str,
        controller: Arc<dyn ControllerFactory>,
        view: Arc<dyn TagView>,
    ) -> Self {
        Self {
            type_name: type_name.to_string(),
            capabilities: BTreeSet::new(),
            children: ChildRule::leaf(),
            schema: AttributeSchema::new(),
            controller,
            view,
        }
    }

    pub fn capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    pub fn children(mut self, rule: ChildRule) -> Self {
        self.children = rule;
        self
    }

    pub fn schema(mut self, schema: AttributeSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Comma separated capability names, for logs.
    pub fn capability_names(&self) -> String {
        self.capabilities
            .iter()
            .map(Capability::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Same name, flags, child rule and schema, and the same factory and
    /// view implementations.
    pub fn is_equivalent(&self, other: &TagDescriptor) -> bool {
        self.type_name == other.type_name
            && self.capabilities == other.capabilities
            && self.children == other.children
            && self.schema == other.schema
            && self.controller.implementation() == other.controller.implementation()
            && self.view.implementation() == other.view.implementation()
    }
}
