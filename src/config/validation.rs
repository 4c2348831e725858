// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Whole-tree checks that run after every node has been resolved.
//!
//! Per-node checks (tag resolution, attribute shapes, child rules) happen
//! while building. What remains needs the full set of nodes:
//!
//! 1. **Name uniqueness**: no two nodes share a `name`
//! 2. **Reference resolution**: every `toName` target of a control tag names
//!    an object tag
//!
//! Names are checked first because reference resolution looks targets up
//! by name.

use std::collections::{BTreeMap, HashSet};

use crate::config::consts::TO_NAME_ATTRIBUTE;
use crate::config::tree::ConfigNode;
use crate::errors::ConfigError;
use crate::registry::{Capability, TagRegistry};

/// Run all whole-tree checks, accumulating every error found.
///
/// Reference resolution is skipped when names are not unique, since a
/// duplicated name makes the lookup ambiguous.
pub fn validate_tree(nodes: &[ConfigNode], registry: &TagRegistry) -> Result<(), Vec<ConfigError>> {
    validate_unique_names(nodes)?;
    validate_references(nodes, registry)
}

fn validate_unique_names(nodes: &[ConfigNode]) -> Result<(), Vec<ConfigError>> {
    let mut seen = HashSet::new();
    let mut errors = Vec::new();

    for node in nodes {
        if let Some(name) = node.name() {
            if !seen.insert(name) {
                errors.push(ConfigError::DuplicateName {
                    name: name.to_string(),
                    path: node.path().to_string(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_references(nodes: &[ConfigNode], registry: &TagRegistry) -> Result<(), Vec<ConfigError>> {
    let by_name: BTreeMap<&str, &ConfigNode> = nodes
        .iter()
        .filter_map(|node| node.name().map(|name| (name, node)))
        .collect();
    let has = |node: &ConfigNode, capability: Capability| {
        registry
            .get(&node.tag_type)
            .map(|descriptor| descriptor.has(capability))
            .unwrap_or(false)
    };

    let mut errors = Vec::new();
    for node in nodes.iter().filter(|node| has(node, Capability::Control)) {
        let targets = node.to_names();
        if targets.is_empty() {
            // A blank or separator-only toName binds the control to nothing.
            errors.push(ConfigError::UnresolvedReference {
                tag: node.tag_type.clone(),
                path: node.path().to_string(),
                attribute: TO_NAME_ATTRIBUTE.to_string(),
                target: String::new(),
            });
        }
        for target in targets {
            let resolved = by_name
                .get(target)
                .map(|target| has(target, Capability::Object))
                .unwrap_or(false);
            if !resolved {
                errors.push(ConfigError::UnresolvedReference {
                    tag: node.tag_type.clone(),
                    path: node.path().to_string(),
                    attribute: TO_NAME_ATTRIBUTE.to_string(),
                    target: target.to_string(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
