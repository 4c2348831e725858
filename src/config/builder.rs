// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Config tree building.
//!
//! Building runs in four stages:
//!
//! 1. **Parse**: markup becomes a tree of generic elements
//! 2. **Expand**: repeaters are unrolled against the task data
//! 3. **Resolve**: each element is matched to a registered tag type, its
//!    attributes are validated against the type's schema and its children
//!    are checked against the parent's allowed-children rule
//! 4. **Validate**: names must be unique and `toName` targets must resolve
//!
//! The first failure aborts the build; no partial tree is ever returned.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::markup::{self, GenericElement};
use crate::config::repeater;
use crate::config::tree::{BuildWarning, ConfigNode, ConfigTree, NodeId, SourceRef};
use crate::config::validation::validate_tree;
use crate::errors::ConfigError;
use crate::observability::messages::builder::{
    AttributeFellBack, TreeBuilt, UndeclaredAttribute, UnknownTagDropped,
};
use crate::observability::messages::StructuredLog;
use crate::registry::{TagDescriptor, TagRegistry};
use crate::schema::{AttributeIssue, InvalidAttributePolicy};

/// What the builder does with an element whose name is not registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownTagPolicy {
    /// Fail the build with `UnknownTagType`
    #[default]
    Abort,
    /// Drop the element and its subtree, recording a warning
    DropSubtree,
}

/// Builder policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct BuildOptions {
    #[serde(default)]
    pub unknown_tags: UnknownTagPolicy,
    #[serde(default)]
    pub invalid_attributes: InvalidAttributePolicy,
}

/// Builds [`ConfigTree`]s against one registry.
///
/// # Example
/// ```rust
/// use the_labelwood::config::ConfigTreeBuilder;
/// use the_labelwood::registry::TagRegistry;
/// use serde_json::Map;
///
/// let registry = TagRegistry::with_builtin_tags().unwrap();
/// let tree = ConfigTreeBuilder::new(&registry)
///     .build(r#"<View><Text name="t" value="$text"/></View>"#, &Map::new())
///     .unwrap();
/// assert_eq!(tree.len(), 2);
/// ```
pub struct ConfigTreeBuilder<'a> {
    registry: &'a TagRegistry,
    options: BuildOptions,
}

struct BuildState {
    nodes: Vec<ConfigNode>,
    warnings: Vec<BuildWarning>,
}

impl<'a> ConfigTreeBuilder<'a> {
    pub fn new(registry: &'a TagRegistry) -> Self {
        Self {
            registry,
            options: BuildOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> BuildOptions {
        self.options
    }

    /// Build a tree from markup, expanding repeaters over `data`.
    pub fn build(&self, markup: &str, data: &Map<String, Value>) -> Result<ConfigTree, ConfigError> {
        let document = markup::parse(markup)?;
        let document = repeater::expand(document, data)?;

        let mut state = BuildState {
            nodes: Vec::new(),
            warnings: Vec::new(),
        };
        let root_path = document.name.clone();
        if self.resolve(&document, None, root_path.clone(), &mut state)?.is_none() {
            // A dropped root leaves nothing to annotate.
            return Err(ConfigError::UnknownTagType {
                tag: document.name.clone(),
                path: root_path,
            });
        }

        if let Err(errors) = validate_tree(&state.nodes, self.registry) {
            if let Some(first) = errors.into_iter().next() {
                return Err(first);
            }
        }

        let tree = ConfigTree::from_parts(state.nodes, state.warnings);
        TreeBuilt {
            root: &document.name,
            node_count: tree.len(),
            warning_count: tree.warnings().len(),
        }
        .log();
        Ok(tree)
    }

    /// Resolve one element and its subtree. Returns `None` when the element
    /// was dropped.
    fn resolve(
        &self,
        element: &GenericElement,
        parent: Option<(NodeId, &TagDescriptor)>,
        path: String,
        state: &mut BuildState,
    ) -> Result<Option<NodeId>, ConfigError> {
        let Some(descriptor) = self.registry.get(&element.name) else {
            return match self.options.unknown_tags {
                UnknownTagPolicy::Abort => Err(ConfigError::UnknownTagType {
                    tag: element.name.clone(),
                    path,
                }),
                UnknownTagPolicy::DropSubtree => {
                    UnknownTagDropped {
                        tag: &element.name,
                        path: &path,
                    }
                    .log();
                    state.warnings.push(BuildWarning::UnknownTagDropped {
                        tag: element.name.clone(),
                        path,
                    });
                    Ok(None)
                }
            };
        };

        let validated = descriptor.schema.validate(
            &element.name,
            &path,
            &element.attributes,
            self.options.invalid_attributes,
        )?;
        for issue in validated.issues {
            state
                .warnings
                .push(self.record_issue(&element.name, &path, issue));
        }

        if let Some((_, parent)) = parent {
            if !parent.children.permits(&element.name) {
                return Err(ConfigError::DisallowedChild {
                    parent: parent.type_name.clone(),
                    child: element.name.clone(),
                    path,
                });
            }
        }

        let id = NodeId(state.nodes.len());
        state.nodes.push(ConfigNode {
            id,
            tag_type: descriptor.type_name.clone(),
            attributes: validated.values,
            parent: parent.map(|(parent, _)| parent),
            children: Vec::new(),
            text: element.text.clone(),
            source: SourceRef {
                line: element.line,
                column: element.column,
                path: path.clone(),
            },
        });

        let mut children = Vec::with_capacity(element.children.len());
        for (index, child) in element.children.iter().enumerate() {
            let child_path = format!("{}/{}[{}]", path, child.name, index);
            if let Some(child_id) =
                self.resolve(child, Some((id, descriptor.as_ref())), child_path, state)?
            {
                children.push(child_id);
            }
        }
        state.nodes[id.0].children = children;

        Ok(Some(id))
    }

    fn record_issue(&self, tag: &str, path: &str, issue: AttributeIssue) -> BuildWarning {
        match issue {
            AttributeIssue::Undeclared { attribute, .. } => {
                UndeclaredAttribute {
                    tag,
                    path,
                    attribute: &attribute,
                }
                .log();
                BuildWarning::UndeclaredAttribute {
                    tag: tag.to_string(),
                    path: path.to_string(),
                    attribute,
                }
            }
            AttributeIssue::FellBackToDefault {
                attribute,
                value,
                default,
            } => {
                AttributeFellBack {
                    tag,
                    path,
                    attribute: &attribute,
                    value: &value,
                    default: &default.to_string(),
                }
                .log();
                BuildWarning::AttributeFellBack {
                    tag: tag.to_string(),
                    path: path.to_string(),
                    attribute,
                    value,
                    default,
                }
            }
        }
    }
}
