// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for config tree construction.
//!
//! This module contains message types for logging events related to:
//! * Tree build completion
//! * Undeclared and out-of-shape attributes
//! * Unknown tags dropped under the lenient policy
//! * Repeater expansion

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Config tree built successfully.
///
/// # Log Level
/// `info!` - Important operational event
pub struct TreeBuilt<'a> {
    pub root: &'a str,
    pub node_count: usize,
    pub warning_count: usize,
}

impl Display for TreeBuilt<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Config tree built: root <{}>, {} nodes, {} warnings",
            self.root, self.node_count, self.warning_count
        )
    }
}

impl StructuredLog for TreeBuilt<'_> {
    fn log(&self) {
        tracing::info!(
            root = self.root,
            node_count = self.node_count,
            warning_count = self.warning_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "tree_built",
            span_name = name,
            root = self.root,
            node_count = self.node_count,
        )
    }
}

/// An attribute the tag type does not declare.
///
/// # Log Level
/// `warn!` - Tolerated for forward compatibility
///
/// # Example
/// ```
/// use the_labelwood::observability::messages::builder::UndeclaredAttribute;
///
/// let msg = UndeclaredAttribute {
///     tag: "Choices",
///     path: "View/Choices[0]",
///     attribute: "layout",
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct UndeclaredAttribute<'a> {
    pub tag: &'a str,
    pub path: &'a str,
    pub attribute: &'a str,
}

impl Display for UndeclaredAttribute<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Attribute '{}' is not declared by <{}> at '{}'",
            self.attribute, self.tag, self.path
        )
    }
}

impl StructuredLog for UndeclaredAttribute<'_> {
    fn log(&self) {
        tracing::warn!(
            tag = self.tag,
            path = self.path,
            attribute = self.attribute,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "undeclared_attribute",
            span_name = name,
            tag = self.tag,
            path = self.path,
            attribute = self.attribute,
        )
    }
}

/// An out-of-shape attribute replaced by its declared default.
///
/// # Log Level
/// `warn!` - Degraded behavior
pub struct AttributeFellBack<'a> {
    pub tag: &'a str,
    pub path: &'a str,
    pub attribute: &'a str,
    pub value: &'a str,
    pub default: &'a str,
}

impl Display for AttributeFellBack<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Invalid value '{}' for '{}' on <{}> at '{}'; using default '{}'",
            self.value, self.attribute, self.tag, self.path, self.default
        )
    }
}

impl StructuredLog for AttributeFellBack<'_> {
    fn log(&self) {
        tracing::warn!(
            tag = self.tag,
            path = self.path,
            attribute = self.attribute,
            value = self.value,
            default = self.default,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "attribute_fell_back",
            span_name = name,
            tag = self.tag,
            attribute = self.attribute,
        )
    }
}

/// Unknown tag removed together with its subtree.
///
/// # Log Level
/// `warn!` - Part of the config is ignored
pub struct UnknownTagDropped<'a> {
    pub tag: &'a str,
    pub path: &'a str,
}

impl Display for UnknownTagDropped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Unknown tag type '{}' at '{}'; subtree dropped",
            self.tag, self.path
        )
    }
}

impl StructuredLog for UnknownTagDropped<'_> {
    fn log(&self) {
        tracing::warn!(tag = self.tag, path = self.path, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "unknown_tag_dropped",
            span_name = name,
            tag = self.tag,
            path = self.path,
        )
    }
}

/// Repeater expanded over a data array.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct RepeaterExpanded<'a> {
    pub path: &'a str,
    pub key: &'a str,
    pub copies: usize,
}

impl Display for RepeaterExpanded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Repeater at '{}' expanded over '{}' into {} copies",
            self.path, self.key, self.copies
        )
    }
}

impl StructuredLog for RepeaterExpanded<'_> {
    fn log(&self) {
        tracing::debug!(
            path = self.path,
            key = self.key,
            copies = self.copies,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "repeater_expanded",
            span_name = name,
            path = self.path,
            key = self.key,
        )
    }
}
