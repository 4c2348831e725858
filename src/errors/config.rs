// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Errors that can occur while turning configuration markup into a config tree
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The markup itself is malformed
    Syntax {
        message: String,
        /// 1-based line of the failure, when the parser reports a position
        line: Option<usize>,
        column: Option<usize>,
    },
    /// The document has no root element
    EmptyDocument,
    /// An element name does not match any registered tag type
    UnknownTagType {
        tag: String,
        /// Path from the root, e.g. `View/Bogus[1]`
        path: String,
    },
    /// An attribute value falls outside its declared shape
    InvalidAttribute {
        tag: String,
        path: String,
        attribute: String,
        value: String,
        /// Human readable description of the accepted values
        expected: String,
    },
    /// A required attribute has neither a supplied value nor a default
    MissingRequiredAttribute {
        tag: String,
        path: String,
        attribute: String,
    },
    /// A child element is not permitted by its parent's allowed-children set
    DisallowedChild {
        parent: String,
        child: String,
        path: String,
    },
    /// A cross-reference attribute (e.g. `toName`) points at nothing usable
    UnresolvedReference {
        tag: String,
        path: String,
        attribute: String,
        target: String,
    },
    /// Two nodes declare the same `name`
    DuplicateName { name: String, path: String },
    /// A repeater could not read its data array from the task payload
    RepeaterData {
        path: String,
        key: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Syntax {
                message,
                line,
                column,
            } => match (line, column) {
                (Some(line), Some(column)) => write!(
                    f,
                    "Config syntax error at line {}, column {}: {}",
                    line, column, message
                ),
                _ => write!(f, "Config syntax error: {}", message),
            },
            ConfigError::EmptyDocument => write!(f, "Config document has no root element"),
            ConfigError::UnknownTagType { tag, path } => {
                write!(f, "Unknown tag type '{}' at '{}'", tag, path)
            }
            ConfigError::InvalidAttribute {
                tag,
                path,
                attribute,
                value,
                expected,
            } => write!(
                f,
                "Invalid value '{}' for attribute '{}' of <{}> at '{}': expected {}",
                value, attribute, tag, path, expected
            ),
            ConfigError::MissingRequiredAttribute {
                tag,
                path,
                attribute,
            } => write!(
                f,
                "Missing required attribute '{}' on <{}> at '{}'",
                attribute, tag, path
            ),
            ConfigError::DisallowedChild {
                parent,
                child,
                path,
            } => write!(
                f,
                "<{}> is not allowed inside <{}> at '{}'",
                child, parent, path
            ),
            ConfigError::UnresolvedReference {
                tag,
                path,
                attribute,
                target,
            } => write!(
                f,
                "<{}> at '{}' references '{}' through '{}', but no object tag has that name",
                tag, path, target, attribute
            ),
            ConfigError::DuplicateName { name, path } => {
                write!(f, "Duplicate tag name '{}' at '{}'", name, path)
            }
            ConfigError::RepeaterData { path, key, reason } => write!(
                f,
                "Repeater at '{}' cannot expand over '{}': {}",
                path, key, reason
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
