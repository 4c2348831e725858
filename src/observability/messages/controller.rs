// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for annotation and controller lifecycle events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Annotation opened in a session.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_labelwood::observability::messages::controller::AnnotationOpened;
///
/// let msg = AnnotationOpened {
///     annotation: 7,
///     read_only: true,
///     result_count: 3,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct AnnotationOpened {
    pub annotation: u64,
    pub read_only: bool,
    pub result_count: usize,
}

impl Display for AnnotationOpened {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Annotation {} opened ({}, {} results)",
            self.annotation,
            if self.read_only { "read-only" } else { "editable" },
            self.result_count
        )
    }
}

impl StructuredLog for AnnotationOpened {
    fn log(&self) {
        tracing::info!(
            annotation = self.annotation,
            read_only = self.read_only,
            result_count = self.result_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "annotation",
            span_name = name,
            annotation = self.annotation,
            read_only = self.read_only,
        )
    }
}

/// Annotation destroyed together with its controllers and state.
///
/// # Log Level
/// `info!` - Important operational event
pub struct AnnotationDestroyed {
    pub annotation: u64,
    pub controller_count: usize,
    pub unit_count: usize,
}

impl Display for AnnotationDestroyed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Annotation {} destroyed: {} controllers, {} state units released",
            self.annotation, self.controller_count, self.unit_count
        )
    }
}

impl StructuredLog for AnnotationDestroyed {
    fn log(&self) {
        tracing::info!(
            annotation = self.annotation,
            controller_count = self.controller_count,
            unit_count = self.unit_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "annotation_destroyed",
            span_name = name,
            annotation = self.annotation,
        )
    }
}

/// Controller instantiated for a node under an annotation.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct ControllerCreated<'a> {
    pub tag: &'a str,
    pub node: usize,
    pub annotation: u64,
}

impl Display for ControllerCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Controller for <{}> node {} created in annotation {}",
            self.tag, self.node, self.annotation
        )
    }
}

impl StructuredLog for ControllerCreated<'_> {
    fn log(&self) {
        tracing::debug!(
            tag = self.tag,
            node = self.node,
            annotation = self.annotation,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "controller",
            span_name = name,
            tag = self.tag,
            node = self.node,
            annotation = self.annotation,
        )
    }
}

/// Controller destroyed and its subscriptions released.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct ControllerReleased<'a> {
    pub tag: &'a str,
    pub node: usize,
    pub annotation: u64,
    pub subscriptions: usize,
}

impl Display for ControllerReleased<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Controller for <{}> node {} in annotation {} destroyed ({} subscriptions released)",
            self.tag, self.node, self.annotation, self.subscriptions
        )
    }
}

impl StructuredLog for ControllerReleased<'_> {
    fn log(&self) {
        tracing::debug!(
            tag = self.tag,
            node = self.node,
            annotation = self.annotation,
            subscriptions = self.subscriptions,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "controller_released",
            span_name = name,
            tag = self.tag,
            node = self.node,
        )
    }
}

/// A state unit could not be released while destroying a controller.
/// The controller is destroyed regardless.
///
/// # Log Level
/// `warn!` - Unexpected but recoverable
pub struct UnitReleaseFailed<'a> {
    pub tag: &'a str,
    pub node: usize,
    pub annotation: u64,
    pub unit: u64,
    pub error: &'a dyn std::error::Error,
}

impl Display for UnitReleaseFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Controller for <{}> node {} in annotation {} could not release unit {}: {}",
            self.tag, self.node, self.annotation, self.unit, self.error
        )
    }
}

impl StructuredLog for UnitReleaseFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            tag = self.tag,
            node = self.node,
            annotation = self.annotation,
            unit = self.unit,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "unit_release_failed",
            span_name = name,
            tag = self.tag,
            unit = self.unit,
        )
    }
}

/// A control failed validation; submission is blocked.
///
/// # Log Level
/// `info!` - Expected, user-facing outcome
pub struct ValidationFailed<'a> {
    pub tag: &'a str,
    pub name: &'a str,
    pub annotation: u64,
    pub reason: &'a str,
}

impl Display for ValidationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "<{}> '{}' failed validation in annotation {}: {}",
            self.tag, self.name, self.annotation, self.reason
        )
    }
}

impl StructuredLog for ValidationFailed<'_> {
    fn log(&self) {
        tracing::info!(
            tag = self.tag,
            name = self.name,
            annotation = self.annotation,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "validation_failed",
            span_name = name,
            tag = self.tag,
            tag_name = self.name,
        )
    }
}
