// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::cell::RefCell;

use crate::observability::messages::controller::ValidationFailed;
use crate::observability::messages::StructuredLog;
use crate::state::AnnotationId;

/// Receives the "this field is required" indication when validation fails.
///
/// The engine only reports; presenting the indication is up to the host.
pub trait RequiredFieldNotifier {
    fn required_field(&self, annotation: AnnotationId, tag: &str, name: &str, message: &str);
}

/// Reports failures through tracing only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl RequiredFieldNotifier for LogNotifier {
    fn required_field(&self, annotation: AnnotationId, tag: &str, name: &str, message: &str) {
        ValidationFailed {
            tag,
            name,
            annotation: annotation.0,
            reason: message,
        }
        .log();
    }
}

/// Keeps every indication it receives.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: RefCell<Vec<(AnnotationId, String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(annotation, name, message)` triples in arrival order.
    pub fn received(&self) -> Vec<(AnnotationId, String, String)> {
        self.received.borrow().clone()
    }
}

impl RequiredFieldNotifier for RecordingNotifier {
    fn required_field(&self, annotation: AnnotationId, _tag: &str, name: &str, message: &str) {
        self.received
            .borrow_mut()
            .push((annotation, name.to_string(), message.to_string()));
    }
}
