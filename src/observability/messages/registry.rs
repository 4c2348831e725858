// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for tag registration.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Tag type registered.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct TagRegistered<'a> {
    pub type_name: &'a str,
    pub capabilities: &'a str,
}

impl Display for TagRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Registered tag type <{}> ({})",
            self.type_name, self.capabilities
        )
    }
}

impl StructuredLog for TagRegistered<'_> {
    fn log(&self) {
        tracing::debug!(
            type_name = self.type_name,
            capabilities = self.capabilities,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("tag_registered", span_name = name, type_name = self.type_name)
    }
}

/// Registration refused.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct RegistrationRejected<'a> {
    pub type_name: &'a str,
    pub reason: &'a str,
}

impl Display for RegistrationRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Registration of <{}> rejected: {}",
            self.type_name, self.reason
        )
    }
}

impl StructuredLog for RegistrationRejected<'_> {
    fn log(&self) {
        tracing::error!(type_name = self.type_name, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "registration_rejected",
            span_name = name,
            type_name = self.type_name,
            reason = self.reason,
        )
    }
}

/// Registry sealed or reset.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RegistryStateChanged<'a> {
    pub transition: &'a str,
    pub tag_count: usize,
}

impl Display for RegistryStateChanged<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Tag registry {} with {} tag types",
            self.transition, self.tag_count
        )
    }
}

impl StructuredLog for RegistryStateChanged<'_> {
    fn log(&self) {
        tracing::info!(
            transition = self.transition,
            tag_count = self.tag_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "registry_state_changed",
            span_name = name,
            transition = self.transition,
        )
    }
}
