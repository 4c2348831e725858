// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the reactive state store.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// State namespace opened for an annotation.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct NamespaceOpened {
    pub namespace: u64,
}

impl Display for NamespaceOpened {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "State namespace {} opened", self.namespace)
    }
}

impl StructuredLog for NamespaceOpened {
    fn log(&self) {
        tracing::debug!(namespace = self.namespace, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("namespace_opened", span_name = name, namespace = self.namespace)
    }
}

/// State namespace disposed with all of its units.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct NamespaceDisposed {
    pub namespace: u64,
    pub unit_count: usize,
}

impl Display for NamespaceDisposed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "State namespace {} disposed ({} units)",
            self.namespace, self.unit_count
        )
    }
}

impl StructuredLog for NamespaceDisposed {
    fn log(&self) {
        tracing::debug!(
            namespace = self.namespace,
            unit_count = self.unit_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "namespace_disposed",
            span_name = name,
            namespace = self.namespace,
            unit_count = self.unit_count,
        )
    }
}

/// Flush stopped with notifications still queued.
///
/// # Log Level
/// `warn!` - Listeners keep writing in response to their own notifications
pub struct FlushLimitReached {
    pub rounds: usize,
    pub remaining: usize,
}

impl Display for FlushLimitReached {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Flush stopped after {} rounds with {} notifications still queued",
            self.rounds, self.remaining
        )
    }
}

impl StructuredLog for FlushLimitReached {
    fn log(&self) {
        tracing::warn!(rounds = self.rounds, remaining = self.remaining, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("flush_limit_reached", span_name = name, rounds = self.rounds)
    }
}
