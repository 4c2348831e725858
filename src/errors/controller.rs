// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::errors::StateError;

/// Errors surfaced by tag controllers.
///
/// Validation failures are not errors; see [`crate::engine::SubmitOutcome`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControllerError {
    #[error("Controller for <{tag}> '{name}' has been destroyed")]
    ControllerDestroyed { tag: String, name: String },

    #[error("Controller for <{0}> has already been hydrated")]
    AlreadyHydrated(String),

    #[error("Controller for <{tag}> is not active (state: {state})")]
    NotActive { tag: String, state: &'static str },

    #[error("Annotation {0} is read-only")]
    ReadOnlyAnnotation(u64),

    #[error("Invalid value for <{tag}> '{name}': {reason}")]
    InvalidValue {
        tag: String,
        name: String,
        reason: String,
    },

    #[error("<{tag}> '{name}' has no result '{id}'")]
    UnknownResult { tag: String, name: String, id: String },

    #[error("<{0}> does not support this operation")]
    Unsupported(String),

    #[error(transparent)]
    State(#[from] StateError),
}
