// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::errors::{ConfigError, ControllerError, RegistryError, StateError};

/// Top-level error for session operations.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error("Unknown annotation {0}")]
    UnknownAnnotation(u64),

    #[error("Annotation {0} is already open")]
    AnnotationExists(u64),

    #[error("Unknown config node {0}")]
    UnknownNode(usize),

    #[error("No tag named '{0}' in the config tree")]
    UnknownTagName(String),

    #[error("Task data is not a JSON record: {0}")]
    TaskData(String),
}
