// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised by the tag registry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// A different implementation is already registered under this name.
    #[error("Tag type '{0}' is already registered with a different implementation")]
    DuplicateRegistration(String),

    /// Registration was attempted after initialization completed.
    #[error("Registry is sealed; cannot register tag type '{0}'")]
    Sealed(String),

    /// No descriptor exists for this name.
    #[error("Unknown tag type '{0}'")]
    UnknownTagType(String),
}
