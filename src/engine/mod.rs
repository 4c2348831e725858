// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod annotation;
pub mod cache;
pub mod controller;
pub mod session;

pub use annotation::AnnotationScope;
pub use cache::ControllerCache;
pub use controller::{Controller, ControllerEnv, InstanceCounter, Lifecycle, StateSlice};
pub use session::{Session, SubmitOutcome, ValidationFailure};
