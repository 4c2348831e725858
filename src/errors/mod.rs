// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod controller;
mod engine;
mod registry;
mod settings;
mod state;

pub use config::ConfigError;
pub use controller::ControllerError;
pub use engine::EngineError;
pub use registry::RegistryError;
pub use settings::SettingsError;
pub use state::StateError;
