// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod behavior;
pub mod notifier;
pub mod view;

pub use behavior::{BehaviorContext, CommandOutcome, ControlCommand, ControllerFactory, TagBehavior};
pub use notifier::{LogNotifier, RecordingNotifier, RequiredFieldNotifier};
pub use view::{TagView, ViewContext};
