// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Element name of the compile-time repeater
pub const REPEATER_TAG: &str = "Repeater";
/// Placeholder replaced with the copy index inside a repeater
pub const DEFAULT_INDEX_FLAG: &str = "{{idx}}";
/// Attribute naming a tag instance
pub const NAME_ATTRIBUTE: &str = "name";
/// Attribute linking a control tag to the object tags it annotates
pub const TO_NAME_ATTRIBUTE: &str = "toName";
