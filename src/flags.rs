// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::collections::BTreeMap;

/// Named on/off switches that tag behaviors and views may consult.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct FeatureFlags {
    flags: BTreeMap<String, bool>,
}

impl FeatureFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// The flag's value, or `default_if_absent` when it was never set.
    pub fn is_enabled(&self, key: &str, default_if_absent: bool) -> bool {
        self.flags.get(key).copied().unwrap_or(default_if_absent)
    }

    pub fn set(&mut self, key: &str, enabled: bool) {
        self.flags.insert(key.to_string(), enabled);
    }

    pub fn with(mut self, key: &str, enabled: bool) -> Self {
        self.set(key, enabled);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_flags_take_the_callers_default() {
        let flags = FeatureFlags::new().with("show_region_count", false);
        assert!(!flags.is_enabled("show_region_count", true));
        assert!(flags.is_enabled("unset", true));
        assert!(!flags.is_enabled("unset", false));
    }

    #[test]
    fn test_flags_deserialize_from_a_plain_map() {
        let flags: FeatureFlags = serde_yaml::from_str("a: true\nb: false\n").unwrap();
        assert!(flags.is_enabled("a", false));
        assert!(!flags.is_enabled("b", true));
    }
}
