// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::config::builder::BuildOptions;
use crate::errors::SettingsError;
use crate::flags::FeatureFlags;

/// Engine settings, typically loaded from a YAML file.
///
/// Every section is optional; a missing section takes its defaults.
///
/// # Fields
/// * `build` - Policies for unknown tags and invalid attribute values
/// * `registry` - Registry lifecycle options
/// * `feature_flags` - Named switches tag behaviors may consult
///
/// # Example
/// ```yaml
/// build:
///   unknown_tags: drop_subtree
///   invalid_attributes: fall_back_to_default
/// registry:
///   seal_after_builtin: true
/// feature_flags:
///   show_region_count: true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EngineSettings {
    #[serde(default)]
    pub build: BuildOptions,
    #[serde(default)]
    pub registry: RegistrySettings,
    #[serde(default)]
    pub feature_flags: FeatureFlags,
}

/// Registry lifecycle options.
///
/// # Fields
/// * `seal_after_builtin` - Seal the registry once the built-in tags are
///   registered, so later registrations are rejected (defaults to true)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegistrySettings {
    #[serde(default = "default_seal")]
    pub seal_after_builtin: bool,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            seal_after_builtin: default_seal(),
        }
    }
}

fn default_seal() -> bool {
    true
}

/// Parse engine settings from YAML text.
pub fn parse_settings(yaml: &str, origin: &str) -> Result<EngineSettings, SettingsError> {
    serde_yaml::from_str(yaml).map_err(|source| SettingsError::Yaml {
        path: origin.to_string(),
        source,
    })
}

/// Load engine settings from a YAML file.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<EngineSettings, SettingsError> {
    let display = path.as_ref().display().to_string();
    let contents = fs::read_to_string(&path).map_err(|source| SettingsError::Io {
        path: display.clone(),
        source,
    })?;
    parse_settings(&contents, &display)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builder::UnknownTagPolicy;
    use crate::schema::InvalidAttributePolicy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_when_sections_missing() {
        let settings = parse_settings("{}", "inline").unwrap();
        assert_eq!(settings, EngineSettings::default());
        assert_eq!(settings.build.unknown_tags, UnknownTagPolicy::Abort);
        assert_eq!(
            settings.build.invalid_attributes,
            InvalidAttributePolicy::Reject
        );
        assert!(settings.registry.seal_after_builtin);
    }

    #[test]
    fn test_load_settings_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "build:\n  unknown_tags: drop_subtree\n  invalid_attributes: fall_back_to_default\nregistry:\n  seal_after_builtin: false\nfeature_flags:\n  fancy: true\n"
        )
        .unwrap();

        let settings = load_settings(file.path()).unwrap();
        assert_eq!(settings.build.unknown_tags, UnknownTagPolicy::DropSubtree);
        assert_eq!(
            settings.build.invalid_attributes,
            InvalidAttributePolicy::FallBackToDefault
        );
        assert!(!settings.registry.seal_after_builtin);
        assert!(settings.feature_flags.is_enabled("fancy", false));
    }

    #[test]
    fn test_load_settings_errors() {
        assert!(matches!(
            load_settings("does/not/exist.yaml"),
            Err(SettingsError::Io { .. })
        ));
        assert!(matches!(
            parse_settings("build:\n  unknown_tags: explode\n", "inline"),
            Err(SettingsError::Yaml { .. })
        ));
    }
}
