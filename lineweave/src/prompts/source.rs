//! Prompt sources: where named prompt texts come from.

use std::collections::HashMap;
use std::path::Path;

use super::PromptError;

/// A provider of named prompt texts.
///
/// The agent resolves all required prompts once at construction; sources do
/// not need to be fast or cached.
pub trait PromptSource: Send + Sync {
    /// Returns the prompt text for a logical name, when available.
    fn get(&self, name: &str) -> Option<String>;
}

/// In-code prompt map, used by tests and as the carrier for embedded catalogs.
#[derive(Debug, Clone, Default)]
pub struct StaticPromptSource {
    prompts: HashMap<String, String>,
}

impl StaticPromptSource {
    pub fn from_pairs<I, N, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
        T: Into<String>,
    {
        Self {
            prompts: pairs
                .into_iter()
                .map(|(n, t)| (n.into(), t.into()))
                .collect(),
        }
    }

    /// Parses a YAML document of `name: text` pairs (e.g. an embedded catalog).
    pub fn from_yaml_str(yaml: &str) -> Result<Self, PromptError> {
        let prompts: HashMap<String, String> =
            serde_yaml::from_str(yaml).map_err(|e| PromptError::Source(e.to_string()))?;
        Ok(Self { prompts })
    }
}

impl PromptSource for StaticPromptSource {
    fn get(&self, name: &str) -> Option<String> {
        self.prompts.get(name).cloned()
    }
}

/// Prompts loaded from a YAML file: a flat map of `name: text`.
#[derive(Debug, Clone)]
pub struct YamlPromptSource {
    prompts: HashMap<String, String>,
}

impl YamlPromptSource {
    /// Reads and parses the catalog file. Unreadable or malformed files are
    /// startup errors.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PromptError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            PromptError::Source(format!("{}: {}", path.as_ref().display(), e))
        })?;
        let prompts: HashMap<String, String> =
            serde_yaml::from_str(&text).map_err(|e| PromptError::Source(e.to_string()))?;
        Ok(Self { prompts })
    }
}

impl PromptSource for YamlPromptSource {
    fn get(&self, name: &str) -> Option<String> {
        self.prompts.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: A YAML catalog string parses into name → text pairs.
    #[test]
    fn static_source_from_yaml() {
        let source = StaticPromptSource::from_yaml_str(
            "input-validation-system: |\n  You are an input validator.\nplanning-system: plan it\n",
        )
        .unwrap();
        assert!(source
            .get("input-validation-system")
            .unwrap()
            .contains("input validator"));
        assert_eq!(source.get("planning-system").as_deref(), Some("plan it"));
        assert!(source.get("missing").is_none());
    }

    /// **Scenario**: Malformed YAML is a Source error, not a panic.
    #[test]
    fn malformed_yaml_is_source_error() {
        assert!(matches!(
            StaticPromptSource::from_yaml_str("a: [unclosed"),
            Err(PromptError::Source(_))
        ));
    }

    /// **Scenario**: Loading a YAML file from disk resolves names.
    #[test]
    fn yaml_file_source_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompts.yaml");
        std::fs::write(&path, "summary-system: condense the dialogue\n").unwrap();
        let source = YamlPromptSource::load(&path).unwrap();
        assert_eq!(
            source.get("summary-system").as_deref(),
            Some("condense the dialogue")
        );
    }
}
