//! Operator configuration loaded from a TOML file.

use serde::Deserialize;

/// Server-side quest engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestsConfig {
    /// Species that never advance any task, as namespaced identifiers.
    #[serde(default)]
    pub ignored_pokemon: Vec<String>,
}

impl QuestsConfig {
    /// Load the config from a TOML file.
    pub fn load(path: &std::path::Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {:?}: {}", path, e))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config {:?}: {}", path, e))
    }

    /// Whether events for this species are dropped outright.
    pub fn is_ignored(&self, species: &str) -> bool {
        self.ignored_pokemon
            .iter()
            .any(|ignored| ignored.eq_ignore_ascii_case(species))
    }
}
