//! Content catalog: archetype tables, title/name pools, and contract
//! ranges driving the generators.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use bevy::prelude::Resource;
use serde::Deserialize;
use thiserror::Error;

pub const BUILTIN_CONTENT_CATALOG: &str = include_str!("data/content_config.json");

/// Environment variable pointing at a catalog override file.
pub const CONTENT_CATALOG_PATH_VAR: &str = "BURNDOWN_CONTENT_PATH";

#[derive(Debug, Clone, Deserialize)]
pub struct ContentCatalog {
    story_titles: Vec<String>,
    blocker_titles: Vec<String>,
    clients: Vec<String>,
    #[serde(default)]
    contract: ContractRanges,
    archetypes: Vec<ArchetypeDefinition>,
}

impl ContentCatalog {
    pub fn builtin() -> Arc<Self> {
        let catalog: ContentCatalog = serde_json::from_str(BUILTIN_CONTENT_CATALOG)
            .expect("builtin content catalog should parse");
        catalog
            .validate()
            .expect("builtin content catalog should validate");
        Arc::new(catalog)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ContentCatalogError> {
        let catalog: ContentCatalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_file(path: &Path) -> Result<Self, ContentCatalogError> {
        let contents = fs::read_to_string(path).map_err(|source| {
            ContentCatalogError::ReadFailed {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::from_json_str(&contents)
    }

    fn validate(&self) -> Result<(), ContentCatalogError> {
        if self.story_titles.is_empty() {
            return Err(ContentCatalogError::Invalid("story_titles is empty"));
        }
        if self.blocker_titles.is_empty() {
            return Err(ContentCatalogError::Invalid("blocker_titles is empty"));
        }
        if self.clients.is_empty() {
            return Err(ContentCatalogError::Invalid("clients is empty"));
        }
        if self.archetypes.is_empty() {
            return Err(ContentCatalogError::Invalid("archetypes is empty"));
        }
        if self.archetypes.iter().all(|a| a.weight == 0) {
            return Err(ContentCatalogError::Invalid("all archetype weights are zero"));
        }
        if self.archetypes.iter().any(|a| a.names.is_empty()) {
            return Err(ContentCatalogError::Invalid("archetype with empty name pool"));
        }
        self.contract.validate()?;
        Ok(())
    }

    pub fn story_titles(&self) -> &[String] {
        &self.story_titles
    }

    pub fn blocker_titles(&self) -> &[String] {
        &self.blocker_titles
    }

    pub fn clients(&self) -> &[String] {
        &self.clients
    }

    pub fn contract(&self) -> &ContractRanges {
        &self.contract
    }

    pub fn archetypes(&self) -> &[ArchetypeDefinition] {
        &self.archetypes
    }
}

#[derive(Debug, Error)]
pub enum ContentCatalogError {
    #[error("failed to parse content catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read content catalog from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("content catalog invalid: {0}")]
    Invalid(&'static str),
}

/// Uniform ranges every contract field is drawn from, each independently.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContractRanges {
    stories_min: u32,
    stories_max: u32,
    points_min: u32,
    points_max: u32,
    sprints_min: u8,
    sprints_max: u8,
    payout_min: i64,
    payout_max: i64,
}

impl Default for ContractRanges {
    fn default() -> Self {
        Self {
            stories_min: 6,
            stories_max: 10,
            points_min: 3,
            points_max: 8,
            sprints_min: 2,
            sprints_max: 4,
            payout_min: 6_000,
            payout_max: 12_000,
        }
    }
}

impl ContractRanges {
    fn validate(&self) -> Result<(), ContentCatalogError> {
        if self.stories_min == 0 || self.stories_min > self.stories_max {
            return Err(ContentCatalogError::Invalid("contract story range"));
        }
        if self.points_min > self.points_max {
            return Err(ContentCatalogError::Invalid("contract point range"));
        }
        if self.sprints_min == 0 || self.sprints_min > self.sprints_max {
            return Err(ContentCatalogError::Invalid("contract sprint range"));
        }
        if self.payout_min <= 0 || self.payout_min > self.payout_max {
            return Err(ContentCatalogError::Invalid("contract payout range"));
        }
        Ok(())
    }

    pub fn stories(&self) -> (u32, u32) {
        (self.stories_min, self.stories_max)
    }

    pub fn points(&self) -> (u32, u32) {
        (self.points_min, self.points_max)
    }

    pub fn sprints(&self) -> (u8, u8) {
        (self.sprints_min, self.sprints_max)
    }

    pub fn payout(&self) -> (i64, i64) {
        (self.payout_min, self.payout_max)
    }
}

/// Passive effect carried by an archetype, as declared in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PassiveEffectDef {
    DisruptionShield { reduction: f32 },
    VelocityBoost { bonus: f32 },
}

/// One row of the weighted archetype table.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchetypeDefinition {
    pub id: String,
    pub label: String,
    /// Relative draw weight; common archetypes carry larger weights.
    pub weight: u32,
    pub velocity_min: f32,
    pub velocity_max: f32,
    pub hire_cost_min: i64,
    pub hire_cost_max: i64,
    #[serde(default)]
    pub passive: Option<PassiveEffectDef>,
    pub names: Vec<String>,
}

/// Shared, immutable handle to the loaded catalog.
#[derive(Resource, Debug, Clone)]
pub struct ContentCatalogHandle(Arc<ContentCatalog>);

impl ContentCatalogHandle {
    pub fn new(catalog: Arc<ContentCatalog>) -> Self {
        Self(catalog)
    }

    pub fn get(&self) -> Arc<ContentCatalog> {
        Arc::clone(&self.0)
    }

    pub fn catalog(&self) -> &ContentCatalog {
        &self.0
    }
}

/// Loads the catalog from the override path when set, falling back to the
/// builtin catalog on any failure.
pub fn load_content_catalog_from_env() -> Arc<ContentCatalog> {
    if let Some(path) = env::var(CONTENT_CATALOG_PATH_VAR).ok().map(PathBuf::from) {
        match ContentCatalog::from_file(&path) {
            Ok(catalog) => {
                tracing::info!(
                    target: "burndown::config",
                    path = %path.display(),
                    "content_catalog.loaded=file"
                );
                return Arc::new(catalog);
            }
            Err(err) => {
                tracing::warn!(
                    target: "burndown::config",
                    path = %path.display(),
                    error = %err,
                    "content_catalog.load_failed"
                );
            }
        }
    }

    tracing::info!(target: "burndown::config", "content_catalog.loaded=builtin");
    ContentCatalog::builtin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_parses_and_validates() {
        let catalog = ContentCatalog::builtin();
        assert!(catalog.story_titles().len() >= 10);
        assert!(catalog.archetypes().len() >= 3);
        assert!(catalog.archetypes().iter().any(|a| a.passive.is_some()));
    }

    #[test]
    fn catalog_rejects_empty_tables() {
        let err = ContentCatalog::from_json_str(
            r#"{"story_titles": [], "blocker_titles": ["x"], "clients": ["y"], "archetypes": []}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ContentCatalogError::Invalid(_)));
    }

    #[test]
    fn passive_effects_deserialize_by_kind_tag() {
        let json = r#"{"kind": "disruption_shield", "reduction": 0.3}"#;
        let def: PassiveEffectDef = serde_json::from_str(json).unwrap();
        assert_eq!(def, PassiveEffectDef::DisruptionShield { reduction: 0.3 });

        let json = r#"{"kind": "velocity_boost", "bonus": 0.2}"#;
        let def: PassiveEffectDef = serde_json::from_str(json).unwrap();
        assert_eq!(def, PassiveEffectDef::VelocityBoost { bonus: 0.2 });
    }
}
