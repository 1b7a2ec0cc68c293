//! Parsed scenario handed to the scenario spawn point.
//!
//! Scenario files are read outside the kernel; only the entity list reaches it.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Name of the entity that becomes the ego agent.
pub const EGO_ENTITY_NAME: &str = "Ego";

/// One scenario participant and the catalog entry it is built from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScenarioEntity {
    pub name: String,
    pub catalog_reference: String,
}

impl ScenarioEntity {
    pub fn new(name: impl Into<String>, catalog_reference: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            catalog_reference: catalog_reference.into(),
        }
    }

    pub fn is_ego(&self) -> bool {
        self.name == EGO_ENTITY_NAME
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub entities: Vec<ScenarioEntity>,
}

impl Scenario {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity: ScenarioEntity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(SimError::from)
    }
}
