//! Spawn point configuration: which libraries to load, when they run, and the
//! parameter profiles they are sampled from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::parameters::ParameterSet;
use crate::stochastics::Sampler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnPointPhase {
    /// Triggered once before the first tick.
    PreRun,
    /// Triggered every tick.
    Runtime,
}

/// One spawn point to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnPointLibraryInfo {
    pub library_name: String,
    #[serde(default)]
    pub priority: i32,
    pub phase: SpawnPointPhase,
    #[serde(default)]
    pub profile_name: Option<String>,
}

impl SpawnPointLibraryInfo {
    pub fn new(library_name: impl Into<String>, priority: i32, phase: SpawnPointPhase) -> Self {
        Self {
            library_name: library_name.into(),
            priority,
            phase,
            profile_name: None,
        }
    }

    pub fn with_profile(mut self, profile_name: impl Into<String>) -> Self {
        self.profile_name = Some(profile_name.into());
        self
    }
}

/// One weighted parameter set of a spawn point profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileAlternative {
    pub probability: f64,
    pub parameters: ParameterSet,
}

/// Profile name → weighted alternatives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpawnPointProfiles {
    profiles: BTreeMap<String, Vec<ProfileAlternative>>,
}

impl SpawnPointProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one alternative to the named profile.
    pub fn with_alternative(
        mut self,
        name: impl Into<String>,
        probability: f64,
        parameters: ParameterSet,
    ) -> Self {
        self.profiles
            .entry(name.into())
            .or_default()
            .push(ProfileAlternative {
                probability,
                parameters,
            });
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    /// Every probability must be finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        self.profiles
            .iter()
            .try_for_each(|(name, alternatives)| check_probabilities(name, alternatives))
    }

    /// Draw one parameter set of the named profile.
    ///
    /// A profile whose alternatives all have zero probability counts as missing.
    pub fn sample(&self, name: &str, sampler: &Sampler) -> Result<ParameterSet> {
        let alternatives = self
            .profiles
            .get(name)
            .ok_or_else(|| SimError::ProfileNotFound(name.to_string()))?;
        check_probabilities(name, alternatives)?;
        sampler
            .sample_weighted(alternatives, |a| a.probability)
            .map(|a| a.parameters.clone())
            .ok_or_else(|| SimError::ProfileNotFound(name.to_string()))
    }
}

fn check_probabilities(name: &str, alternatives: &[ProfileAlternative]) -> Result<()> {
    match alternatives
        .iter()
        .find(|a| !a.probability.is_finite() || a.probability < 0.0)
    {
        Some(bad) => Err(SimError::Config(format!(
            "spawn point profile '{}' has invalid probability {}",
            name, bad.probability
        ))),
        None => Ok(()),
    }
}
