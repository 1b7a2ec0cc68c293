//! Run configuration for the kernel and its tick driver.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::spawn::{SpawnPointLibraryInfo, SpawnPointProfiles};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Seed for component stochastics and profile sampling.
    pub seed: u64,
    /// Tick length of the driver.
    pub cycle_time_ms: u64,
    /// The run stops before the first tick at or past this time.
    pub end_time_ms: u64,
    /// Archived events older than `now - event_retention_ms` are pruned.
    pub event_retention_ms: u64,
    pub spawn_points: Vec<SpawnPointLibraryInfo>,
    pub spawn_point_profiles: SpawnPointProfiles,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            cycle_time_ms: 100,
            end_time_ms: 10_000,
            event_retention_ms: 10_000,
            spawn_points: Vec::new(),
            spawn_point_profiles: SpawnPointProfiles::new(),
        }
    }
}

impl KernelConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_cycle_time_ms(mut self, cycle_time_ms: u64) -> Self {
        self.cycle_time_ms = cycle_time_ms;
        self
    }

    pub fn with_end_time_ms(mut self, end_time_ms: u64) -> Self {
        self.end_time_ms = end_time_ms;
        self
    }

    pub fn with_event_retention_ms(mut self, event_retention_ms: u64) -> Self {
        self.event_retention_ms = event_retention_ms;
        self
    }

    pub fn with_spawn_point(mut self, info: SpawnPointLibraryInfo) -> Self {
        self.spawn_points.push(info);
        self
    }

    pub fn with_spawn_point_profiles(mut self, profiles: SpawnPointProfiles) -> Self {
        self.spawn_point_profiles = profiles;
        self
    }

    /// Decode and validate a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cycle_time_ms == 0 {
            return Err(SimError::Config("cycle_time_ms must be positive".to_string()));
        }
        self.spawn_point_profiles.validate()?;
        for info in &self.spawn_points {
            if let Some(profile) = &info.profile_name {
                if !self.spawn_point_profiles.contains(profile) {
                    return Err(SimError::ProfileNotFound(profile.clone()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::SpawnPointPhase;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = KernelConfig::from_json_str(
            r#"{
                "seed": 7,
                "spawn_points": [
                    {"library_name": "SpawnPointScenario", "priority": 2, "phase": "PreRun"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.cycle_time_ms, 100);
        assert_eq!(
            config.spawn_points,
            vec![SpawnPointLibraryInfo::new("SpawnPointScenario", 2, SpawnPointPhase::PreRun)]
        );
    }

    #[test]
    fn rejects_zero_cycle_time_and_dangling_profiles() {
        assert!(matches!(
            KernelConfig::from_json_str(r#"{"cycle_time_ms": 0}"#),
            Err(SimError::Config(_))
        ));
        let config = KernelConfig::default().with_spawn_point(
            SpawnPointLibraryInfo::new("SpawnPointPreRunCommon", 1, SpawnPointPhase::PreRun)
                .with_profile("Missing"),
        );
        assert_eq!(config.validate(), Err(SimError::ProfileNotFound("Missing".to_string())));
        assert!(matches!(
            KernelConfig::from_json_str("{not json"),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn profile_probabilities_are_checked_up_front() {
        let huge = KernelConfig::from_json_str(
            r#"{"spawn_point_profiles": {"Traffic": [
                {"probability": 1e308, "parameters": {"Count": 1}},
                {"probability": 1e308, "parameters": {"Count": 2}}
            ]}}"#,
        );
        assert!(huge.is_ok());

        let negative = KernelConfig::from_json_str(
            r#"{"spawn_point_profiles": {"Traffic": [
                {"probability": -1.0, "parameters": {"Count": 1}}
            ]}}"#,
        );
        assert!(matches!(negative, Err(SimError::Config(_))));
    }
}
