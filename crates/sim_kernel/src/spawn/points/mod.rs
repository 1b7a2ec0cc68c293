//! Built-in spawn points.

mod pre_run_common;
mod runtime_common;
mod scenario;

pub use pre_run_common::{SpawnPointPreRunCommon, SpawnPointPreRunCommonLibrary};
pub use runtime_common::{SpawnPointRuntimeCommon, SpawnPointRuntimeCommonLibrary};
pub use scenario::{SpawnPointScenario, SpawnPointScenarioLibrary};

use tracing::warn;

use crate::bindings::SpawnPointDependencies;
use crate::parameters::{ParameterSet, ParameterValue};
use crate::world::AgentId;

/// Agent profiles a common spawn point draws from, with their weights.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AgentProfileChoice {
    profiles: Vec<(String, f64)>,
}

impl AgentProfileChoice {
    /// Read `AgentProfiles` (with optional `AgentProfileWeights`) or a single `AgentProfile`.
    pub(crate) fn from_parameters(parameters: &ParameterSet) -> Result<Self, String> {
        let profiles: Vec<(String, f64)> = if let Some(names) = parameters.get_string_vector("AgentProfiles") {
            let weights = match parameters.get("AgentProfileWeights") {
                Some(ParameterValue::DoubleVector(weights)) => weights.clone(),
                Some(ParameterValue::IntVector(weights)) => {
                    weights.iter().map(|w| *w as f64).collect()
                }
                Some(other) => return Err(format!("AgentProfileWeights must be a list, got {}", other)),
                None => vec![1.0; names.len()],
            };
            if weights.len() != names.len() {
                return Err(format!(
                    "{} agent profiles but {} weights",
                    names.len(),
                    weights.len()
                ));
            }
            names.iter().cloned().zip(weights).collect()
        } else if let Some(name) = parameters.get_string("AgentProfile") {
            vec![(name.to_string(), 1.0)]
        } else {
            return Err("missing AgentProfiles or AgentProfile".to_string());
        };

        if !profiles.iter().any(|(_, weight)| *weight > 0.0) {
            return Err("no agent profile has a positive weight".to_string());
        }
        Ok(Self { profiles })
    }

    /// Draw a profile and create one agent from it.
    ///
    /// `Ok(None)` when the factory rejected the agent; the spawn point carries on.
    pub(crate) fn spawn(
        &self,
        dependencies: &SpawnPointDependencies,
        spawn_point: &str,
    ) -> Result<Option<AgentId>, String> {
        let (profile, _) = dependencies
            .sampler
            .sample_weighted(&self.profiles, |(_, weight)| *weight)
            .ok_or_else(|| "no agent profile to draw from".to_string())?;
        let blueprint = dependencies
            .blueprint_provider
            .sample_blueprint(profile, &dependencies.sampler)
            .map_err(|err| err.to_string())?;

        let result = dependencies.agent_factory.lock().add_agent(&blueprint);
        match result {
            Ok(id) => Ok(Some(id)),
            Err(err) => {
                warn!(spawn_point, profile = %profile, error = %err, "agent rejected, skipping");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_come_from_either_key() {
        let single = ParameterSet::new().with("AgentProfile", "car");
        assert_eq!(
            AgentProfileChoice::from_parameters(&single).unwrap().profiles,
            vec![("car".to_string(), 1.0)]
        );

        let mut weighted = ParameterSet::new();
        weighted.insert(
            "AgentProfiles",
            ParameterValue::StringVector(vec!["car".into(), "truck".into()]),
        );
        weighted.insert(
            "AgentProfileWeights",
            ParameterValue::DoubleVector(vec![3.0, 1.0]),
        );
        assert_eq!(
            AgentProfileChoice::from_parameters(&weighted).unwrap().profiles,
            vec![("car".to_string(), 3.0), ("truck".to_string(), 1.0)]
        );
    }

    #[test]
    fn mismatched_or_missing_profiles_are_rejected() {
        assert!(AgentProfileChoice::from_parameters(&ParameterSet::new()).is_err());

        let mut mismatched = ParameterSet::new();
        mismatched.insert(
            "AgentProfiles",
            ParameterValue::StringVector(vec!["car".into()]),
        );
        mismatched.insert(
            "AgentProfileWeights",
            ParameterValue::DoubleVector(vec![1.0, 1.0]),
        );
        assert!(AgentProfileChoice::from_parameters(&mismatched).is_err());
    }
}
