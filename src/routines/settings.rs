use crate::routines::coarsening::subspace::SubspacePolicy;
use crate::routines::coarsening::SurplusCoarseningFunctor;
use crate::routines::refinement::SurplusRefinementFunctor;
use serde::{Deserialize, Serialize};

/// The adaptivity policy of a caller-driven refine/coarsen loop.
///
/// Plain data; deserialize it from whatever configuration source the
/// application uses and build the concrete functors from it once per run.
#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub refinement: Control,
    #[serde(default)]
    pub coarsening: Control,
    #[serde(default)]
    pub subspace: SubspacePolicy,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Budget and threshold of one adaptive step.
#[derive(Debug, Deserialize, Clone, Copy, Serialize)]
pub struct Control {
    #[serde(default = "default_budget")]
    pub budget: usize,
    #[serde(default)]
    pub threshold: f64,
}

impl Default for Control {
    fn default() -> Self {
        Self {
            budget: default_budget(),
            threshold: 0.0,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refinement: Control::default(),
            coarsening: Control::default(),
            subspace: SubspacePolicy::default(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    pub fn refinement_functor(&self) -> SurplusRefinementFunctor {
        SurplusRefinementFunctor::new(self.refinement.budget, self.refinement.threshold)
    }

    pub fn coarsening_functor(&self) -> SurplusCoarseningFunctor {
        SurplusCoarseningFunctor::new(self.coarsening.budget, self.coarsening.threshold)
    }
}

fn default_budget() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routines::coarsening::subspace::ScoreAggregation;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.refinement.budget, 1);
        assert_eq!(settings.coarsening.threshold, 0.0);
        assert_eq!(settings.subspace.aggregation, ScoreAggregation::Max);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_deserialize_with_partial_fields() {
        let json = r#"{ "refinement": { "budget": 8, "threshold": 0.25 } }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.refinement.budget, 8);
        assert_eq!(settings.refinement.threshold, 0.25);
        assert_eq!(settings.coarsening.budget, 1);
    }
}
