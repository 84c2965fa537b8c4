//! Provider-selection policy: picks a `{position, heading, velocity}` provider
//! triple out of the engine's registered providers for a client's criteria.

use std::sync::Arc;

use location_types::{Criteria, Feature, Requirement};

use crate::provider::{LifecycleState, NullProvider, Provider};

/// The outcome of resolving `Criteria` against the engine's provider set.
/// Any field may be the canonical null provider if nothing matched.
#[derive(Clone)]
pub struct ProviderSelection {
    pub position: Arc<dyn Provider>,
    pub heading: Arc<dyn Provider>,
    pub velocity: Arc<dyn Provider>,
}

pub trait ProviderSelectionPolicy: Send + Sync {
    /// `satellites_enabled` is the engine's current `satellite_positioning`
    /// flag: when `false`, providers requiring `Requirement::Satellites` are
    /// filtered out regardless of whether they otherwise match.
    fn select(
        &self,
        criteria: &Criteria,
        providers: &[Arc<dyn Provider>],
        satellites_enabled: bool,
    ) -> ProviderSelection;
}

/// For each requested stream: filter to providers that advertise the feature,
/// match the criteria, and aren't disallowed by the satellite-positioning
/// flag, prefer one already active (warm-path preference), and break
/// remaining ties by order of appearance.
#[derive(Debug, Default)]
pub struct DefaultProviderSelectionPolicy;

impl ProviderSelectionPolicy for DefaultProviderSelectionPolicy {
    fn select(
        &self,
        criteria: &Criteria,
        providers: &[Arc<dyn Provider>],
        satellites_enabled: bool,
    ) -> ProviderSelection {
        ProviderSelection {
            position: pick_for(criteria, providers, Feature::Position, satellites_enabled),
            heading: pick_for(criteria, providers, Feature::Heading, satellites_enabled),
            velocity: pick_for(criteria, providers, Feature::Velocity, satellites_enabled),
        }
    }
}

fn pick_for(
    criteria: &Criteria,
    providers: &[Arc<dyn Provider>],
    feature: Feature,
    satellites_enabled: bool,
) -> Arc<dyn Provider> {
    let candidates: Vec<Arc<dyn Provider>> = providers
        .iter()
        .filter(|p| p.features().contains(feature) && p.matches(criteria))
        .filter(|p| satellites_enabled || !p.requirements().contains(Requirement::Satellites))
        .cloned()
        .collect();

    candidates
        .iter()
        .find(|p| p.lifecycle_state() == LifecycleState::Active)
        .or_else(|| candidates.first())
        .cloned()
        .unwrap_or_else(|| Arc::new(NullProvider::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderEvent;
    use crate::reactive::Signal;
    use location_types::{FeatureSet, RequirementSet, Update, Position, Heading, Velocity};

    struct StubProvider {
        features: FeatureSet,
        requirements: RequirementSet,
    }

    impl Provider for StubProvider {
        fn features(&self) -> FeatureSet {
            self.features
        }
        fn requirements(&self) -> RequirementSet {
            self.requirements
        }
        fn matches(&self, _criteria: &Criteria) -> bool {
            true
        }
        fn on_event(&self, _event: ProviderEvent) {}
        fn enable(&self) -> Result<(), crate::error::ProviderError> {
            Ok(())
        }
        fn disable(&self) -> Result<(), crate::error::ProviderError> {
            Ok(())
        }
        fn activate(&self) -> Result<(), crate::error::ProviderError> {
            Ok(())
        }
        fn deactivate(&self) -> Result<(), crate::error::ProviderError> {
            Ok(())
        }
        fn lifecycle_state(&self) -> LifecycleState {
            LifecycleState::Disabled
        }
        fn position_updates(&self) -> Signal<Update<Position>> {
            Signal::new()
        }
        fn heading_updates(&self) -> Signal<Update<Heading>> {
            Signal::new()
        }
        fn velocity_updates(&self) -> Signal<Update<Velocity>> {
            Signal::new()
        }
    }

    #[test]
    fn falls_back_to_null_provider_when_nothing_matches() {
        let policy = DefaultProviderSelectionPolicy;
        let selection = policy.select(&Criteria::empty(), &[], true);
        assert!(!selection.position.matches(&Criteria::empty()));
    }

    #[test]
    fn first_encountered_candidate_wins_ties() {
        let a: Arc<dyn Provider> = Arc::new(StubProvider {
            features: FeatureSet::empty().with(Feature::Position),
            requirements: RequirementSet::empty(),
        });
        let b: Arc<dyn Provider> = Arc::new(StubProvider {
            features: FeatureSet::empty().with(Feature::Position),
            requirements: RequirementSet::empty(),
        });
        let policy = DefaultProviderSelectionPolicy;
        let selection = policy.select(&Criteria::empty(), &[a.clone(), b], true);
        assert!(Arc::ptr_eq(&selection.position, &a));
    }

    #[test]
    fn satellite_requiring_provider_is_excluded_when_satellites_disabled() {
        let satellite_based: Arc<dyn Provider> = Arc::new(StubProvider {
            features: FeatureSet::empty().with(Feature::Position),
            requirements: RequirementSet::empty().with(Requirement::Satellites),
        });
        let policy = DefaultProviderSelectionPolicy;

        let selection = policy.select(&Criteria::empty(), &[satellite_based.clone()], false);
        assert!(!Arc::ptr_eq(&selection.position, &satellite_based));

        let selection = policy.select(&Criteria::empty(), &[satellite_based.clone()], true);
        assert!(Arc::ptr_eq(&selection.position, &satellite_based));
    }
}
