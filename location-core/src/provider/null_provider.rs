use location_types::{Criteria, FeatureSet, Heading, Position, RequirementSet, Update, Velocity};

use crate::error::ProviderError;
use crate::reactive::Signal;

use super::{LifecycleCell, LifecycleState, Provider, ProviderEvent};

/// A canonical zero-valued provider: advertises no features or requirements,
/// matches nothing, and never emits. Used to fill a selection triple slot
/// when no real provider satisfies a stream.
pub struct NullProvider {
    lifecycle: LifecycleCell,
    position: Signal<Update<Position>>,
    heading: Signal<Update<Heading>>,
    velocity: Signal<Update<Velocity>>,
}

impl Default for NullProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl NullProvider {
    pub fn new() -> Self {
        Self {
            lifecycle: LifecycleCell::new(),
            position: Signal::new(),
            heading: Signal::new(),
            velocity: Signal::new(),
        }
    }
}

impl Provider for NullProvider {
    fn features(&self) -> FeatureSet {
        FeatureSet::empty()
    }

    fn requirements(&self) -> RequirementSet {
        RequirementSet::empty()
    }

    fn matches(&self, _criteria: &Criteria) -> bool {
        false
    }

    fn on_event(&self, _event: ProviderEvent) {}

    fn enable(&self) -> Result<(), ProviderError> {
        self.lifecycle.enable()
    }

    fn disable(&self) -> Result<(), ProviderError> {
        self.lifecycle.disable()
    }

    fn activate(&self) -> Result<(), ProviderError> {
        self.lifecycle.activate()
    }

    fn deactivate(&self) -> Result<(), ProviderError> {
        self.lifecycle.deactivate()
    }

    fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    fn position_updates(&self) -> Signal<Update<Position>> {
        self.position.clone()
    }

    fn heading_updates(&self) -> Signal<Update<Heading>> {
        self.heading.clone()
    }

    fn velocity_updates(&self) -> Signal<Update<Velocity>> {
        self.velocity.clone()
    }
}
