use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use location_types::{Criteria, FeatureSet, Heading, Position, RequirementSet, Update, Velocity};

use crate::error::ProviderError;
use crate::reactive::Signal;

use super::{LifecycleState, Provider, ProviderEvent};

/// Wraps any provider with reference-counted activation: `activate()` only
/// calls through to the wrapped provider on a 0→1 transition of the demand
/// counter, `deactivate()` only on a 1→0 transition. Multiple independent
/// callers (sessions) can each hold a demand on the same provider without
/// starting its backend more than once.
pub struct StateTrackingProvider {
    inner: Arc<dyn Provider>,
    demand: AtomicU32,
}

impl StateTrackingProvider {
    pub fn new(inner: Arc<dyn Provider>) -> Self {
        Self {
            inner,
            demand: AtomicU32::new(0),
        }
    }

    pub fn demand(&self) -> u32 {
        self.demand.load(Ordering::SeqCst)
    }
}

impl Provider for StateTrackingProvider {
    fn features(&self) -> FeatureSet {
        self.inner.features()
    }

    fn requirements(&self) -> RequirementSet {
        self.inner.requirements()
    }

    fn matches(&self, criteria: &Criteria) -> bool {
        self.inner.matches(criteria)
    }

    fn on_event(&self, event: ProviderEvent) {
        self.inner.on_event(event)
    }

    fn enable(&self) -> Result<(), ProviderError> {
        self.inner.enable()
    }

    fn disable(&self) -> Result<(), ProviderError> {
        self.demand.store(0, Ordering::SeqCst);
        self.inner.disable()
    }

    fn activate(&self) -> Result<(), ProviderError> {
        let prev = self.demand.fetch_add(1, Ordering::SeqCst);
        if prev == 0 {
            if let Err(e) = self.inner.activate() {
                self.demand.fetch_sub(1, Ordering::SeqCst);
                return Err(e);
            }
        }
        Ok(())
    }

    fn deactivate(&self) -> Result<(), ProviderError> {
        let prev = self
            .demand
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| {
                if c == 0 {
                    None
                } else {
                    Some(c - 1)
                }
            });
        match prev {
            Ok(1) => self.inner.deactivate(),
            Ok(_) => Ok(()),
            Err(_) => Ok(()),
        }
    }

    fn lifecycle_state(&self) -> LifecycleState {
        self.inner.lifecycle_state()
    }

    fn position_updates(&self) -> Signal<Update<Position>> {
        self.inner.position_updates()
    }

    fn heading_updates(&self) -> Signal<Update<Heading>> {
        self.inner.heading_updates()
    }

    fn velocity_updates(&self) -> Signal<Update<Velocity>> {
        self.inner.velocity_updates()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::NullProvider;

    #[test]
    fn matched_activate_deactivate_pairs_start_and_stop_underlying_once() {
        let inner = Arc::new(NullProvider::new());
        inner.enable().unwrap();
        let tracked = StateTrackingProvider::new(inner.clone());

        for _ in 0..5 {
            tracked.activate().unwrap();
        }
        assert_eq!(inner.lifecycle_state(), LifecycleState::Active);
        assert_eq!(tracked.demand(), 5);

        for _ in 0..4 {
            tracked.deactivate().unwrap();
        }
        assert_eq!(inner.lifecycle_state(), LifecycleState::Active);

        tracked.deactivate().unwrap();
        assert_eq!(inner.lifecycle_state(), LifecycleState::Enabled);
        assert_eq!(tracked.demand(), 0);
    }

    #[test]
    fn activate_while_disabled_fails_and_does_not_increment() {
        let inner = Arc::new(NullProvider::new());
        let tracked = StateTrackingProvider::new(inner);

        assert!(tracked.activate().is_err());
        assert_eq!(tracked.demand(), 0);
    }
}
