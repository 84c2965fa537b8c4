//! The provider capability contract: the uniform interface every positioning
//! backend (GNSS receiver, cell/wifi lookup, vendor plugin, fusion of others)
//! is normalized behind.

mod fusion;
mod null_provider;
mod state_tracking;

pub use fusion::FusionProvider;
pub use null_provider::NullProvider;
pub use state_tracking::StateTrackingProvider;

use std::sync::Mutex;

use location_types::{Criteria, FeatureSet, Heading, Position, RequirementSet, Update, Velocity};

use crate::error::ProviderError;
use crate::reactive::Signal;

/// Events the engine pushes down into every registered provider.
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    ReferencePositionUpdated(Update<Position>),
    ReferenceVelocityUpdated(Update<Velocity>),
    ReferenceHeadingUpdated(Update<Heading>),
    WifiCellReportingStateChanged(bool),
}

/// Lifecycle state of a provider, per the `disabled <-> enabled <-> active` machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Disabled,
    Enabled,
    Active,
}

/// Uniform capability/lifecycle contract over any positioning backend.
///
/// Concrete backends (hardware drivers, network lookups, vendor plugins)
/// implement this directly; `FusionProvider` composes several into one and
/// `StateTrackingProvider` wraps any of them with reference-counted activation.
pub trait Provider: Send + Sync {
    fn features(&self) -> FeatureSet;
    fn requirements(&self) -> RequirementSet;

    /// Whether this provider can satisfy the given client criteria.
    fn matches(&self, criteria: &Criteria) -> bool;

    /// Push a reference-state or configuration event down into the provider.
    fn on_event(&self, event: ProviderEvent);

    fn enable(&self) -> Result<(), ProviderError>;
    fn disable(&self) -> Result<(), ProviderError>;
    fn activate(&self) -> Result<(), ProviderError>;
    fn deactivate(&self) -> Result<(), ProviderError>;

    fn lifecycle_state(&self) -> LifecycleState;

    fn position_updates(&self) -> Signal<Update<Position>>;
    fn heading_updates(&self) -> Signal<Update<Heading>>;
    fn velocity_updates(&self) -> Signal<Update<Velocity>>;
}

/// Enforces the `disabled <-> enabled <-> active` machine generically, so
/// every concrete provider shares one legality check instead of reimplementing it.
pub(crate) struct LifecycleCell(Mutex<LifecycleState>);

impl LifecycleCell {
    pub(crate) fn new() -> Self {
        Self(Mutex::new(LifecycleState::Disabled))
    }

    pub(crate) fn state(&self) -> LifecycleState {
        *self.0.lock().unwrap()
    }

    pub(crate) fn enable(&self) -> Result<(), ProviderError> {
        let mut state = self.0.lock().unwrap();
        match *state {
            LifecycleState::Disabled => {
                *state = LifecycleState::Enabled;
                Ok(())
            }
            other => Err(invalid_state("enable", other)),
        }
    }

    pub(crate) fn disable(&self) -> Result<(), ProviderError> {
        let mut state = self.0.lock().unwrap();
        match *state {
            LifecycleState::Enabled => {
                *state = LifecycleState::Disabled;
                Ok(())
            }
            other => Err(invalid_state("disable", other)),
        }
    }

    pub(crate) fn activate(&self) -> Result<(), ProviderError> {
        let mut state = self.0.lock().unwrap();
        match *state {
            LifecycleState::Enabled => {
                *state = LifecycleState::Active;
                Ok(())
            }
            other => Err(invalid_state("activate", other)),
        }
    }

    pub(crate) fn deactivate(&self) -> Result<(), ProviderError> {
        let mut state = self.0.lock().unwrap();
        match *state {
            LifecycleState::Active => {
                *state = LifecycleState::Enabled;
                Ok(())
            }
            other => Err(invalid_state("deactivate", other)),
        }
    }
}

fn invalid_state(attempted: &'static str, current: LifecycleState) -> ProviderError {
    ProviderError::InvalidState {
        attempted,
        current: match current {
            LifecycleState::Disabled => "disabled",
            LifecycleState::Enabled => "enabled",
            LifecycleState::Active => "active",
        },
    }
}
