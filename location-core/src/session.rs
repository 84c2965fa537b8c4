//! A client's per-request handle to position/heading/velocity streams.

use std::sync::{Arc, Mutex};

use location_types::{Heading, Position, Update, Velocity};
use tracing::trace;

use crate::engine::Engine;
use crate::error::ProviderError;
use crate::reactive::{Property, Subscription};
use crate::selection_policy::ProviderSelection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Disabled,
    Enabled,
}

#[derive(Default)]
struct StreamSubscriptions {
    position: Option<Subscription>,
    heading: Option<Subscription>,
    velocity: Option<Subscription>,
}

/// Three independently toggleable streams bound to a provider selection.
/// Status transitions are edge-triggered: enabling an already-enabled stream
/// (or disabling an already-disabled one) is a no-op.
pub struct Session {
    engine: Arc<Engine>,
    selection: ProviderSelection,
    pub position_status: Property<StreamStatus>,
    pub heading_status: Property<StreamStatus>,
    pub velocity_status: Property<StreamStatus>,
    pub position: Property<Option<Update<Position>>>,
    pub heading: Property<Option<Update<Heading>>>,
    pub velocity: Property<Option<Update<Velocity>>>,
    subscriptions: Mutex<StreamSubscriptions>,
}

impl Session {
    pub fn new(engine: Arc<Engine>, selection: ProviderSelection) -> Arc<Self> {
        Arc::new(Self {
            engine,
            selection,
            position_status: Property::new(StreamStatus::Disabled),
            heading_status: Property::new(StreamStatus::Disabled),
            velocity_status: Property::new(StreamStatus::Disabled),
            position: Property::new(None),
            heading: Property::new(None),
            velocity: Property::new(None),
            subscriptions: Mutex::new(StreamSubscriptions::default()),
        })
    }

    pub fn start_position_updates(&self) -> Result<(), ProviderError> {
        if self.position_status.get() == StreamStatus::Enabled {
            return Ok(());
        }
        self.selection.position.activate()?;

        if let Some(last) = self.engine.last_known_location.get() {
            self.position.set(Some(last));
        }

        let position = self.position.clone();
        let sub = self
            .selection
            .position
            .position_updates()
            .subscribe(move |update| position.set(Some(*update)));
        self.subscriptions.lock().unwrap().position = Some(sub);
        self.position_status.set(StreamStatus::Enabled);
        trace!("position updates started");
        Ok(())
    }

    pub fn stop_position_updates(&self) -> Result<(), ProviderError> {
        if self.position_status.get() == StreamStatus::Disabled {
            return Ok(());
        }
        self.subscriptions.lock().unwrap().position = None;
        self.selection.position.deactivate()?;
        self.position_status.set(StreamStatus::Disabled);
        trace!("position updates stopped");
        Ok(())
    }

    pub fn start_heading_updates(&self) -> Result<(), ProviderError> {
        if self.heading_status.get() == StreamStatus::Enabled {
            return Ok(());
        }
        self.selection.heading.activate()?;
        let heading = self.heading.clone();
        let sub = self
            .selection
            .heading
            .heading_updates()
            .subscribe(move |update| heading.set(Some(*update)));
        self.subscriptions.lock().unwrap().heading = Some(sub);
        self.heading_status.set(StreamStatus::Enabled);
        Ok(())
    }

    pub fn stop_heading_updates(&self) -> Result<(), ProviderError> {
        if self.heading_status.get() == StreamStatus::Disabled {
            return Ok(());
        }
        self.subscriptions.lock().unwrap().heading = None;
        self.selection.heading.deactivate()?;
        self.heading_status.set(StreamStatus::Disabled);
        Ok(())
    }

    pub fn start_velocity_updates(&self) -> Result<(), ProviderError> {
        if self.velocity_status.get() == StreamStatus::Enabled {
            return Ok(());
        }
        self.selection.velocity.activate()?;
        let velocity = self.velocity.clone();
        let sub = self
            .selection
            .velocity
            .velocity_updates()
            .subscribe(move |update| velocity.set(Some(*update)));
        self.subscriptions.lock().unwrap().velocity = Some(sub);
        self.velocity_status.set(StreamStatus::Enabled);
        Ok(())
    }

    pub fn stop_velocity_updates(&self) -> Result<(), ProviderError> {
        if self.velocity_status.get() == StreamStatus::Disabled {
            return Ok(());
        }
        self.subscriptions.lock().unwrap().velocity = None;
        self.selection.velocity.deactivate()?;
        self.velocity_status.set(StreamStatus::Disabled);
        Ok(())
    }

    /// Tears the session down: detaches all stream listeners and returns
    /// the wrapped providers' activation demand to its pre-session baseline.
    pub fn close(&self) {
        let _ = self.stop_position_updates();
        let _ = self.stop_heading_updates();
        let _ = self.stop_velocity_updates();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::provider::{NullProvider, Provider, StateTrackingProvider};
    use location_types::Accuracy;
    use chrono::{TimeZone, Utc};

    fn selection_over(provider: Arc<dyn Provider>) -> ProviderSelection {
        ProviderSelection {
            position: provider.clone(),
            heading: provider.clone(),
            velocity: provider,
        }
    }

    #[test]
    fn s1_update_propagation_after_enable() {
        let engine = Engine::new(EngineConfig::default());
        let inner = Arc::new(NullProvider::new());
        inner.enable().unwrap();
        let provider: Arc<dyn Provider> = Arc::new(StateTrackingProvider::new(inner.clone()));

        let session = Session::new(Arc::clone(&engine), selection_over(provider));
        session.start_position_updates().unwrap();

        let when = Utc.timestamp_opt(1, 0).unwrap();
        let value = Position::new(9.0, 53.0, Some(-2.0), Accuracy::none()).unwrap();
        inner.position_updates().emit(&Update::new(value, when));

        assert_eq!(session.position.get(), Some(Update::new(value, when)));
    }

    #[test]
    fn s2_status_gating_blocks_updates_while_disabled() {
        let engine = Engine::new(EngineConfig::default());
        let inner = Arc::new(NullProvider::new());
        inner.enable().unwrap();
        let provider: Arc<dyn Provider> = Arc::new(StateTrackingProvider::new(inner.clone()));
        let session = Session::new(engine, selection_over(provider));

        let when = Utc.timestamp_opt(1, 0).unwrap();
        let value = Position::new(9.0, 53.0, None, Accuracy::none()).unwrap();
        inner.position_updates().emit(&Update::new(value, when));

        assert_eq!(session.position.get(), None);
    }

    #[test]
    fn s7_first_enable_sees_engines_last_known_location_immediately() {
        let engine = Engine::new(EngineConfig::default());
        let seed_provider: Arc<dyn Provider> = Arc::new(NullProvider::new());
        engine.add_provider(seed_provider.clone());
        let when = Utc.timestamp_opt(0, 0).unwrap();
        let seed_value = Position::new(1.0, 2.0, None, Accuracy::none()).unwrap();
        seed_provider.position_updates().emit(&Update::new(seed_value, when));

        let inner = Arc::new(NullProvider::new());
        inner.enable().unwrap();
        let provider: Arc<dyn Provider> = Arc::new(StateTrackingProvider::new(inner));
        let session = Session::new(Arc::clone(&engine), selection_over(provider));

        session.start_position_updates().unwrap();
        assert_eq!(session.position.get(), Some(Update::new(seed_value, when)));
    }

    #[test]
    fn closing_session_returns_activation_demand_to_baseline() {
        let engine = Engine::new(EngineConfig::default());
        let inner = Arc::new(NullProvider::new());
        inner.enable().unwrap();
        let provider = Arc::new(StateTrackingProvider::new(inner));
        let provider_dyn: Arc<dyn Provider> = provider.clone();
        let session = Session::new(engine, selection_over(provider_dyn));

        session.start_position_updates().unwrap();
        assert_eq!(provider.demand(), 1);

        drop(session);
        assert_eq!(provider.demand(), 0);
    }
}
