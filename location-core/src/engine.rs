//! The engine: owns the provider set, tracks reference state, and resolves
//! provider selections for client criteria.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use location_types::{Criteria, Heading, Position, SpaceVehicle, SpaceVehicleKey, Update, Velocity};
use tracing::{debug, info, warn};

use crate::policy::{SourceId, TimeBasedUpdateSelectionPolicy, UpdateSelectionPolicy, WithSource};
use crate::provider::{Provider, ProviderEvent};
use crate::reactive::{Property, Subscription};
use crate::selection_policy::{DefaultProviderSelectionPolicy, ProviderSelection, ProviderSelectionPolicy};

/// The engine's own on/off/active tri-state. `Off` implies no provider is
/// active; flipping to `On`/`Active` never auto-activates providers, only
/// sessions do that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Off,
    On,
    Active,
}

/// Constructor-time tunables for the engine. The config-file format that
/// would populate these is out of scope; this is the seam a bootstrap layer
/// feeds from whatever source it owns.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub update_selection_cutoff: chrono::Duration,
    pub initial_engine_state: EngineState,
    pub initial_satellite_positioning: bool,
    pub initial_wifi_cell_reporting: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            update_selection_cutoff: chrono::Duration::minutes(2),
            initial_engine_state: EngineState::Off,
            initial_satellite_positioning: true,
            initial_wifi_cell_reporting: false,
        }
    }
}

pub struct EngineConfigProperties {
    pub engine_state: Property<EngineState>,
    pub satellite_positioning: Property<bool>,
    pub wifi_cell_reporting: Property<bool>,
}

pub struct EngineUpdates {
    pub position: Property<Option<Update<Position>>>,
    pub velocity: Property<Option<Update<Velocity>>>,
    pub heading: Property<Option<Update<Heading>>>,
    visible: Mutex<HashMap<SpaceVehicleKey, SpaceVehicle>>,
}

struct ProviderEntry {
    provider: Arc<dyn Provider>,
    source: SourceId,
    _subscriptions: Vec<Subscription>,
}

/// Owns the dynamic set of registered providers, the reference/last-known
/// state they feed, and the global config flags. The provider set is guarded
/// by a single mutex held only during structural changes; update callbacks
/// run after the lock is released.
pub struct Engine {
    providers: Mutex<Vec<ProviderEntry>>,
    pub config: EngineConfigProperties,
    pub updates: EngineUpdates,
    last_known_accumulator: Mutex<Option<WithSource<Position>>>,
    pub last_known_location: Property<Option<Update<Position>>>,
    provider_selection_policy: Arc<dyn ProviderSelectionPolicy>,
    update_selection_policy: Arc<dyn UpdateSelectionPolicy>,
    next_source_id: AtomicU64,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Arc<Self> {
        Arc::new(Self {
            providers: Mutex::new(Vec::new()),
            config: EngineConfigProperties {
                engine_state: Property::new(config.initial_engine_state),
                satellite_positioning: Property::new(config.initial_satellite_positioning),
                wifi_cell_reporting: Property::new(config.initial_wifi_cell_reporting),
            },
            updates: EngineUpdates {
                position: Property::new(None),
                velocity: Property::new(None),
                heading: Property::new(None),
                visible: Mutex::new(HashMap::new()),
            },
            last_known_accumulator: Mutex::new(None),
            last_known_location: Property::new(None),
            provider_selection_policy: Arc::new(DefaultProviderSelectionPolicy),
            update_selection_policy: Arc::new(TimeBasedUpdateSelectionPolicy::with_cutoff(
                config.update_selection_cutoff,
            )),
            next_source_id: AtomicU64::new(0),
        })
    }

    /// Registers a provider, idempotent by identity. Subscribes to its three
    /// streams and wires them into `updates`/`last_known_location`.
    pub fn add_provider(self: &Arc<Self>, provider: Arc<dyn Provider>) {
        let mut providers = self.providers.lock().unwrap();
        if providers.iter().any(|e| Arc::ptr_eq(&e.provider, &provider)) {
            return;
        }

        let source = SourceId(self.next_source_id.fetch_add(1, Ordering::SeqCst));
        let weak = Arc::downgrade(self);
        let mut subscriptions = Vec::new();

        let w = weak.clone();
        subscriptions.push(provider.position_updates().subscribe(move |update| {
            if let Some(engine) = w.upgrade() {
                engine.on_provider_position(source, *update);
            }
        }));

        let w = weak.clone();
        subscriptions.push(provider.heading_updates().subscribe(move |update| {
            if let Some(engine) = w.upgrade() {
                engine.updates.heading.set(Some(*update));
                engine.dispatch_reference_event(source, ProviderEvent::ReferenceHeadingUpdated(*update));
            }
        }));

        let w = weak.clone();
        subscriptions.push(provider.velocity_updates().subscribe(move |update| {
            if let Some(engine) = w.upgrade() {
                engine.updates.velocity.set(Some(*update));
                engine.dispatch_reference_event(source, ProviderEvent::ReferenceVelocityUpdated(*update));
            }
        }));

        provider.on_event(ProviderEvent::WifiCellReportingStateChanged(
            self.config.wifi_cell_reporting.get(),
        ));

        providers.push(ProviderEntry {
            provider,
            source,
            _subscriptions: subscriptions,
        });
        drop(providers);
        debug!("provider added to engine");
    }

    /// Forwards a reference-state event to every registered provider except
    /// the one it originated from, per the engine's role of relaying each
    /// provider's fix to the others as reference state (§2).
    fn dispatch_reference_event(&self, source: SourceId, event: ProviderEvent) {
        let providers = self.providers.lock().unwrap();
        for entry in providers.iter() {
            if entry.source != source {
                entry.provider.on_event(event.clone());
            }
        }
    }

    fn on_provider_position(&self, source: SourceId, update: Update<Position>) {
        self.updates.position.set(Some(update));
        self.dispatch_reference_event(source, ProviderEvent::ReferencePositionUpdated(update));

        let candidate = WithSource::new(update, source);
        let mut accumulator = self.last_known_accumulator.lock().unwrap();
        let best = match accumulator.as_ref() {
            None => candidate,
            Some(prev) => self.update_selection_policy.select(prev, &candidate),
        };

        if accumulator.as_ref() != Some(&best) {
            *accumulator = Some(best.clone());
            drop(accumulator);
            self.last_known_location.set(Some(best.update));
        }
    }

    /// Unsubscribes all connections and releases ownership. Non-fatal if unknown.
    pub fn remove_provider(&self, provider: &Arc<dyn Provider>) {
        let mut providers = self.providers.lock().unwrap();
        providers.retain(|e| !Arc::ptr_eq(&e.provider, provider));
    }

    pub fn has_provider(&self, provider: &Arc<dyn Provider>) -> bool {
        self.providers
            .lock()
            .unwrap()
            .iter()
            .any(|e| Arc::ptr_eq(&e.provider, provider))
    }

    pub fn for_each_provider(&self, mut f: impl FnMut(&Arc<dyn Provider>)) {
        let providers = self.providers.lock().unwrap();
        for entry in providers.iter() {
            f(&entry.provider);
        }
    }

    pub fn determine_provider_selection_for_criteria(&self, criteria: &Criteria) -> ProviderSelection {
        let snapshot: Vec<Arc<dyn Provider>> = {
            let providers = self.providers.lock().unwrap();
            providers.iter().map(|e| Arc::clone(&e.provider)).collect()
        };
        let satellites_enabled = self.config.satellite_positioning.get();
        self.provider_selection_policy
            .select(criteria, &snapshot, satellites_enabled)
    }

    pub fn set_engine_state(&self, state: EngineState) {
        self.config.engine_state.set(state);
        if state == EngineState::Off {
            self.for_each_provider(|p| {
                if let Err(e) = p.deactivate() {
                    warn!(error = %e, "provider failed to deactivate on engine-off");
                }
            });
        }
        info!(?state, "engine state changed");
    }

    pub fn set_satellite_positioning(&self, enabled: bool) {
        self.config.satellite_positioning.set(enabled);
    }

    pub fn set_wifi_cell_reporting(&self, enabled: bool) {
        self.config.wifi_cell_reporting.set(enabled);
        self.for_each_provider(|p| p.on_event(ProviderEvent::WifiCellReportingStateChanged(enabled)));
    }

    pub fn record_visible_space_vehicle(&self, sv: SpaceVehicle) {
        self.updates.visible.lock().unwrap().insert(sv.key, sv);
    }

    pub fn visible_space_vehicles(&self) -> Vec<SpaceVehicle> {
        self.updates.visible.lock().unwrap().values().copied().collect()
    }
}
