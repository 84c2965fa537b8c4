//! Optional reporter pipeline: fans the engine's last-known fix plus visible
//! wifi/cell ids out to a pluggable reporter, gated by `wifi_cell_reporting`.

use std::sync::{Arc, Mutex};

use location_types::{Position, Update};

use crate::engine::Engine;
use crate::reactive::Subscription;

/// A point-in-time snapshot of nearby wireless infrastructure. The scan
/// format itself (wifi BSSIDs, cell tower ids) is out of scope; this is an
/// opaque payload handed straight to the reporter.
#[derive(Debug, Clone, Default)]
pub struct ConnectivitySnapshot {
    pub wifis: Vec<String>,
    pub cells: Vec<String>,
}

/// External collaborator that can take a connectivity snapshot on demand.
pub trait ConnectivityObserver: Send + Sync {
    fn snapshot(&self) -> ConnectivitySnapshot;
}

/// External collaborator that receives harvested fixes. Interface is
/// intentionally minimal; the delivery mechanism (Ichnaea-style upload, a
/// local log, whatever) is out of scope.
pub trait Reporter: Send + Sync {
    fn start(&self);
    fn stop(&self);
    fn report(&self, position: Update<Position>, snapshot: ConnectivitySnapshot);
}

/// Observes the engine's `last_known_location` while `wifi_cell_reporting`
/// is on, and stops collecting the moment it's flipped off.
pub struct Harvester {
    engine: Arc<Engine>,
    connectivity: Arc<dyn ConnectivityObserver>,
    reporter: Arc<dyn Reporter>,
    position_subscription: Mutex<Option<Subscription>>,
    reporting_gate: Mutex<Option<Subscription>>,
}

impl Harvester {
    pub fn new(
        engine: Arc<Engine>,
        connectivity: Arc<dyn ConnectivityObserver>,
        reporter: Arc<dyn Reporter>,
    ) -> Arc<Self> {
        let harvester = Arc::new(Self {
            engine: Arc::clone(&engine),
            connectivity,
            reporter,
            position_subscription: Mutex::new(None),
            reporting_gate: Mutex::new(None),
        });

        let weak = Arc::downgrade(&harvester);
        let gate = engine.config.wifi_cell_reporting.subscribe(move |enabled| {
            if let Some(harvester) = weak.upgrade() {
                if *enabled {
                    harvester.start_collecting();
                } else {
                    harvester.stop_collecting();
                }
            }
        });
        *harvester.reporting_gate.lock().unwrap() = Some(gate);

        if engine.config.wifi_cell_reporting.get() {
            harvester.start_collecting();
        }

        harvester
    }

    fn start_collecting(&self) {
        if self.position_subscription.lock().unwrap().is_some() {
            return;
        }
        self.reporter.start();

        let connectivity = Arc::clone(&self.connectivity);
        let reporter = Arc::clone(&self.reporter);
        let subscription = self
            .engine
            .last_known_location
            .subscribe(move |position: &Option<Update<Position>>| {
                if let Some(position) = position {
                    reporter.report(*position, connectivity.snapshot());
                }
            });
        *self.position_subscription.lock().unwrap() = Some(subscription);
    }

    fn stop_collecting(&self) {
        let mut guard = self.position_subscription.lock().unwrap();
        if guard.take().is_some() {
            self.reporter.stop();
        }
    }

    pub fn is_collecting(&self) -> bool {
        self.position_subscription.lock().unwrap().is_some()
    }
}
