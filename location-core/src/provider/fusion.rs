use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};

use location_types::{Criteria, FeatureSet, Heading, Position, RequirementSet, Update, Velocity};
use tracing::warn;

use crate::error::ProviderError;
use crate::policy::{SourceId, UpdateSelectionPolicy, WithSource};
use crate::reactive::{Signal, Subscription};

use super::{LifecycleCell, LifecycleState, Provider, ProviderEvent};

struct Shared {
    children: Vec<Arc<dyn Provider>>,
    policy: Arc<dyn UpdateSelectionPolicy>,
    lifecycle: LifecycleCell,
    position: Signal<Update<Position>>,
    heading: Signal<Update<Heading>>,
    velocity: Signal<Update<Velocity>>,
    last_position: Mutex<Option<WithSource<Position>>>,
    _child_subscriptions: Mutex<Vec<Subscription>>,
}

impl Shared {
    fn on_child_position(&self, source: SourceId, update: Update<Position>) {
        let candidate = WithSource::new(update, source);
        let mut guard = self.last_position.lock().unwrap();

        let best = match guard.as_ref() {
            None => candidate,
            Some(prev) => {
                match panic::catch_unwind(AssertUnwindSafe(|| self.policy.select(prev, &candidate))) {
                    Ok(chosen) => chosen,
                    Err(_) => {
                        warn!("update-selection policy panicked; keeping previous position");
                        prev.clone()
                    }
                }
            }
        };

        if guard.as_ref() != Some(&best) {
            *guard = Some(best.clone());
            drop(guard);
            self.position.emit(&best.update);
        }
    }
}

/// Merges N child providers into one position/heading/velocity stream using
/// an update-selection policy (position only — heading and velocity are
/// forwarded last-writer-wins).
///
/// Each child-stream subscription closes over a `Weak` back-reference to the
/// shared fusion state, so a dropped `FusionProvider` leaves pending child
/// callbacks as harmless no-ops instead of keeping itself alive via a cycle.
pub struct FusionProvider {
    shared: Arc<Shared>,
}

impl FusionProvider {
    pub fn new(
        children: Vec<Arc<dyn Provider>>,
        policy: Arc<dyn UpdateSelectionPolicy>,
    ) -> Arc<Self> {
        let shared = Arc::new(Shared {
            children,
            policy,
            lifecycle: LifecycleCell::new(),
            position: Signal::new(),
            heading: Signal::new(),
            velocity: Signal::new(),
            last_position: Mutex::new(None),
            _child_subscriptions: Mutex::new(Vec::new()),
        });

        let weak: Weak<Shared> = Arc::downgrade(&shared);
        let mut subscriptions = Vec::new();
        for (index, child) in shared.children.iter().enumerate() {
            let source = SourceId(index as u64);

            let w = weak.clone();
            subscriptions.push(child.position_updates().subscribe(move |update| {
                if let Some(shared) = w.upgrade() {
                    shared.on_child_position(source, update.clone());
                }
            }));

            let w = weak.clone();
            subscriptions.push(child.heading_updates().subscribe(move |update| {
                if let Some(shared) = w.upgrade() {
                    shared.heading.emit(update);
                }
            }));

            let w = weak.clone();
            subscriptions.push(child.velocity_updates().subscribe(move |update| {
                if let Some(shared) = w.upgrade() {
                    shared.velocity.emit(update);
                }
            }));
        }
        *shared._child_subscriptions.lock().unwrap() = subscriptions;

        Arc::new(Self { shared })
    }
}

impl Provider for FusionProvider {
    fn features(&self) -> FeatureSet {
        self.shared
            .children
            .iter()
            .map(|c| c.features())
            .fold(FeatureSet::empty(), |acc, f| {
                f.iter().fold(acc, |acc, feature| acc.with(feature))
            })
    }

    fn requirements(&self) -> RequirementSet {
        self.shared
            .children
            .iter()
            .map(|c| c.requirements())
            .fold(RequirementSet::empty(), |acc, r| {
                r.iter().fold(acc, |acc, requirement| acc.with(requirement))
            })
    }

    fn matches(&self, criteria: &Criteria) -> bool {
        self.shared.children.iter().any(|c| c.matches(criteria))
    }

    fn on_event(&self, event: ProviderEvent) {
        for child in &self.shared.children {
            child.on_event(event.clone());
        }
    }

    fn enable(&self) -> Result<(), ProviderError> {
        self.shared.lifecycle.enable()?;
        for child in &self.shared.children {
            if let Err(e) = child.enable() {
                warn!(error = %e, "fusion child failed to enable; continuing");
            }
        }
        Ok(())
    }

    fn disable(&self) -> Result<(), ProviderError> {
        self.shared.lifecycle.disable()?;
        for child in &self.shared.children {
            if let Err(e) = child.disable() {
                warn!(error = %e, "fusion child failed to disable; continuing");
            }
        }
        Ok(())
    }

    fn activate(&self) -> Result<(), ProviderError> {
        self.shared.lifecycle.activate()?;
        for child in &self.shared.children {
            if let Err(e) = child.activate() {
                warn!(error = %e, "fusion child failed to activate; continuing");
            }
        }
        Ok(())
    }

    fn deactivate(&self) -> Result<(), ProviderError> {
        self.shared.lifecycle.deactivate()?;
        for child in &self.shared.children {
            if let Err(e) = child.deactivate() {
                warn!(error = %e, "fusion child failed to deactivate; continuing");
            }
        }
        Ok(())
    }

    fn lifecycle_state(&self) -> LifecycleState {
        self.shared.lifecycle.state()
    }

    fn position_updates(&self) -> Signal<Update<Position>> {
        self.shared.position.clone()
    }

    fn heading_updates(&self) -> Signal<Update<Heading>> {
        self.shared.heading.clone()
    }

    fn velocity_updates(&self) -> Signal<Update<Velocity>> {
        self.shared.velocity.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::TimeBasedUpdateSelectionPolicy;
    use crate::provider::NullProvider;
    use chrono::{TimeZone, Utc};
    use location_types::Accuracy;

    fn pos(lat: f64, horiz: Option<f64>) -> Position {
        Position::new(lat, 0.0, None, Accuracy { horizontal: horiz, vertical: None }).unwrap()
    }

    #[test]
    fn fusion_dropped_leaves_child_callbacks_as_no_ops() {
        let child = Arc::new(NullProvider::new());
        let fusion = FusionProvider::new(vec![child.clone()], Arc::new(TimeBasedUpdateSelectionPolicy::default()));
        let weak_position = fusion.position_updates();
        drop(fusion);

        // Emitting after the fusion provider is dropped must not panic; the
        // weak back-reference inside the child subscription simply upgrades to None.
        child
            .position_updates()
            .emit(&Update::new(pos(1.0, None), Utc.timestamp_opt(0, 0).unwrap()));
        assert_eq!(weak_position.subscriber_count(), 0);
    }

    #[test]
    fn s3_more_accurate_update_within_window_wins() {
        let a = Arc::new(NullProvider::new());
        let b = Arc::new(NullProvider::new());
        let fusion = FusionProvider::new(
            vec![a.clone(), b.clone()],
            Arc::new(TimeBasedUpdateSelectionPolicy::default()),
        );

        let observed = Arc::new(Mutex::new(None));
        let observed_in_listener = Arc::clone(&observed);
        let _sub = fusion.position_updates().subscribe(move |u: &Update<Position>| {
            *observed_in_listener.lock().unwrap() = Some(*u);
        });

        let t0 = Utc.timestamp_opt(1_000, 0).unwrap();
        a.position_updates().emit(&Update::new(pos(9.0, Some(10.0)), t0));
        b.position_updates()
            .emit(&Update::new(pos(9.5, Some(50.0)), t0 + chrono::Duration::seconds(30)));

        let observed = observed.lock().unwrap().unwrap();
        assert_eq!(observed.value, pos(9.0, Some(10.0)));
    }

    #[test]
    fn s4_stale_update_outside_window_is_ignored() {
        let a = Arc::new(NullProvider::new());
        let b = Arc::new(NullProvider::new());
        let fusion = FusionProvider::new(
            vec![a.clone(), b.clone()],
            Arc::new(TimeBasedUpdateSelectionPolicy::default()),
        );

        let observed = Arc::new(Mutex::new(None));
        let observed_in_listener = Arc::clone(&observed);
        let _sub = fusion.position_updates().subscribe(move |u: &Update<Position>| {
            *observed_in_listener.lock().unwrap() = Some(*u);
        });

        let t0 = Utc.timestamp_opt(10_000, 0).unwrap();
        a.position_updates().emit(&Update::new(pos(9.0, Some(10.0)), t0));
        b.position_updates()
            .emit(&Update::new(pos(9.5, Some(1.0)), t0 - chrono::Duration::minutes(5)));

        let observed = observed.lock().unwrap().unwrap();
        assert_eq!(observed.value, pos(9.0, Some(10.0)));
    }
}
