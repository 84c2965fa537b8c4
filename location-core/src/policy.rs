//! Update-selection policy: decides which of two competing position fixes to retain.

use chrono::Duration;
use location_types::{Position, Update};

/// Identifies which provider an update came from, for tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub u64);

/// An update paired with the identity of the provider that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct WithSource<T> {
    pub update: Update<T>,
    pub source: SourceId,
}

impl<T> WithSource<T> {
    pub fn new(update: Update<T>, source: SourceId) -> Self {
        Self { update, source }
    }
}

/// Chooses between a retained update and a freshly arrived one.
pub trait UpdateSelectionPolicy: Send + Sync {
    fn select(
        &self,
        prev: &WithSource<Position>,
        next: &WithSource<Position>,
    ) -> WithSource<Position>;
}

/// Default policy: prefers recency outside a cutoff window, accuracy within it.
#[derive(Debug, Clone)]
pub struct TimeBasedUpdateSelectionPolicy {
    cutoff: Duration,
}

impl Default for TimeBasedUpdateSelectionPolicy {
    fn default() -> Self {
        Self {
            cutoff: Duration::minutes(2),
        }
    }
}

impl TimeBasedUpdateSelectionPolicy {
    pub fn with_cutoff(cutoff: Duration) -> Self {
        Self { cutoff }
    }
}

fn is_malformed(position: &Position) -> bool {
    position.latitude.degrees().is_nan() || position.longitude.degrees().is_nan()
}

impl UpdateSelectionPolicy for TimeBasedUpdateSelectionPolicy {
    fn select(
        &self,
        prev: &WithSource<Position>,
        next: &WithSource<Position>,
    ) -> WithSource<Position> {
        if is_malformed(&next.update.value) {
            return prev.clone();
        }

        let delta = next.update.when - prev.update.when;
        if delta < -self.cutoff {
            return prev.clone();
        }
        if delta > self.cutoff {
            return next.clone();
        }

        let prev_missing = prev.update.value.accuracy.horizontal.is_none();
        let next_missing = next.update.value.accuracy.horizontal.is_none();
        if prev_missing && next_missing {
            // Neither candidate carries horizontal accuracy; prefer the newer one.
            return next.clone();
        }

        let prev_acc = prev.update.value.accuracy.horizontal.unwrap_or(f64::INFINITY);
        let next_acc = next.update.value.accuracy.horizontal.unwrap_or(f64::INFINITY);

        match next_acc.partial_cmp(&prev_acc) {
            Some(std::cmp::Ordering::Less) => next.clone(),
            Some(std::cmp::Ordering::Greater) => prev.clone(),
            _ => {
                if next.source == prev.source {
                    next.clone()
                } else {
                    prev.clone()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use location_types::Accuracy;

    fn pos(lat: f64, lon: f64, horiz: Option<f64>) -> Position {
        Position::new(lat, lon, None, Accuracy { horizontal: horiz, vertical: None }).unwrap()
    }

    fn at(secs: i64, lat: f64, lon: f64, horiz: Option<f64>, source: u64) -> WithSource<Position> {
        WithSource::new(
            Update::new(pos(lat, lon, horiz), Utc.timestamp_opt(secs, 0).unwrap()),
            SourceId(source),
        )
    }

    #[test]
    fn select_is_idempotent() {
        let policy = TimeBasedUpdateSelectionPolicy::default();
        let x = at(1_000, 10.0, 20.0, Some(5.0), 1);
        assert_eq!(policy.select(&x, &x), x);
    }

    #[test]
    fn newer_outside_cutoff_wins_regardless_of_accuracy() {
        let policy = TimeBasedUpdateSelectionPolicy::default();
        let prev = at(0, 10.0, 20.0, Some(1.0), 1);
        let next = at(200, 11.0, 21.0, Some(500.0), 2);
        assert_eq!(policy.select(&prev, &next), next);
    }

    #[test]
    fn older_outside_cutoff_is_rejected() {
        let policy = TimeBasedUpdateSelectionPolicy::default();
        let prev = at(1_000, 10.0, 20.0, Some(1.0), 1);
        let next = at(700, 11.0, 21.0, Some(1.0), 2);
        assert_eq!(policy.select(&prev, &next), prev);
    }

    #[test]
    fn within_cutoff_prefers_better_accuracy() {
        let policy = TimeBasedUpdateSelectionPolicy::default();
        let prev = at(0, 10.0, 20.0, Some(50.0), 1);
        let next = at(30, 11.0, 21.0, Some(10.0), 2);
        assert_eq!(policy.select(&prev, &next), next);
    }

    #[test]
    fn within_cutoff_rejects_worse_accuracy() {
        let policy = TimeBasedUpdateSelectionPolicy::default();
        let prev = at(0, 10.0, 20.0, Some(10.0), 1);
        let next = at(30, 11.0, 21.0, Some(50.0), 2);
        assert_eq!(policy.select(&prev, &next), prev);
    }

    #[test]
    fn missing_accuracy_on_both_sides_prefers_newer() {
        let policy = TimeBasedUpdateSelectionPolicy::default();
        let prev = at(0, 10.0, 20.0, None, 1);
        let next = at(30, 11.0, 21.0, None, 2);
        assert_eq!(policy.select(&prev, &next), next);
    }

    #[test]
    fn exact_tie_prefers_same_source_continuity() {
        let policy = TimeBasedUpdateSelectionPolicy::default();
        let prev = at(0, 10.0, 20.0, Some(5.0), 1);
        let next_same_source = at(30, 11.0, 21.0, Some(5.0), 1);
        assert_eq!(policy.select(&prev, &next_same_source), next_same_source);

        let next_other_source = at(30, 11.0, 21.0, Some(5.0), 2);
        assert_eq!(policy.select(&prev, &next_other_source), prev);
    }
}
