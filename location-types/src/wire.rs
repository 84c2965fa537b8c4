//! Wire-level DTOs mirroring the IPC surface described for this service.
//!
//! These are plain, transport-agnostic shapes: whichever object-path/marshalling
//! layer eventually sits on top of the core converts to/from these with
//! `From`/`TryFrom`, the same way it would convert to/from a D-Bus message body.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::criteria::{AccuracyEnvelope, Criteria, FlagSet};
use crate::error::LocationError;
use crate::geo::{Accuracy, Position, Update};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccuracyWire {
    pub horiz: Option<f64>,
    pub vert: Option<f64>,
}

impl From<Accuracy> for AccuracyWire {
    fn from(a: Accuracy) -> Self {
        Self {
            horiz: a.horizontal,
            vert: a.vertical,
        }
    }
}

impl From<AccuracyWire> for Accuracy {
    fn from(w: AccuracyWire) -> Self {
        Self {
            horizontal: w.horiz,
            vertical: w.vert,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionWire {
    pub lat: f64,
    pub lon: f64,
    pub alt: Option<f64>,
    pub acc: AccuracyWire,
}

impl From<Position> for PositionWire {
    fn from(p: Position) -> Self {
        Self {
            lat: p.latitude.degrees(),
            lon: p.longitude.degrees(),
            alt: p.altitude,
            acc: p.accuracy.into(),
        }
    }
}

impl TryFrom<PositionWire> for Position {
    type Error = LocationError;

    fn try_from(w: PositionWire) -> Result<Self, Self::Error> {
        Position::new(w.lat, w.lon, w.alt, w.acc.into())
    }
}

/// Wire form of `Update<T>`: `{ value: T, when: nanoseconds_since_epoch }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpdateWire<T> {
    pub value: T,
    pub when: i64,
}

fn nanos_since_epoch(when: DateTime<Utc>) -> i64 {
    when.timestamp_nanos_opt().unwrap_or(i64::MAX)
}

fn from_nanos_since_epoch(nanos: i64) -> DateTime<Utc> {
    Utc.timestamp_nanos(nanos)
}

impl From<Update<Position>> for UpdateWire<PositionWire> {
    fn from(u: Update<Position>) -> Self {
        Self {
            value: u.value.into(),
            when: nanos_since_epoch(u.when),
        }
    }
}

impl TryFrom<UpdateWire<PositionWire>> for Update<Position> {
    type Error = LocationError;

    fn try_from(w: UpdateWire<PositionWire>) -> Result<Self, Self::Error> {
        Ok(Update::new(w.value.try_into()?, from_nanos_since_epoch(w.when)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccuracyEnvelopeWire {
    pub horizontal: Option<f64>,
    pub vertical: Option<f64>,
    pub velocity: Option<f64>,
    pub heading: Option<f64>,
}

impl From<AccuracyEnvelope> for AccuracyEnvelopeWire {
    fn from(e: AccuracyEnvelope) -> Self {
        Self {
            horizontal: e.horizontal,
            vertical: e.vertical,
            velocity: e.velocity,
            heading: e.heading,
        }
    }
}

impl From<AccuracyEnvelopeWire> for AccuracyEnvelope {
    fn from(w: AccuracyEnvelopeWire) -> Self {
        Self {
            horizontal: w.horizontal,
            vertical: w.vertical,
            velocity: w.velocity,
            heading: w.heading,
        }
    }
}

/// Wire form of `Criteria`: `{ features_bitset, requirements_bitset, accuracy }`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CriteriaWire {
    pub features_bitset: u8,
    pub requirements_bitset: u8,
    pub accuracy: AccuracyEnvelopeWire,
}

impl From<Criteria> for CriteriaWire {
    fn from(c: Criteria) -> Self {
        Self {
            features_bitset: c.features_bits(),
            requirements_bitset: c.requirements_bits(),
            accuracy: c.accuracy.into(),
        }
    }
}

impl From<CriteriaWire> for Criteria {
    fn from(w: CriteriaWire) -> Self {
        Criteria::from_bits(w.features_bitset, w.requirements_bitset, w.accuracy.into())
    }
}

impl Criteria {
    fn features_bits(&self) -> u8 {
        self.features.bits()
    }

    fn requirements_bits(&self) -> u8 {
        self.requirements.bits()
    }

    fn from_bits(features_bits: u8, requirements_bits: u8, accuracy: AccuracyEnvelope) -> Self {
        Self {
            features: crate::criteria::FeatureSet::from_bits(FlagSet::from_bits(features_bits)),
            requirements: crate::criteria::RequirementSet::from_bits(FlagSet::from_bits(
                requirements_bits,
            )),
            accuracy,
        }
    }
}
