use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LocationError;

/// Latitude in degrees, constrained to `[-90, 90]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Latitude(f64);

impl Latitude {
    pub fn new(degrees: f64) -> Result<Self, LocationError> {
        if !(-90.0..=90.0).contains(&degrees) || degrees.is_nan() {
            return Err(LocationError::out_of_range("latitude", degrees, -90.0, 90.0));
        }
        Ok(Self(degrees))
    }

    pub fn degrees(&self) -> f64 {
        self.0
    }
}

/// Longitude in degrees, constrained to `[-180, 180]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Longitude(f64);

impl Longitude {
    pub fn new(degrees: f64) -> Result<Self, LocationError> {
        if !(-180.0..=180.0).contains(&degrees) || degrees.is_nan() {
            return Err(LocationError::out_of_range("longitude", degrees, -180.0, 180.0));
        }
        Ok(Self(degrees))
    }

    pub fn degrees(&self) -> f64 {
        self.0
    }
}

/// Heading in degrees, constrained to `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Heading(f64);

impl Heading {
    pub fn new(degrees: f64) -> Result<Self, LocationError> {
        if !(0.0..360.0).contains(&degrees) || degrees.is_nan() {
            return Err(LocationError::out_of_range("heading", degrees, 0.0, 360.0));
        }
        Ok(Self(degrees))
    }

    pub fn degrees(&self) -> f64 {
        self.0
    }
}

/// Velocity in meters per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    meters_per_second: f64,
}

impl Velocity {
    pub fn new(meters_per_second: f64) -> Self {
        Self { meters_per_second }
    }

    pub fn meters_per_second(&self) -> f64 {
        self.meters_per_second
    }
}

/// Horizontal/vertical accuracy envelope, in meters, attached to a `Position`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Accuracy {
    pub horizontal: Option<f64>,
    pub vertical: Option<f64>,
}

impl Accuracy {
    pub const fn none() -> Self {
        Self {
            horizontal: None,
            vertical: None,
        }
    }

    pub const fn horizontal(meters: f64) -> Self {
        Self {
            horizontal: Some(meters),
            vertical: None,
        }
    }
}

/// A single position fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: Latitude,
    pub longitude: Longitude,
    pub altitude: Option<f64>,
    pub accuracy: Accuracy,
}

impl Position {
    pub fn new(
        latitude_degrees: f64,
        longitude_degrees: f64,
        altitude: Option<f64>,
        accuracy: Accuracy,
    ) -> Result<Self, LocationError> {
        Ok(Self {
            latitude: Latitude::new(latitude_degrees)?,
            longitude: Longitude::new(longitude_degrees)?,
            altitude,
            accuracy,
        })
    }
}

/// A value paired with the timestamp it was observed at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Update<T> {
    pub value: T,
    pub when: DateTime<Utc>,
}

impl<T> Update<T> {
    pub fn new(value: T, when: DateTime<Utc>) -> Self {
        Self { value, when }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Update<U> {
        Update {
            value: f(self.value),
            when: self.when,
        }
    }
}
