use serde::{Deserialize, Serialize};

/// The satellite constellation a space vehicle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SatelliteSystem {
    Gps,
    Glonass,
    Galileo,
    Beidou,
    Compass,
    Qzss,
    Irnss,
    Unknown,
}

/// Uniquely identifies a space vehicle within its constellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpaceVehicleKey {
    pub system: SatelliteSystem,
    pub id: u16,
}

/// A single tracked satellite and what the receiver currently knows about it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpaceVehicle {
    pub key: SpaceVehicleKey,
    pub snr: Option<f64>,
    pub has_almanac: bool,
    pub has_ephemeris: bool,
    pub used_in_fix: bool,
    pub azimuth: Option<f64>,
    pub elevation: Option<f64>,
}

impl SpaceVehicle {
    pub fn new(key: SpaceVehicleKey) -> Self {
        Self {
            key,
            snr: None,
            has_almanac: false,
            has_ephemeris: false,
            used_in_fix: false,
            azimuth: None,
            elevation: None,
        }
    }
}
