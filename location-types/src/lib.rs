//! Value types shared across the location service core: measurements,
//! space-vehicle metadata, client criteria, distance math, and the
//! wire-level DTOs the (out of scope) transport layer would marshal.

pub mod criteria;
pub mod distance;
pub mod error;
pub mod geo;
pub mod space_vehicle;
pub mod wire;

pub use criteria::{
    AccuracyEnvelope, Criteria, Feature, FeatureSet, Requirement, RequirementSet,
};
pub use distance::haversine_distance_meters;
pub use error::LocationError;
pub use geo::{Accuracy, Heading, Latitude, Longitude, Position, Update, Velocity};
pub use space_vehicle::{SatelliteSystem, SpaceVehicle, SpaceVehicleKey};
