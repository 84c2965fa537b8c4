use serde::{Deserialize, Serialize};

/// Streams a provider can emit, or a client can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Position,
    Heading,
    Velocity,
}

const ALL_FEATURES: [Feature; 3] = [Feature::Position, Feature::Heading, Feature::Velocity];

/// External dependencies a provider may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Satellites,
    CellNetwork,
    DataNetwork,
    MonetarySpending,
}

const ALL_REQUIREMENTS: [Requirement; 4] = [
    Requirement::Satellites,
    Requirement::CellNetwork,
    Requirement::DataNetwork,
    Requirement::MonetarySpending,
];

/// A small fixed-universe set, stored as a bitset, matching the wire-level
/// `features_bitset`/`requirements_bitset` shape described for `Criteria`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlagSet(u8);

impl FlagSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, bit: u8) {
        self.0 |= 1 << bit;
    }

    pub fn contains(&self, bit: u8) -> bool {
        self.0 & (1 << bit) != 0
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }
}

/// Set of requested `Feature`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureSet(FlagSet);

impl FeatureSet {
    pub const fn empty() -> Self {
        Self(FlagSet::empty())
    }

    pub fn with(mut self, feature: Feature) -> Self {
        self.0.insert(feature as u8);
        self
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.0.contains(feature as u8)
    }

    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        ALL_FEATURES.iter().copied().filter(move |f| self.contains(*f))
    }

    pub fn bits(&self) -> u8 {
        self.0.bits()
    }

    pub fn from_bits(bits: FlagSet) -> Self {
        Self(bits)
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), |set, f| set.with(f))
    }
}

/// Set of acceptable `Requirement`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequirementSet(FlagSet);

impl RequirementSet {
    pub const fn empty() -> Self {
        Self(FlagSet::empty())
    }

    pub const fn all() -> Self {
        // Satellites | CellNetwork | DataNetwork | MonetarySpending
        Self(FlagSet(0b1111))
    }

    pub fn with(mut self, requirement: Requirement) -> Self {
        self.0.insert(requirement as u8);
        self
    }

    pub fn contains(&self, requirement: Requirement) -> bool {
        self.0.contains(requirement as u8)
    }

    pub fn iter(&self) -> impl Iterator<Item = Requirement> + '_ {
        ALL_REQUIREMENTS
            .iter()
            .copied()
            .filter(move |r| self.contains(*r))
    }

    pub fn bits(&self) -> u8 {
        self.0.bits()
    }

    pub fn from_bits(bits: FlagSet) -> Self {
        Self(bits)
    }
}

impl FromIterator<Requirement> for RequirementSet {
    fn from_iter<I: IntoIterator<Item = Requirement>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), |set, r| set.with(r))
    }
}

/// Optional accuracy envelope a client is willing to accept.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccuracyEnvelope {
    pub horizontal: Option<f64>,
    pub vertical: Option<f64>,
    pub velocity: Option<f64>,
    pub heading: Option<f64>,
}

/// A client's declarative requirements on feature set, requirements, and accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Criteria {
    pub features: FeatureSet,
    pub requirements: RequirementSet,
    pub accuracy: AccuracyEnvelope,
}

impl Criteria {
    pub fn empty() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_set_round_trips_membership() {
        let set = FeatureSet::empty().with(Feature::Position).with(Feature::Heading);
        assert!(set.contains(Feature::Position));
        assert!(set.contains(Feature::Heading));
        assert!(!set.contains(Feature::Velocity));
    }

    #[test]
    fn requirement_set_all_contains_every_variant() {
        let all = RequirementSet::all();
        for r in ALL_REQUIREMENTS {
            assert!(all.contains(r));
        }
    }
}
