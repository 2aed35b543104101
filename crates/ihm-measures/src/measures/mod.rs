//! The six instance hardness measures.
//!
//! Every measure returns one value per instance in dataset order; higher
//! values mean harder instances.
use std::fmt;
use std::str::FromStr;

use ndarray::Array1;

pub mod likelihood;
pub mod neighborhood;
pub mod tree_based;

/// One value per instance, in dataset order.
pub type MeasureResult = Array1<f64>;

/// Prefix marking result columns as derived features.
pub const COLUMN_PREFIX: &str = "feature_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    /// Entropy of the k nearest neighbors' labels.
    Kdn,
    /// Intra/extra class nearest-neighbor distance ratio.
    N2,
    /// Gap between the two largest calibrated class probabilities.
    Cld,
    /// Entropy of the instance's disjunct in a leave-one-out tree.
    Dcp,
    TdPruned,
    TdUnpruned,
}

impl Measure {
    /// Declared order, used when no subset is requested.
    pub const ALL: [Measure; 6] = [
        Measure::Kdn,
        Measure::N2,
        Measure::Cld,
        Measure::Dcp,
        Measure::TdPruned,
        Measure::TdUnpruned,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Measure::Kdn => "kDN",
            Measure::N2 => "N2",
            Measure::Cld => "CLD",
            Measure::Dcp => "DCP",
            Measure::TdPruned => "TD_P",
            Measure::TdUnpruned => "TD_U",
        }
    }

    pub fn column_name(&self) -> String {
        format!("{}{}", COLUMN_PREFIX, self.name())
    }

    /// Whether the measure reads the shared distance/classifier structures.
    pub fn uses_precomputation(&self) -> bool {
        matches!(self, Measure::Kdn | Measure::N2 | Measure::Cld)
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Measure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Measure::ALL
            .iter()
            .copied()
            .find(|m| m.name() == s)
            .ok_or_else(|| format!("Unknown measure: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for measure in Measure::ALL {
            assert_eq!(measure.name().parse::<Measure>(), Ok(measure));
        }
        assert!("kdn".parse::<Measure>().is_err());
        assert_eq!(Measure::TdPruned.column_name(), "feature_TD_P");
    }
}
