//! Mapping errors

use thiserror::Error;

use crate::network::{EquipmentKind, EquipmentVariable};

/// Configuration errors, detected while building a [`MappingModel`](super::MappingModel).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindingError {
    #[error("equipment \"{equipment}\" variable {variable} is bound twice (series \"{first}\" and \"{second}\")")]
    DuplicateBinding {
        equipment: String,
        variable: EquipmentVariable,
        first: String,
        second: String,
    },

    #[error("group mapping of series \"{series}\" has no equipment")]
    EmptyGroup { series: String },

    #[error("variable {variable} is not supported by {kind} \"{equipment}\"")]
    UnsupportedVariable {
        equipment: String,
        kind: EquipmentKind,
        variable: EquipmentVariable,
    },

    #[error("equipment \"{equipment}\" referenced by series \"{series}\" does not exist")]
    UnknownEquipment { equipment: String, series: String },

    #[error("group mapping of series \"{series}\" mixes {first} and {second} equipment")]
    MixedGroupKinds {
        series: String,
        first: EquipmentKind,
        second: EquipmentKind,
    },
}

/// Resolution errors, fatal to the current evaluation run only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("time series \"{series}\" needed at point {point} is not in the store")]
    UnresolvedSeries { series: String, point: usize },

    #[error("distribution key {key} of \"{equipment}\" cannot be resolved at point {point}")]
    MissingKeySource {
        equipment: String,
        key: String,
        point: usize,
    },

    #[error("time series \"{series}\" has {len} points, point {point} requested")]
    PointOutOfRange {
        series: String,
        point: usize,
        len: usize,
    },
}
