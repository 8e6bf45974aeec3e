//! Equipment kinds and the settable variables each kind exposes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::mapping::error::BindingError;

/// Kind of network equipment a time series can be mapped onto.
///
/// The set is closed: adding a kind means extending every `match` below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EquipmentKind {
    Generator,
    Load,
    HvdcLine,
    PhaseTapChanger,
}

impl EquipmentKind {
    /// All kinds, in evaluation order.
    pub const ALL: [EquipmentKind; 4] = [
        EquipmentKind::Generator,
        EquipmentKind::Load,
        EquipmentKind::HvdcLine,
        EquipmentKind::PhaseTapChanger,
    ];

    /// Returns the variable bound when a rule names no variable.
    pub fn default_variable(self) -> EquipmentVariable {
        match self {
            EquipmentKind::Generator => EquipmentVariable::TargetP,
            EquipmentKind::Load => EquipmentVariable::P0,
            EquipmentKind::HvdcLine => EquipmentVariable::ActivePowerSetpoint,
            EquipmentKind::PhaseTapChanger => EquipmentVariable::CurrentTap,
        }
    }

    /// Returns the variables that may be mapped on this kind.
    pub fn variables(self) -> &'static [EquipmentVariable] {
        use EquipmentVariable::*;
        match self {
            EquipmentKind::Generator => &[TargetP, TargetQ, MinP, MaxP],
            EquipmentKind::Load => &[
                P0,
                Q0,
                FixedActivePower,
                VariableActivePower,
                FixedReactivePower,
                VariableReactivePower,
            ],
            EquipmentKind::HvdcLine => &[ActivePowerSetpoint, MinP, MaxP],
            EquipmentKind::PhaseTapChanger => &[CurrentTap],
        }
    }

    /// Returns `true` when `variable` is settable on this kind.
    pub fn is_valid(self, variable: EquipmentVariable) -> bool {
        self.variables().contains(&variable)
    }

    /// Checks `variable` against this kind for the rule targeting `equipment_id`.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::UnsupportedVariable`] when the variable is not
    /// valid for the kind (e.g. a tap position requested on a generator).
    pub fn check(self, equipment_id: &str, variable: EquipmentVariable) -> Result<(), BindingError> {
        if self.is_valid(variable) {
            Ok(())
        } else {
            Err(BindingError::UnsupportedVariable {
                equipment: equipment_id.to_string(),
                kind: self,
                variable,
            })
        }
    }

    /// Kebab-case name used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            EquipmentKind::Generator => "generator",
            EquipmentKind::Load => "load",
            EquipmentKind::HvdcLine => "hvdc-line",
            EquipmentKind::PhaseTapChanger => "phase-tap-changer",
        }
    }
}

impl fmt::Display for EquipmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Settable attribute of an equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EquipmentVariable {
    /// Generator active power setpoint (MW).
    TargetP,
    /// Generator reactive power setpoint (MVar).
    TargetQ,
    /// Lower active power limit (generator or HVDC line).
    MinP,
    /// Upper active power limit (generator or HVDC line).
    MaxP,
    /// Load active power (MW).
    P0,
    /// Load reactive power (MVar).
    Q0,
    FixedActivePower,
    VariableActivePower,
    FixedReactivePower,
    VariableReactivePower,
    /// HVDC converter active power setpoint (MW).
    ActivePowerSetpoint,
    /// Phase tap changer position.
    CurrentTap,
}

impl EquipmentVariable {
    /// camelCase name used in configuration files and exports.
    pub fn name(self) -> &'static str {
        match self {
            EquipmentVariable::TargetP => "targetP",
            EquipmentVariable::TargetQ => "targetQ",
            EquipmentVariable::MinP => "minP",
            EquipmentVariable::MaxP => "maxP",
            EquipmentVariable::P0 => "p0",
            EquipmentVariable::Q0 => "q0",
            EquipmentVariable::FixedActivePower => "fixedActivePower",
            EquipmentVariable::VariableActivePower => "variableActivePower",
            EquipmentVariable::FixedReactivePower => "fixedReactivePower",
            EquipmentVariable::VariableReactivePower => "variableReactivePower",
            EquipmentVariable::ActivePowerSetpoint => "activePowerSetpoint",
            EquipmentVariable::CurrentTap => "currentTap",
        }
    }

    /// Returns `true` for variables that only take integer values.
    pub fn is_discrete(self) -> bool {
        matches!(self, EquipmentVariable::CurrentTap)
    }
}

impl fmt::Display for EquipmentVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown variable name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown equipment variable \"{0}\"")]
pub struct UnknownVariable(pub String);

impl FromStr for EquipmentVariable {
    type Err = UnknownVariable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EquipmentKind::ALL
            .iter()
            .flat_map(|kind| kind.variables())
            .copied()
            .find(|v| v.name() == s)
            .ok_or_else(|| UnknownVariable(s.to_string()))
    }
}
