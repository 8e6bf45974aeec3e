//! In-memory network used by studies and tests.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use super::variable::{EquipmentKind, EquipmentVariable, UnknownVariable};
use super::Network;

/// Errors raised while assembling an [`InMemoryNetwork`].
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("equipment \"{0}\" declared twice")]
    DuplicateEquipment(String),

    #[error("equipment \"{equipment}\": {source}")]
    UnknownAttribute {
        equipment: String,
        #[source]
        source: UnknownVariable,
    },

    #[error("equipment \"{equipment}\" ({kind}) has no attribute {variable}")]
    InvalidAttribute {
        equipment: String,
        kind: EquipmentKind,
        variable: EquipmentVariable,
    },
}

/// One equipment entry as declared in a study file.
///
/// Attribute names are the camelCase variable names (`maxP`, `p0`, ...).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Equipment {
    pub id: String,
    pub kind: EquipmentKind,
    #[serde(default)]
    pub attributes: BTreeMap<String, f64>,
}

impl Equipment {
    /// Creates an equipment entry with no attributes.
    pub fn new(id: impl Into<String>, kind: EquipmentKind) -> Self {
        Self {
            id: id.into(),
            kind,
            attributes: BTreeMap::new(),
        }
    }

    /// Adds an attribute value, builder style.
    pub fn with(mut self, variable: EquipmentVariable, value: f64) -> Self {
        self.attributes.insert(variable.name().to_string(), value);
        self
    }
}

#[derive(Debug, Clone)]
struct Entry {
    kind: EquipmentKind,
    attributes: BTreeMap<EquipmentVariable, f64>,
}

/// Network held entirely in memory, keyed by equipment id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNetwork {
    equipment: BTreeMap<String, Entry>,
}

impl InMemoryNetwork {
    /// Creates an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a network from declared equipment.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError`] on duplicate ids, unknown attribute names,
    /// or attributes that do not belong to the equipment kind.
    pub fn from_equipment<I>(equipment: I) -> Result<Self, NetworkError>
    where
        I: IntoIterator<Item = Equipment>,
    {
        let mut network = Self::new();
        for e in equipment {
            network.insert(e)?;
        }
        Ok(network)
    }

    /// Adds one equipment entry.
    ///
    /// # Errors
    ///
    /// See [`InMemoryNetwork::from_equipment`].
    pub fn insert(&mut self, equipment: Equipment) -> Result<(), NetworkError> {
        if self.equipment.contains_key(&equipment.id) {
            return Err(NetworkError::DuplicateEquipment(equipment.id));
        }
        let mut attributes = BTreeMap::new();
        for (name, value) in &equipment.attributes {
            let variable: EquipmentVariable =
                name.parse().map_err(|source| NetworkError::UnknownAttribute {
                    equipment: equipment.id.clone(),
                    source,
                })?;
            if !equipment.kind.is_valid(variable) {
                return Err(NetworkError::InvalidAttribute {
                    equipment: equipment.id.clone(),
                    kind: equipment.kind,
                    variable,
                });
            }
            attributes.insert(variable, *value);
        }
        self.equipment.insert(
            equipment.id,
            Entry {
                kind: equipment.kind,
                attributes,
            },
        );
        Ok(())
    }

    /// Number of equipment entries.
    pub fn len(&self) -> usize {
        self.equipment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equipment.is_empty()
    }
}

impl Network for InMemoryNetwork {
    fn exists(&self, equipment_id: &str) -> bool {
        self.equipment.contains_key(equipment_id)
    }

    fn kind(&self, equipment_id: &str) -> Option<EquipmentKind> {
        self.equipment.get(equipment_id).map(|e| e.kind)
    }

    fn attribute(&self, equipment_id: &str, variable: EquipmentVariable) -> Option<f64> {
        self.equipment
            .get(equipment_id)
            .and_then(|e| e.attributes.get(&variable))
            .copied()
    }

    fn ids_of_kind(&self, kind: EquipmentKind) -> Vec<&str> {
        self.equipment
            .iter()
            .filter(|(_, e)| e.kind == kind)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}
