//! Network model interface consumed by the mapping engine.

pub mod model;
pub mod variable;

pub use model::{Equipment, InMemoryNetwork, NetworkError};
pub use variable::{EquipmentKind, EquipmentVariable};

/// Read-only view of the network the mapping engine queries.
///
/// The engine never mutates the network; callers apply observed values
/// themselves. Current attribute values serve both as static distribution
/// keys and, on request, as the reported value of unmapped equipment.
pub trait Network {
    /// Returns `true` when an equipment with this id exists.
    fn exists(&self, equipment_id: &str) -> bool {
        self.kind(equipment_id).is_some()
    }

    /// Returns the kind of the equipment, or `None` if it does not exist.
    fn kind(&self, equipment_id: &str) -> Option<EquipmentKind>;

    /// Returns the current value of an equipment attribute.
    ///
    /// Used for static distribution keys such as a generator's `maxP`.
    fn attribute(&self, equipment_id: &str, variable: EquipmentVariable) -> Option<f64>;

    /// Ids of every equipment of `kind`, in lexical order.
    fn ids_of_kind(&self, kind: EquipmentKind) -> Vec<&str>;
}
