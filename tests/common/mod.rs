//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use ts_mapper::mapping::{
    EvaluationContext, Mapper, MappingModel, MappingRules, RecordingObserver,
};
use ts_mapper::network::{Equipment, EquipmentKind, EquipmentVariable, InMemoryNetwork};
use ts_mapper::timeseries::InMemoryStore;

/// Two generators (maxP 500 / 1500), two loads, an HVDC line and a PST.
pub fn small_network() -> InMemoryNetwork {
    InMemoryNetwork::from_equipment([
        Equipment::new("G1", EquipmentKind::Generator).with(EquipmentVariable::MaxP, 500.0),
        Equipment::new("G2", EquipmentKind::Generator).with(EquipmentVariable::MaxP, 1500.0),
        Equipment::new("L1", EquipmentKind::Load).with(EquipmentVariable::P0, 10.0),
        Equipment::new("L2", EquipmentKind::Load).with(EquipmentVariable::P0, 30.0),
        Equipment::new("HVDC1", EquipmentKind::HvdcLine),
        Equipment::new("PST1", EquipmentKind::PhaseTapChanger),
    ])
    .expect("fixture network is valid")
}

/// Store built from `(name, values)` pairs.
pub fn store_of(series: &[(&str, &[f64])]) -> InMemoryStore {
    let mut store = InMemoryStore::new();
    for (name, values) in series {
        store
            .insert(*name, values.to_vec())
            .expect("fixture series names are unique");
    }
    store
}

/// Builds the model and runs it once with a single recording observer.
pub fn record(
    rules: &MappingRules,
    network: &InMemoryNetwork,
    store: &InMemoryStore,
    context: &EvaluationContext,
) -> RecordingObserver {
    let model = MappingModel::build(rules, network).expect("fixture rules are valid");
    let mut rec = RecordingObserver::new();
    Mapper::new(&model, network)
        .evaluate(store, context, &mut [&mut rec])
        .expect("fixture run succeeds");
    rec
}
