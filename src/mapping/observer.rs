//! Push-based output channel of the mapping engine.

use serde::Serialize;

use super::context::EvaluationContext;
use crate::network::{EquipmentKind, EquipmentVariable};

/// One computed equipment value, borrowed from the engine for the duration
/// of a callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assignment<'a> {
    pub point: usize,
    pub series: &'a str,
    pub equipment_id: &'a str,
    pub kind: EquipmentKind,
    pub variable: EquipmentVariable,
    pub value: f64,
    /// Equipment limits must not be enforced when applying this value.
    pub limit_exempt: bool,
}

impl Assignment<'_> {
    pub fn to_record(&self) -> AssignmentRecord {
        AssignmentRecord {
            point: self.point,
            series: self.series.to_string(),
            equipment_id: self.equipment_id.to_string(),
            kind: self.kind,
            variable: self.variable,
            value: self.value,
            limit_exempt: self.limit_exempt,
        }
    }
}

/// Owned copy of an [`Assignment`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentRecord {
    pub point: usize,
    pub series: String,
    pub equipment_id: String,
    pub kind: EquipmentKind,
    pub variable: EquipmentVariable,
    pub value: f64,
    pub limit_exempt: bool,
}

/// Receives the results of an evaluation run.
///
/// Callbacks are invoked synchronously and in-line. Every registered observer
/// sees the same sequence: `on_run_start`, then for each point in ascending
/// order `on_point_start`, its assignments, `on_point_end`, and finally
/// `on_run_end`. A run aborted by an error stops mid-sequence and never
/// delivers `on_run_end`.
pub trait MappingObserver {
    fn on_assignment(&mut self, assignment: &Assignment<'_>);

    fn on_run_start(&mut self, _context: &EvaluationContext) {}

    fn on_point_start(&mut self, _point: usize) {}

    fn on_point_end(&mut self, _point: usize) {}

    fn on_run_end(&mut self) {}
}

/// Keeps every assignment in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    pub records: Vec<AssignmentRecord>,
    /// Points that were fully evaluated.
    pub completed_points: Vec<usize>,
    pub finished: bool,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records observed at `point`.
    pub fn at_point(&self, point: usize) -> impl Iterator<Item = &AssignmentRecord> {
        self.records.iter().filter(move |r| r.point == point)
    }

    /// Value assigned to `(equipment_id, variable)` at `point`, if any.
    pub fn value(&self, point: usize, equipment_id: &str, variable: EquipmentVariable) -> Option<f64> {
        self.at_point(point)
            .find(|r| r.equipment_id == equipment_id && r.variable == variable)
            .map(|r| r.value)
    }
}

impl MappingObserver for RecordingObserver {
    fn on_assignment(&mut self, assignment: &Assignment<'_>) {
        self.records.push(assignment.to_record());
    }

    fn on_run_start(&mut self, _context: &EvaluationContext) {
        self.records.clear();
        self.completed_points.clear();
        self.finished = false;
    }

    fn on_point_end(&mut self, point: usize) {
        self.completed_points.push(point);
    }

    fn on_run_end(&mut self) {
        self.finished = true;
    }
}
