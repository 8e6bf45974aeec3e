//! Aggregate statistics of a mapping run.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::mapping::{Assignment, EvaluationContext, EvaluationMode, MappingObserver};
use crate::network::EquipmentVariable;

/// Per-series totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeriesStats {
    /// Number of assignments fed by the series.
    pub assignments: usize,
    /// Sum of finite assigned values.
    pub total: f64,
}

/// Run summary built incrementally as an observer.
///
/// Only `points_completed` and `finished` tell a truncated run apart from a
/// complete one.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MappingSummary {
    pub mode: EvaluationMode,
    pub points_requested: usize,
    pub points_completed: usize,
    pub assignments: usize,
    pub limit_exempt: usize,
    /// Assignments reporting the network value of unmapped equipment.
    pub unmapped: usize,
    pub non_finite: usize,
    pub by_variable: BTreeMap<EquipmentVariable, usize>,
    pub by_series: BTreeMap<String, SeriesStats>,
    pub finished: bool,
}

impl MappingSummary {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MappingObserver for MappingSummary {
    fn on_run_start(&mut self, context: &EvaluationContext) {
        *self = Self {
            mode: context.mode(),
            points_requested: context.points().len(),
            ..Self::default()
        };
    }

    fn on_assignment(&mut self, a: &Assignment<'_>) {
        self.assignments += 1;
        if a.limit_exempt {
            self.limit_exempt += 1;
        }
        *self.by_variable.entry(a.variable).or_default() += 1;
        if !a.value.is_finite() {
            self.non_finite += 1;
        }

        if a.series.is_empty() {
            self.unmapped += 1;
            return;
        }
        let stats = self.by_series.entry(a.series.to_string()).or_default();
        stats.assignments += 1;
        if a.value.is_finite() {
            stats.total += a.value;
        }
    }

    fn on_point_end(&mut self, _point: usize) {
        self.points_completed += 1;
    }

    fn on_run_end(&mut self) {
        self.finished = true;
    }
}

impl fmt::Display for MappingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Mapping Summary ---")?;
        writeln!(
            f,
            "Points: {}/{} ({:?}){}",
            self.points_completed,
            self.points_requested,
            self.mode,
            if self.finished { "" } else { " [incomplete]" }
        )?;
        writeln!(f, "Assignments: {}", self.assignments)?;
        writeln!(f, "Limit-exempt: {}", self.limit_exempt)?;
        if self.unmapped > 0 {
            writeln!(f, "Unmapped (network values): {}", self.unmapped)?;
        }
        writeln!(f, "Non-finite values: {}", self.non_finite)?;
        for (variable, count) in &self.by_variable {
            writeln!(f, "  {variable:<24} {count:>8}")?;
        }
        for (series, stats) in &self.by_series {
            writeln!(
                f,
                "  series {series:<17} {:>8} total={:.3}",
                stats.assignments, stats.total
            )?;
        }
        Ok(())
    }
}
