use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Whether a run covers the base case only or also contingency states.
///
/// The engine forwards the mode to observers; it does not change how values
/// are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvaluationMode {
    #[default]
    BaseCase,
    WithContingencies,
}

/// Per-run evaluation state.
///
/// # Examples
///
/// ```
/// use ts_mapper::mapping::EvaluationContext;
///
/// let ctx = EvaluationContext::new([5, 2, 9, 2]);
/// assert_eq!(ctx.points().iter().copied().collect::<Vec<_>>(), vec![2, 5, 9]);
/// assert_eq!(ctx.tolerance(), EvaluationContext::DEFAULT_TOLERANCE);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationContext {
    points: BTreeSet<usize>,
    tolerance: f64,
    mode: EvaluationMode,
    report_unmapped: bool,
}

impl EvaluationContext {
    /// Tolerance below which a key sum counts as zero.
    pub const DEFAULT_TOLERANCE: f64 = 1e-4;

    /// Creates a context over `points`; duplicates collapse, order is ascending.
    pub fn new(points: impl IntoIterator<Item = usize>) -> Self {
        Self {
            points: points.into_iter().collect(),
            tolerance: Self::DEFAULT_TOLERANCE,
            mode: EvaluationMode::default(),
            report_unmapped: false,
        }
    }

    /// Sets the zero key-sum tolerance. Negative values count by magnitude;
    /// NaN is read as 0.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = if tolerance.is_nan() { 0.0 } else { tolerance.abs() };
        self
    }

    /// Also report, at every point, the current network value of each
    /// equipment whose default variable no binding covers. Such assignments
    /// carry an empty series name.
    pub fn with_unmapped(mut self, report_unmapped: bool) -> Self {
        self.report_unmapped = report_unmapped;
        self
    }

    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn points(&self) -> &BTreeSet<usize> {
        &self.points
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    pub fn report_unmapped(&self) -> bool {
        self.report_unmapped
    }
}
