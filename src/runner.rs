//! Study assembly: turns a [`StudyConfig`] into a network, a series store and
//! a mapping model, then runs the engine with a [`MappingSummary`] attached.

use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ConfigError, StudyConfig};
use crate::mapping::{
    BindingError, EvaluationContext, EvaluationError, Mapper, MappingModel, MappingObserver,
};
use crate::network::{InMemoryNetwork, NetworkError};
use crate::report::MappingSummary;
use crate::timeseries::{InMemoryStore, StoreError};

/// Any failure between reading a study and finishing its run.
#[derive(Debug, Error)]
pub enum StudyError {
    #[error("invalid configuration ({} error(s)); first: {}", .0.len(), first_message(.0))]
    Config(Vec<ConfigError>),

    #[error("network: {0}")]
    Network(#[from] NetworkError),

    #[error("time series: {0}")]
    Store(#[from] StoreError),

    #[error("mapping: {0}")]
    Binding(#[from] BindingError),

    #[error("evaluation: {0}")]
    Evaluation(#[from] EvaluationError),
}

fn first_message(errors: &[ConfigError]) -> String {
    errors.first().map(ToString::to_string).unwrap_or_default()
}

/// A validated study, ready to run any number of times.
#[derive(Debug)]
pub struct Study {
    pub network: InMemoryNetwork,
    pub store: InMemoryStore,
    pub model: MappingModel,
    pub context: EvaluationContext,
}

impl Study {
    /// Validates `config` and builds every runtime structure it describes.
    ///
    /// # Errors
    ///
    /// Returns [`StudyError::Config`] with every validation failure, or the
    /// first network, store or binding error met.
    pub fn prepare(config: &StudyConfig) -> Result<Self, StudyError> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(StudyError::Config(errors));
        }

        let network = InMemoryNetwork::from_equipment(config.network.equipment.iter().cloned())?;

        let mut store = match config.series_csv_path() {
            Some(path) => InMemoryStore::from_csv_path(&path)?,
            None => InMemoryStore::new(),
        };
        for (name, values) in &config.series {
            store.insert(name.clone(), values.clone())?;
        }

        let model = MappingModel::build(&config.mapping, &network)?;

        let points = match &config.evaluation.points {
            Some(points) => points.clone(),
            None => (0..default_point_count(&model, &store)).collect(),
        };
        let context = EvaluationContext::new(points)
            .with_tolerance(config.evaluation.tolerance)
            .with_mode(config.evaluation.mode)
            .with_unmapped(config.evaluation.report_unmapped);

        info!(
            equipment = network.len(),
            series = store.len(),
            bindings = model.len(),
            points = context.points().len(),
            "study prepared"
        );

        Ok(Self {
            network,
            store,
            model,
            context,
        })
    }

    /// Runs the mapping once. `extra` observers are notified after the
    /// summary, in slice order.
    ///
    /// # Errors
    ///
    /// Returns [`StudyError::Evaluation`] if the run aborts.
    pub fn run(&self, extra: &mut [&mut dyn MappingObserver]) -> Result<MappingSummary, StudyError> {
        let mut summary = MappingSummary::new();
        let mut observers: Vec<&mut dyn MappingObserver> = Vec::with_capacity(extra.len() + 1);
        observers.push(&mut summary);
        for observer in extra.iter_mut() {
            observers.push(&mut **observer);
        }

        Mapper::new(&self.model, &self.network).evaluate(&self.store, &self.context, &mut observers)?;
        drop(observers);
        Ok(summary)
    }
}

/// Length of the shortest referenced series present in `store`.
fn default_point_count(model: &MappingModel, store: &InMemoryStore) -> usize {
    let referenced = model.referenced_series();
    let missing: Vec<&str> = referenced
        .iter()
        .copied()
        .filter(|name| store.len_of(name).is_none())
        .collect();
    if !missing.is_empty() {
        warn!(?missing, "referenced series absent from the store");
    }
    referenced
        .iter()
        .filter_map(|name| store.len_of(name))
        .min()
        .unwrap_or(0)
}

/// Prepares and runs `config` in one go.
///
/// # Errors
///
/// See [`Study::prepare`] and [`Study::run`].
pub fn run_study(
    config: &StudyConfig,
    extra: &mut [&mut dyn MappingObserver],
) -> Result<MappingSummary, StudyError> {
    Study::prepare(config)?.run(extra)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{DirectRule, RecordingObserver};
    use crate::network::EquipmentVariable;

    #[test]
    fn demo_runs_to_completion() {
        let summary = run_study(&StudyConfig::demo(), &mut []).unwrap();
        assert!(summary.finished);
        assert_eq!(summary.points_requested, 4);
        assert_eq!(summary.points_completed, 4);
        // 2 wind members + 4 direct bindings per point
        assert_eq!(summary.assignments, 24);
        // wind and hvdc are exempt: 3 per point
        assert_eq!(summary.limit_exempt, 12);
    }

    #[test]
    fn demo_wind_is_split_by_capacity() {
        let mut rec = RecordingObserver::new();
        run_study(&StudyConfig::demo(), &mut [&mut rec]).unwrap();
        assert_eq!(rec.value(0, "FSSV.O11_G", EquipmentVariable::TargetP), Some(250.0));
        assert_eq!(rec.value(0, "FSSV.O12_G", EquipmentVariable::TargetP), Some(750.0));
        assert_eq!(rec.value(3, "HVDC1", EquipmentVariable::ActivePowerSetpoint), Some(10_000.0));
        assert_eq!(rec.value(1, "PST1", EquipmentVariable::CurrentTap), Some(13.0));
    }

    #[test]
    fn invalid_config_collects_errors() {
        let mut cfg = StudyConfig::demo();
        cfg.evaluation.tolerance = f64::NAN;
        cfg.series.insert("empty".into(), Vec::new());
        match Study::prepare(&cfg) {
            Err(StudyError::Config(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected config errors, got {other:?}"),
        }
    }

    #[test]
    fn binding_errors_surface() {
        let mut cfg = StudyConfig::demo();
        cfg.mapping.direct.push(DirectRule::new("wind", "FSSV.O11_G"));
        assert!(matches!(
            Study::prepare(&cfg),
            Err(StudyError::Binding(BindingError::DuplicateBinding { .. }))
        ));
    }

    #[test]
    fn default_points_follow_shortest_series() {
        let mut cfg = StudyConfig::demo();
        cfg.series.insert("tap".into(), vec![1.0, 2.0]);
        let study = Study::prepare(&cfg).unwrap();
        assert_eq!(study.context.points().len(), 2);
    }

    #[test]
    fn missing_series_fails_evaluation() {
        let mut cfg = StudyConfig::demo();
        cfg.series.remove("tap");
        cfg.evaluation.points = Some(vec![0]);
        assert!(matches!(
            run_study(&cfg, &mut []),
            Err(StudyError::Evaluation(EvaluationError::UnresolvedSeries { .. }))
        ));
    }

    #[test]
    fn unmapped_reporting_follows_config() {
        let mut cfg = StudyConfig::demo();
        cfg.mapping.direct.retain(|r| r.equipment != "PST1");
        cfg.evaluation.report_unmapped = true;

        let mut rec = RecordingObserver::new();
        let summary = run_study(&cfg, &mut [&mut rec]).unwrap();
        assert_eq!(summary.unmapped, 4);
        assert_eq!(rec.value(2, "PST1", EquipmentVariable::CurrentTap), Some(12.0));
        assert!(rec.records.iter().filter(|r| r.series.is_empty()).all(|r| r.equipment_id == "PST1"));
    }

    #[test]
    fn study_can_run_twice() {
        let study = Study::prepare(&StudyConfig::synthetic()).unwrap();
        let a = study.run(&mut []).unwrap();
        let b = study.run(&mut []).unwrap();
        assert_eq!(a.assignments, b.assignments);
        assert_eq!(a.by_series["wind"].total, b.by_series["wind"].total);
    }
}
