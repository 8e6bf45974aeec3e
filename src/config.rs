//! TOML-based study configuration and preset definitions.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::mapping::{
    DirectRule, EvaluationContext, EvaluationMode, GroupRule, KeySpec, MappingRules,
};
use crate::network::{Equipment, EquipmentKind, EquipmentVariable};
use crate::timeseries::DailyProfile;

/// Top-level study configuration parsed from TOML.
///
/// Every section is optional. Load with [`StudyConfig::from_toml_file`] or
/// pick a built-in study with [`StudyConfig::from_preset`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudyConfig {
    /// Points to evaluate and resolver settings.
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    /// Equipment declarations.
    #[serde(default)]
    pub network: NetworkConfig,
    /// Direct and group rules plus the ignore-limits set.
    #[serde(default)]
    pub mapping: MappingRules,
    /// Inline series, keyed by name.
    #[serde(default)]
    pub series: BTreeMap<String, Vec<f64>>,
    /// CSV file with one column per series, relative to the study file.
    #[serde(default)]
    pub series_csv: Option<PathBuf>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// Evaluation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvaluationConfig {
    /// Explicit point indices. When absent, every point of the shortest
    /// referenced series is evaluated.
    pub points: Option<Vec<usize>>,
    /// Key-sum magnitude at or below which a group splits equally.
    pub tolerance: f64,
    /// Forwarded to observers; does not change computed values.
    pub mode: EvaluationMode,
    /// Also report network values of equipment no rule maps.
    pub report_unmapped: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            points: None,
            tolerance: EvaluationContext::DEFAULT_TOLERANCE,
            mode: EvaluationMode::BaseCase,
            report_unmapped: false,
        }
    }
}

/// Network section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    pub equipment: Vec<Equipment>,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"evaluation.tolerance"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

const DEMO_POINTS: usize = 4;
const SYNTHETIC_POINTS_PER_DAY: usize = 24;
const SYNTHETIC_DAYS: usize = 2;
const SYNTHETIC_SEED: u64 = 42;

impl StudyConfig {
    /// Available preset names.
    pub const PRESETS: &[&str] = &["demo", "synthetic"];

    /// Small hand-written study: two wind generators sharing a series by
    /// capacity, a load, an HVDC line and a phase tap changer.
    pub fn demo() -> Self {
        let series = BTreeMap::from([
            ("wind".to_string(), vec![1000.0, 800.0, 0.0, 1200.0]),
            ("load_p".to_string(), vec![310.0, 295.5, 280.0, 330.25]),
            ("load_q".to_string(), vec![42.0, 40.0, 39.5, 45.0]),
            ("hvdc".to_string(), vec![-150.0, 0.0, 200.0, 10_000.0]),
            ("tap".to_string(), vec![12.0, 13.0, 13.0, 11.0]),
        ]);
        debug_assert!(series.values().all(|s| s.len() == DEMO_POINTS));

        Self {
            series,
            ..Self::demo_shape()
        }
    }

    /// Same network and rules as [`StudyConfig::demo`], fed by two days of
    /// seeded synthetic profiles.
    pub fn synthetic() -> Self {
        let len = SYNTHETIC_POINTS_PER_DAY * SYNTHETIC_DAYS;
        let ppd = SYNTHETIC_POINTS_PER_DAY;
        let profiles = [
            ("wind", DailyProfile::new(900.0, 400.0, 0.0, 60.0, ppd)),
            ("load_p", DailyProfile::new(300.0, 80.0, 1.2, 5.0, ppd)),
            ("load_q", DailyProfile::new(40.0, 8.0, 1.2, 1.0, ppd)),
            ("hvdc", DailyProfile::new(0.0, 250.0, 0.5, 10.0, ppd)),
            ("tap", DailyProfile::new(12.0, 2.0, 0.0, 0.0, ppd)),
        ];
        let series = profiles
            .iter()
            .zip(SYNTHETIC_SEED..)
            .map(|((name, profile), seed)| (name.to_string(), profile.generate(len, seed)))
            .collect();

        Self {
            series,
            ..Self::demo_shape()
        }
    }

    fn demo_shape() -> Self {
        use EquipmentVariable::*;

        let equipment = vec![
            Equipment::new("FSSV.O11_G", EquipmentKind::Generator)
                .with(MinP, 0.0)
                .with(MaxP, 500.0),
            Equipment::new("FSSV.O12_G", EquipmentKind::Generator)
                .with(MinP, 0.0)
                .with(MaxP, 1500.0),
            Equipment::new("FSSV.O11_L", EquipmentKind::Load)
                .with(P0, 300.0)
                .with(Q0, 40.0),
            Equipment::new("HVDC1", EquipmentKind::HvdcLine)
                .with(MinP, -1000.0)
                .with(MaxP, 1000.0),
            Equipment::new("PST1", EquipmentKind::PhaseTapChanger).with(CurrentTap, 12.0),
        ];

        let mapping = MappingRules {
            direct: vec![
                DirectRule::new("load_p", "FSSV.O11_L"),
                DirectRule::new("load_q", "FSSV.O11_L").variable(Q0),
                DirectRule::new("hvdc", "HVDC1"),
                DirectRule::new("tap", "PST1"),
            ],
            group: vec![
                GroupRule::new("wind", ["FSSV.O11_G", "FSSV.O12_G"]).key(KeySpec::Attribute(MaxP)),
            ],
            ignore_limits: ["wind".to_string(), "hvdc".to_string()].into(),
        };

        Self {
            network: NetworkConfig { equipment },
            mapping,
            ..Self::default()
        }
    }

    /// Loads a study from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "demo" => Ok(Self::demo()),
            "synthetic" => Ok(Self::synthetic()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a study from a TOML file. A relative `series_csv` is resolved
    /// against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        let mut cfg = Self::from_toml_str(&content)?;
        cfg.base_dir = path.parent().map(Path::to_path_buf);
        Ok(cfg)
    }

    /// Parses a study from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Location of the series CSV, if any.
    pub fn series_csv_path(&self) -> Option<PathBuf> {
        let path = self.series_csv.as_ref()?;
        match &self.base_dir {
            Some(dir) if path.is_relative() => Some(dir.join(path)),
            _ => Some(path.clone()),
        }
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid. Rule consistency
    /// against the network is checked later, when the mapping model is built.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let tol = self.evaluation.tolerance;
        if !tol.is_finite() || tol < 0.0 {
            errors.push(ConfigError::new(
                "evaluation.tolerance",
                format!("must be finite and >= 0, got {tol}"),
            ));
        }

        for (i, eq) in self.network.equipment.iter().enumerate() {
            if eq.id.trim().is_empty() {
                errors.push(ConfigError::new(
                    format!("network.equipment[{i}].id"),
                    "must not be empty",
                ));
            }
        }

        for (i, rule) in self.mapping.direct.iter().enumerate() {
            if rule.series.trim().is_empty() {
                errors.push(ConfigError::new(
                    format!("mapping.direct[{i}].series"),
                    "must not be empty",
                ));
            }
        }
        for (i, rule) in self.mapping.group.iter().enumerate() {
            if rule.series.trim().is_empty() {
                errors.push(ConfigError::new(
                    format!("mapping.group[{i}].series"),
                    "must not be empty",
                ));
            }
            if let KeySpec::Constant(keys) = &rule.distribution_key {
                for (id, k) in keys {
                    if !k.is_finite() {
                        errors.push(ConfigError::new(
                            format!("mapping.group[{i}].distribution_key.constant.{id}"),
                            format!("must be finite, got {k}"),
                        ));
                    }
                }
            }
        }

        for (name, values) in &self.series {
            if values.is_empty() {
                errors.push(ConfigError::new(
                    format!("series.{name}"),
                    "must contain at least one value",
                ));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_presets_are_valid() {
        for name in StudyConfig::PRESETS {
            let cfg = StudyConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn from_preset_unknown() {
        let e = StudyConfig::from_preset("nonexistent").unwrap_err();
        assert_eq!(e.field, "preset");
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn synthetic_is_reproducible() {
        let a = StudyConfig::synthetic();
        let b = StudyConfig::synthetic();
        assert_eq!(a.series, b.series);
        assert!(a.series.values().all(|s| s.len() == 48));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
series_csv = "data/series.csv"

[evaluation]
points = [0, 2, 1]
tolerance = 1e-6
mode = "with-contingencies"
report_unmapped = true

[[network.equipment]]
id = "G1"
kind = "generator"
attributes = { maxP = 500.0 }

[[network.equipment]]
id = "G2"
kind = "generator"
attributes = { maxP = 1500.0 }

[mapping]
ignore_limits = ["ts1"]

[[mapping.direct]]
series = "ts2"
equipment = "G1"
variable = "targetQ"

[[mapping.group]]
series = "ts1"
equipment = ["G2", "G1"]
distribution_key = { attribute = "maxP" }

[series]
ts1 = [1000.0, 500.0, 0.0]
"#;
        let cfg = StudyConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.evaluation.points, Some(vec![0, 2, 1]));
        assert_eq!(cfg.evaluation.mode, EvaluationMode::WithContingencies);
        assert!(cfg.evaluation.report_unmapped);
        assert_eq!(cfg.network.equipment.len(), 2);
        assert_eq!(cfg.mapping.direct[0].variable, Some(EquipmentVariable::TargetQ));
        assert_eq!(
            cfg.mapping.group[0].distribution_key,
            KeySpec::Attribute(EquipmentVariable::MaxP)
        );
        assert!(cfg.mapping.ignore_limits.contains("ts1"));
        assert_eq!(cfg.series["ts1"].len(), 3);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn constant_and_series_keys_parse() {
        let toml = r#"
[[mapping.group]]
series = "a"
equipment = ["G1", "G2"]
distribution_key = { constant = { G1 = 1.0, G2 = 3.0 } }

[[mapping.group]]
series = "b"
equipment = ["L1"]
distribution_key = { series = { L1 = "weights" } }

[[mapping.group]]
series = "c"
equipment = ["L2"]
distribution_key = "uniform"
"#;
        let cfg = StudyConfig::from_toml_str(toml).unwrap();
        assert!(matches!(&cfg.mapping.group[0].distribution_key, KeySpec::Constant(m) if m["G2"] == 3.0));
        assert!(matches!(&cfg.mapping.group[1].distribution_key, KeySpec::Series(m) if m["L1"] == "weights"));
        assert_eq!(cfg.mapping.group[2].distribution_key, KeySpec::Uniform);
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[evaluation]
tolerance = 1e-3
bogus_field = true
"#;
        assert!(StudyConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn unknown_variable_is_rejected_at_parse() {
        let toml = r#"
[[mapping.direct]]
series = "ts1"
equipment = "G1"
variable = "voltage"
"#;
        let e = StudyConfig::from_toml_str(toml).unwrap_err();
        assert_eq!(e.field, "toml");
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let cfg = StudyConfig::from_toml_str("[evaluation]\npoints = [3]\n").unwrap();
        assert_eq!(cfg.evaluation.tolerance, EvaluationContext::DEFAULT_TOLERANCE);
        assert_eq!(cfg.evaluation.mode, EvaluationMode::BaseCase);
        assert!(!cfg.evaluation.report_unmapped);
        assert!(cfg.mapping.direct.is_empty());
        assert!(cfg.series_csv_path().is_none());
    }

    #[test]
    fn validation_catches_negative_tolerance() {
        let mut cfg = StudyConfig::demo();
        cfg.evaluation.tolerance = -1.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "evaluation.tolerance"));
    }

    #[test]
    fn validation_catches_empty_series_and_nan_key() {
        let mut cfg = StudyConfig::demo();
        cfg.series.insert("empty".into(), Vec::new());
        cfg.mapping.group.push(
            GroupRule::new("x", ["A"]).key(KeySpec::Constant([("A".to_string(), f64::NAN)].into())),
        );
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"series.empty".to_string()));
        assert!(fields.iter().any(|f| f.ends_with("constant.A")));
    }

    #[test]
    fn series_csv_resolves_against_file_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("study.toml");
        fs::write(&path, "series_csv = \"series.csv\"\n").unwrap();

        let cfg = StudyConfig::from_toml_file(&path).unwrap();
        assert_eq!(cfg.series_csv_path(), Some(dir.path().join("series.csv")));
    }

    #[test]
    fn missing_file_reports_path() {
        let e = StudyConfig::from_toml_file(Path::new("/nonexistent/study.toml")).unwrap_err();
        assert_eq!(e.field, "config");
        assert!(e.message.contains("study.toml"));
    }
}
