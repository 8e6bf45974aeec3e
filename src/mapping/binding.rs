//! Resolved equipment-to-series bindings.
//!
//! [`MappingRules`] is the fully resolved output of a mapping front-end:
//! concrete equipment ids, no filters. [`MappingModel::build`] checks it
//! against the network and freezes it into evaluation order.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use tracing::{debug, warn};

use super::error::BindingError;
use crate::network::{EquipmentKind, EquipmentVariable, Network};

/// Maps one series onto one equipment.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectRule {
    pub series: String,
    pub equipment: String,
    /// Defaults to the kind's default variable.
    #[serde(default)]
    pub variable: Option<EquipmentVariable>,
}

impl DirectRule {
    pub fn new(series: impl Into<String>, equipment: impl Into<String>) -> Self {
        Self {
            series: series.into(),
            equipment: equipment.into(),
            variable: None,
        }
    }

    pub fn variable(mut self, variable: EquipmentVariable) -> Self {
        self.variable = Some(variable);
        self
    }
}

/// How a group's value is weighted across its members.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySpec {
    /// Every member weighs 1.
    #[default]
    Uniform,
    /// Static network attribute of each member, e.g. `maxP`.
    Attribute(EquipmentVariable),
    /// Fixed weight per member id.
    Constant(BTreeMap<String, f64>),
    /// Key series name per member id, read at every point.
    Series(BTreeMap<String, String>),
}

/// Distributes one series across several equipment of the same kind.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupRule {
    pub series: String,
    pub equipment: Vec<String>,
    #[serde(default)]
    pub variable: Option<EquipmentVariable>,
    #[serde(default)]
    pub distribution_key: KeySpec,
}

impl GroupRule {
    pub fn new<I, S>(series: impl Into<String>, equipment: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            series: series.into(),
            equipment: equipment.into_iter().map(Into::into).collect(),
            variable: None,
            distribution_key: KeySpec::Uniform,
        }
    }

    pub fn variable(mut self, variable: EquipmentVariable) -> Self {
        self.variable = Some(variable);
        self
    }

    pub fn key(mut self, key: KeySpec) -> Self {
        self.distribution_key = key;
        self
    }
}

/// Resolved mapping configuration handed over by the front-end.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MappingRules {
    pub direct: Vec<DirectRule>,
    pub group: Vec<GroupRule>,
    /// Series whose assignments bypass equipment limit enforcement.
    pub ignore_limits: BTreeSet<String>,
}

/// Source of one group member's distribution key.
#[derive(Debug, Clone, PartialEq)]
pub enum KeySource {
    Constant(f64),
    Attribute(EquipmentVariable),
    Series(String),
}

impl KeySource {
    /// Short label for logs and errors.
    pub fn describe(&self) -> String {
        match self {
            KeySource::Constant(v) => format!("constant {v}"),
            KeySource::Attribute(var) => format!("attribute {var}"),
            KeySource::Series(name) => format!("series \"{name}\""),
        }
    }
}

/// One series feeding one equipment variable.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectBinding {
    pub series: String,
    pub equipment_id: String,
    pub kind: EquipmentKind,
    pub variable: EquipmentVariable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupMember {
    pub equipment_id: String,
    /// `None` when a per-member key map has no entry for this member.
    pub key: Option<KeySource>,
}

/// One series distributed across several equipment.
///
/// Members are sorted by id; the distribution itself does not depend on order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBinding {
    pub series: String,
    pub kind: EquipmentKind,
    pub variable: EquipmentVariable,
    pub members: Vec<GroupMember>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Direct(DirectBinding),
    Group(GroupBinding),
}

impl Binding {
    /// Name of the series feeding this binding.
    pub fn series(&self) -> &str {
        match self {
            Binding::Direct(d) => &d.series,
            Binding::Group(g) => &g.series,
        }
    }

    pub fn kind(&self) -> EquipmentKind {
        match self {
            Binding::Direct(d) => d.kind,
            Binding::Group(g) => g.kind,
        }
    }

    pub fn variable(&self) -> EquipmentVariable {
        match self {
            Binding::Direct(d) => d.variable,
            Binding::Group(g) => g.variable,
        }
    }

    /// Equipment ids covered by this binding, in evaluation order.
    pub fn equipment_ids(&self) -> impl Iterator<Item = &str> {
        let (single, members) = match self {
            Binding::Direct(d) => (Some(d.equipment_id.as_str()), &[][..]),
            Binding::Group(g) => (None, g.members.as_slice()),
        };
        single
            .into_iter()
            .chain(members.iter().map(|m| m.equipment_id.as_str()))
    }

    /// Evaluation order: kind, then lexical equipment id, then variable.
    fn order_key(&self) -> (EquipmentKind, &str, EquipmentVariable, &str) {
        let first_id = self.equipment_ids().next().unwrap_or("");
        (self.kind(), first_id, self.variable(), self.series())
    }
}

/// Immutable set of bindings, checked and sorted for evaluation.
#[derive(Debug, Clone, Default)]
pub struct MappingModel {
    bindings: Vec<Binding>,
    index: BTreeMap<String, BTreeMap<EquipmentVariable, usize>>,
    ignore_limits: BTreeSet<String>,
}

impl MappingModel {
    /// Checks `rules` against `network` and builds the model.
    ///
    /// # Errors
    ///
    /// * [`BindingError::UnknownEquipment`] for ids absent from the network
    /// * [`BindingError::UnsupportedVariable`] for variables (or attribute keys)
    ///   the equipment kind does not have
    /// * [`BindingError::EmptyGroup`] for a group with no members
    /// * [`BindingError::MixedGroupKinds`] for groups spanning several kinds
    /// * [`BindingError::DuplicateBinding`] when two rules target the same
    ///   equipment variable
    pub fn build<N: Network + ?Sized>(
        rules: &MappingRules,
        network: &N,
    ) -> Result<Self, BindingError> {
        let mut bindings = Vec::with_capacity(rules.direct.len() + rules.group.len());
        // (equipment, variable) -> series, in rule order
        let mut claimed: BTreeMap<(String, EquipmentVariable), String> = BTreeMap::new();

        for rule in &rules.direct {
            let kind = lookup_kind(network, &rule.equipment, &rule.series)?;
            let variable = rule.variable.unwrap_or(kind.default_variable());
            kind.check(&rule.equipment, variable)?;
            claim(&mut claimed, &rule.equipment, variable, &rule.series)?;
            bindings.push(Binding::Direct(DirectBinding {
                series: rule.series.clone(),
                equipment_id: rule.equipment.clone(),
                kind,
                variable,
            }));
        }

        for rule in &rules.group {
            bindings.push(Binding::Group(build_group(rule, network, &mut claimed)?));
        }

        bindings.sort_by(|a, b| a.order_key().cmp(&b.order_key()));

        let mut index: BTreeMap<String, BTreeMap<EquipmentVariable, usize>> = BTreeMap::new();
        for (i, binding) in bindings.iter().enumerate() {
            for id in binding.equipment_ids() {
                index
                    .entry(id.to_string())
                    .or_default()
                    .insert(binding.variable(), i);
            }
        }

        for name in &rules.ignore_limits {
            if !bindings.iter().any(|b| b.series() == name) {
                warn!(series = %name, "ignore-limits series is not mapped");
            }
        }

        debug!(
            bindings = bindings.len(),
            equipment = index.len(),
            ignore_limits = rules.ignore_limits.len(),
            "mapping model built"
        );

        Ok(Self {
            bindings,
            index,
            ignore_limits: rules.ignore_limits.clone(),
        })
    }

    /// Returns the binding covering `(equipment_id, variable)`, if any.
    pub fn resolve_binding(&self, equipment_id: &str, variable: EquipmentVariable) -> Option<&Binding> {
        self.index
            .get(equipment_id)
            .and_then(|vars| vars.get(&variable))
            .map(|&i| &self.bindings[i])
    }

    /// Iterates bindings in evaluation order.
    pub fn bindings(&self) -> impl ExactSizeIterator<Item = &Binding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn ignore_limits(&self) -> &BTreeSet<String> {
        &self.ignore_limits
    }

    /// Returns `true` when assignments from `series` skip limit enforcement.
    pub fn is_limit_exempt(&self, series: &str) -> bool {
        self.ignore_limits.contains(series)
    }

    /// Every series the model reads, source and key series alike.
    pub fn referenced_series(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        for binding in &self.bindings {
            names.insert(binding.series());
            if let Binding::Group(g) = binding {
                for m in &g.members {
                    if let Some(KeySource::Series(s)) = &m.key {
                        names.insert(s.as_str());
                    }
                }
            }
        }
        names
    }
}

fn lookup_kind<N: Network + ?Sized>(
    network: &N,
    equipment: &str,
    series: &str,
) -> Result<EquipmentKind, BindingError> {
    network
        .kind(equipment)
        .ok_or_else(|| BindingError::UnknownEquipment {
            equipment: equipment.to_string(),
            series: series.to_string(),
        })
}

fn claim(
    claimed: &mut BTreeMap<(String, EquipmentVariable), String>,
    equipment: &str,
    variable: EquipmentVariable,
    series: &str,
) -> Result<(), BindingError> {
    let key = (equipment.to_string(), variable);
    if let Some(first) = claimed.get(&key) {
        return Err(BindingError::DuplicateBinding {
            equipment: equipment.to_string(),
            variable,
            first: first.clone(),
            second: series.to_string(),
        });
    }
    claimed.insert(key, series.to_string());
    Ok(())
}

fn build_group<N: Network + ?Sized>(
    rule: &GroupRule,
    network: &N,
    claimed: &mut BTreeMap<(String, EquipmentVariable), String>,
) -> Result<GroupBinding, BindingError> {
    if rule.equipment.is_empty() {
        return Err(BindingError::EmptyGroup {
            series: rule.series.clone(),
        });
    }

    let mut ids = rule.equipment.clone();
    ids.sort();

    let kind = lookup_kind(network, &ids[0], &rule.series)?;
    let variable = rule.variable.unwrap_or(kind.default_variable());

    let mut members = Vec::with_capacity(ids.len());
    for id in ids {
        let member_kind = lookup_kind(network, &id, &rule.series)?;
        if member_kind != kind {
            return Err(BindingError::MixedGroupKinds {
                series: rule.series.clone(),
                first: kind,
                second: member_kind,
            });
        }
        kind.check(&id, variable)?;
        claim(claimed, &id, variable, &rule.series)?;

        let key = match &rule.distribution_key {
            KeySpec::Uniform => Some(KeySource::Constant(1.0)),
            KeySpec::Attribute(var) => {
                kind.check(&id, *var)?;
                Some(KeySource::Attribute(*var))
            }
            KeySpec::Constant(weights) => weights.get(&id).copied().map(KeySource::Constant),
            KeySpec::Series(names) => names.get(&id).cloned().map(KeySource::Series),
        };
        members.push(GroupMember {
            equipment_id: id,
            key,
        });
    }

    Ok(GroupBinding {
        series: rule.series.clone(),
        kind,
        variable,
        members,
    })
}
