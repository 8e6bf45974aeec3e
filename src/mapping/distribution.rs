//! Per-point distribution of a group's series value across its members.

use tracing::debug;

use super::binding::{GroupBinding, KeySource};
use super::error::EvaluationError;
use crate::network::Network;
use crate::timeseries::{StoreError, TimeSeriesStore};

/// How a group value was split at one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    /// `V * k_i / K`.
    Proportional,
    /// Keys summed to zero within tolerance: `V / n`.
    Equal,
}

/// Computes member shares for group bindings.
///
/// Keys are used as given: a negative key yields a share of opposite sign
/// to the group value.
#[derive(Debug, Clone, Copy)]
pub struct DistributionResolver {
    tolerance: f64,
}

impl DistributionResolver {
    /// Creates a resolver treating `|K| <= tolerance` as a zero key sum.
    /// A NaN tolerance is read as 0.
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance: if tolerance.is_nan() { 0.0 } else { tolerance.abs() },
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Splits `value` according to `keys`, writing one share per key into `shares`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ts_mapper::mapping::{DistributionResolver, Split};
    ///
    /// let resolver = DistributionResolver::new(1e-9);
    /// let mut shares = Vec::new();
    /// assert_eq!(resolver.split(1000.0, &[500.0, 1500.0], &mut shares), Split::Proportional);
    /// assert_eq!(shares, vec![250.0, 750.0]);
    ///
    /// assert_eq!(resolver.split(1000.0, &[0.0, 0.0], &mut shares), Split::Equal);
    /// assert_eq!(shares, vec![500.0, 500.0]);
    /// ```
    pub fn split(&self, value: f64, keys: &[f64], shares: &mut Vec<f64>) -> Split {
        shares.clear();
        if keys.is_empty() {
            return Split::Equal;
        }

        let key_sum: f64 = keys.iter().sum();
        // NaN key sums fall through to the proportional branch and propagate.
        if key_sum.abs() <= self.tolerance {
            let share = value / keys.len() as f64;
            shares.extend(std::iter::repeat_n(share, keys.len()));
            Split::Equal
        } else {
            shares.extend(keys.iter().map(|k| value * k / key_sum));
            Split::Proportional
        }
    }

    /// Resolves the shares of `group` at `point`.
    ///
    /// `keys` and `shares` are scratch buffers reused across calls; on
    /// success `shares[i]` is the value of `group.members[i]`.
    ///
    /// # Errors
    ///
    /// * [`EvaluationError::UnresolvedSeries`] if the group series is missing
    /// * [`EvaluationError::MissingKeySource`] if a member's key cannot be read
    /// * [`EvaluationError::PointOutOfRange`] if a series is too short
    pub fn resolve<S, N>(
        &self,
        group: &GroupBinding,
        point: usize,
        store: &S,
        network: &N,
        keys: &mut Vec<f64>,
        shares: &mut Vec<f64>,
    ) -> Result<Split, EvaluationError>
    where
        S: TimeSeriesStore + ?Sized,
        N: Network + ?Sized,
    {
        let value = series_value(store, &group.series, point)?;

        keys.clear();
        for member in &group.members {
            keys.push(key_value(member.key.as_ref(), &member.equipment_id, point, store, network)?);
        }

        let split = self.split(value, keys, shares);
        if split == Split::Equal {
            debug!(
                series = %group.series,
                point,
                members = group.members.len(),
                "distribution keys sum to zero, splitting equally"
            );
        }
        Ok(split)
    }
}

/// Reads a source series value, mapping store failures to evaluation errors.
pub(crate) fn series_value<S: TimeSeriesStore + ?Sized>(
    store: &S,
    series: &str,
    point: usize,
) -> Result<f64, EvaluationError> {
    store.value_at(series, point).map_err(|e| match e {
        StoreError::PointOutOfRange { name, point, len } => EvaluationError::PointOutOfRange {
            series: name,
            point,
            len,
        },
        _ => EvaluationError::UnresolvedSeries {
            series: series.to_string(),
            point,
        },
    })
}

fn key_value<S, N>(
    key: Option<&KeySource>,
    equipment_id: &str,
    point: usize,
    store: &S,
    network: &N,
) -> Result<f64, EvaluationError>
where
    S: TimeSeriesStore + ?Sized,
    N: Network + ?Sized,
{
    let missing = |what: String| EvaluationError::MissingKeySource {
        equipment: equipment_id.to_string(),
        key: what,
        point,
    };

    let Some(source) = key else {
        return Err(missing("<none>".to_string()));
    };

    match source {
        KeySource::Constant(v) => Ok(*v),
        KeySource::Attribute(var) => network
            .attribute(equipment_id, *var)
            .ok_or_else(|| missing(source.describe())),
        KeySource::Series(name) => match store.value_at(name, point) {
            Ok(v) => Ok(v),
            Err(StoreError::PointOutOfRange { name, point, len }) => {
                Err(EvaluationError::PointOutOfRange {
                    series: name,
                    point,
                    len,
                })
            }
            Err(_) => Err(missing(source.describe())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::binding::GroupMember;
    use crate::network::{Equipment, EquipmentKind, EquipmentVariable, InMemoryNetwork};
    use crate::timeseries::InMemoryStore;

    fn group(keys: Vec<Option<KeySource>>) -> GroupBinding {
        GroupBinding {
            series: "ts1".into(),
            kind: EquipmentKind::Generator,
            variable: EquipmentVariable::TargetP,
            members: keys
                .into_iter()
                .enumerate()
                .map(|(i, key)| GroupMember {
                    equipment_id: format!("G{}", i + 1),
                    key,
                })
                .collect(),
        }
    }

    fn network() -> InMemoryNetwork {
        InMemoryNetwork::from_equipment([
            Equipment::new("G1", EquipmentKind::Generator).with(EquipmentVariable::MaxP, 500.0),
            Equipment::new("G2", EquipmentKind::Generator).with(EquipmentVariable::MaxP, 1500.0),
        ])
        .unwrap()
    }

    fn store() -> InMemoryStore {
        let mut s = InMemoryStore::new();
        s.insert("ts1", vec![1000.0, 2000.0]).unwrap();
        s.insert("k1", vec![1.0, 0.0]).unwrap();
        s.insert("k2", vec![3.0, 0.0]).unwrap();
        s
    }

    #[test]
    fn proportional_split() {
        let mut shares = Vec::new();
        let split = DistributionResolver::new(1e-6).split(100.0, &[1.0, 3.0], &mut shares);
        assert_eq!(split, Split::Proportional);
        assert_eq!(shares, vec![25.0, 75.0]);
    }

    #[test]
    fn zero_keys_split_equally() {
        let mut shares = Vec::new();
        let split = DistributionResolver::new(1e-6).split(90.0, &[0.0, 0.0, 0.0], &mut shares);
        assert_eq!(split, Split::Equal);
        assert_eq!(shares, vec![30.0, 30.0, 30.0]);
    }

    #[test]
    fn tiny_key_sum_within_tolerance_is_zero() {
        let mut shares = Vec::new();
        let split = DistributionResolver::new(1e-3).split(10.0, &[1e-5, -2e-5], &mut shares);
        assert_eq!(split, Split::Equal);
        assert_eq!(shares, vec![5.0, 5.0]);
    }

    #[test]
    fn nan_tolerance_still_splits_zero_keys_equally() {
        let resolver = DistributionResolver::new(f64::NAN);
        assert_eq!(resolver.tolerance(), 0.0);

        let mut shares = Vec::new();
        assert_eq!(resolver.split(100.0, &[0.0, 0.0], &mut shares), Split::Equal);
        assert_eq!(shares, vec![50.0, 50.0]);
    }

    #[test]
    fn negative_key_gives_opposite_sign() {
        let mut shares = Vec::new();
        DistributionResolver::new(1e-6).split(100.0, &[-1.0, 3.0], &mut shares);
        assert_eq!(shares, vec![-50.0, 150.0]);
    }

    #[test]
    fn nan_key_propagates() {
        let mut shares = Vec::new();
        let split = DistributionResolver::new(1e-6).split(100.0, &[f64::NAN, 1.0], &mut shares);
        assert_eq!(split, Split::Proportional);
        assert!(shares.iter().all(|s| s.is_nan()));
    }

    #[test]
    fn resolves_attribute_keys() {
        let g = group(vec![
            Some(KeySource::Attribute(EquipmentVariable::MaxP)),
            Some(KeySource::Attribute(EquipmentVariable::MaxP)),
        ]);
        let (mut keys, mut shares) = (Vec::new(), Vec::new());
        DistributionResolver::new(1e-6)
            .resolve(&g, 0, &store(), &network(), &mut keys, &mut shares)
            .unwrap();
        assert_eq!(keys, vec![500.0, 1500.0]);
        assert_eq!(shares, vec![250.0, 750.0]);
    }

    #[test]
    fn series_keys_vary_per_point() {
        let g = group(vec![
            Some(KeySource::Series("k1".into())),
            Some(KeySource::Series("k2".into())),
        ]);
        let resolver = DistributionResolver::new(1e-6);
        let (mut keys, mut shares) = (Vec::new(), Vec::new());

        let split = resolver
            .resolve(&g, 0, &store(), &network(), &mut keys, &mut shares)
            .unwrap();
        assert_eq!(split, Split::Proportional);
        assert_eq!(shares, vec![250.0, 750.0]);

        let split = resolver
            .resolve(&g, 1, &store(), &network(), &mut keys, &mut shares)
            .unwrap();
        assert_eq!(split, Split::Equal);
        assert_eq!(shares, vec![1000.0, 1000.0]);
    }

    #[test]
    fn missing_attribute_key() {
        let g = group(vec![
            Some(KeySource::Attribute(EquipmentVariable::MinP)),
            Some(KeySource::Attribute(EquipmentVariable::MinP)),
        ]);
        let (mut keys, mut shares) = (Vec::new(), Vec::new());
        let err = DistributionResolver::new(1e-6)
            .resolve(&g, 0, &store(), &network(), &mut keys, &mut shares)
            .unwrap_err();
        assert!(matches!(err, EvaluationError::MissingKeySource { ref equipment, .. } if equipment == "G1"));
    }

    #[test]
    fn missing_key_series() {
        let g = group(vec![Some(KeySource::Series("nope".into()))]);
        let (mut keys, mut shares) = (Vec::new(), Vec::new());
        let err = DistributionResolver::new(1e-6)
            .resolve(&g, 0, &store(), &network(), &mut keys, &mut shares)
            .unwrap_err();
        assert!(matches!(err, EvaluationError::MissingKeySource { .. }));
    }

    #[test]
    fn unkeyed_member() {
        let g = group(vec![Some(KeySource::Constant(1.0)), None]);
        let (mut keys, mut shares) = (Vec::new(), Vec::new());
        let err = DistributionResolver::new(1e-6)
            .resolve(&g, 0, &store(), &network(), &mut keys, &mut shares)
            .unwrap_err();
        assert!(matches!(err, EvaluationError::MissingKeySource { ref equipment, .. } if equipment == "G2"));
    }

    #[test]
    fn missing_group_series() {
        let mut g = group(vec![Some(KeySource::Constant(1.0))]);
        g.series = "absent".into();
        let (mut keys, mut shares) = (Vec::new(), Vec::new());
        let err = DistributionResolver::new(1e-6)
            .resolve(&g, 0, &store(), &network(), &mut keys, &mut shares)
            .unwrap_err();
        assert_eq!(
            err,
            EvaluationError::UnresolvedSeries {
                series: "absent".into(),
                point: 0
            }
        );
    }
}
