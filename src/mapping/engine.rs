//! Mapping evaluation engine that walks points and bindings and notifies observers.

use tracing::{debug, error, info};

use super::binding::{Binding, MappingModel};
use super::clock::PointClock;
use super::context::EvaluationContext;
use super::distribution::{DistributionResolver, series_value};
use super::error::EvaluationError;
use super::observer::{Assignment, MappingObserver};
use crate::network::{EquipmentKind, EquipmentVariable, Network};
use crate::timeseries::TimeSeriesStore;

/// Evaluates a [`MappingModel`] against a network and a time series store.
///
/// Holds shared borrows only, so one model and network can serve many runs,
/// including runs on different threads.
pub struct Mapper<'a, N: Network + ?Sized> {
    model: &'a MappingModel,
    network: &'a N,
}

impl<'a, N: Network + ?Sized> Mapper<'a, N> {
    /// Creates a mapper over a built model and the network it was checked against.
    pub fn new(model: &'a MappingModel, network: &'a N) -> Self {
        Self { model, network }
    }

    pub fn model(&self) -> &MappingModel {
        self.model
    }

    /// Runs the mapping over every point of `context`.
    ///
    /// Points are visited in ascending order and bindings in model order;
    /// each observer is notified, in slice order, once per equipment variable
    /// per point. A group's members are notified as one contiguous run at the
    /// position of its lexically smallest member, so a direct binding on an
    /// id between two members comes after the whole group.
    ///
    /// With [`EvaluationContext::report_unmapped`] set, every point ends with
    /// one assignment per equipment whose default variable is not bound,
    /// ordered by kind then id. These carry an empty series name, the
    /// network's current value and `limit_exempt = false`; equipment with no
    /// current value is skipped.
    ///
    /// # Errors
    ///
    /// Returns the first [`EvaluationError`] met. Notifications delivered
    /// before the failure stand; `on_run_end` is not sent.
    pub fn evaluate<S: TimeSeriesStore + ?Sized>(
        &self,
        store: &S,
        context: &EvaluationContext,
        observers: &mut [&mut dyn MappingObserver],
    ) -> Result<(), EvaluationError> {
        info!(
            points = context.points().len(),
            bindings = self.model.len(),
            mode = ?context.mode(),
            "mapping run starting"
        );

        for observer in observers.iter_mut() {
            observer.on_run_start(context);
        }

        let resolver = DistributionResolver::new(context.tolerance());
        let mut keys = Vec::new();
        let mut shares = Vec::new();
        let mut assignments = 0_usize;
        let exempt: Vec<bool> = self
            .model
            .bindings()
            .map(|b| self.model.is_limit_exempt(b.series()))
            .collect();
        let unmapped = if context.report_unmapped() {
            self.unmapped_values()
        } else {
            Vec::new()
        };

        let mut clock = PointClock::new(context.points());
        let outcome = clock.try_run(|point| {
            for observer in observers.iter_mut() {
                observer.on_point_start(point);
            }

            for (binding, &limit_exempt) in self.model.bindings().zip(exempt.iter()) {
                match binding {
                    Binding::Direct(direct) => {
                        let value = series_value(store, &direct.series, point)?;
                        let assignment = Assignment {
                            point,
                            series: &direct.series,
                            equipment_id: &direct.equipment_id,
                            kind: direct.kind,
                            variable: direct.variable,
                            value,
                            limit_exempt,
                        };
                        notify(observers, &assignment);
                        assignments += 1;
                    }
                    Binding::Group(group) => {
                        resolver.resolve(group, point, store, self.network, &mut keys, &mut shares)?;
                        for (member, &value) in group.members.iter().zip(shares.iter()) {
                            let assignment = Assignment {
                                point,
                                series: &group.series,
                                equipment_id: &member.equipment_id,
                                kind: group.kind,
                                variable: group.variable,
                                value,
                                limit_exempt,
                            };
                            notify(observers, &assignment);
                        }
                        assignments += group.members.len();
                    }
                }
            }

            for &(equipment_id, kind, variable, value) in &unmapped {
                let assignment = Assignment {
                    point,
                    series: "",
                    equipment_id,
                    kind,
                    variable,
                    value,
                    limit_exempt: false,
                };
                notify(observers, &assignment);
            }
            assignments += unmapped.len();

            for observer in observers.iter_mut() {
                observer.on_point_end(point);
            }
            Ok(())
        });

        if let Err(e) = outcome {
            error!(
                error = %e,
                points_done = clock.elapsed().saturating_sub(1),
                points_skipped = clock.remaining(),
                "mapping run aborted"
            );
            return Err(e);
        }

        for observer in observers.iter_mut() {
            observer.on_run_end();
        }
        info!(points = clock.elapsed(), assignments, "mapping run finished");
        Ok(())
    }

    /// Default-variable values of equipment no binding covers, ordered by
    /// kind then id.
    fn unmapped_values(&self) -> Vec<(&'a str, EquipmentKind, EquipmentVariable, f64)> {
        let network: &'a N = self.network;
        let mut values = Vec::new();
        for kind in EquipmentKind::ALL {
            let variable = kind.default_variable();
            for id in network.ids_of_kind(kind) {
                if self.model.resolve_binding(id, variable).is_some() {
                    continue;
                }
                match network.attribute(id, variable) {
                    Some(value) => values.push((id, kind, variable, value)),
                    None => debug!(equipment = id, %variable, "unmapped equipment has no current value"),
                }
            }
        }
        debug!(count = values.len(), "unmapped equipment reported");
        values
    }
}

fn notify(observers: &mut [&mut dyn MappingObserver], assignment: &Assignment<'_>) {
    if !assignment.value.is_finite() {
        debug!(
            point = assignment.point,
            equipment = assignment.equipment_id,
            value = assignment.value,
            "non-finite value forwarded"
        );
    } else if assignment.variable.is_discrete() && assignment.value.fract() != 0.0 {
        debug!(
            point = assignment.point,
            equipment = assignment.equipment_id,
            value = assignment.value,
            "fractional value forwarded for discrete variable"
        );
    }
    for observer in observers.iter_mut() {
        observer.on_assignment(assignment);
    }
}
