//! Time-series to equipment mapping for power network studies.
//!
//! A [`mapping::MappingModel`] binds named time series to equipment
//! variables, either one-to-one or distributed across a group by a key.
//! The [`mapping::Mapper`] evaluates those bindings at a set of points and
//! pushes every computed value to registered [`mapping::MappingObserver`]s.

pub mod config;
pub mod io;
pub mod mapping;
pub mod network;
pub mod report;
pub mod runner;
pub mod timeseries;
