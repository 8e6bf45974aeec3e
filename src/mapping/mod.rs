//! Binding model, distribution and evaluation engine.

pub mod binding;
pub mod clock;
pub mod context;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod observer;

pub use binding::{
    Binding, DirectBinding, DirectRule, GroupBinding, GroupMember, GroupRule, KeySource, KeySpec,
    MappingModel, MappingRules,
};
pub use clock::PointClock;
pub use context::{EvaluationContext, EvaluationMode};
pub use distribution::{DistributionResolver, Split};
pub use engine::Mapper;
pub use error::{BindingError, EvaluationError};
pub use observer::{Assignment, AssignmentRecord, MappingObserver, RecordingObserver};
