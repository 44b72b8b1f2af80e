//! Domain types and pure functions — no IO, no imports from `crate::infra`,
//! `crate::commands`, or `crate::output`.

pub mod error;
pub mod plan;
pub mod remote;
pub mod report;
pub mod role;

pub use error::{ConnectError, InputError};
pub use plan::{FleetPlan, Target};
pub use report::{TargetOutcome, TargetReport};
pub use role::Role;
