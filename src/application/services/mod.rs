//! Application services.

pub mod provision;
