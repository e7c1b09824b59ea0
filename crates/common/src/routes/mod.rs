//! Operational endpoints mounted on every service.

pub mod health;
pub mod metrics;
