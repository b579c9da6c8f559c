//! Service plumbing shared by Intake services: error bodies, health probes,
//! request ids, tracing setup, and serde helpers.

pub mod error;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
