//! Domain types shared across Intake services.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers; never in `infra/` or `handlers/`.

pub mod id;
pub mod lead;
pub mod pagination;
pub mod role;
