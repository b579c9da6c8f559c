//! Test utilities for Intake services.
//!
//! Provides mock gateway identity headers and a multipart body builder.
//! Use from dev-dependencies only; never in production code.

pub mod auth;
pub mod multipart;
