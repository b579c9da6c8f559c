//! Authorization types shared across Intake services.
//!
//! Credential handling lives in the gateway; services only read the identity
//! it injects through the `IdentityHeaders` extractor.

pub mod identity;
