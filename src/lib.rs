//! Accommodation management backend for university members: listings with resolved
//! campus distances, reservations with temporal consistency checks, and stay-gated
//! ratings, exposed through a JSON HTTP API.

pub mod config;
pub mod error;
pub mod geo;
pub mod housing;
pub mod telemetry;
