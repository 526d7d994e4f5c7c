//! Core domain logic for the CareerPath orientation-testing platform.
//!
//! The hosted storage/auth provider sits behind the repository and
//! token-verifier traits; everything above those seams — scoring, learning
//! plans, authorization predicates, analytics rollups, and the HTTP routers —
//! lives here and is exercised against in-memory fakes in the test suites.

pub mod auth;
pub mod catalog;
pub mod community;
pub mod config;
pub mod error;
pub mod insights;
pub mod pagination;
pub mod progress;
pub mod telemetry;
