//! Shared types and pricing math for the Peony Cafe admin panel
//!
//! This crate contains the pure recipe-pricing formulas, the wire types for
//! ingredient editing, and validation helpers used by the backend.

pub mod pricing;
pub mod types;
pub mod validation;

pub use pricing::*;
pub use types::*;
pub use validation::*;
