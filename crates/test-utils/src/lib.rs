//! Shared test utilities for the groundwater surface workspace.
//!
//! Synthetic well fields and boundary polygons with predictable,
//! verifiable structure for use across the test suite.
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod generators;

pub use generators::*;
