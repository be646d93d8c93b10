//! Integration test crate for the folio settlement pipeline.
//!
//! This crate has no library code — it only contains integration tests
//! that exercise the full monthly settlement flow across the workspace
//! crates.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p folio-integration-tests
//! ```
