//! Strata Testing Infrastructure
//!
//! Shared fixtures for tests across the workspace: call logs, recording and
//! terminal layers, callback capture, assertion macros and tracing setup.
//!
//! # Usage
//!
//! Add this to your crate's `Cargo.toml` dev-dependencies:
//! ```toml
//! [dev-dependencies]
//! strata-testkit = { path = "../strata-testkit" }
//! ```
//!
//! Then in your tests:
//! ```rust,no_run
//! use strata_testkit::*;
//!
//! #[test]
//! fn my_test() {
//!     init_test_tracing();
//!     let log = CallLog::new();
//!     let object = object_with_method("m", "a, cb");
//!     object.use_layer(recording_layer("outer", &["m"], &log));
//!     // ... test logic
//! }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(missing_docs)]

pub mod assertions;
pub mod capture;
pub mod layers;
pub mod log;
pub mod tracing_setup;

pub use capture::CapturedCallback;
pub use layers::*;
pub use log::{CallLog, ValueLog};
pub use tracing_setup::init_test_tracing;

// Re-exported for the assertion macros
pub use strata_core;
