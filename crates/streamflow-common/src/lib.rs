//! Streamflow Common Library
//!
//! Functionality shared by the Streamflow workspace members. Today that is the
//! logging setup every binary installs at startup.

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogOutput};
