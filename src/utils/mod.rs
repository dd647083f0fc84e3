//! The `utils` module provides a collection of utility functions and common
//! definitions used across the `chathub` application.
//!
//! It centralizes the error types shared by the hub, the client actors and the
//! listeners, and the logging setup used by the binary and the tests.

pub mod error;
pub mod logging;
