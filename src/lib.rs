//! VDOS dashboard
//!
//! Operator control panel for the VDOS simulation service: keeps a local
//! session in sync with the remote engine by adaptive polling and turns
//! operator commands into simulation control calls.

pub mod api;
pub mod config;
pub mod console;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod persona;
pub mod version;

pub use error::{Error, Result};
