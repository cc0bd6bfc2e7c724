//! # Tessera Core
//!
//! Core types shared by the Tessera crates: the unified error type,
//! result aliases and logging initialisation.

pub mod error;
pub mod result;
pub mod telemetry;

pub use error::*;
pub use result::*;
