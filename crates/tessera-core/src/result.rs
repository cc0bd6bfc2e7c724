//! Result type aliases for Tessera.

use crate::TesseraError;

/// A specialized `Result` type for Tessera operations.
pub type TesseraResult<T> = Result<T, TesseraError>;
