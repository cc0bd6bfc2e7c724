//! Result type for best-effort operations.
//!
//! A best-effort operation never hands an error back through `?`. Its store
//! failure is logged, counted, and parked inside the [`Outcome`] next to the
//! neutral value (`false`, `0`, `None`) so callers that care can still look.

use crate::error::{CacheError, CacheResult};
use crate::metrics::record_failure;
use std::future::Future;
use tracing::error;

/// Value of a best-effort operation plus the failure it absorbed, if any.
#[derive(Debug)]
#[must_use]
pub struct Outcome<T> {
    value: T,
    error: Option<CacheError>,
}

impl<T> Outcome<T> {
    /// A completed operation.
    pub fn ok(value: T) -> Self {
        Self { value, error: None }
    }

    /// A failed operation carrying its neutral value.
    pub fn failed(neutral: T, error: CacheError) -> Self {
        Self {
            value: neutral,
            error: Some(error),
        }
    }

    /// Returns true if no failure was absorbed.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// The absorbed failure.
    pub fn error(&self) -> Option<&CacheError> {
        self.error.as_ref()
    }

    /// The result, or the neutral value after a failure.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Consume the outcome and return the result or neutral value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Turn the outcome back into a plain `Result`.
    pub fn into_result(self) -> CacheResult<T> {
        match self.error {
            None => Ok(self.value),
            Some(e) => Err(e),
        }
    }

    /// Map the carried value, keeping the failure.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            error: self.error,
        }
    }
}

impl<T: Copy> Outcome<T> {
    /// Copy out the result or neutral value.
    pub fn get(&self) -> T {
        self.value
    }
}

/// Run a store call, absorbing its failure.
///
/// On error the call is logged once at ERROR level with the operation name,
/// the rendered arguments and the error, the failure counter is bumped, and
/// `neutral` is returned. `args` is only evaluated on failure.
pub(crate) async fn best_effort<T, A, Fut>(
    operation: &'static str,
    args: A,
    neutral: T,
    call: Fut,
) -> Outcome<T>
where
    A: FnOnce() -> String,
    Fut: Future<Output = CacheResult<T>>,
{
    match call.await {
        Ok(value) => Outcome::ok(value),
        Err(e) => {
            error!(operation, args = %args(), error = %e, "Cache operation failed");
            record_failure(operation);
            Outcome::failed(neutral, e)
        }
    }
}
