//! Best-effort steps.
//!
//! Several steps of a request (model calls, image lookup, the tool pass) must
//! not fail the request when they fail. They produce an [`AttemptResult`],
//! and [`settle`] turns it into an `Option` after logging the failure.

use std::fmt::Display;

use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestEffortFailure {
    pub context: &'static str,
    pub message: String,
}

pub type AttemptResult<T> = Result<T, BestEffortFailure>;

pub fn attempt<T, E: Display>(context: &'static str, result: Result<T, E>) -> AttemptResult<T> {
    result.map_err(|e| BestEffortFailure {
        context,
        message: e.to_string(),
    })
}

/// Log a failed attempt at `warn` and drop it.
pub fn settle<T>(result: AttemptResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(failure) => {
            warn!(context = failure.context, "Best-effort step failed: {}", failure.message);
            None
        }
    }
}

pub trait BestEffort<T> {
    fn best_effort(self, context: &'static str) -> Option<T>;
}

impl<T, E: Display> BestEffort<T> for Result<T, E> {
    fn best_effort(self, context: &'static str) -> Option<T> {
        settle(attempt(context, self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_keeps_context() {
        let failed: Result<i32, String> = Err("timeout".to_string());
        let result = attempt("image lookup", failed);
        assert_eq!(
            result,
            Err(BestEffortFailure {
                context: "image lookup",
                message: "timeout".to_string()
            })
        );
        assert_eq!(settle(result), None);
    }

    #[test]
    fn test_best_effort_passes_values_through() {
        let ok: Result<&str, String> = Ok("https://img");
        assert_eq!(ok.best_effort("image lookup"), Some("https://img"));
    }
}
