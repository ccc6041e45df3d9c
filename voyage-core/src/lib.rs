pub mod attempt;
pub mod booking;
pub mod dates;
pub mod email;
pub mod extract;
pub mod llm;
pub mod repository;
pub mod supplier;
pub mod trip;

pub use voyage_shared::TripField;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Upstream failure: {0}")]
    Upstream(String),
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Upstream(err.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
