pub mod models;
pub mod pii;
pub mod sse;

pub use models::components::{
    ButtonComponent, Component, ComponentResponse, ContextEvent, FlightOffer, InputType,
    PromptComponent,
};
pub use models::fields::TripField;
pub use sse::SseDecoder;
