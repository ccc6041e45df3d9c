pub mod assistant;
pub mod booking_desk;
pub mod inbox;
pub mod input;
pub mod orchestrator;
pub mod prompts;
pub mod reconciler;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use assistant::TripSearchAssistant;
pub use booking_desk::{BookingDesk, BookingRequest};
pub use inbox::{EmailInbox, EmailNotice, NoticeQuery};
pub use input::TripInput;
pub use orchestrator::ComponentOrchestrator;
pub use prompts::PromptPlanner;
pub use reconciler::TripReconciler;
