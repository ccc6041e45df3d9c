use std::sync::Arc;

use voyage_core::llm::LanguageModel;
use voyage_core::repository::{BookingRepository, EmailRepository, TripRepository};
use voyage_core::supplier::{FlightSearchClient, PhotoSearch};
use voyage_planner::{BookingDesk, ComponentOrchestrator, EmailInbox, TripSearchAssistant};

/// Everything a handler may touch. Cloned per request; all members are shared.
#[derive(Clone)]
pub struct AppState {
    pub trips: Arc<dyn TripRepository>,
    pub orchestrator: Arc<ComponentOrchestrator>,
    pub inbox: Arc<EmailInbox>,
    pub booking_desk: Arc<BookingDesk>,
    pub assistant: Arc<TripSearchAssistant>,
}

/// External collaborators the state is wired from.
pub struct Services {
    pub trips: Arc<dyn TripRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub emails: Arc<dyn EmailRepository>,
    pub model: Arc<dyn LanguageModel>,
    pub flights: Arc<dyn FlightSearchClient>,
    pub photos: Arc<dyn PhotoSearch>,
}

impl AppState {
    pub fn new(services: Services) -> Self {
        let Services {
            trips,
            bookings,
            emails,
            model,
            flights,
            photos,
        } = services;

        Self {
            orchestrator: Arc::new(ComponentOrchestrator::new(trips.clone(), model.clone())),
            inbox: Arc::new(EmailInbox::new(emails, trips.clone(), model.clone())),
            booking_desk: Arc::new(BookingDesk::new(trips.clone(), bookings, photos)),
            assistant: Arc::new(TripSearchAssistant::new(model, flights)),
            trips,
        }
    }
}
