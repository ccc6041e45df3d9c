pub mod airports;
pub mod generator;
pub mod regions;

pub use airports::{resolve_airport, ResolvedAirport};
pub use generator::{FlightOfferGenerator, OfferError};
pub use regions::{Airline, Region};
