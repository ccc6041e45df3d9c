pub mod amadeus;
pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod email_repo;
pub mod memory;
pub mod openai;
pub mod trip_repo;
pub mod unsplash;

pub use amadeus::AmadeusClient;
pub use app_config::Config;
pub use booking_repo::StoreBookingRepository;
pub use database::DbClient;
pub use email_repo::StoreEmailRepository;
pub use openai::OpenAiClient;
pub use trip_repo::StoreTripRepository;
pub use unsplash::UnsplashClient;
