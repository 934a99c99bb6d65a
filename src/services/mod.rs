pub mod email_service;
pub mod geocoding;
pub mod token_sweeper;

pub use email_service::EmailService;
pub use geocoding::GeocodingClient;
pub use token_sweeper::start_token_sweeper;
