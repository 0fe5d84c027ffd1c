pub mod app_config;
pub mod artifact_repo;
pub mod database;
pub mod index_repo;
pub mod mail;
pub mod memory;
pub mod purchase_repo;
pub mod render_client;
pub mod upstream_client;

pub use database::{DatabaseError, DbClient};
pub use mail::LogMailer;
pub use memory::{InMemoryBookingStore, InMemoryReservationStore};
pub use render_client::HttpTicketRenderer;
pub use upstream_client::{HttpCoachApi, MockCoachApi};
