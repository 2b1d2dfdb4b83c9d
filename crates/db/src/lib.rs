pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;
pub mod service_desk;

pub use connection::{connect, connect_with_config, connect_with_settings, DbPool};
pub use fixtures::{seed_dummy_data, seed_knowledge, SeedSummary};
pub use repositories::RepositoryError;
pub use service_desk::SqlServiceDesk;
