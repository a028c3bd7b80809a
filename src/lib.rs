pub mod completion_client;
pub mod configuration;
pub mod delivery;
pub mod domain;
pub mod email_client;
pub mod rate_limit;
pub mod render;
pub mod repository;
pub mod routes;
pub mod scheduler;
pub mod scraper;
pub mod startup;
pub mod telemetry;
pub mod token;
pub mod utils;

pub use utils::*;
