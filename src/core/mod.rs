pub mod batch;
pub mod config;
pub mod db;
pub mod http;

pub use batch::{BatchReport, ItemOutcome};
pub use config::AppConfig;
