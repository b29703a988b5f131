mod app_config;
mod file_config;
mod loader;

pub use app_config::{AppConfig, HistoryConfig, LogConfig, ProfileConfig};
pub use loader::load;
