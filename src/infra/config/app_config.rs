use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub logging: LogConfig,
    pub profile: ProfileConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileConfig {
    /// Label shown for outgoing messages in search results.
    pub display_name: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            display_name: "You".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Newest-message window rendered by the `show` command.
    pub page_size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { page_size: 50 }
    }
}
