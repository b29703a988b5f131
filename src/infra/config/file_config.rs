use serde::Deserialize;

use crate::infra::config::{AppConfig, HistoryConfig, LogConfig, ProfileConfig};

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub logging: Option<FileLogConfig>,
    pub profile: Option<FileProfileConfig>,
    pub history: Option<FileHistoryConfig>,
}

impl FileConfig {
    pub fn merge_into(self, config: &mut AppConfig) {
        if let Some(logging) = self.logging {
            logging.merge_into(&mut config.logging);
        }

        if let Some(profile) = self.profile {
            profile.merge_into(&mut config.profile);
        }

        if let Some(history) = self.history {
            history.merge_into(&mut config.history);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileLogConfig {
    pub level: Option<String>,
}

impl FileLogConfig {
    fn merge_into(self, config: &mut LogConfig) {
        if let Some(level) = self.level {
            config.level = level;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileProfileConfig {
    pub display_name: Option<String>,
}

impl FileProfileConfig {
    fn merge_into(self, config: &mut ProfileConfig) {
        if let Some(display_name) = self.display_name {
            config.display_name = display_name;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileHistoryConfig {
    pub page_size: Option<usize>,
}

impl FileHistoryConfig {
    fn merge_into(self, config: &mut HistoryConfig) {
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
    }
}
