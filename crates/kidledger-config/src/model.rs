use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const APP_DIR: &str = "kidledger";
const DATABASE_FILE: &str = "kidledger.db";

/// Stores engine settings. Every field has a default so partial files load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional SQLite file location. Defaults to `<data dir>/kidledger/kidledger.db`.
    pub database_path: Option<PathBuf>,
    #[serde(default = "Config::default_log_filter")]
    pub log_filter: String,
    /// IANA name applied to reminder settings created without one.
    #[serde(default = "Config::default_timezone_value")]
    pub default_timezone: String,
    #[serde(default)]
    pub entries: EntrySettings,
    #[serde(default)]
    pub reminders: ReminderLinkSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            log_filter: Self::default_log_filter(),
            default_timezone: Self::default_timezone_value(),
            entries: EntrySettings::default(),
            reminders: ReminderLinkSettings::default(),
        }
    }
}

impl Config {
    pub fn default_log_filter() -> String {
        "kidledger=info".into()
    }

    pub fn default_timezone_value() -> String {
        "UTC".into()
    }

    pub fn resolve_database_path(&self) -> PathBuf {
        if let Some(path) = &self.database_path {
            return path.clone();
        }

        let base = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join(APP_DIR).join(DATABASE_FILE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySettings {
    /// Approve chore entries a kid logs for themselves without guardian review.
    #[serde(default = "EntrySettings::default_auto_approve")]
    pub auto_approve_kid_entries: bool,
}

impl EntrySettings {
    fn default_auto_approve() -> bool {
        true
    }
}

impl Default for EntrySettings {
    fn default() -> Self {
        Self {
            auto_approve_kid_entries: Self::default_auto_approve(),
        }
    }
}

/// Links opened from reminder notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderLinkSettings {
    #[serde(default = "ReminderLinkSettings::default_daily_jobs_link")]
    pub daily_jobs_link: String,
    #[serde(default = "ReminderLinkSettings::default_habits_link")]
    pub habits_link: String,
}

impl ReminderLinkSettings {
    fn default_daily_jobs_link() -> String {
        "/kids/jobs".into()
    }

    fn default_habits_link() -> String {
        "/kids/habits".into()
    }
}

impl Default for ReminderLinkSettings {
    fn default() -> Self {
        Self {
            daily_jobs_link: Self::default_daily_jobs_link(),
            habits_link: Self::default_habits_link(),
        }
    }
}
