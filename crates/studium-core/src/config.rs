use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

/// Deploy-time configuration, layered from `studium.toml` and `STUDIUM_*`
/// environment variables. Every value has a default, so an empty
/// environment yields a working setup. User preferences that change at
/// runtime live in the settings table instead.
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    /// Path of the SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Wall-clock hour at which a working day starts
    #[serde(default = "default_day_start")]
    pub day_start: u8,
    #[serde(default)]
    pub timer: TimerConfig,
}

/// Session clock defaults.
#[derive(Deserialize, Debug, Clone)]
pub struct TimerConfig {
    /// Length of a work round in seconds
    #[serde(default = "default_work_secs")]
    pub work_secs: u64,
    /// Length of a break round in seconds
    #[serde(default = "default_break_secs")]
    pub break_secs: u64,
    /// Length of a coffee round in seconds; zero counts up open-endedly
    #[serde(default)]
    pub coffee_secs: u64,
    /// Cadence the UI drives the clock at
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_secs: default_work_secs(),
            break_secs: default_break_secs(),
            coffee_secs: 0,
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            day_start: default_day_start(),
            timer: TimerConfig::default(),
        }
    }
}

fn default_database_path() -> String {
    "studium.db".to_string()
}

fn default_day_start() -> u8 {
    5
}

fn default_work_secs() -> u64 {
    1500
}

fn default_break_secs() -> u64 {
    300
}

fn default_tick_interval_ms() -> u64 {
    125
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("studium.toml"))
            .merge(Env::prefixed("STUDIUM_"))
            .extract()
    }
}
