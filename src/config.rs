use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_scan_per_min: u32,

    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            server_addr: env_or("SERVER_ADDR", "0.0.0.0:5000".to_string())?,
            api_prefix: env_or("API_PREFIX", "/api".to_string())?,
            rate_scan_per_min: env_or("RATE_SCAN_PER_MIN", 600)?,
            log_dir: env_or("LOG_DIR", "logs".to_string())?,
        })
    }
}

/// Settings for the badge kiosk. All fixed for the lifetime of the process.
#[derive(Clone, Debug)]
pub struct KioskConfig {
    pub serial_port: String,
    pub baud_rate: u32,
    pub api_url: String,
    pub api_timeout: Duration,
    pub debounce_window: Duration,
    pub reconnect_delay: Duration,
    pub ui_tick: Duration,
    pub display_hold: Duration,
    pub dispatch_workers: usize,
    pub queue_warn_depth: usize,
    pub log_dir: String,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            serial_port: "/dev/ttyRPMSG0".to_string(),
            baud_rate: 115_200,
            api_url: "http://127.0.0.1:5000/api/scan".to_string(),
            api_timeout: Duration::from_secs(5),
            debounce_window: Duration::from_secs(2),
            reconnect_delay: Duration::from_secs(5),
            ui_tick: Duration::from_millis(100),
            display_hold: Duration::from_secs(3),
            dispatch_workers: 8,
            queue_warn_depth: 64,
            log_dir: "logs".to_string(),
        }
    }
}

impl KioskConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        let d = Self::default();

        Ok(Self {
            serial_port: env_or("SERIAL_PORT", d.serial_port)?,
            baud_rate: env_or("BAUD_RATE", d.baud_rate)?,
            api_url: env_or("API_URL", d.api_url)?,
            api_timeout: Duration::from_secs(env_or("API_TIMEOUT_SECS", d.api_timeout.as_secs())?),
            debounce_window: Duration::from_millis(env_or(
                "DEBOUNCE_MS",
                d.debounce_window.as_millis() as u64,
            )?),
            reconnect_delay: Duration::from_secs(env_or(
                "RECONNECT_DELAY_SECS",
                d.reconnect_delay.as_secs(),
            )?),
            ui_tick: Duration::from_millis(env_or("UI_TICK_MS", d.ui_tick.as_millis() as u64)?),
            display_hold: Duration::from_secs(env_or(
                "DISPLAY_HOLD_SECS",
                d.display_hold.as_secs(),
            )?),
            dispatch_workers: env_or("DISPATCH_WORKERS", d.dispatch_workers)?.max(1),
            queue_warn_depth: env_or("QUEUE_WARN_DEPTH", d.queue_warn_depth)?,
            log_dir: env_or("LOG_DIR", d.log_dir)?,
        })
    }
}

/// Reads `key`, falling back to `default` when unset.
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => parse_var(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{key} has an invalid value: {raw:?}"))
}
