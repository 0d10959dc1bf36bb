use std::{fmt::Display, str::FromStr};

use anyhow::{Context, anyhow};
use chrono_tz::Tz;

pub const DEFAULT_OPEN_DATA_URL: &str = "https://data.ny.gov/resource/gxb3-akrn.json";

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Socrata endpoint of the MTA bus hourly ridership dataset
    pub open_data_url: String,
    pub open_data_limit: u32,
    /// Zone whose calendar hours the ridership is bucketed by
    pub timezone: Tz,
    pub log_dir: String,
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Reads the configuration from the environment (and `.env` if it was loaded).
    pub fn load() -> anyhow::Result<Self> {
        Ok(Config {
            database_url: var_or("DATABASE_URL", "postgres://localhost/ridership"),
            port: parse_var("PORT", 5000)?,
            open_data_url: var_or("OPEN_DATA_URL", DEFAULT_OPEN_DATA_URL),
            open_data_limit: parse_var("OPEN_DATA_LIMIT", 1000)?,
            timezone: parse_var("TIMEZONE", chrono_tz::America::New_York)?,
            log_dir: var_or("LOG_DIR", "./logs"),
            otlp_endpoint: dotenvy::var("OTLP_ENDPOINT")
                .ok()
                .filter(|e| !e.trim().is_empty()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "postgres://localhost/ridership".to_string(),
            port: 5000,
            open_data_url: DEFAULT_OPEN_DATA_URL.to_string(),
            open_data_limit: 1000,
            timezone: chrono_tz::America::New_York,
            log_dir: "./logs".to_string(),
            otlp_endpoint: None,
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    dotenvy::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    parse_value(key, dotenvy::var(key).ok(), default)
}

fn parse_value<T>(key: &str, raw: Option<String>, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("invalid value {raw:?} for {key}")),
        None => Ok(default),
    }
}
