use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use chrono::Duration;
use tracing::{info, warn};

use crate::{
    error::AppError,
    scoring::{Aggregation, ScoringConfig, Suppression},
    window::Window,
};

pub struct Config {
    pub port: u16,
    pub bank_path: PathBuf,
    pub bank_url: Option<String>,
    pub data_dir: PathBuf,
    pub fav_cooldown: Duration,
    pub scoring: ScoringConfig,
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        let debug_window: bool = try_load("FAV_DEBUG_WINDOW", "false")?;
        let suppression = Suppression::new(
            try_load("FAV_SUPPRESSION_FLOOR", "0.6")?,
            try_load("FAV_SUPPRESSION_HORIZON", "8")?,
        )
        .ok_or_else(|| {
            AppError::Config("suppression floor must be in (0, 1) and horizon positive".into())
        })?;

        Ok(Self {
            port: try_load("RUST_PORT", "1111")?,
            bank_path: try_load("BANK_PATH", "../bank.bin")?,
            bank_url: var("BANK_URL").ok(),
            data_dir: try_load("DATA_DIR", "data/processed")?,
            fav_cooldown: Duration::seconds(i64::from(try_load::<u32>(
                "FAV_COOLDOWN_SECS",
                "30",
            )?)),
            scoring: ScoringConfig {
                aggregation: try_load::<Aggregation>("FAV_AGGREGATION", "ever_favved")?,
                window: if debug_window {
                    Window::PreviousHour
                } else {
                    Window::PreviousWeek
                },
                suppression,
            },
        })
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        info!("Environment variable {key} not set");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, AppError>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    parse(key, &raw)
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T, AppError>
where
    T::Err: Display,
{
    raw.trim().parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        AppError::Config(format!("{key}: {e}"))
    })
}
