use anyhow::{Context, Result};
use dotenvy::dotenv;
use hh_client::{Employment, Experience, Schedule, VacancyQuery, DEFAULT_ENDPOINT};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Published detail snapshot used when enrichment is bypassed.
pub const DEFAULT_CACHE_URL: &str =
    "https://drive.google.com/uc?export=view&id=1d2NfxfM2n48m5WS6oCCc3rcQ4hdnTQ1v";

/// Every day at 09:00.
pub const DEFAULT_SCHEDULE: &str = "0 0 9 * * *";

/// Harvester configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    pub user_agent: String,
    pub data_dir: PathBuf,
    pub cache_url: String,
    pub detail_delay: Duration,
    pub schedule: String,
    pub query: VacancyQuery,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let query = VacancyQuery::builder()
            .text(env::var("HARVEST_TEXT").unwrap_or_else(|_| "python".to_string()))
            .experience(optional_var::<Experience>("HARVEST_EXPERIENCE")?)
            .employment(optional_var::<Employment>("HARVEST_EMPLOYMENT")?)
            .schedule(optional_var::<Schedule>("HARVEST_SCHEDULE_TYPE")?)
            .per_page(
                env::var("HARVEST_PER_PAGE")
                    .unwrap_or_else(|_| "100".to_string())
                    .parse()
                    .context("HARVEST_PER_PAGE must be a valid number")?,
            )
            .period(
                env::var("HARVEST_PERIOD")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("HARVEST_PERIOD must be a valid number")?,
            )
            .build();
        query
            .validate()
            .context("HARVEST_PER_PAGE / HARVEST_PERIOD out of range")?;

        Ok(Self {
            endpoint: env::var("HH_VACANCIES_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            user_agent: env::var("HH_USER_AGENT")
                .unwrap_or_else(|_| "vacancy-harvester/0.1".to_string()),
            data_dir: env::var("HARVEST_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            cache_url: env::var("HARVEST_CACHE_URL")
                .unwrap_or_else(|_| DEFAULT_CACHE_URL.to_string()),
            detail_delay: Duration::from_millis(
                env::var("HARVEST_DETAIL_DELAY_MS")
                    .unwrap_or_else(|_| "200".to_string())
                    .parse()
                    .context("HARVEST_DETAIL_DELAY_MS must be a valid number")?,
            ),
            schedule: env::var("HARVEST_SCHEDULE")
                .unwrap_or_else(|_| DEFAULT_SCHEDULE.to_string()),
            query,
        })
    }
}

fn optional_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} has an unsupported value", name)),
        _ => Ok(None),
    }
}
