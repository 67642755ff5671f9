use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveTime;
use chrono_tz::Tz;
use dotenvy::dotenv;

use crate::engine::policy::Policy;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    /// Zone every attendance date and cutoff is evaluated in
    pub timezone: Tz,
    pub policy: Policy,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("{key}: invalid value '{raw}': {e}"))
}

fn time_of_day(key: &str, default: &str) -> Result<NaiveTime> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    parse_time(&raw).with_context(|| format!("{key}: invalid time '{raw}', expected HH:MM[:SS]"))
}

fn parse_time(raw: &str) -> Result<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(Into::into)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let absent_cutoff = match env::var("ABSENT_CUTOFF") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                parse_time(&raw)
                    .with_context(|| format!("ABSENT_CUTOFF: invalid time '{raw}'"))?,
            ),
            _ => None,
        };

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,

            rate_protected_per_min: parsed("RATE_PROTECTED_PER_MIN", "1000")?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            timezone: parsed("ATTENDANCE_TZ", "Asia/Kolkata")?,
            policy: Policy {
                reporting_time: time_of_day("REPORTING_TIME", "09:30:00")?,
                half_day_cutoff: time_of_day("HALF_DAY_CUTOFF", "13:30:00")?,
                absent_cutoff,
                break_limit_minutes: parsed("BREAK_LIMIT_MINUTES", "30")?,
                lunch_limit_minutes: parsed("LUNCH_LIMIT_MINUTES", "45")?,
            },
        })
    }

    #[cfg(test)]
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: String::new(),
            jwt_secret: jwt_secret.to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            rate_protected_per_min: 1000,
            api_prefix: "/api".to_string(),
            timezone: chrono_tz::Asia::Kolkata,
            policy: Policy::default(),
        }
    }
}
