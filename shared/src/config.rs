//! Configuration management for the fixture sync Lambda.

use std::env;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::Duration;

use crate::{Error, Result};

pub const DEFAULT_FOOTBALL_BASE_URL: &str = "https://v3.football.api-sports.io";
pub const DEFAULT_FOOTBALL_HOST: &str = "v3.football.api-sports.io";
pub const DEFAULT_CALENDAR_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Accepted values for `MATCH_DURATION_HOURS`.
const MATCH_DURATION_RANGE: RangeInclusive<i64> = 1..=24;

/// What to do when creating or updating a calendar event fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteErrorPolicy {
    /// Propagate the error and stop processing the remaining fixtures.
    #[default]
    Abort,
    /// Log the error and move on to the next fixture.
    Continue,
}

impl FromStr for WriteErrorPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "continue" => Ok(Self::Continue),
            other => Err(Error::Config(format!(
                "WRITE_ERROR_POLICY must be 'abort' or 'continue', got '{}'",
                other
            ))),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// API-Football key sent as `x-rapidapi-key`
    pub football_api_key: String,
    /// Base URL of the fixtures API
    pub football_base_url: String,
    /// Value for the `x-rapidapi-host` header
    pub football_host: String,
    /// Team whose fixtures are synced
    pub team_id: u32,
    /// Season whose fixtures are synced
    pub season: u32,
    /// Target calendar (`primary` or a calendar address)
    pub calendar_id: String,
    /// Base URL of the Google Calendar v3 API
    pub calendar_base_url: String,
    /// OAuth token endpoint used when credentials don't carry their own
    pub token_uri: String,
    /// Assumed length of a match
    pub match_duration: Duration,
    /// Location used when no venue name can be resolved
    pub default_location: String,
    pub write_error_policy: WriteErrorPolicy,
    /// Per-request HTTP timeout in seconds
    pub http_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let football_api_key = lookup("API_FOOTBALL_KEY")
            .ok_or_else(|| Error::Config("API_FOOTBALL_KEY not set".to_string()))?;
        let text = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let duration_hours: i64 = parse_var(&lookup, "MATCH_DURATION_HOURS", 2)?;
        if !MATCH_DURATION_RANGE.contains(&duration_hours) {
            return Err(Error::Config(format!(
                "MATCH_DURATION_HOURS must be between {} and {}, got {}",
                MATCH_DURATION_RANGE.start(),
                MATCH_DURATION_RANGE.end(),
                duration_hours
            )));
        }

        Ok(Self {
            football_api_key,
            football_base_url: text("API_FOOTBALL_BASE_URL", DEFAULT_FOOTBALL_BASE_URL),
            football_host: text("API_FOOTBALL_HOST", DEFAULT_FOOTBALL_HOST),
            team_id: parse_var(&lookup, "TEAM_ID", 5580)?,
            season: parse_var(&lookup, "SEASON", 2023)?,
            calendar_id: text("CALENDAR_ID", "primary"),
            calendar_base_url: text("GOOGLE_CALENDAR_BASE_URL", DEFAULT_CALENDAR_BASE_URL),
            token_uri: text("GOOGLE_TOKEN_URI", DEFAULT_TOKEN_URI),
            match_duration: Duration::hours(duration_hours),
            default_location: text("DEFAULT_LOCATION", "TBD"),
            write_error_policy: match lookup("WRITE_ERROR_POLICY") {
                Some(value) => value.parse()?,
                None => WriteErrorPolicy::default(),
            },
            http_timeout_secs: parse_var(&lookup, "HTTP_TIMEOUT_SECS", 30)?,
        })
    }

    /// Configuration pointing at mock servers, with defaults for everything
    /// else.
    #[cfg(test)]
    pub(crate) fn for_endpoints(
        football_base_url: &str,
        calendar_base_url: &str,
        token_uri: &str,
    ) -> Self {
        Self {
            football_api_key: "test-key".to_string(),
            football_base_url: football_base_url.to_string(),
            football_host: DEFAULT_FOOTBALL_HOST.to_string(),
            team_id: 5580,
            season: 2023,
            calendar_id: "primary".to_string(),
            calendar_base_url: calendar_base_url.to_string(),
            token_uri: token_uri.to_string(),
            match_duration: Duration::hours(2),
            default_location: "TBD".to_string(),
            write_error_policy: WriteErrorPolicy::Abort,
            http_timeout_secs: 30,
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T> {
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: '{}'", name, raw))),
        None => Ok(default),
    }
}
