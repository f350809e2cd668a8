//! API-Football client for fixtures and venues.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::models::{Fixture, FixtureStatus, Score, Venue};
use crate::{Config, Error, Result};

/// Source of fixtures for the sync job.
#[async_trait]
pub trait FixtureSource: Send + Sync {
    /// All fixtures of a team in a season.
    async fn fetch_fixtures(&self, team_id: u32, season: u32) -> Result<Vec<Fixture>>;

    /// Name of a venue, if the API knows it.
    async fn venue_name(&self, venue_id: u64) -> Result<Option<String>>;
}

/// Response envelope shared by every API-Football endpoint.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    response: Vec<serde_json::Value>,
    #[serde(default)]
    errors: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawFixture {
    #[serde(default)]
    fixture: Option<RawFixtureInfo>,
    #[serde(default)]
    league: Option<RawNamed>,
    #[serde(default)]
    teams: Option<RawTeams>,
    #[serde(default)]
    goals: Option<RawGoals>,
}

#[derive(Debug, Default, Deserialize)]
struct RawFixtureInfo {
    id: Option<RawId>,
    date: Option<String>,
    #[serde(default)]
    venue: Option<RawVenue>,
    #[serde(default)]
    status: Option<RawStatus>,
}

#[derive(Debug, Default, Deserialize)]
struct RawVenue {
    id: Option<u64>,
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStatus {
    short: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawNamed {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTeams {
    home: Option<RawNamed>,
    away: Option<RawNamed>,
}

#[derive(Debug, Default, Deserialize)]
struct RawGoals {
    home: Option<u32>,
    away: Option<u32>,
}

const UNKNOWN_TEAM: &str = "TBD";
const UNKNOWN_LEAGUE: &str = "Unknown League";

impl RawFixture {
    /// Validate the minimum fields and fill defaults for the rest.
    fn into_fixture(self) -> Result<Fixture> {
        let info = self
            .fixture
            .ok_or_else(|| Error::Validation("fixture block missing".to_string()))?;
        let id = info
            .id
            .ok_or_else(|| Error::Validation("fixture id missing".to_string()))?
            .into_string();
        let date = info
            .date
            .ok_or_else(|| Error::Validation(format!("fixture {} has no date", id)))?;
        let kickoff = DateTime::parse_from_rfc3339(&date)
            .map_err(|e| {
                Error::Validation(format!("fixture {} has invalid date '{}': {}", id, date, e))
            })?
            .with_timezone(&Utc);

        let status = info
            .status
            .and_then(|s| s.short)
            .map(|code| FixtureStatus::from_short(&code))
            .unwrap_or(FixtureStatus::Scheduled);

        let teams = self.teams.unwrap_or_default();
        let team_name = |team: Option<RawNamed>| {
            team.and_then(|t| t.name)
                .unwrap_or_else(|| UNKNOWN_TEAM.to_string())
        };

        let venue = info
            .venue
            .map(|v| Venue {
                id: v.id,
                name: v.name.filter(|n| !n.trim().is_empty()),
            })
            .unwrap_or_default();

        let goals = self.goals.and_then(|g| match (g.home, g.away) {
            (Some(home), Some(away)) => Some(Score { home, away }),
            _ => None,
        });

        Ok(Fixture {
            id,
            kickoff,
            status,
            home_team: team_name(teams.home),
            away_team: team_name(teams.away),
            venue,
            league: self
                .league
                .and_then(|l| l.name)
                .unwrap_or_else(|| UNKNOWN_LEAGUE.to_string()),
            goals,
        })
    }
}

/// Convert raw `response` entries into fixtures, skipping the unusable ones.
fn parse_fixtures(items: Vec<serde_json::Value>) -> Vec<Fixture> {
    items
        .into_iter()
        .filter_map(|item| {
            let raw: RawFixture = match serde_json::from_value(item) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(error = %e, "Skipping malformed fixture");
                    return None;
                }
            };
            match raw.into_fixture() {
                Ok(fixture) => Some(fixture),
                Err(e) => {
                    warn!(error = %e, "Skipping incomplete fixture");
                    None
                }
            }
        })
        .collect()
}

/// HTTP client for API-Football.
pub struct FootballClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    host: String,
}

impl FootballClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.football_base_url.trim_end_matches('/').to_string(),
            api_key: config.football_api_key.clone(),
            host: config.football_host.clone(),
        })
    }

    async fn get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Envelope> {
        let response = self
            .http_client
            .get(format!("{}/{}", self.base_url, endpoint))
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.host)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                service: "API-Football",
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope = response.json().await?;

        let has_errors = match &envelope.errors {
            serde_json::Value::Array(items) => !items.is_empty(),
            serde_json::Value::Object(map) => !map.is_empty(),
            _ => false,
        };
        if has_errors {
            warn!(endpoint, errors = %envelope.errors, "API-Football reported errors");
        }

        Ok(envelope)
    }
}

#[async_trait]
impl FixtureSource for FootballClient {
    async fn fetch_fixtures(&self, team_id: u32, season: u32) -> Result<Vec<Fixture>> {
        let envelope = self
            .get(
                "fixtures",
                &[("team", team_id.to_string()), ("season", season.to_string())],
            )
            .await?;

        let received = envelope.response.len();
        let fixtures = parse_fixtures(envelope.response);

        info!(team_id, season, received, usable = fixtures.len(), "Fetched fixtures");

        Ok(fixtures)
    }

    async fn venue_name(&self, venue_id: u64) -> Result<Option<String>> {
        let envelope = self.get("venues", &[("id", venue_id.to_string())]).await?;

        Ok(envelope
            .response
            .into_iter()
            .filter_map(|item| serde_json::from_value::<RawVenue>(item).ok())
            .find_map(|venue| venue.name))
    }
}
