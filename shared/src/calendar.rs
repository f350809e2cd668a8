//! Google Calendar v3 client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

use crate::auth::{refresh_access_token, GoogleCredentials};
use crate::models::{CalendarEvent, MATCH_ID_PROPERTY};
use crate::{Config, Error, Result};

/// Result of inserting an event.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Created(CalendarEvent),
    /// An event with the same id is already in the calendar
    AlreadyExists,
}

/// Calendar operations the sync job relies on.
#[async_trait]
pub trait CalendarApi: Send + Sync {
    /// First event whose private `matchID` property equals `match_id`.
    async fn find_by_match_id(&self, match_id: &str) -> Result<Option<CalendarEvent>>;

    async fn insert(&self, event: &CalendarEvent) -> Result<InsertOutcome>;

    /// Replace an existing event; `event.id` must be set.
    async fn update(&self, event: &CalendarEvent) -> Result<CalendarEvent>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<CalendarEvent>,
}

/// Authenticated handle on one Google calendar.
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    base_url: String,
    calendar_id: String,
    access_token: String,
}

impl GoogleCalendarClient {
    /// Refresh an access token and return a client bound to the configured calendar.
    pub async fn connect(config: &Config, credentials: &GoogleCredentials) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        let access_token =
            refresh_access_token(&http_client, credentials, &config.token_uri).await?;

        Ok(Self {
            http_client,
            base_url: config.calendar_base_url.trim_end_matches('/').to_string(),
            calendar_id: config.calendar_id.clone(),
            access_token,
        })
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(&self.calendar_id)
        )
    }

    async fn api_error(response: reqwest::Response) -> Error {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Error::Api {
            service: "Google Calendar",
            status,
            body,
        }
    }
}

#[async_trait]
impl CalendarApi for GoogleCalendarClient {
    async fn find_by_match_id(&self, match_id: &str) -> Result<Option<CalendarEvent>> {
        let response = self
            .http_client
            .get(self.events_url())
            .bearer_auth(&self.access_token)
            .query(&[
                (
                    "privateExtendedProperty",
                    format!("{}={}", MATCH_ID_PROPERTY, match_id),
                ),
                ("showDeleted", "false".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let list: EventListResponse = response.json().await?;
        debug!(match_id, matches = list.items.len(), "Looked up calendar event");

        Ok(list
            .items
            .into_iter()
            .find(|event| event.match_id() == Some(match_id)))
    }

    async fn insert(&self, event: &CalendarEvent) -> Result<InsertOutcome> {
        let response = self
            .http_client
            .post(self.events_url())
            .bearer_auth(&self.access_token)
            .json(event)
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            return Ok(InsertOutcome::AlreadyExists);
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let created: CalendarEvent = response.json().await?;
        info!(
            event_id = created.id.as_deref().unwrap_or_default(),
            link = created.html_link.as_deref().unwrap_or_default(),
            "Added to calendar"
        );

        Ok(InsertOutcome::Created(created))
    }

    async fn update(&self, event: &CalendarEvent) -> Result<CalendarEvent> {
        let event_id = event
            .id
            .as_deref()
            .ok_or_else(|| Error::Validation("Cannot update an event without id".to_string()))?;

        let response = self
            .http_client
            .put(format!(
                "{}/{}",
                self.events_url(),
                urlencoding::encode(event_id)
            ))
            .bearer_auth(&self.access_token)
            .json(event)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        Ok(response.json().await?)
    }
}
