//! Fixture Sync Lambda - Mirrors a team's fixtures into a Google Calendar.
//!
//! This Lambda runs on a schedule (EventBridge). Each run creates events for
//! new fixtures and appends the final score to events of finished matches.

use std::sync::Arc;

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use shared::{
    Config, CredentialSource, FootballClient, GoogleCalendarClient, InvocationResponse, SyncJob,
    SyncSettings, SyncTrigger, SUCCESS_MESSAGE,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state
struct AppState {
    config: Config,
    credentials: CredentialSource,
    football: FootballClient,
}

impl AppState {
    fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let credentials = CredentialSource::from_env()?;
        let football = FootballClient::new(&config)?;

        Ok(Self {
            config,
            credentials,
            football,
        })
    }
}

async fn handler(
    state: Arc<AppState>,
    event: LambdaEvent<serde_json::Value>,
) -> Result<InvocationResponse, Error> {
    let trigger = SyncTrigger::from_payload(event.payload);
    let team_id = trigger.team_id.unwrap_or(state.config.team_id);
    let season = trigger.season.unwrap_or(state.config.season);

    info!(team_id, season, calendar_id = %state.config.calendar_id, "Starting fixture sync");

    // Authenticate on every invocation; failures abort the run.
    let credentials = state.credentials.clone().load().await?;
    let calendar = GoogleCalendarClient::connect(&state.config, &credentials).await?;

    let job = SyncJob::new(&state.football, &calendar, SyncSettings::from(&state.config));
    let summary = job.run(team_id, season).await?;

    info!(
        fetched = summary.fetched,
        created = summary.created,
        already_exists = summary.already_exists,
        unchanged = summary.unchanged,
        results_posted = summary.results_posted,
        results_already_posted = summary.results_already_posted,
        restored = summary.restored,
        missing_score = summary.missing_score,
        duplicates = summary.duplicates,
        failed = summary.failed,
        "Fixture sync complete"
    );

    Ok(InvocationResponse::success(SUCCESS_MESSAGE))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new()?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
