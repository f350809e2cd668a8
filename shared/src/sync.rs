//! Fixture to calendar sync policy.
//!
//! Every fixture is looked up in the calendar by its `matchID` private
//! property and then created, updated with the final score, or left alone.

use std::collections::{HashMap, HashSet};

use chrono::Duration;
use tracing::{error, info, warn};

use crate::calendar::{CalendarApi, InsertOutcome};
use crate::config::WriteErrorPolicy;
use crate::football::FixtureSource;
use crate::models::{CalendarEvent, Fixture, Venue};
use crate::{Config, Result};

/// What happened to a single fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureOutcome {
    /// A new event was inserted
    Created,
    /// A previously deleted event was brought back
    Restored,
    /// Insert was rejected because the deterministic id is taken
    AlreadyExists,
    /// Event exists and the match is not finished yet
    Unchanged,
    /// Final score appended to an existing event
    ResultPosted,
    /// Event already carries the result sentinel
    ResultAlreadyPosted,
    /// Finished match without goal counts
    MissingScore,
    /// Fixture id was already handled earlier in this run
    Duplicate,
}

/// Per-run tally, used for the completion log line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub fetched: usize,
    pub created: u32,
    pub restored: u32,
    pub already_exists: u32,
    pub unchanged: u32,
    pub results_posted: u32,
    pub results_already_posted: u32,
    pub missing_score: u32,
    pub duplicates: u32,
    pub failed: u32,
}

impl SyncSummary {
    fn record(&mut self, outcome: FixtureOutcome) {
        match outcome {
            FixtureOutcome::Created => self.created += 1,
            FixtureOutcome::Restored => self.restored += 1,
            FixtureOutcome::AlreadyExists => self.already_exists += 1,
            FixtureOutcome::Unchanged => self.unchanged += 1,
            FixtureOutcome::ResultPosted => self.results_posted += 1,
            FixtureOutcome::ResultAlreadyPosted => self.results_already_posted += 1,
            FixtureOutcome::MissingScore => self.missing_score += 1,
            FixtureOutcome::Duplicate => self.duplicates += 1,
        }
    }
}

/// Knobs of the sync policy.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub match_duration: Duration,
    pub default_location: String,
    pub write_error_policy: WriteErrorPolicy,
}

impl From<&Config> for SyncSettings {
    fn from(config: &Config) -> Self {
        Self {
            match_duration: config.match_duration,
            default_location: config.default_location.clone(),
            write_error_policy: config.write_error_policy,
        }
    }
}

/// Result of looking up a fixture's event.
enum Lookup {
    Found(CalendarEvent),
    Missing,
    Failed,
}

/// One sync pass over a team's fixtures.
pub struct SyncJob<'a, F: ?Sized, C: ?Sized> {
    fixtures: &'a F,
    calendar: &'a C,
    settings: SyncSettings,
}

impl<'a, F, C> SyncJob<'a, F, C>
where
    F: FixtureSource + ?Sized,
    C: CalendarApi + ?Sized,
{
    pub fn new(fixtures: &'a F, calendar: &'a C, settings: SyncSettings) -> Self {
        Self {
            fixtures,
            calendar,
            settings,
        }
    }

    /// Sync every fixture of `team_id` in `season`.
    ///
    /// A failed fixtures fetch counts as an empty season. Write errors abort
    /// the run unless the policy says to continue.
    pub async fn run(&self, team_id: u32, season: u32) -> Result<SyncSummary> {
        let fixtures = match self.fixtures.fetch_fixtures(team_id, season).await {
            Ok(fixtures) => fixtures,
            Err(e) => {
                error!(team_id, season, error = %e, "Failed to fetch matches");
                Vec::new()
            }
        };

        let mut summary = SyncSummary {
            fetched: fixtures.len(),
            ..Default::default()
        };
        let mut seen = HashSet::new();
        let mut venues = HashMap::new();

        for fixture in &fixtures {
            if !seen.insert(fixture.id.as_str()) {
                warn!(fixture_id = %fixture.id, "Duplicate fixture in fetch, skipping");
                summary.record(FixtureOutcome::Duplicate);
                continue;
            }

            match self.sync_fixture(fixture, &mut venues).await {
                Ok(outcome) => summary.record(outcome),
                Err(e) => match self.settings.write_error_policy {
                    WriteErrorPolicy::Abort => {
                        error!(
                            fixture_id = %fixture.id,
                            error = %e,
                            "Calendar write failed, aborting run"
                        );
                        return Err(e);
                    }
                    WriteErrorPolicy::Continue => {
                        error!(fixture_id = %fixture.id, error = %e, "Calendar write failed");
                        summary.failed += 1;
                    }
                },
            }
        }

        Ok(summary)
    }

    /// Apply the create/update/skip policy to one fixture.
    ///
    /// Only write failures are returned as errors.
    async fn sync_fixture(
        &self,
        fixture: &Fixture,
        venues: &mut HashMap<u64, Option<String>>,
    ) -> Result<FixtureOutcome> {
        let lookup = match self.calendar.find_by_match_id(&fixture.id).await {
            Ok(Some(event)) => Lookup::Found(event),
            Ok(None) => Lookup::Missing,
            Err(e) => {
                warn!(
                    fixture_id = %fixture.id,
                    error = %e,
                    "Event lookup failed, treating as not found"
                );
                Lookup::Failed
            }
        };

        match lookup {
            Lookup::Found(event) if fixture.status.is_finished() => {
                self.post_result(fixture, event).await
            }
            Lookup::Found(_) => Ok(FixtureOutcome::Unchanged),
            Lookup::Missing => self.create(fixture, venues, true).await,
            Lookup::Failed => self.create(fixture, venues, false).await,
        }
    }

    async fn post_result(
        &self,
        fixture: &Fixture,
        mut event: CalendarEvent,
    ) -> Result<FixtureOutcome> {
        if event.has_result() {
            return Ok(FixtureOutcome::ResultAlreadyPosted);
        }

        let Some(line) = fixture.result_line() else {
            warn!(fixture_id = %fixture.id, "Finished match has no score, leaving event as is");
            return Ok(FixtureOutcome::MissingScore);
        };

        event.append_result(&line);
        self.calendar.update(&event).await?;

        info!(
            fixture_id = %fixture.id,
            event_id = event.id.as_deref().unwrap_or_default(),
            "Posted match result"
        );

        Ok(FixtureOutcome::ResultPosted)
    }

    /// Insert the fixture's event.
    ///
    /// With a trusted empty lookup, a taken id can only belong to a deleted
    /// event, which is brought back in place. After a failed lookup the id
    /// may belong to a live event, so nothing is overwritten.
    async fn create(
        &self,
        fixture: &Fixture,
        venues: &mut HashMap<u64, Option<String>>,
        lookup_trusted: bool,
    ) -> Result<FixtureOutcome> {
        let location = self.resolve_location(&fixture.venue, venues).await;
        let event = CalendarEvent::for_fixture(fixture, &location, self.settings.match_duration);

        match self.calendar.insert(&event).await? {
            InsertOutcome::Created(_) => Ok(FixtureOutcome::Created),
            InsertOutcome::AlreadyExists if lookup_trusted => {
                self.calendar.update(&event.confirmed()).await?;
                info!(
                    fixture_id = %fixture.id,
                    event_id = event.id.as_deref().unwrap_or_default(),
                    "Restored deleted event"
                );
                Ok(FixtureOutcome::Restored)
            }
            InsertOutcome::AlreadyExists => {
                info!(
                    fixture_id = %fixture.id,
                    event_id = event.id.as_deref().unwrap_or_default(),
                    "Event already exists"
                );
                Ok(FixtureOutcome::AlreadyExists)
            }
        }
    }

    /// Venue name, looked up by id when the fixture only carries the id.
    async fn resolve_location(
        &self,
        venue: &Venue,
        venues: &mut HashMap<u64, Option<String>>,
    ) -> String {
        if let Some(name) = &venue.name {
            return name.clone();
        }
        let Some(venue_id) = venue.id else {
            return self.settings.default_location.clone();
        };

        let resolved = match venues.get(&venue_id) {
            Some(cached) => cached.clone(),
            None => {
                let resolved = match self.fixtures.venue_name(venue_id).await {
                    Ok(name) => name,
                    Err(e) => {
                        warn!(venue_id, error = %e, "Venue lookup failed");
                        None
                    }
                };
                venues.insert(venue_id, resolved.clone());
                resolved
            }
        };

        resolved.unwrap_or_else(|| self.settings.default_location.clone())
    }
}
