//! Shared data models.

use std::collections::HashMap;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Marker appended to an event description once the final score is posted.
pub const RESULT_SENTINEL: &str = "Match Result Updated";

/// Private extended property joining a calendar event to its fixture.
pub const MATCH_ID_PROPERTY: &str = "matchID";

/// Match state as reported by the fixtures API short status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureStatus {
    Scheduled,
    InProgress,
    Finished,
    /// Postponed, cancelled, abandoned, awarded or unknown codes
    Other(String),
}

impl FixtureStatus {
    pub fn from_short(code: &str) -> Self {
        match code {
            "NS" | "TBD" => Self::Scheduled,
            "1H" | "HT" | "2H" | "ET" | "BT" | "P" | "SUSP" | "INT" | "LIVE" => Self::InProgress,
            "FT" | "AET" | "PEN" => Self::Finished,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// Final or current score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

/// Where a fixture is played.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Venue {
    pub id: Option<u64>,
    pub name: Option<String>,
}

/// One scheduled or completed match.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub id: String,
    pub kickoff: DateTime<Utc>,
    pub status: FixtureStatus,
    pub home_team: String,
    pub away_team: String,
    pub venue: Venue,
    pub league: String,
    /// Present once the match has a score
    pub goals: Option<Score>,
}

impl Fixture {
    pub fn summary(&self) -> String {
        format!("{} vs {}", self.home_team, self.away_team)
    }

    pub fn description(&self) -> String {
        format!("Match in {}. Match ID: {}", self.league, self.id)
    }

    /// Line appended to the event description once the match is over.
    pub fn result_line(&self) -> Option<String> {
        let goals = self.goals?;
        Some(format!(
            "Result: {} {} - {} {}. {}",
            self.home_team, goals.home, goals.away, self.away_team, RESULT_SENTINEL
        ))
    }

    /// Deterministic calendar event id for this fixture.
    ///
    /// Google Calendar only accepts base32hex characters (`a-v`, `0-9`) in
    /// client-supplied ids, which lowercase hex satisfies.
    pub fn event_id(&self) -> String {
        format!("match{}", hex::encode(self.id.as_bytes()))
    }
}

/// Start or end of a calendar event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    /// All-day events carry a date instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    pub fn utc(instant: DateTime<Utc>) -> Self {
        Self {
            date_time: Some(instant.to_rfc3339_opts(SecondsFormat::Secs, true)),
            date: None,
            time_zone: Some("UTC".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedProperties {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub private: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub shared: HashMap<String, String>,
}

/// Google Calendar event resource.
///
/// Fields not modelled here are kept in `extra` so that a full update does
/// not drop them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_properties: Option<ExtendedProperties>,
    /// `confirmed`, `tentative` or `cancelled`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CalendarEvent {
    /// Build the event for a fixture that has no calendar entry yet.
    pub fn for_fixture(fixture: &Fixture, location: &str, duration: Duration) -> Self {
        let mut private = HashMap::new();
        private.insert(MATCH_ID_PROPERTY.to_string(), fixture.id.clone());

        Self {
            id: Some(fixture.event_id()),
            summary: Some(fixture.summary()),
            description: Some(fixture.description()),
            location: Some(location.to_string()),
            start: Some(EventDateTime::utc(fixture.kickoff)),
            end: Some(EventDateTime::utc(fixture.kickoff + duration)),
            extended_properties: Some(ExtendedProperties {
                private,
                shared: HashMap::new(),
            }),
            ..Default::default()
        }
    }

    pub fn match_id(&self) -> Option<&str> {
        self.extended_properties
            .as_ref()?
            .private
            .get(MATCH_ID_PROPERTY)
            .map(String::as_str)
    }

    /// Copy of the event marked live, used to bring back a deleted event.
    pub fn confirmed(&self) -> Self {
        Self {
            status: Some("confirmed".to_string()),
            ..self.clone()
        }
    }

    pub fn has_result(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|d| d.contains(RESULT_SENTINEL))
    }

    /// Append a result line to the description.
    pub fn append_result(&mut self, line: &str) {
        self.description = Some(match self.description.take() {
            Some(existing) if !existing.is_empty() => format!("{}\n{}", existing, line),
            _ => line.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixture() -> Fixture {
        Fixture {
            id: "1035037".to_string(),
            kickoff: Utc.with_ymd_and_hms(2023, 8, 11, 19, 0, 0).unwrap(),
            status: FixtureStatus::Finished,
            home_team: "Al Ahli".to_string(),
            away_team: "Al Hilal".to_string(),
            venue: Venue::default(),
            league: "Pro League".to_string(),
            goals: Some(Score { home: 2, away: 1 }),
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(FixtureStatus::from_short("NS"), FixtureStatus::Scheduled);
        assert_eq!(FixtureStatus::from_short("HT"), FixtureStatus::InProgress);
        assert!(FixtureStatus::from_short("FT").is_finished());
        assert!(FixtureStatus::from_short("PEN").is_finished());
        assert_eq!(
            FixtureStatus::from_short("PST"),
            FixtureStatus::Other("PST".to_string())
        );
    }

    #[test]
    fn test_event_for_fixture() {
        let event =
            CalendarEvent::for_fixture(&fixture(), "King Abdullah Sports City", Duration::hours(2));

        assert_eq!(event.summary.as_deref(), Some("Al Ahli vs Al Hilal"));
        assert_eq!(
            event.description.as_deref(),
            Some("Match in Pro League. Match ID: 1035037")
        );
        assert_eq!(event.match_id(), Some("1035037"));
        assert_eq!(
            event.start.as_ref().unwrap().date_time.as_deref(),
            Some("2023-08-11T19:00:00Z")
        );
        assert_eq!(
            event.end.as_ref().unwrap().date_time.as_deref(),
            Some("2023-08-11T21:00:00Z")
        );
        assert_eq!(event.end.as_ref().unwrap().time_zone.as_deref(), Some("UTC"));
    }

    #[test]
    fn test_event_id_uses_base32hex_alphabet() {
        let id = fixture().event_id();
        assert_eq!(id, "match31303335303337");
        assert!(id
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='v').contains(&c)));
    }

    #[test]
    fn test_append_result_sets_sentinel() {
        let fixture = fixture();
        let mut event = CalendarEvent::for_fixture(&fixture, "TBD", Duration::hours(2));
        assert!(!event.has_result());

        event.append_result(&fixture.result_line().unwrap());

        assert!(event.has_result());
        let expected = "Match in Pro League. Match ID: 1035037\n\
                        Result: Al Ahli 2 - 1 Al Hilal. Match Result Updated";
        assert_eq!(event.description.as_deref(), Some(expected));
    }

    #[test]
    fn test_confirmed_copy_is_sent_as_live() {
        let event = CalendarEvent::for_fixture(&fixture(), "TBD", Duration::hours(2));
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("status").is_none());

        let revived = event.confirmed();
        assert_eq!(revived.status.as_deref(), Some("confirmed"));
        assert_eq!(revived.id, event.id);

        let revived_json = serde_json::to_value(&revived).unwrap();
        assert_eq!(revived_json["status"], "confirmed");
    }

    #[test]
    fn test_result_line_requires_goals() {
        let mut fixture = fixture();
        fixture.goals = None;
        assert!(fixture.result_line().is_none());
    }

    #[test]
    fn test_unknown_event_fields_survive_round_trip() {
        let json = serde_json::json!({
            "id": "abc",
            "summary": "Al Ahli vs Al Hilal",
            "colorId": "5",
            "reminders": {"useDefault": true},
            "extendedProperties": {"private": {"matchID": "42"}}
        });

        let event: CalendarEvent = serde_json::from_value(json).unwrap();
        assert_eq!(event.match_id(), Some("42"));

        let back = serde_json::to_value(&event).unwrap();
        assert_eq!(back["colorId"], "5");
        assert_eq!(back["reminders"]["useDefault"], true);
    }
}
