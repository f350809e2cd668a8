//! Shared library for the fixture calendar sync Lambda.
//!
//! This crate provides configuration, API clients and the sync policy used by
//! the `fixture_sync` function.

pub mod auth;
pub mod calendar;
pub mod config;
pub mod error;
pub mod football;
pub mod invocation;
pub mod models;
pub mod secrets;
pub mod sync;

pub use auth::{refresh_access_token, CredentialSource, GoogleCredentials};
pub use calendar::{CalendarApi, GoogleCalendarClient, InsertOutcome};
pub use config::{Config, WriteErrorPolicy};
pub use error::{Error, Result};
pub use football::{FixtureSource, FootballClient};
pub use invocation::{InvocationResponse, SyncTrigger, SUCCESS_MESSAGE};
pub use models::{CalendarEvent, Fixture, FixtureStatus, Score, Venue};
pub use sync::{SyncJob, SyncSettings, SyncSummary};
