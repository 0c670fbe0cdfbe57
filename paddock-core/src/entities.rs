//! Schedule entities.
//!
//! All entities are plain value snapshots. Nested values (circuit, sessions,
//! results, standings) are owned by their parent, never shared.

use serde::{Deserialize, Serialize};

use crate::{SeasonStatus, SessionType, ValidationError};

/// Unix timestamp in seconds.
pub type UnixSeconds = i64;

// ============================================================================
// STANDINGS
// ============================================================================

/// A driver's championship position within a season snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverStanding {
    pub position: i32,
    pub driver_number: i32,
    pub driver_name: String,
    pub driver_code: String,
    pub team: String,
    pub points: i32,
    pub wins: i32,
}

/// A constructor's championship position within a season snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorStanding {
    pub position: i32,
    pub team: String,
    pub points: i32,
    pub wins: i32,
}

// ============================================================================
// SEASON
// ============================================================================

/// One championship year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    /// Natural key, unique within the store.
    pub year: i32,
    /// Number of rounds on the calendar.
    pub rounds: i32,
    pub start_date: UnixSeconds,
    pub end_date: UnixSeconds,
    pub status: SeasonStatus,
    pub current_round: i32,
    pub driver_standings: Vec<DriverStanding>,
    pub constructor_standings: Vec<ConstructorStanding>,
    pub total_drivers: i32,
    pub total_teams: i32,
}

impl Season {
    /// Check that both standings tables are ordered by position and
    /// contiguous from 1.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_contiguous(self.year, self.driver_standings.iter().map(|s| s.position))?;
        check_contiguous(
            self.year,
            self.constructor_standings.iter().map(|s| s.position),
        )
    }
}

fn check_contiguous(year: i32, positions: impl Iterator<Item = i32>) -> Result<(), ValidationError> {
    for (idx, got) in positions.enumerate() {
        let expected = idx as i32 + 1;
        if got != expected {
            return Err(ValidationError::NonContiguousStandings {
                year,
                expected,
                got,
            });
        }
    }
    Ok(())
}

// ============================================================================
// ROUND
// ============================================================================

/// Venue of a round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circuit {
    pub name: String,
    /// Latitude, kept as text.
    pub lat: String,
    /// Longitude, kept as text.
    pub long: String,
    pub locality: String,
    pub country: String,
    /// Base64 track map, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    pub laps: i32,
}

/// One classified line of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    pub position: i32,
    pub driver_number: i32,
    pub driver_name: String,
    pub driver_code: String,
    pub team: String,
    /// Elapsed time or gap exactly as published, never parsed.
    pub time: String,
    pub laps: i32,
}

/// An on-track session of a round weekend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub date: UnixSeconds,
    pub total_laps: i32,
    /// Laps completed so far.
    pub current_lap: i32,
    pub is_live: bool,
    pub status: String,
    pub results: Vec<SessionResult>,
}

/// A race weekend, identified by `(season, round_id)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub season: i32,
    pub round_id: i32,
    pub name: String,
    pub circuit: Circuit,
    pub first_date: UnixSeconds,
    pub end_date: UnixSeconds,
    pub sessions: Vec<Session>,
}
