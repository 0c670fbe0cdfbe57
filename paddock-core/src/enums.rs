//! Enum types for paddock entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ENTITY DISCRIMINATOR
// ============================================================================

/// Entity type discriminator used in errors and cache bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Season,
    Round,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            EntityType::Season => "Season",
            EntityType::Round => "Round",
        };
        write!(f, "{}", value)
    }
}

// ============================================================================
// SEASON STATUS
// ============================================================================

/// Lifecycle status of a season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonStatus {
    #[default]
    Scheduled,
    Active,
    Completed,
}

impl SeasonStatus {
    /// Text stored in the durable record.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            SeasonStatus::Scheduled => "scheduled",
            SeasonStatus::Active => "active",
            SeasonStatus::Completed => "completed",
        }
    }

    /// Parse the stored text, accepting the fetcher's legacy spellings.
    pub fn from_db_str(s: &str) -> Result<Self, SeasonStatusParseError> {
        match s.to_ascii_lowercase().as_str() {
            "scheduled" | "upcoming" => Ok(SeasonStatus::Scheduled),
            "active" | "in_progress" => Ok(SeasonStatus::Active),
            "completed" => Ok(SeasonStatus::Completed),
            _ => Err(SeasonStatusParseError(s.to_string())),
        }
    }
}

impl fmt::Display for SeasonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for SeasonStatus {
    type Err = SeasonStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid season status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonStatusParseError(pub String);

impl fmt::Display for SeasonStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid season status: {}", self.0)
    }
}

impl std::error::Error for SeasonStatusParseError {}

// ============================================================================
// SESSION TYPE
// ============================================================================

/// Type of an on-track session within a round weekend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    #[default]
    #[serde(rename = "practice_1")]
    Practice1,
    #[serde(rename = "practice_2")]
    Practice2,
    #[serde(rename = "practice_3")]
    Practice3,
    Qualifying,
    SprintQualifying,
    Sprint,
    Race,
}

impl SessionType {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            SessionType::Practice1 => "practice_1",
            SessionType::Practice2 => "practice_2",
            SessionType::Practice3 => "practice_3",
            SessionType::Qualifying => "qualifying",
            SessionType::SprintQualifying => "sprint_qualifying",
            SessionType::Sprint => "sprint",
            SessionType::Race => "race",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, SessionTypeParseError> {
        match s.to_ascii_lowercase().as_str() {
            "practice" | "practice_1" => Ok(SessionType::Practice1),
            "practice_2" => Ok(SessionType::Practice2),
            "practice_3" => Ok(SessionType::Practice3),
            "qualifying" => Ok(SessionType::Qualifying),
            "sprint_qualifying" => Ok(SessionType::SprintQualifying),
            "sprint" => Ok(SessionType::Sprint),
            "race" => Ok(SessionType::Race),
            _ => Err(SessionTypeParseError(s.to_string())),
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for SessionType {
    type Err = SessionTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid session type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTypeParseError(pub String);

impl fmt::Display for SessionTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid session type: {}", self.0)
    }
}

impl std::error::Error for SessionTypeParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_status_db_roundtrip() {
        for status in [
            SeasonStatus::Scheduled,
            SeasonStatus::Active,
            SeasonStatus::Completed,
        ] {
            assert_eq!(SeasonStatus::from_db_str(status.as_db_str()), Ok(status));
        }
    }

    #[test]
    fn test_season_status_accepts_legacy_spellings() {
        assert_eq!("upcoming".parse::<SeasonStatus>(), Ok(SeasonStatus::Scheduled));
        assert_eq!("in_progress".parse::<SeasonStatus>(), Ok(SeasonStatus::Active));
        assert_eq!("COMPLETED".parse::<SeasonStatus>(), Ok(SeasonStatus::Completed));
        assert!("cancelled".parse::<SeasonStatus>().is_err());
    }

    #[test]
    fn test_session_type_serde_matches_db_str() {
        let json = serde_json::to_string(&SessionType::SprintQualifying).unwrap();
        assert_eq!(json, "\"sprint_qualifying\"");
        let json = serde_json::to_string(&SessionType::Practice2).unwrap();
        assert_eq!(json, "\"practice_2\"");
    }

    #[test]
    fn test_session_type_bare_practice() {
        assert_eq!(SessionType::from_db_str("practice"), Ok(SessionType::Practice1));
        let err = SessionType::from_db_str("warmup").unwrap_err();
        assert_eq!(err.to_string(), "Invalid session type: warmup");
    }
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
