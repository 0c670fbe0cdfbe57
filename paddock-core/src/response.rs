//! Response shapes returned by the schedule operations.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{Round, Season};

/// Metadata attached to every read response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Query completion time, Unix seconds.
    pub timestamp: i64,
    /// True when the answer came from the cache.
    pub cached: bool,
}

impl Metadata {
    /// Stamp a response completed now.
    pub fn now(cached: bool) -> Self {
        Self {
            timestamp: Utc::now().timestamp(),
            cached,
        }
    }
}

/// Cached snapshot of a seasons query result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonsData {
    pub seasons: Vec<Season>,
}

/// Cached snapshot of a rounds query result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundsData {
    pub rounds: Vec<Round>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonsResponse {
    pub metadata: Metadata,
    pub seasons: Vec<Season>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundsResponse {
    pub metadata: Metadata,
    pub rounds: Vec<Round>,
}

/// Outcome of a write batch. Failure is a value, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOutcome {
    pub success: bool,
    pub message: String,
    pub records_affected: u64,
}

impl WriteOutcome {
    pub fn succeeded(message: impl Into<String>, records_affected: u64) -> Self {
        Self {
            success: true,
            message: message.into(),
            records_affected,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            records_affected: 0,
        }
    }
}
