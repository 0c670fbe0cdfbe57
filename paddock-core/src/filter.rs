//! Query filters for the read operations.

use serde::{Deserialize, Serialize};

use crate::SeasonStatus;

/// Filter for `GetSeasons`. Every field is optional; an empty filter
/// selects all seasons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonsFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SeasonStatus>,
}

impl SeasonsFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn year(year: i32) -> Self {
        Self {
            year: Some(year),
            status: None,
        }
    }

    pub fn with_status(mut self, status: SeasonStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Filter for `GetRounds`. The season is mandatory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundsFilter {
    pub season: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_id: Option<i32>,
}

impl RoundsFilter {
    pub fn season(season: i32) -> Self {
        Self {
            season,
            round_id: None,
        }
    }

    pub fn round(season: i32, round_id: i32) -> Self {
        Self {
            season,
            round_id: Some(round_id),
        }
    }
}
