//! Cache keys derived from query shape.
//!
//! A key names one cached query result, never a single entity. The same
//! filter always derives the same key. The season status filter is not
//! part of the key: a status-filtered read shares its slot with the
//! unfiltered read of the same year.

use std::fmt;
use std::str::FromStr;

use paddock_core::{Round, RoundsFilter, SeasonsFilter};

/// A cache slot for one query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// `seasons:all`
    AllSeasons,
    /// `seasons:<year>`
    Season(i32),
    /// `rounds:<season>`
    SeasonRounds(i32),
    /// `rounds:<season>:<round_id>`
    Round(i32, i32),
}

impl CacheKey {
    pub fn for_seasons(filter: &SeasonsFilter) -> Self {
        match filter.year {
            Some(year) => CacheKey::Season(year),
            None => CacheKey::AllSeasons,
        }
    }

    pub fn for_rounds(filter: &RoundsFilter) -> Self {
        match filter.round_id {
            Some(round_id) => CacheKey::Round(filter.season, round_id),
            None => CacheKey::SeasonRounds(filter.season),
        }
    }

    /// Keys to drop after a season write. Only the aggregate key is
    /// dropped; per-year entries age out by TTL.
    pub fn for_season_write() -> Vec<Self> {
        vec![CacheKey::AllSeasons]
    }

    /// Keys to drop after a round write: the season list and the single
    /// round for every round in the batch, first-seen order, no repeats.
    pub fn for_round_write(rounds: &[Round]) -> Vec<Self> {
        let mut keys = Vec::with_capacity(rounds.len() * 2);
        for round in rounds {
            for key in [
                CacheKey::SeasonRounds(round.season),
                CacheKey::Round(round.season, round.round_id),
            ] {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::AllSeasons => write!(f, "seasons:all"),
            CacheKey::Season(year) => write!(f, "seasons:{}", year),
            CacheKey::SeasonRounds(season) => write!(f, "rounds:{}", season),
            CacheKey::Round(season, round_id) => write!(f, "rounds:{}:{}", season, round_id),
        }
    }
}

impl FromStr for CacheKey {
    type Err = CacheKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CacheKeyParseError(s.to_string());
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            ["seasons", "all"] => Ok(CacheKey::AllSeasons),
            ["seasons", year] => year.parse().map(CacheKey::Season).map_err(|_| err()),
            ["rounds", season] => season
                .parse()
                .map(CacheKey::SeasonRounds)
                .map_err(|_| err()),
            ["rounds", season, round_id] => {
                let season = season.parse().map_err(|_| err())?;
                let round_id = round_id.parse().map_err(|_| err())?;
                Ok(CacheKey::Round(season, round_id))
            }
            _ => Err(err()),
        }
    }
}

/// Error when parsing an invalid cache key string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeyParseError(pub String);

impl fmt::Display for CacheKeyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid cache key: {}", self.0)
    }
}

impl std::error::Error for CacheKeyParseError {}


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
