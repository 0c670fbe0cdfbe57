//! Document mapper.
//!
//! Converts between store [`Document`]s and the typed entities in
//! `paddock-core`, and between entity sets and cache payload bytes.
//!
//! Reading is lenient per field: a corrupt attribute decodes to its zero
//! value and never blanks the surrounding record. Writing is total: every
//! field of an entity lands in its document, so `from_document(to_document(e))`
//! gives back `e`.

use paddock_core::{
    CacheError, Circuit, ConstructorStanding, DriverStanding, Round, RoundsData, RoundsFilter,
    Season, SeasonStatus, SeasonsData, SeasonsFilter, Session, SessionResult, SessionType,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};

use crate::document::{
    bool_field, doc_field, doc_list_field, int_field, long_field, opt_str_field, str_field,
    Document, Filter,
};

/// Collection holding season documents.
pub const SEASONS_COLLECTION: &str = "seasons";
/// Collection holding round documents.
pub const ROUNDS_COLLECTION: &str = "rounds";

/// Two-way mapping between a typed value and its store document.
pub trait DocumentRecord: Sized {
    /// Decode leniently. Never fails.
    fn from_document(doc: &Document) -> Self;

    fn to_document(&self) -> Document;
}

/// A top-level entity with its own collection and natural key.
pub trait StoredEntity: DocumentRecord + Send + Sync + 'static {
    const COLLECTION: &'static str;

    /// Filter selecting exactly this entity's record.
    fn key_filter(&self) -> Filter;
}

/// A query result set that is cached as one payload.
pub trait CachedResultSet: Serialize + DeserializeOwned + Send + Sync {
    type Item: StoredEntity;

    fn from_items(items: Vec<Self::Item>) -> Self;
}

fn object(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

fn decode_list<T: DocumentRecord>(doc: &Document, field: &str) -> Vec<T> {
    doc_list_field(doc, field).map(T::from_document).collect()
}

fn encode_list<T: DocumentRecord>(items: &[T]) -> Vec<Document> {
    items.iter().map(T::to_document).collect()
}

// ============================================================================
// STANDINGS
// ============================================================================

impl DocumentRecord for DriverStanding {
    fn from_document(doc: &Document) -> Self {
        Self {
            position: int_field(doc, "position"),
            driver_number: int_field(doc, "driver_number"),
            driver_name: str_field(doc, "driver_name"),
            driver_code: str_field(doc, "driver_code"),
            team: str_field(doc, "team"),
            points: int_field(doc, "points"),
            wins: int_field(doc, "wins"),
        }
    }

    fn to_document(&self) -> Document {
        object(json!({
            "position": self.position,
            "driver_number": self.driver_number,
            "driver_name": self.driver_name,
            "driver_code": self.driver_code,
            "team": self.team,
            "points": self.points,
            "wins": self.wins,
        }))
    }
}

impl DocumentRecord for ConstructorStanding {
    fn from_document(doc: &Document) -> Self {
        Self {
            position: int_field(doc, "position"),
            team: str_field(doc, "team"),
            points: int_field(doc, "points"),
            wins: int_field(doc, "wins"),
        }
    }

    fn to_document(&self) -> Document {
        object(json!({
            "position": self.position,
            "team": self.team,
            "points": self.points,
            "wins": self.wins,
        }))
    }
}

// ============================================================================
// SEASON
// ============================================================================

impl DocumentRecord for Season {
    fn from_document(doc: &Document) -> Self {
        Self {
            year: int_field(doc, "year"),
            rounds: int_field(doc, "rounds"),
            start_date: long_field(doc, "start_date"),
            end_date: long_field(doc, "end_date"),
            status: SeasonStatus::from_db_str(&str_field(doc, "status")).unwrap_or_default(),
            current_round: int_field(doc, "current_round"),
            driver_standings: decode_list(doc, "driver_standings"),
            constructor_standings: decode_list(doc, "constructor_standings"),
            total_drivers: int_field(doc, "total_drivers"),
            total_teams: int_field(doc, "total_teams"),
        }
    }

    fn to_document(&self) -> Document {
        object(json!({
            "year": self.year,
            "rounds": self.rounds,
            "start_date": self.start_date,
            "end_date": self.end_date,
            "status": self.status.as_db_str(),
            "current_round": self.current_round,
            "driver_standings": encode_list(&self.driver_standings),
            "constructor_standings": encode_list(&self.constructor_standings),
            "total_drivers": self.total_drivers,
            "total_teams": self.total_teams,
        }))
    }
}

impl StoredEntity for Season {
    const COLLECTION: &'static str = SEASONS_COLLECTION;

    fn key_filter(&self) -> Filter {
        object(json!({ "year": self.year }))
    }
}

// ============================================================================
// ROUND
// ============================================================================

impl DocumentRecord for Circuit {
    fn from_document(doc: &Document) -> Self {
        Self {
            name: str_field(doc, "name"),
            lat: str_field(doc, "lat"),
            long: str_field(doc, "long"),
            locality: str_field(doc, "locality"),
            country: str_field(doc, "country"),
            image_base64: opt_str_field(doc, "image_base64"),
            laps: int_field(doc, "laps"),
        }
    }

    fn to_document(&self) -> Document {
        let mut doc = object(json!({
            "name": self.name,
            "lat": self.lat,
            "long": self.long,
            "locality": self.locality,
            "country": self.country,
            "laps": self.laps,
        }));
        if let Some(image) = &self.image_base64 {
            doc.insert("image_base64".to_string(), Value::String(image.clone()));
        }
        doc
    }
}

impl DocumentRecord for SessionResult {
    fn from_document(doc: &Document) -> Self {
        Self {
            position: int_field(doc, "position"),
            driver_number: int_field(doc, "driver_number"),
            driver_name: str_field(doc, "driver_name"),
            driver_code: str_field(doc, "driver_code"),
            team: str_field(doc, "team"),
            time: str_field(doc, "time"),
            laps: int_field(doc, "laps"),
        }
    }

    fn to_document(&self) -> Document {
        object(json!({
            "position": self.position,
            "driver_number": self.driver_number,
            "driver_name": self.driver_name,
            "driver_code": self.driver_code,
            "team": self.team,
            "time": self.time,
            "laps": self.laps,
        }))
    }
}

impl DocumentRecord for Session {
    fn from_document(doc: &Document) -> Self {
        Self {
            session_type: SessionType::from_db_str(&str_field(doc, "type")).unwrap_or_default(),
            date: long_field(doc, "date"),
            total_laps: int_field(doc, "total_laps"),
            current_lap: int_field(doc, "current_lap"),
            is_live: bool_field(doc, "is_live"),
            status: str_field(doc, "status"),
            results: decode_list(doc, "results"),
        }
    }

    fn to_document(&self) -> Document {
        object(json!({
            "type": self.session_type.as_db_str(),
            "date": self.date,
            "total_laps": self.total_laps,
            "current_lap": self.current_lap,
            "is_live": self.is_live,
            "status": self.status,
            "results": encode_list(&self.results),
        }))
    }
}

impl DocumentRecord for Round {
    fn from_document(doc: &Document) -> Self {
        Self {
            season: int_field(doc, "season"),
            round_id: int_field(doc, "round_id"),
            name: str_field(doc, "name"),
            circuit: doc_field(doc, "circuit")
                .map(Circuit::from_document)
                .unwrap_or_default(),
            first_date: long_field(doc, "first_date"),
            end_date: long_field(doc, "end_date"),
            sessions: decode_list(doc, "sessions"),
        }
    }

    fn to_document(&self) -> Document {
        object(json!({
            "season": self.season,
            "round_id": self.round_id,
            "name": self.name,
            "circuit": self.circuit.to_document(),
            "first_date": self.first_date,
            "end_date": self.end_date,
            "sessions": encode_list(&self.sessions),
        }))
    }
}

impl StoredEntity for Round {
    const COLLECTION: &'static str = ROUNDS_COLLECTION;

    fn key_filter(&self) -> Filter {
        object(json!({ "season": self.season, "round_id": self.round_id }))
    }
}

// ============================================================================
// QUERIES AND PAYLOADS
// ============================================================================

/// Store query for a seasons filter. Status narrows the query.
pub fn seasons_query(filter: &SeasonsFilter) -> Filter {
    let mut query = Filter::new();
    if let Some(year) = filter.year {
        query.insert("year".to_string(), json!(year));
    }
    if let Some(status) = filter.status {
        query.insert("status".to_string(), json!(status.as_db_str()));
    }
    query
}

/// Store query for a rounds filter.
pub fn rounds_query(filter: &RoundsFilter) -> Filter {
    let mut query = Filter::new();
    query.insert("season".to_string(), json!(filter.season));
    if let Some(round_id) = filter.round_id {
        query.insert("round_id".to_string(), json!(round_id));
    }
    query
}

impl CachedResultSet for SeasonsData {
    type Item = Season;

    fn from_items(seasons: Vec<Season>) -> Self {
        Self { seasons }
    }
}

impl CachedResultSet for RoundsData {
    type Item = Round;

    fn from_items(rounds: Vec<Round>) -> Self {
        Self { rounds }
    }
}

/// Serialize a result set for the cache.
pub fn encode_payload<T: Serialize>(value: &T) -> Result<Vec<u8>, CacheError> {
    serde_json::to_vec(value).map_err(|e| CacheError::Codec {
        reason: e.to_string(),
    })
}

/// Deserialize a cached result set. A corrupt payload is a codec error.
pub fn decode_payload<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CacheError> {
    serde_json::from_slice(bytes).map_err(|e| CacheError::Codec {
        reason: e.to_string(),
    })
}


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
