//! PADDOCK Test Utilities
//!
//! Shared test infrastructure for the paddock workspace:
//! - Proptest generators for every schedule entity
//! - Fixtures for the common season/round scenarios

// Re-export core types for convenience
pub use paddock_core::{
    Circuit, ConstructorStanding, DriverStanding, Round, RoundsFilter, Season, SeasonStatus,
    SeasonsFilter, Session, SessionResult, SessionType,
};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating paddock entity types.

    use super::*;
    use proptest::prelude::*;

    // === Scalar Generators ===

    /// Unix seconds between 2020 and 2030.
    pub fn arb_unix_seconds() -> impl Strategy<Value = i64> {
        1577836800i64..1893456000i64
    }

    pub fn arb_name() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z .'-]{0,30}"
    }

    pub fn arb_driver_code() -> impl Strategy<Value = String> {
        "[A-Z]{3}"
    }

    // === Enum Generators ===

    /// Generate a SeasonStatus variant.
    pub fn arb_season_status() -> impl Strategy<Value = SeasonStatus> {
        prop_oneof![
            Just(SeasonStatus::Scheduled),
            Just(SeasonStatus::Active),
            Just(SeasonStatus::Completed),
        ]
    }

    /// Generate a SessionType variant.
    pub fn arb_session_type() -> impl Strategy<Value = SessionType> {
        prop_oneof![
            Just(SessionType::Practice1),
            Just(SessionType::Practice2),
            Just(SessionType::Practice3),
            Just(SessionType::Qualifying),
            Just(SessionType::SprintQualifying),
            Just(SessionType::Sprint),
            Just(SessionType::Race),
        ]
    }

    // === Nested Value Generators ===

    pub fn arb_circuit() -> impl Strategy<Value = Circuit> {
        (
            arb_name(),
            "-?[0-9]{1,2}\\.[0-9]{1,6}",
            "-?[0-9]{1,3}\\.[0-9]{1,6}",
            arb_name(),
            arb_name(),
            prop::option::of("[A-Za-z0-9+/]{0,64}={0,2}"),
            0i32..80,
        )
            .prop_map(|(name, lat, long, locality, country, image_base64, laps)| Circuit {
                name,
                lat,
                long,
                locality,
                country,
                image_base64,
                laps,
            })
    }

    pub fn arb_session_result() -> impl Strategy<Value = SessionResult> {
        (
            1i32..=20,
            1i32..100,
            arb_name(),
            arb_driver_code(),
            arb_name(),
            "(\\+?[0-9]{1,2}:[0-9]{2}\\.[0-9]{3})?",
            0i32..80,
        )
            .prop_map(
                |(position, driver_number, driver_name, driver_code, team, time, laps)| {
                    SessionResult {
                        position,
                        driver_number,
                        driver_name,
                        driver_code,
                        team,
                        time,
                        laps,
                    }
                },
            )
    }

    pub fn arb_session() -> impl Strategy<Value = Session> {
        (
            arb_session_type(),
            arb_unix_seconds(),
            0i32..80,
            0i32..80,
            any::<bool>(),
            "(scheduled|live|finished)?",
            prop::collection::vec(arb_session_result(), 0..4),
        )
            .prop_map(
                |(session_type, date, total_laps, current_lap, is_live, status, results)| Session {
                    session_type,
                    date,
                    total_laps,
                    current_lap,
                    is_live,
                    status,
                    results,
                },
            )
    }

    /// Driver standings, positions contiguous from 1.
    pub fn arb_driver_standings() -> impl Strategy<Value = Vec<DriverStanding>> {
        prop::collection::vec(
            (1i32..100, arb_name(), arb_driver_code(), arb_name(), 0i32..600, 0i32..25),
            0..6,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(
                    |(idx, (driver_number, driver_name, driver_code, team, points, wins))| {
                        DriverStanding {
                            position: idx as i32 + 1,
                            driver_number,
                            driver_name,
                            driver_code,
                            team,
                            points,
                            wins,
                        }
                    },
                )
                .collect()
        })
    }

    /// Constructor standings, positions contiguous from 1.
    pub fn arb_constructor_standings() -> impl Strategy<Value = Vec<ConstructorStanding>> {
        prop::collection::vec((arb_name(), 0i32..900, 0i32..25), 0..4).prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(idx, (team, points, wins))| ConstructorStanding {
                    position: idx as i32 + 1,
                    team,
                    points,
                    wins,
                })
                .collect()
        })
    }

    // === Entity Generators ===

    /// Generate a Season that passes `Season::validate`.
    pub fn arb_season() -> impl Strategy<Value = Season> {
        (
            1950i32..2100,
            0i32..25,
            arb_unix_seconds(),
            arb_unix_seconds(),
            arb_season_status(),
            0i32..25,
            arb_driver_standings(),
            arb_constructor_standings(),
            0i32..30,
            0i32..12,
        )
            .prop_map(
                |(
                    year,
                    rounds,
                    start_date,
                    end_date,
                    status,
                    current_round,
                    driver_standings,
                    constructor_standings,
                    total_drivers,
                    total_teams,
                )| {
                    Season {
                        year,
                        rounds,
                        start_date,
                        end_date,
                        status,
                        current_round,
                        driver_standings,
                        constructor_standings,
                        total_drivers,
                        total_teams,
                    }
                },
            )
    }

    /// Generate a Round within the given season.
    pub fn arb_round_in(season: i32) -> impl Strategy<Value = Round> {
        (
            1i32..25,
            arb_name(),
            arb_circuit(),
            arb_unix_seconds(),
            arb_unix_seconds(),
            prop::collection::vec(arb_session(), 0..5),
        )
            .prop_map(
                move |(round_id, name, circuit, first_date, end_date, sessions)| Round {
                    season,
                    round_id,
                    name,
                    circuit,
                    first_date,
                    end_date,
                    sessions,
                },
            )
    }

    /// Generate a Round in any season.
    pub fn arb_round() -> impl Strategy<Value = Round> {
        (1950i32..2100).prop_flat_map(arb_round_in)
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common scenarios.

    use super::*;

    /// A practice-to-race weekend with one classified race result.
    pub fn weekend_sessions(first_date: i64) -> Vec<Session> {
        let day = 86_400;
        vec![
            Session {
                session_type: SessionType::Practice1,
                date: first_date,
                status: "finished".to_string(),
                ..Default::default()
            },
            Session {
                session_type: SessionType::Qualifying,
                date: first_date + day,
                status: "finished".to_string(),
                ..Default::default()
            },
            Session {
                session_type: SessionType::Race,
                date: first_date + 2 * day,
                total_laps: 57,
                current_lap: 57,
                is_live: false,
                status: "finished".to_string(),
                results: vec![SessionResult {
                    position: 1,
                    driver_number: 1,
                    driver_name: "Max Verstappen".to_string(),
                    driver_code: "VER".to_string(),
                    team: "Red Bull Racing".to_string(),
                    time: "1:31:44.742".to_string(),
                    laps: 57,
                }],
            },
        ]
    }

    /// Create a round with a named weekend and a minimal circuit.
    pub fn round_fixture(season: i32, round_id: i32, name: &str) -> Round {
        let first_date = 1_709_164_800 + i64::from(round_id) * 7 * 86_400;
        Round {
            season,
            round_id,
            name: name.to_string(),
            circuit: Circuit {
                name: format!("{} Circuit", name),
                lat: "26.0325".to_string(),
                long: "50.5106".to_string(),
                locality: "Sakhir".to_string(),
                country: "Bahrain".to_string(),
                image_base64: None,
                laps: 57,
            },
            first_date,
            end_date: first_date + 2 * 86_400,
            sessions: weekend_sessions(first_date),
        }
    }

    /// The 2024 season opener.
    pub fn bahrain_round() -> Round {
        round_fixture(2024, 1, "Bahrain GP")
    }

    /// Create a season with valid two-driver, one-team standings.
    pub fn season_fixture(year: i32) -> Season {
        Season {
            year,
            rounds: 24,
            start_date: 1_709_164_800,
            end_date: 1_733_011_200,
            status: SeasonStatus::Completed,
            current_round: 24,
            driver_standings: vec![
                DriverStanding {
                    position: 1,
                    driver_number: 1,
                    driver_name: "Max Verstappen".to_string(),
                    driver_code: "VER".to_string(),
                    team: "Red Bull Racing".to_string(),
                    points: 437,
                    wins: 9,
                },
                DriverStanding {
                    position: 2,
                    driver_number: 4,
                    driver_name: "Lando Norris".to_string(),
                    driver_code: "NOR".to_string(),
                    team: "McLaren".to_string(),
                    points: 374,
                    wins: 4,
                },
            ],
            constructor_standings: vec![ConstructorStanding {
                position: 1,
                team: "McLaren".to_string(),
                points: 666,
                wins: 6,
            }],
            total_drivers: 2,
            total_teams: 1,
        }
    }
}
