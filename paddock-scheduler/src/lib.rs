//! PADDOCK Scheduler - Schedule Data Service
//!
//! Wires the cache-aside storage layer to a JSON RPC boundary:
//!
//! - [`service::ScheduleService`] is the facade over the resolver and the
//!   write coordinator
//! - [`routes::create_router`] exposes it over axum
//! - [`db::PgDocumentStore`] is the PostgreSQL document store
//! - [`config`], [`server`] and [`telemetry`] cover process setup

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod server;
pub mod service;
pub mod telemetry;

pub use config::SchedulerConfig;
pub use db::{DbConfig, PgDocumentStore};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::{create_router, GetRoundRequest, GetRoundResponse, WriteRoundsRequest, WriteSeasonsRequest};
pub use service::{ScheduleService, ServiceHealth};
