// Common library for the jobly API: models, persistence, auth and telemetry

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod sql;
pub mod telemetry;
