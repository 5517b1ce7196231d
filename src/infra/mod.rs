//! Infrastructure adapters and runtime bootstrap.

pub mod db;
pub mod error;
pub mod health;
pub mod http;
pub mod redis;
pub mod telemetry;
