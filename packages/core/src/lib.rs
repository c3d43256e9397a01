//! Kiosk alert service library. The binary in `src/main.rs` wires these
//! modules together; `tests/` drives them through the router.

pub mod alerts;
pub mod api;
pub mod db;
pub mod error;
pub mod metrics;
pub mod monitor;
pub mod pipeline;
pub mod repository;

pub mod cli;
pub mod config;
pub mod logging;
