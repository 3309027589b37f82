//! # Fanout API Library
//!
//! This library provides the core functionality for the Fanout API service:
//! webhook classification, rule matching and notification fan-out.

pub mod auth;
pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod notify;
pub mod render;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub use migration;
