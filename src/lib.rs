//! Infobus client library
//!
//! Exposes the API client, the local store, the route/station cache, route
//! selection and the command runner for the binary and integration tests.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod occupancy;
pub mod overlay;
pub mod refresh;
pub mod selection;
pub mod store;
