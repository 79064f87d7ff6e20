//! HTTP request handlers for the GHRSST API.

pub mod api;
pub mod bounds;
pub mod health;
pub mod query;
