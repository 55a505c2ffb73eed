//! Event listing and registration service.
//!
//! Visitors browse a curated feed of events ranked by how soon they start,
//! signed-in users publish their own events and register for others.

pub mod auth;
pub mod config;
pub mod db;
pub mod feed;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod seed;
pub mod state;
pub mod utils;
