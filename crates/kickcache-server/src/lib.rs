//! # Kickcache Server Library
//!
//! Process bootstrap for the read-through cache: builds the [`app::Core`],
//! exposes health and stats endpoints and prints startup information.

pub mod app;
pub mod health;
pub mod startup;
