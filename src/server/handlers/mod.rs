//! API handlers, grouped by area.

pub mod articles;
pub mod auth;
pub mod keywords;
pub mod settings;
