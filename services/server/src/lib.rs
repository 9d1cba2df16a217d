//! Marquee HTTP service: admin CRUD, display payload resolution, screen
//! heartbeats, and the live invalidation feed.
pub mod api;
pub mod app;
pub mod config;
pub mod observability;
