//! Newsletter backend
//!
//! Stores each user's newsletter preferences (favourite subreddits, send time, opt-in)
//! and relays the upstream top-news listing. Everything is served under `/api/profile`.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod services;

pub use app::{AppState, build_app};
