//! Outbound integrations

pub mod feed;

pub use feed::{FeedClient, FeedError};
