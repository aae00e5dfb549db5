//! Tower/axum middleware for the API.

pub mod metrics;
