//! Middleware module for the Homefix HTTP server
//!
//! Provides:
//! - Sliding-window rate limiter
//! - Rate limiting layer (per key + global)

pub mod limiter;
pub mod rate_limit;
