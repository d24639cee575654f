//! Homefix Store - Persistence collaborator
//!
//! SQLite storage for the two things worth keeping between requests:
//! - Home profiles, keyed by an opaque user id
//! - Saved analyses, listed newest first per user
//!
//! The diagnostic core never depends on this crate being available.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod store;

pub use error::{Error, Result};
pub use store::{SavedAnalysis, Store, StoredProfile};
