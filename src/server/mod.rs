//! Server module for Homefix
//!
//! # Module Structure
//!
//! - `config`: Configuration structures for all server components
//! - `loader`: Configuration loading from files and environment
//! - `providers`: Generation provider resolution
//! - `init`: Router construction and the run loop

pub mod config;
mod init;
mod loader;
mod providers;

pub use init::{build_router, build_service, run};
pub use loader::load_config;
