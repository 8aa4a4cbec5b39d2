// ABOUTME: Library root for imagewait - exposes the wait machinery for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod error;
pub mod output;
pub mod registry;
pub mod types;
pub mod wait;
