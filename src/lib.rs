//! Credential relay for a browser-based music player.
//!
//! Runs the authorization code flow against the streaming provider, keeps the
//! resulting tokens in memory, and proxies one playlist query with them. The
//! client secret never leaves the server.

pub mod auth;
pub mod config;
pub mod logging;
pub mod providers;
pub mod server;
