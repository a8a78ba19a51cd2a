//! hachivsd - one-shot sync of HashiCorp Vault KV secrets to local files.
//!
//! The library exposes each pipeline stage separately: configuration
//! discovery, secret listing and fetching, rendering, and writing.

pub mod config;
pub mod doctor;
pub mod error;
pub mod format;
pub mod output;
pub mod sync;
pub mod vault;
