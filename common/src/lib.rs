//! Shared models for seekr: candidate addresses, subnet ranges, the local
//! network query, configuration and typed errors.

pub mod config;
pub mod error;
pub mod network;
pub mod utils;
