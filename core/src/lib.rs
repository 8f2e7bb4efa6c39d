//! Discovery engine for seekr: the cached-host check, the concurrent subnet
//! sweep and the listener plumbing that reports a session's outcome.

pub mod cache;
pub mod discovery;
pub mod events;
pub mod liveness;
pub mod scanner;
pub mod session;

#[cfg(test)]
mod test_helpers;
