//! End-to-end discovery runs against a real HTTP responder on loopback.

mod discovery;
