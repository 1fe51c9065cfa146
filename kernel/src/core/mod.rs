//! Deterministic, pure logic for the reasoning-loop protocol.
//!
//! Core modules must be free of I/O side effects. Clocks and randomness are
//! passed in by callers so every function here is reproducible in tests.

pub mod gradient;
pub mod roles;
pub mod router;
pub mod tuple;
pub mod types;
