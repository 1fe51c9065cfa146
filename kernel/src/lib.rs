//! Tool server for the Thinking Tuple reasoning protocol.
//!
//! The crate keeps the same strict split throughout:
//!
//! - **[`core`]**: Pure, deterministic logic (tuple transitions, routing,
//!   gradient decisions, role defaults). No I/O.
//! - **[`io`]**: Side effects (asset lookup, config, tuple snapshots, template
//!   rendering).
//!
//! Orchestration modules ([`tuples`], [`route`], [`evaluate`], [`compose`],
//! [`knowledge`]) add tool handlers to [`kernel::Kernel`]; [`tools`] validates
//! and dispatches calls and [`server`] speaks JSON-RPC over stdio.

pub mod compose;
pub mod core;
pub mod error;
pub mod evaluate;
pub mod io;
pub mod kernel;
pub mod knowledge;
pub mod logging;
pub mod route;
pub mod server;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tools;
pub mod tuples;
