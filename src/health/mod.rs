//! Upstream readiness subsystem.
//!
//! # Data Flow
//! ```text
//! GET /ready
//!     → readiness.rs (fresh get_blockchain_state call)
//!     → RpcClient (may answer from its response cache)
//!     → bool: node reports itself synced
//! ```
//!
//! # Design Decisions
//! - No state is kept here; each probe asks the node again
//! - Any error or missing field means "not ready"

pub mod readiness;

pub use readiness::ReadinessProber;
