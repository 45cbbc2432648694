//! Cache cluster health subsystem.
//!
//! # Data Flow
//! ```text
//! On demand (cluster.rs):
//!     /status request
//!     → ping every node concurrently
//!     → apply quorum rule
//!     → ClusterStatus
//!
//! Background (monitor.rs):
//!     Periodic timer
//!     → cluster.rs check
//!     → log transitions, update metrics
//! ```
//!
//! # Design Decisions
//! - Quorum is configuration, not an assumed majority
//! - "Below quorum" and "no client at all" are different failure tiers

pub mod cluster;
pub mod monitor;

pub use cluster::{
    is_success_reply, ClusterHealthChecker, ClusterState, ClusterStatus, HealthError, NodeHealth,
    NodeStatus,
};
pub use monitor::HealthMonitor;
