//! Validation statistics.
//!
//! # Data Flow
//! ```text
//! /validate handler
//!     → worker.rs StatsSender::submit (non-blocking, bounded queue)
//!     → worker.rs StatsWorker (background task)
//!     → recorder.rs StatsRecorder::record (INCR, LPUSH, LTRIM)
//!
//! /stats handler
//!     → recorder.rs StatsRecorder::get_stats (GET, LRANGE)
//! ```
//!
//! # Design Decisions
//! - Counts are approximate: push-then-trim is not atomic across requests
//! - Cache slowness never reaches the validation response

pub mod recorder;
pub mod worker;

pub use recorder::{StatsEntry, StatsError, StatsRecorder, StatsSnapshot};
pub use worker::{channel, StatsEvent, StatsSender, StatsWorker};
