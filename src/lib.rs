//! Measurement and validation harness for batched Argon2 processing units.
//!
//! The crate drives an opaque hashing pipeline (password staging, device computation, hash
//! retrieval) through the [device::ComputeBackend] and [device::ProcessingUnit] traits and
//! provides two protocols on top of it:
//!
//! - [bench]: timed batch trials aggregated by the [stats] engine and rendered as a report.
//! - [vectors]: fixed test vectors replayed through the pipeline and compared byte-for-byte.

pub mod bench;
pub mod device;
#[cfg(feature = "executable")]
pub mod logging;
pub mod params;
pub mod stats;
pub mod vectors;

// RE-EXPORTS
// ================================================================================================

pub use params::{Argon2Type, Argon2Version, ConfigError, HashParams};
pub use stats::{DataSet, Nanosecs, RunTimeStats, StatsError};

