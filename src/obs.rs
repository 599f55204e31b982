//! Optional observability helpers for library fetches.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `debrid_library_sync.fetch` with the
//!   `service`, `pagination`, and `force_refresh` fields, plus `source` and `records` once the
//!   listing resolves.
//! - Enable `metrics` to increment the `debrid_library_sync_fetch_total` counter for every
//!   attempt/cache hit/join/success/failure/cancellation, labeled by `service` + `outcome`, and the
//!   `debrid_library_sync_remote_calls_total` counter for every rate-limited remote call.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchOutcome {
	/// Entry to `fetch_library`.
	Attempt,
	/// Served from the library cache without remote calls.
	CacheHit,
	/// Attached to a fetch already in flight for the same key.
	Joined,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// The caller's cancellation signal tripped.
	Cancelled,
}
impl FetchOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FetchOutcome::Attempt => "attempt",
			FetchOutcome::CacheHit => "cache_hit",
			FetchOutcome::Joined => "joined",
			FetchOutcome::Success => "success",
			FetchOutcome::Failure => "failure",
			FetchOutcome::Cancelled => "cancelled",
		}
	}
}
impl Display for FetchOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
