// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for library fetches.
#[derive(Debug, Default)]
pub struct FetchMetrics {
	attempts: AtomicU64,
	cache_hits: AtomicU64,
	joined: AtomicU64,
	remote_calls: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	cancelled: AtomicU64,
}
impl FetchMetrics {
	/// Returns the total number of `fetch_library` calls.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of fetches answered from the cache.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Returns the number of calls that attached to a fetch already in flight.
	pub fn joined(&self) -> u64 {
		self.joined.load(Ordering::Relaxed)
	}

	/// Returns the number of remote calls admitted by the rate limiter on behalf of fetches.
	pub fn remote_calls(&self) -> u64 {
		self.remote_calls.load(Ordering::Relaxed)
	}

	/// Returns the number of fetches that reached the remote and completed.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of fetches that failed for reasons other than cancellation.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns the number of fetches stopped by their cancellation token.
	pub fn cancellations(&self) -> u64 {
		self.cancelled.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_joined(&self) {
		self.joined.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_remote_call(&self) {
		self.remote_calls.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_cancellation(&self) {
		self.cancelled.fetch_add(1, Ordering::Relaxed);
	}
}
