//! Per-service flow control for outbound remote calls.
//!
//! Every service owns one lane sized to its published ceiling. A lane is a GCRA cell spacing
//! admissions `per / max_calls` apart, so no window of length `per` ever holds more than
//! `max_calls` calls. Callers that would exceed the budget wait (in submission order) instead of
//! being rejected. The limiter never retries and never inspects the action's result.

// std
use std::{
	num::NonZeroU32,
	time::{Duration as StdDuration, Instant as StdInstant},
};
// crates.io
use governor::{
	Quota, RateLimiter as Gcra,
	clock::Clock,
	middleware::NoOpMiddleware,
	state::{InMemoryState, NotKeyed},
};
use tokio::{
	sync::Mutex as FairMutex,
	time::{self, Instant},
};
// self
use crate::{
	_prelude::*,
	obs,
	service::{ServiceKind, SyncConfig},
};

type LaneCell = Gcra<NotKeyed, InMemoryState, TokioClock, NoOpMiddleware<StdInstant>>;

/// Call ceiling for one service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RatePolicy {
	/// Calls admitted per window.
	pub max_calls: u32,
	/// Window length.
	pub per: StdDuration,
}
impl RatePolicy {
	/// Creates a policy admitting `max_calls` per `per`.
	pub const fn new(max_calls: u32, per: StdDuration) -> Self {
		Self { max_calls, per }
	}

	/// Minimum spacing between two admissions.
	///
	/// Rounded up so `max_calls` intervals always cover the whole window.
	pub fn interval(self) -> StdDuration {
		let nanos = self.per.as_nanos().div_ceil(u128::from(self.max_calls.max(1)));

		StdDuration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
	}

	fn quota(self) -> Quota {
		Quota::with_period(self.interval()).unwrap_or_else(|| Quota::per_second(NonZeroU32::MAX))
	}
}

/// [`governor`] clock backed by `tokio::time`, so paused runtimes drive admission too.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioClock;
impl Clock for TokioClock {
	type Instant = StdInstant;

	fn now(&self) -> Self::Instant {
		Instant::now().into_std()
	}
}

struct Lane {
	policy: RatePolicy,
	cell: LaneCell,
	queue: FairMutex<()>,
}
impl Lane {
	fn new(policy: RatePolicy) -> Self {
		Self {
			policy,
			cell: Gcra::direct_with_clock(policy.quota(), TokioClock),
			queue: FairMutex::new(()),
		}
	}

	/// Waits for budget and records the admission; returns how long the caller waited.
	///
	/// The queue lock is held while sleeping so later callers line up behind earlier ones.
	/// Dropping the future before it resolves spends no budget.
	async fn admit(&self) -> StdDuration {
		let _turn = self.queue.lock().await;
		let started = Instant::now();

		while let Err(not_until) = self.cell.check() {
			time::sleep(not_until.wait_time_from(TokioClock.now())).await;
		}

		started.elapsed()
	}
}
impl Debug for Lane {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Lane").field("policy", &self.policy).finish_non_exhaustive()
	}
}

/// Serializes remote calls per service so each service's ceiling is never exceeded.
#[derive(Debug)]
pub struct RateLimiter {
	lanes: [Lane; 3],
}
impl RateLimiter {
	/// Builds one lane per service from the configured profiles.
	pub fn new(config: &SyncConfig) -> Self {
		Self { lanes: ServiceKind::ALL.map(|kind| Lane::new(config.profile(kind).rate)) }
	}

	/// Replaces the lane for `service` with a fresh one using `policy`.
	pub fn with_policy(mut self, service: ServiceKind, policy: RatePolicy) -> Self {
		self.lanes[service.index()] = Lane::new(policy);

		self
	}

	/// Returns the policy enforced for `service`.
	pub fn policy(&self, service: ServiceKind) -> RatePolicy {
		self.lane(service).policy
	}

	/// Runs `action` once the lane for `service` has budget.
	///
	/// `key` labels the call for logs only; limiting is per service. Whatever `action`
	/// resolves to, error or not, is returned untouched.
	pub async fn execute<F, Fut>(&self, service: ServiceKind, key: &str, action: F) -> Fut::Output
	where
		F: FnOnce() -> Fut,
		Fut: Future,
	{
		let waited = self.lane(service).admit().await;

		self.run_admitted(service, key, waited, action).await
	}

	/// Like [`execute`](Self::execute), but leaves the queue as soon as `cancel` trips.
	///
	/// Returns `None` when cancelled before admission; the lane budget is left untouched.
	pub async fn execute_until_cancelled<F, Fut>(
		&self,
		service: ServiceKind,
		key: &str,
		cancel: &CancellationToken,
		action: F,
	) -> Option<Fut::Output>
	where
		F: FnOnce() -> Fut,
		Fut: Future,
	{
		let waited = tokio::select! {
			biased;
			_ = cancel.cancelled() => {
				#[cfg(feature = "tracing")]
				tracing::debug!(service = service.as_str(), key, "queued remote call cancelled");

				return None;
			},
			waited = self.lane(service).admit() => waited,
		};

		Some(self.run_admitted(service, key, waited, action).await)
	}

	async fn run_admitted<F, Fut>(
		&self,
		service: ServiceKind,
		key: &str,
		waited: StdDuration,
		action: F,
	) -> Fut::Output
	where
		F: FnOnce() -> Fut,
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			if waited.is_zero() {
				tracing::trace!(service = service.as_str(), key, "remote call admitted");
			} else {
				tracing::debug!(
					service = service.as_str(),
					key,
					waited_ms = waited.as_millis() as u64,
					"remote call delayed by rate limit"
				);
			}
		}
		#[cfg(not(feature = "tracing"))]
		let _ = (key, waited);

		obs::record_remote_call(service);

		action().await
	}

	fn lane(&self, service: ServiceKind) -> &Lane {
		&self.lanes[service.index()]
	}
}
impl Default for RateLimiter {
	fn default() -> Self {
		Self::new(&SyncConfig::default())
	}
}
