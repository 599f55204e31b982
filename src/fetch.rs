//! Unified library fetcher: single-flight, cache-first, rate-limited pagination across services.
//!
//! [`LibraryFetcher::fetch_library`] deduplicates concurrent calls per `service:credential`,
//! serves unexpired cached listings without touching the network, and otherwise drives the
//! service's pagination model (`realdebrid`, `alldebrid`, `torbox` submodules) with every remote
//! call routed through the shared [`RateLimiter`]. Completed listings are cached for the
//! configured library TTL; failed or cancelled fetches leave existing cache entries untouched.

mod alldebrid;
mod inflight;
mod metrics;
mod realdebrid;
mod torbox;

pub use inflight::InFlightRegistry;
pub use metrics::FetchMetrics;

// std
use std::sync::atomic::{AtomicUsize, Ordering};
// crates.io
use futures::FutureExt;
// self
use crate::{
	_prelude::*,
	cache::CacheManager,
	convert::Converters,
	credential::Credential,
	limiter::RateLimiter,
	obs::{self, FetchOutcome, FetchSpan},
	record::CanonicalRecord,
	remote::Remotes,
	service::{ServiceKind, SyncConfig},
};

/// Progress callback receiving `(records done, expected total)`; the total is `None` while unknown.
pub type ProgressFn = Arc<dyn Fn(usize, Option<usize>) + Send + Sync>;
/// Callback receiving each converted page or chunk as soon as it is ready.
pub type BatchFn = Arc<dyn Fn(&[CanonicalRecord]) + Send + Sync>;

type SharedRecords = Arc<Vec<CanonicalRecord>>;

/// Per-call fetch configuration.
#[derive(Clone, Default)]
pub struct FetchOptions {
	/// Skips the cache read (the result is still written back).
	pub force_refresh: bool,
	/// Soft cap on records fetched; pagination stops once it is reached.
	pub max_items: Option<usize>,
	/// Pages fetched concurrently per batch (Real-Debrid only).
	pub concurrency: Option<usize>,
	/// Page size override, clamped to the service maximum.
	pub page_size: Option<usize>,
	/// Progress callback.
	pub on_progress: Option<ProgressFn>,
	/// Per-page/per-chunk callback.
	pub on_batch_complete: Option<BatchFn>,
	/// Cancellation signal checked before every remote call.
	pub cancel: CancellationToken,
}
impl FetchOptions {
	/// Creates options with every knob at its default.
	pub fn new() -> Self {
		Self::default()
	}

	/// Bypasses the cache read for this call.
	pub fn force_refresh(mut self) -> Self {
		self.force_refresh = true;

		self
	}

	/// Sets the soft item cap.
	pub fn with_max_items(mut self, max_items: usize) -> Self {
		self.max_items = Some(max_items);

		self
	}

	/// Sets the batch width.
	pub fn with_concurrency(mut self, concurrency: usize) -> Self {
		self.concurrency = Some(concurrency);

		self
	}

	/// Sets the page size override.
	pub fn with_page_size(mut self, page_size: usize) -> Self {
		self.page_size = Some(page_size);

		self
	}

	/// Installs a progress callback.
	pub fn on_progress(
		mut self,
		callback: impl 'static + Fn(usize, Option<usize>) + Send + Sync,
	) -> Self {
		self.on_progress = Some(Arc::new(callback));

		self
	}

	/// Installs a per-batch callback.
	pub fn on_batch_complete(
		mut self,
		callback: impl 'static + Fn(&[CanonicalRecord]) + Send + Sync,
	) -> Self {
		self.on_batch_complete = Some(Arc::new(callback));

		self
	}

	/// Uses `token` as the cancellation signal.
	pub fn with_cancel(mut self, token: CancellationToken) -> Self {
		self.cancel = token;

		self
	}

	fn ensure_active(&self) -> Result<()> {
		if self.cancel.is_cancelled() { Err(Error::Cancelled) } else { Ok(()) }
	}

	fn emit_batch(&self, records: &[CanonicalRecord]) {
		if let Some(callback) = &self.on_batch_complete {
			callback(records);
		}
	}

	fn report_progress(&self, done: usize, total: Option<usize>) {
		if let Some(callback) = &self.on_progress {
			callback(done, total);
		}
	}
}
impl Debug for FetchOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FetchOptions")
			.field("force_refresh", &self.force_refresh)
			.field("max_items", &self.max_items)
			.field("concurrency", &self.concurrency)
			.field("page_size", &self.page_size)
			.field("on_progress_set", &self.on_progress.is_some())
			.field("on_batch_complete_set", &self.on_batch_complete.is_some())
			.field("cancelled", &self.cancel.is_cancelled())
			.finish()
	}
}

/// Target of [`LibraryFetcher::clear_cache`]: one `(service, credential)` library.
pub type CacheTarget<'a> = (ServiceKind, &'a Credential);

/// Coordinates library fetches for every service.
///
/// The fetcher owns the remote clients, converters, cache, and rate limiter so strategy
/// implementations only deal with pagination. Clones share all state, including the in-flight
/// registry, so one fetcher can be handed to many tasks.
#[derive(Clone)]
pub struct LibraryFetcher {
	/// Remote endpoints driven by the strategies.
	pub remotes: Remotes,
	/// Raw-item converters, one per service.
	pub converters: Converters,
	/// Library cache.
	pub cache: CacheManager,
	/// Shared per-service rate limiter.
	pub limiter: Arc<RateLimiter>,
	/// Profiles and library TTL.
	pub config: Arc<SyncConfig>,
	/// In-process fetch counters.
	pub metrics: Arc<FetchMetrics>,
	in_flight: InFlightRegistry,
}
impl LibraryFetcher {
	/// Creates a fetcher with default profiles, an in-memory cache, and a matching rate limiter.
	pub fn new(remotes: Remotes, converters: Converters) -> Self {
		let config = SyncConfig::default();

		Self {
			remotes,
			converters,
			cache: CacheManager::default(),
			limiter: Arc::new(RateLimiter::new(&config)),
			config: Arc::new(config),
			metrics: Default::default(),
			in_flight: Default::default(),
		}
	}

	/// Replaces the configuration and rebuilds the rate limiter from its profiles.
	pub fn with_config(mut self, config: SyncConfig) -> Self {
		self.limiter = Arc::new(RateLimiter::new(&config));
		self.config = Arc::new(config);

		self
	}

	/// Replaces the library cache.
	pub fn with_cache(mut self, cache: CacheManager) -> Self {
		self.cache = cache;

		self
	}

	/// Shares an existing rate limiter (e.g. one used by other collaborators of the same service).
	pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
		self.limiter = limiter;

		self
	}

	/// Returns the cache key holding the library of `credential` on `service`.
	pub fn library_cache_key(service: ServiceKind, credential: &Credential) -> String {
		format!("{}:library:{}", service.as_str(), credential.expose())
	}

	/// Returns `true` while a fetch for `(service, credential)` is in flight.
	pub fn is_in_flight(&self, service: ServiceKind, credential: &Credential) -> bool {
		self.in_flight.contains(&fetch_key(service, credential))
	}

	/// Fetches the full library of `credential` on `service` as canonical records.
	///
	/// Concurrent calls for the same `(service, credential)` attach to the fetch already in flight
	/// unless `options.force_refresh` is set, in which case a fresh fetch starts and races the
	/// earlier one (the last cache write wins). Callbacks in `options` only fire for the call that
	/// started the fetch.
	pub async fn fetch_library(
		&self,
		service: ServiceKind,
		credential: &Credential,
		options: FetchOptions,
	) -> Result<Vec<CanonicalRecord>> {
		obs::record_fetch_outcome(service, FetchOutcome::Attempt);
		self.metrics.record_attempt();

		let force = options.force_refresh;
		let (fetch, joined) = self.in_flight.join_or_start(fetch_key(service, credential), force, || {
			let fetcher = self.clone();
			let credential = credential.clone();

			async move { fetcher.run(service, credential, options).await }.boxed()
		});

		if joined {
			#[cfg(feature = "tracing")]
			tracing::debug!(service = service.as_str(), "attached to in-flight library fetch");

			obs::record_fetch_outcome(service, FetchOutcome::Joined);
			self.metrics.record_joined();
		}

		fetch.await.map(Arc::unwrap_or_clone)
	}

	/// Clears the cached library for one `(service, credential)` pair, or every cached entry
	/// when `target` is `None`.
	pub async fn clear_cache(&self, target: Option<CacheTarget<'_>>) -> Result<usize> {
		let cleared = match target {
			Some((service, credential)) => {
				let key = Self::library_cache_key(service, credential);

				self.cache.clear(Some(&[key.as_str()])).await?
			},
			None => self.cache.clear(None).await?,
		};

		Ok(cleared)
	}

	async fn run(
		&self,
		service: ServiceKind,
		credential: Credential,
		options: FetchOptions,
	) -> Result<SharedRecords> {
		let pagination = self.config.profile(service).pagination.as_str();
		let span = FetchSpan::new(service, pagination, options.force_refresh);

		span.clone().instrument(async move {
			let cache_key = Self::library_cache_key(service, &credential);

			let cached = if options.force_refresh {
				None
			} else {
				self.cached_library(service, &cache_key).await
			};

			if let Some(cached) = cached {
				span.record_result("cache", cached.len());
				obs::record_fetch_outcome(service, FetchOutcome::CacheHit);
				self.metrics.record_cache_hit();

				return Ok(Arc::new(cached));
			}

			let result = match service {
				ServiceKind::RealDebrid => self.fetch_realdebrid(&credential, &options).await,
				ServiceKind::AllDebrid => self.fetch_alldebrid(&credential, &options).await,
				ServiceKind::Torbox => self.fetch_torbox(&credential, &options).await,
			};

			match result {
				Ok(records) => {
					span.record_result("remote", records.len());
					self.store_library(service, cache_key, &records).await;
					obs::record_fetch_outcome(service, FetchOutcome::Success);
					self.metrics.record_success();

					Ok(Arc::new(records))
				},
				Err(err) => {
					if err.is_cancelled() {
						obs::record_fetch_outcome(service, FetchOutcome::Cancelled);
						self.metrics.record_cancellation();
					} else {
						obs::record_fetch_outcome(service, FetchOutcome::Failure);
						self.metrics.record_failure();
					}

					#[cfg(feature = "tracing")]
					tracing::debug!(service = service.as_str(), error = %err, "library fetch failed");

					Err(err)
				},
			}
		})
		.await
	}

	/// Routes one remote call for `service` through the rate limiter.
	///
	/// A fetch cancelled while queued leaves the lane at once without spending budget, and
	/// cancellation is checked again once the lane admits the call.
	async fn call<F, Fut, T>(
		&self,
		service: ServiceKind,
		key: &str,
		options: &FetchOptions,
		action: F,
	) -> Result<T>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		options.ensure_active()?;

		self.limiter
			.execute_until_cancelled(service, key, &options.cancel, || async move {
				options.ensure_active()?;
				self.metrics.record_remote_call();

				action().await
			})
			.await
			.unwrap_or(Err(Error::Cancelled))
	}

	// A broken cache read degrades to a miss; the remote listing is authoritative.
	async fn cached_library(
		&self,
		service: ServiceKind,
		cache_key: &str,
	) -> Option<Vec<CanonicalRecord>> {
		match self.cache.get::<Vec<CanonicalRecord>>(cache_key).await {
			Ok(Some(records)) => {
				#[cfg(feature = "tracing")]
				tracing::debug!(
					service = service.as_str(),
					records = records.len(),
					"serving library from cache"
				);

				Some(records)
			},
			Ok(None) => None,
			Err(_err) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(service = service.as_str(), error = %_err, "library cache read failed");
				#[cfg(not(feature = "tracing"))]
				let _ = service;

				None
			},
		}
	}

	// A failed cache write does not fail a successful fetch.
	async fn store_library(
		&self,
		service: ServiceKind,
		cache_key: String,
		records: &[CanonicalRecord],
	) {
		if let Err(_err) = self.cache.set(cache_key, records, &[], self.config.library_ttl).await {
			#[cfg(feature = "tracing")]
			tracing::warn!(service = service.as_str(), error = %_err, "library cache write failed");
		}

		#[cfg(not(feature = "tracing"))]
		let _ = service;
	}
}
impl Debug for LibraryFetcher {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LibraryFetcher")
			.field("config", &self.config)
			.field("cache", &self.cache)
			.field("in_flight", &self.in_flight.len())
			.finish_non_exhaustive()
	}
}

/// Running count of converted records shared by concurrently completing pages.
#[derive(Debug, Default)]
struct ProgressCounter(AtomicUsize);
impl ProgressCounter {
	fn add(&self, records: usize) -> usize {
		self.0.fetch_add(records, Ordering::Relaxed) + records
	}
}

fn fetch_key(service: ServiceKind, credential: &Credential) -> String {
	format!("{}:{}", service.as_str(), credential.expose())
}
