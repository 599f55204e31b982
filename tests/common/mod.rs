//! Scripted remotes, converters, and a fetcher harness shared by the integration tests.

#![allow(dead_code)]

// std
use std::{
	collections::VecDeque,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration as StdDuration,
};
// crates.io
use parking_lot::Mutex;
use serde_json::json;
// self
use debrid_library_sync::{
	cache::{CacheManager, ManualClock, MemoryCache},
	convert::{Converters, RawItem},
	credential::Credential,
	error::{Error, TransportError},
	fetch::LibraryFetcher,
	record::CanonicalRecord,
	remote::{
		AllDebridApi, AllDebridStatus, RealDebridApi, RealDebridPage, RemoteFuture, Remotes,
		TorboxApi, TorboxPage, TorboxQuery,
	},
	service::ServiceKind,
};

/// Builds a raw item the test converters understand.
pub fn raw_item(prefix: &str, idx: usize) -> RawItem {
	json!({
		"id": format!("{prefix}-{idx}"),
		"hash": format!("{prefix}HASH{idx:04}"),
		"name": format!("{prefix} item {idx}"),
	})
}

fn convert_with(service: ServiceKind) -> impl Fn(&RawItem) -> CanonicalRecord + Send + Sync {
	move |raw| {
		CanonicalRecord::new(
			service,
			raw["id"].as_str().unwrap_or_default(),
			raw["hash"].as_str().unwrap_or_default(),
			raw["name"].as_str().unwrap_or_default(),
		)
	}
}

/// Converters reading `id`, `hash`, and `name` from every raw item.
pub fn converters() -> Converters {
	Converters::new(
		convert_with(ServiceKind::RealDebrid),
		convert_with(ServiceKind::AllDebrid),
		convert_with(ServiceKind::Torbox),
	)
}

pub fn credential(raw: &str) -> Credential {
	Credential::new(raw).expect("Credential fixture should be valid.")
}

fn unavailable(service: &'static str) -> Error {
	TransportError::Status { service, status: 503, body: Some("maintenance".into()) }.into()
}

/// Page-numbered listing over `total` synthetic items.
#[derive(Debug, Default)]
pub struct FakeRealDebrid {
	/// Count reported in every page's total.
	pub total: usize,
	/// Items actually served when fewer than `total` exist.
	pub listed: Option<usize>,
	/// Per-request totals handed out before falling back to `total`.
	pub totals: Mutex<VecDeque<usize>>,
	pub delay: Option<StdDuration>,
	pub fail_page: Option<usize>,
	/// `(page, limit)` per request, in call order.
	pub requests: Mutex<Vec<(usize, usize)>>,
}
impl FakeRealDebrid {
	pub fn with_total(total: usize) -> Self {
		Self { total, ..Default::default() }
	}

	/// Serves `totals` to successive requests, one each.
	pub fn with_totals(totals: impl IntoIterator<Item = usize>) -> Self {
		Self { totals: Mutex::new(totals.into_iter().collect()), ..Default::default() }
	}

	pub fn requests(&self) -> Vec<(usize, usize)> {
		self.requests.lock().clone()
	}

	pub fn calls(&self) -> usize {
		self.requests.lock().len()
	}
}
impl RealDebridApi for FakeRealDebrid {
	fn list<'a>(
		&'a self,
		_credential: &'a Credential,
		page_size: usize,
		page: usize,
	) -> RemoteFuture<'a, RealDebridPage> {
		Box::pin(async move {
			self.requests.lock().push((page, page_size));

			let total = self.totals.lock().pop_front().unwrap_or(self.total);

			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}
			if self.fail_page == Some(page) {
				return Err(unavailable("realdebrid"));
			}

			let start = (page - 1).saturating_mul(page_size);
			let end = start.saturating_add(page_size).min(self.listed.unwrap_or(total));
			let items = (start..end).map(|idx| raw_item("rd", idx)).collect();

			Ok(RealDebridPage { items, total_count: total })
		})
	}
}

/// Unpaginated status endpoint; `magnets: None` omits `data` entirely.
#[derive(Debug, Default)]
pub struct FakeAllDebrid {
	pub magnets: Option<usize>,
	pub fail: bool,
	pub calls: AtomicUsize,
}
impl FakeAllDebrid {
	pub fn with_magnets(count: usize) -> Self {
		Self { magnets: Some(count), ..Default::default() }
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl AllDebridApi for FakeAllDebrid {
	fn status<'a>(&'a self, _credential: &'a Credential) -> RemoteFuture<'a, AllDebridStatus> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			if self.fail {
				return Err(unavailable("alldebrid"));
			}

			Ok(match self.magnets {
				Some(count) =>
					AllDebridStatus::with_magnets((0..count).map(|idx| raw_item("ad", idx)).collect()),
				None => AllDebridStatus::default(),
			})
		})
	}
}

/// Offset listing over `total` synthetic items.
///
/// Pages at or past `unsuccessful_from` report `success: false`.
#[derive(Debug, Default)]
pub struct FakeTorbox {
	pub total: usize,
	pub unsuccessful_from: Option<usize>,
	pub queries: Mutex<Vec<TorboxQuery>>,
}
impl FakeTorbox {
	pub fn with_total(total: usize) -> Self {
		Self { total, ..Default::default() }
	}

	pub fn queries(&self) -> Vec<TorboxQuery> {
		self.queries.lock().clone()
	}

	pub fn calls(&self) -> usize {
		self.queries.lock().len()
	}
}
impl TorboxApi for FakeTorbox {
	fn list<'a>(
		&'a self,
		_credential: &'a Credential,
		query: TorboxQuery,
	) -> RemoteFuture<'a, TorboxPage> {
		Box::pin(async move {
			self.queries.lock().push(query);

			if self.unsuccessful_from.is_some_and(|offset| query.offset >= offset) {
				return Ok(TorboxPage { success: false, data: Vec::new() });
			}

			let end = (query.offset + query.limit).min(self.total);
			let data = (query.offset..end).map(|idx| raw_item("tb", idx)).collect();

			Ok(TorboxPage { success: true, data })
		})
	}
}

/// A fetcher wired to the fakes, with a manually driven cache clock.
pub struct Harness {
	pub fetcher: LibraryFetcher,
	pub realdebrid: Arc<FakeRealDebrid>,
	pub alldebrid: Arc<FakeAllDebrid>,
	pub torbox: Arc<FakeTorbox>,
	pub cache: CacheManager,
	pub clock: ManualClock,
}
impl Harness {
	pub fn new(realdebrid: FakeRealDebrid, alldebrid: FakeAllDebrid, torbox: FakeTorbox) -> Self {
		let clock = ManualClock::default();
		let cache =
			CacheManager::with_clock(Arc::new(MemoryCache::default()), Arc::new(clock.clone()));

		Self::with_cache(realdebrid, alldebrid, torbox, cache, clock)
	}

	pub fn with_cache(
		realdebrid: FakeRealDebrid,
		alldebrid: FakeAllDebrid,
		torbox: FakeTorbox,
		cache: CacheManager,
		clock: ManualClock,
	) -> Self {
		let realdebrid = Arc::new(realdebrid);
		let alldebrid = Arc::new(alldebrid);
		let torbox = Arc::new(torbox);
		let remotes = Remotes::new(realdebrid.clone(), alldebrid.clone(), torbox.clone());
		let fetcher = LibraryFetcher::new(remotes, converters()).with_cache(cache.clone());

		Self { fetcher, realdebrid, alldebrid, torbox, cache, clock }
	}

	pub fn realdebrid(fake: FakeRealDebrid) -> Self {
		Self::new(fake, FakeAllDebrid::default(), FakeTorbox::default())
	}

	pub fn alldebrid(fake: FakeAllDebrid) -> Self {
		Self::new(FakeRealDebrid::default(), fake, FakeTorbox::default())
	}

	pub fn torbox(fake: FakeTorbox) -> Self {
		Self::new(FakeRealDebrid::default(), FakeAllDebrid::default(), fake)
	}
}
