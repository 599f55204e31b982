//! TTL cache contracts, the [`CacheManager`] facade, and the built-in in-memory backend.
//!
//! Entries carry their own `stored_at` + `ttl`; validity is decided at read time only
//! (`now - stored_at < ttl`). Expired entries read as absent and stay in the backend until
//! [`CacheManager::purge_expired`] or a clear removes them.

pub mod clock;
pub mod memory;

pub use clock::*;
pub use memory::MemoryCache;

// self
use crate::_prelude::*;

/// Boxed future returned by [`CacheBackend`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Storage backend contract implemented by cache stores.
pub trait CacheBackend
where
	Self: Send + Sync,
{
	/// Returns the raw entry for `key`, valid or not.
	fn load<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<CacheEntry>>;

	/// Persists or replaces the entry for `key`.
	fn store(&self, key: String, entry: CacheEntry) -> CacheFuture<'_, ()>;

	/// Removes the named keys, returning how many existed.
	fn remove<'a>(&'a self, keys: &'a [&'a str]) -> CacheFuture<'a, usize>;

	/// Removes every entry, returning how many existed.
	fn remove_all(&self) -> CacheFuture<'_, usize>;

	/// Removes every entry carrying `tag`, returning how many existed.
	fn remove_tagged<'a>(&'a self, tag: &'a str) -> CacheFuture<'a, usize>;

	/// Removes every entry that is no longer valid at `now`.
	fn remove_expired(&self, now: OffsetDateTime) -> CacheFuture<'_, usize>;
}

/// Error type produced by [`CacheBackend`] implementations and the [`CacheManager`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// A value could not be converted to or from its cached representation.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
impl From<serde_json::Error> for CacheError {
	fn from(e: serde_json::Error) -> Self {
		Self::Serialization { message: e.to_string() }
	}
}

/// One cached value with its expiry metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
	/// Serialized value.
	pub value: serde_json::Value,
	/// Instant the value was written.
	pub stored_at: OffsetDateTime,
	/// Lifetime measured from `stored_at`.
	pub ttl: Duration,
	/// Secondary index used for group invalidation.
	#[serde(default)]
	pub tags: BTreeSet<String>,
}
impl CacheEntry {
	/// Returns `true` while `now - stored_at < ttl`.
	pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
		now - self.stored_at < self.ttl
	}
}

/// Typed key/value cache with per-entry TTL over any [`CacheBackend`].
#[derive(Clone)]
pub struct CacheManager {
	backend: Arc<dyn CacheBackend>,
	clock: Arc<dyn Clock>,
}
impl CacheManager {
	/// Wraps a backend, reading time from the system clock.
	pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
		Self::with_clock(backend, Arc::new(SystemClock))
	}

	/// Wraps a backend with a caller-provided clock.
	pub fn with_clock(backend: Arc<dyn CacheBackend>, clock: Arc<dyn Clock>) -> Self {
		Self { backend, clock }
	}

	/// Returns the value stored under `key` iff an unexpired entry exists.
	pub async fn get<T>(&self, key: &str) -> Result<Option<T>, CacheError>
	where
		T: DeserializeOwned,
	{
		let Some(entry) = self.backend.load(key).await? else {
			return Ok(None);
		};

		if !entry.is_valid_at(self.clock.now()) {
			return Ok(None);
		}

		Ok(Some(serde_json::from_value(entry.value)?))
	}

	/// Stores `value` under `key` for `ttl`, indexed by `tags`.
	pub async fn set<T>(
		&self,
		key: impl Into<String>,
		value: &T,
		tags: &[&str],
		ttl: Duration,
	) -> Result<(), CacheError>
	where
		T: ?Sized + Serialize,
	{
		let entry = CacheEntry {
			value: serde_json::to_value(value)?,
			stored_at: self.clock.now(),
			ttl,
			tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
		};

		self.backend.store(key.into(), entry).await
	}

	/// Removes the named keys, or every entry when `keys` is `None`.
	///
	/// `Some(&[])` removes nothing; only the absent argument means "everything".
	pub async fn clear(&self, keys: Option<&[&str]>) -> Result<usize, CacheError> {
		match keys {
			Some(keys) => self.backend.remove(keys).await,
			None => self.backend.remove_all().await,
		}
	}

	/// Removes every entry stored with `tag`.
	pub async fn invalidate_tag(&self, tag: &str) -> Result<usize, CacheError> {
		self.backend.remove_tagged(tag).await
	}

	/// Evicts entries that are no longer valid.
	pub async fn purge_expired(&self) -> Result<usize, CacheError> {
		self.backend.remove_expired(self.clock.now()).await
	}
}
impl Default for CacheManager {
	fn default() -> Self {
		Self::new(Arc::new(MemoryCache::default()))
	}
}
impl Debug for CacheManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CacheManager").field("clock", &self.clock).finish_non_exhaustive()
	}
}
