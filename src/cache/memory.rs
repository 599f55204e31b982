//! Thread-safe in-memory [`CacheBackend`] implementation.

// self
use crate::{
	_prelude::*,
	cache::{CacheBackend, CacheEntry, CacheFuture},
};

type EntryMap = Arc<RwLock<HashMap<String, CacheEntry>>>;

/// Process-local cache backend; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache(EntryMap);
impl MemoryCache {
	/// Number of stored entries, expired ones included.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no entries are stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Returns `true` when an entry (valid or not) exists for `key`.
	pub fn contains_key(&self, key: &str) -> bool {
		self.0.read().contains_key(key)
	}

	fn retain_now(map: EntryMap, mut keep: impl FnMut(&CacheEntry) -> bool) -> usize {
		let mut guard = map.write();
		let before = guard.len();

		guard.retain(|_, entry| keep(entry));

		before - guard.len()
	}
}
impl CacheBackend for MemoryCache {
	fn load<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<CacheEntry>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(key).cloned()) })
	}

	fn store(&self, key: String, entry: CacheEntry) -> CacheFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(key, entry);

			Ok(())
		})
	}

	fn remove<'a>(&'a self, keys: &'a [&'a str]) -> CacheFuture<'a, usize> {
		let map = self.0.clone();

		Box::pin(async move {
			let mut guard = map.write();

			Ok(keys.iter().filter(|key| guard.remove(**key).is_some()).count())
		})
	}

	fn remove_all(&self) -> CacheFuture<'_, usize> {
		let map = self.0.clone();

		Box::pin(async move { Ok(std::mem::take(&mut *map.write()).len()) })
	}

	fn remove_tagged<'a>(&'a self, tag: &'a str) -> CacheFuture<'a, usize> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::retain_now(map, |entry| !entry.tags.contains(tag))) })
	}

	fn remove_expired(&self, now: OffsetDateTime) -> CacheFuture<'_, usize> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::retain_now(map, |entry| entry.is_valid_at(now))) })
	}
}
