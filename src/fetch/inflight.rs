//! Single-flight registry keyed by `service:credential`.
//!
//! The registry only holds weak handles, so a fetch lives exactly as long as some caller still
//! awaits it. Each entry is tagged with a generation; the settle guard inside the fetch removes
//! the entry when the fetch finishes or is dropped, but only if the entry still belongs to the
//! same generation (a forced refresh may have replaced it meanwhile).

// crates.io
use futures::{
	FutureExt,
	future::{BoxFuture, Shared, WeakShared},
};
// self
use crate::{_prelude::*, record::CanonicalRecord};

pub(crate) type FetchOutput = Result<Arc<Vec<CanonicalRecord>>>;
pub(crate) type SharedFetch = Shared<BoxFuture<'static, FetchOutput>>;

type WeakFetch = WeakShared<BoxFuture<'static, FetchOutput>>;

/// In-flight library fetches shared by every clone of a fetcher.
#[derive(Clone, Debug, Default)]
pub struct InFlightRegistry(Arc<Mutex<RegistryState>>);
impl InFlightRegistry {
	/// Number of fetches currently registered.
	pub fn len(&self) -> usize {
		self.0.lock().entries.len()
	}

	/// Returns `true` when nothing is in flight.
	pub fn is_empty(&self) -> bool {
		self.0.lock().entries.is_empty()
	}

	/// Returns `true` while a fetch for `key` is registered.
	pub fn contains(&self, key: &str) -> bool {
		self.0.lock().entries.contains_key(key)
	}

	/// Attaches to the fetch registered under `key`, or registers the one built by `start`.
	///
	/// With `force` set the existing entry is ignored and replaced. The returned flag is `true`
	/// when the caller attached to an existing fetch. `start` runs under the registry lock and
	/// must only construct the future.
	pub(crate) fn join_or_start<F>(&self, key: String, force: bool, start: F) -> (SharedFetch, bool)
	where
		F: FnOnce() -> BoxFuture<'static, FetchOutput>,
	{
		let mut state = self.0.lock();
		let existing = if force {
			None
		} else {
			state.entries.get(&key).and_then(|entry| entry.fetch.upgrade())
		};

		if let Some(fetch) = existing {
			return (fetch, true);
		}

		state.generation += 1;

		let guard =
			SettleGuard { registry: self.clone(), key: key.clone(), generation: state.generation };
		let inner = start();
		let fetch = async move {
			let _guard = guard;

			inner.await
		}
		.boxed()
		.shared();

		if let Some(weak) = fetch.downgrade() {
			let generation = state.generation;

			state.entries.insert(key, Entry { generation, fetch: weak });
		}

		(fetch, false)
	}

	fn settle(&self, key: &str, generation: u64) {
		let mut state = self.0.lock();

		if state.entries.get(key).is_some_and(|entry| entry.generation == generation) {
			state.entries.remove(key);
		}
	}
}

#[derive(Default)]
struct RegistryState {
	generation: u64,
	entries: HashMap<String, Entry>,
}
impl Debug for RegistryState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RegistryState")
			.field("generation", &self.generation)
			.field("keys", &self.entries.len())
			.finish()
	}
}

struct Entry {
	generation: u64,
	fetch: WeakFetch,
}

struct SettleGuard {
	registry: InFlightRegistry,
	key: String,
	generation: u64,
}
impl Drop for SettleGuard {
	fn drop(&mut self) {
		self.registry.settle(&self.key, self.generation);
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// crates.io
	use tokio::sync::oneshot;
	// self
	use super::*;

	fn ready(records: usize) -> BoxFuture<'static, FetchOutput> {
		async move { Ok(Arc::new(Vec::with_capacity(records))) }.boxed()
	}

	#[tokio::test]
	async fn concurrent_callers_share_one_fetch() {
		let registry = InFlightRegistry::default();
		let starts = AtomicUsize::new(0);
		let (release, gate) = oneshot::channel::<()>();
		let (first, joined_first) = registry.join_or_start("rd:tok".into(), false, || {
			starts.fetch_add(1, Ordering::SeqCst);

			async move {
				let _ = gate.await;

				Ok(Arc::new(Vec::new()))
			}
			.boxed()
		});
		let (second, joined_second) = registry.join_or_start("rd:tok".into(), false, || {
			starts.fetch_add(1, Ordering::SeqCst);

			ready(0)
		});

		assert!(!joined_first);
		assert!(joined_second);
		assert!(registry.contains("rd:tok"));

		let _ = release.send(());
		let (a, b) = tokio::join!(first, second);

		assert!(a.is_ok() && b.is_ok());
		assert_eq!(starts.load(Ordering::SeqCst), 1);
		assert!(registry.is_empty());
	}

	#[tokio::test]
	async fn failed_fetch_clears_its_entry() {
		let registry = InFlightRegistry::default();
		let (fetch, _) = registry.join_or_start("tb:tok".into(), false, || {
			async { Err(Error::Cancelled) }.boxed()
		});

		assert!(matches!(fetch.await, Err(Error::Cancelled)));
		assert!(registry.is_empty());
	}

	#[tokio::test]
	async fn forced_start_is_not_cleared_by_the_older_fetch() {
		let registry = InFlightRegistry::default();
		let (old, _) = registry.join_or_start("ad:tok".into(), false, || ready(0));
		let (release, gate) = oneshot::channel::<()>();
		let (forced, joined) = registry.join_or_start("ad:tok".into(), true, || {
			async move {
				let _ = gate.await;

				Ok(Arc::new(Vec::new()))
			}
			.boxed()
		});

		assert!(!joined);

		old.await.expect("Older fetch should complete.");

		assert!(registry.contains("ad:tok"), "the forced fetch still owns the key");

		let _ = release.send(());

		forced.await.expect("Forced fetch should complete.");

		assert!(registry.is_empty());
	}

	#[test]
	fn abandoned_fetch_is_removed() {
		let registry = InFlightRegistry::default();
		let (fetch, _) = registry.join_or_start("rd:tok".into(), false, || ready(0));

		assert_eq!(registry.len(), 1);

		drop(fetch);

		assert!(registry.is_empty());
	}
}
