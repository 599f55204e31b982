//! Remote listing contracts for the three services plus the reqwest-backed client.
//!
//! The traits mirror each service's listing endpoint at the level the fetcher needs: raw items
//! plus whatever signal ends pagination (a total count, an unpaginated list, or a success flag).
//! Implementations own authentication and transport; they must not retry, since backoff belongs
//! below this boundary.

#[cfg(feature = "reqwest")] pub mod client;
#[cfg(feature = "reqwest")] pub use client::*;

// self
use crate::{_prelude::*, convert::RawItem, credential::Credential};

/// Boxed future returned by the remote contracts.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// One Real-Debrid listing page.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RealDebridPage {
	/// Items on this page, in service order.
	pub items: Vec<RawItem>,
	/// Total library size reported by the service.
	pub total_count: usize,
}

/// AllDebrid magnet status payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AllDebridStatus {
	/// Response data; absent when the library is empty.
	#[serde(default)]
	pub data: Option<AllDebridData>,
}
impl AllDebridStatus {
	/// Builds a status payload carrying `magnets`.
	pub fn with_magnets(magnets: Vec<RawItem>) -> Self {
		Self { data: Some(AllDebridData { magnets: Some(magnets) }) }
	}

	/// Consumes the payload, treating a missing `data.magnets` as an empty library.
	pub fn into_magnets(self) -> Vec<RawItem> {
		self.data.and_then(|data| data.magnets).unwrap_or_default()
	}
}

/// `data` object inside [`AllDebridStatus`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AllDebridData {
	/// Magnets in service order.
	#[serde(default)]
	pub magnets: Option<Vec<RawItem>>,
}

/// Query for one TorBox listing page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TorboxQuery {
	/// Ask the service to skip its own response cache.
	pub bypass_cache: bool,
	/// Number of items to skip.
	pub offset: usize,
	/// Page size.
	pub limit: usize,
}

/// One TorBox listing page.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TorboxPage {
	/// Whether the service reported success; `false` ends pagination.
	pub success: bool,
	/// Items on this page, in service order.
	#[serde(default)]
	pub data: Vec<RawItem>,
}

/// Real-Debrid-like page-numbered listing.
pub trait RealDebridApi
where
	Self: Send + Sync,
{
	/// Lists page `page` (1-based) with `page_size` items per page.
	fn list<'a>(
		&'a self,
		credential: &'a Credential,
		page_size: usize,
		page: usize,
	) -> RemoteFuture<'a, RealDebridPage>;
}

/// AllDebrid-like unpaginated status endpoint.
pub trait AllDebridApi
where
	Self: Send + Sync,
{
	/// Returns every magnet in the library.
	fn status<'a>(&'a self, credential: &'a Credential) -> RemoteFuture<'a, AllDebridStatus>;
}

/// TorBox-like offset listing.
pub trait TorboxApi
where
	Self: Send + Sync,
{
	/// Lists one page described by `query`.
	fn list<'a>(&'a self, credential: &'a Credential, query: TorboxQuery)
	-> RemoteFuture<'a, TorboxPage>;
}

/// The three remote collaborators the fetcher drives.
#[derive(Clone)]
pub struct Remotes {
	/// Real-Debrid listing.
	pub realdebrid: Arc<dyn RealDebridApi>,
	/// AllDebrid status.
	pub alldebrid: Arc<dyn AllDebridApi>,
	/// TorBox listing.
	pub torbox: Arc<dyn TorboxApi>,
}
impl Remotes {
	/// Bundles three independent endpoint implementations.
	pub fn new(
		realdebrid: Arc<dyn RealDebridApi>,
		alldebrid: Arc<dyn AllDebridApi>,
		torbox: Arc<dyn TorboxApi>,
	) -> Self {
		Self { realdebrid, alldebrid, torbox }
	}

	/// Uses one client that implements every contract.
	pub fn shared<C>(client: Arc<C>) -> Self
	where
		C: 'static + RealDebridApi + AllDebridApi + TorboxApi,
	{
		Self { realdebrid: client.clone(), alldebrid: client.clone(), torbox: client }
	}
}
impl Debug for Remotes {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Remotes(..)")
	}
}
