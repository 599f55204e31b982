//! Rate-limited, cache-backed library synchronization for debrid services.
//!
//! Real-Debrid, AllDebrid, and TorBox listings are normalized into one canonical record stream,
//! with at most one fetch in flight per service and credential.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cache;
pub mod convert;
pub mod credential;
pub mod error;
pub mod fetch;
pub mod limiter;
pub mod obs;
pub mod record;
pub mod remote;
pub mod service;

mod _prelude {
	pub use std::{
		collections::{BTreeSet, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use tokio_util::sync::CancellationToken;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use tokio_util::sync::CancellationToken;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
