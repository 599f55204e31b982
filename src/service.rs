//! Remote service identities (data) and their pagination/rate profiles (behavior knobs).
//!
//! `ServiceKind` names the three supported services. `profile` exposes validated
//! [`ServiceProfile`] values describing each service's published rate ceiling and
//! pagination model, and [`SyncConfig`] groups them with the library cache TTL.

pub mod profile;

pub use profile::*;

// self
use crate::_prelude::*;

/// Remote services whose libraries can be synchronized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
	/// Real-Debrid: page-numbered listing with a total-count header.
	RealDebrid,
	/// AllDebrid: one unpaginated magnet status call.
	AllDebrid,
	/// TorBox: offset-based listing.
	Torbox,
}
impl ServiceKind {
	/// Every supported service, in a stable order.
	pub const ALL: [ServiceKind; 3] = [Self::RealDebrid, Self::AllDebrid, Self::Torbox];

	/// Returns a stable label used in cache keys, span fields, and metric labels.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::RealDebrid => "realdebrid",
			Self::AllDebrid => "alldebrid",
			Self::Torbox => "torbox",
		}
	}

	pub(crate) const fn index(self) -> usize {
		match self {
			Self::RealDebrid => 0,
			Self::AllDebrid => 1,
			Self::Torbox => 2,
		}
	}

	/// Returns the short prefix used to scope canonical record identifiers.
	pub const fn prefix(self) -> &'static str {
		match self {
			Self::RealDebrid => "rd",
			Self::AllDebrid => "ad",
			Self::Torbox => "tb",
		}
	}
}
impl Display for ServiceKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for ServiceKind {
	type Err = UnknownServiceError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"realdebrid" | "real-debrid" | "rd" => Ok(Self::RealDebrid),
			"alldebrid" | "ad" => Ok(Self::AllDebrid),
			"torbox" | "tb" => Ok(Self::Torbox),
			_ => Err(UnknownServiceError { value: s.to_owned() }),
		}
	}
}

/// Error returned when a service label cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown service `{value}`.")]
pub struct UnknownServiceError {
	/// Label that failed to parse.
	pub value: String,
}

/// Fetcher-wide configuration: one profile per service plus the library cache TTL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
	/// Real-Debrid profile.
	pub realdebrid: ServiceProfile,
	/// AllDebrid profile.
	pub alldebrid: ServiceProfile,
	/// TorBox profile.
	pub torbox: ServiceProfile,
	/// Lifetime of a cached library listing.
	pub library_ttl: Duration,
}
impl SyncConfig {
	/// Default lifetime of a cached library listing.
	pub const DEFAULT_LIBRARY_TTL: Duration = Duration::minutes(5);

	/// Returns the profile for `service`.
	pub fn profile(&self, service: ServiceKind) -> &ServiceProfile {
		match service {
			ServiceKind::RealDebrid => &self.realdebrid,
			ServiceKind::AllDebrid => &self.alldebrid,
			ServiceKind::Torbox => &self.torbox,
		}
	}

	/// Replaces the profile matching `profile.kind`.
	pub fn with_profile(mut self, profile: ServiceProfile) -> Self {
		match profile.kind {
			ServiceKind::RealDebrid => self.realdebrid = profile,
			ServiceKind::AllDebrid => self.alldebrid = profile,
			ServiceKind::Torbox => self.torbox = profile,
		}

		self
	}

	/// Overrides the library cache TTL.
	pub fn with_library_ttl(mut self, ttl: Duration) -> Self {
		self.library_ttl = ttl;

		self
	}
}
impl Default for SyncConfig {
	fn default() -> Self {
		Self {
			realdebrid: ServiceProfile::default_for(ServiceKind::RealDebrid),
			alldebrid: ServiceProfile::default_for(ServiceKind::AllDebrid),
			torbox: ServiceProfile::default_for(ServiceKind::Torbox),
			library_ttl: Self::DEFAULT_LIBRARY_TTL,
		}
	}
}
