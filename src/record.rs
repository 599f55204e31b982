//! Canonical library records shared by every service.

// self
use crate::{_prelude::*, service::ServiceKind};

/// Service-scoped record identifier rendered as `{prefix}:{remote id}` (e.g. `rd:ABC123`).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RecordId {
	service: ServiceKind,
	remote: String,
}
impl RecordId {
	/// Scopes a remote identifier by its service prefix.
	pub fn new(service: ServiceKind, remote: impl Into<String>) -> Self {
		Self { service, remote: remote.into() }
	}

	/// Service that issued the identifier.
	pub fn service(&self) -> ServiceKind {
		self.service
	}

	/// Identifier exactly as the remote service issued it.
	pub fn remote(&self) -> &str {
		&self.remote
	}
}
impl Debug for RecordId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "RecordId({self})")
	}
}
impl Display for RecordId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}:{}", self.service.prefix(), self.remote)
	}
}
impl From<RecordId> for String {
	fn from(value: RecordId) -> Self {
		value.to_string()
	}
}
impl TryFrom<String> for RecordId {
	type Error = RecordIdError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}
impl FromStr for RecordId {
	type Err = RecordIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let (prefix, remote) =
			s.split_once(':').ok_or_else(|| RecordIdError { value: s.to_owned() })?;
		let service = ServiceKind::ALL
			.into_iter()
			.find(|kind| kind.prefix() == prefix)
			.ok_or_else(|| RecordIdError { value: s.to_owned() })?;

		if remote.is_empty() {
			return Err(RecordIdError { value: s.to_owned() });
		}

		Ok(Self::new(service, remote))
	}
}

/// Error returned when a record identifier lacks a known service prefix.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Record identifier `{value}` is not scoped by a known service prefix.")]
pub struct RecordIdError {
	/// Identifier that failed to parse.
	pub value: String,
}

/// Lifecycle of a library item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
	/// Queued, magnet resolution, or file selection pending.
	#[default]
	Waiting,
	/// Transfer in progress.
	Downloading,
	/// Transfer complete (downloaded or seeding).
	Finished,
	/// Transfer failed, dead, or rejected.
	Failed,
}

/// Service-agnostic representation of one library item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
	/// Service-scoped identifier.
	pub id: RecordId,
	/// Content (info) hash, lowercase hex.
	pub hash: String,
	/// Display name.
	pub name: String,
	/// Total size in bytes.
	pub bytes: u64,
	/// Lifecycle status.
	pub status: RecordStatus,
	/// Completion percentage in `0.0..=100.0`.
	pub progress: f64,
	/// Retrieval links.
	#[serde(default)]
	pub links: Vec<String>,
	/// Service-specific passthrough fields used for deep-linking.
	#[serde(default)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}
impl CanonicalRecord {
	/// Creates a waiting record with no progress, links, or passthrough fields.
	pub fn new(
		service: ServiceKind,
		remote_id: impl Into<String>,
		hash: impl AsRef<str>,
		name: impl Into<String>,
	) -> Self {
		Self {
			id: RecordId::new(service, remote_id),
			hash: hash.as_ref().to_ascii_lowercase(),
			name: name.into(),
			bytes: 0,
			status: RecordStatus::default(),
			progress: 0.,
			links: Vec::new(),
			extra: Default::default(),
		}
	}

	/// Service the record belongs to.
	pub fn service(&self) -> ServiceKind {
		self.id.service()
	}

	/// Identity used to de-duplicate library entries: `(service, hash)`.
	pub fn identity(&self) -> (ServiceKind, &str) {
		(self.service(), &self.hash)
	}

	/// Sets the byte size.
	pub fn with_bytes(mut self, bytes: u64) -> Self {
		self.bytes = bytes;

		self
	}

	/// Sets the lifecycle status.
	pub fn with_status(mut self, status: RecordStatus) -> Self {
		self.status = status;

		self
	}

	/// Sets the progress percentage, clamped to `0.0..=100.0`.
	pub fn with_progress(mut self, progress: f64) -> Self {
		self.progress = if progress.is_nan() { 0. } else { progress.clamp(0., 100.) };

		self
	}

	/// Replaces the retrieval links.
	pub fn with_links<I, S>(mut self, links: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.links = links.into_iter().map(Into::into).collect();

		self
	}

	/// Adds one passthrough field.
	pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		self.extra.insert(key.into(), value.into());

		self
	}
}
