//! Unpaginated listing: one status call, converted in fixed-size chunks.

// self
use crate::{
	_prelude::*,
	credential::Credential,
	fetch::{FetchOptions, LibraryFetcher},
	record::CanonicalRecord,
	service::ServiceKind,
};

const SERVICE: ServiceKind = ServiceKind::AllDebrid;
const DEFAULT_CHUNK_SIZE: usize = 50;

impl LibraryFetcher {
	pub(super) async fn fetch_alldebrid(
		&self,
		credential: &Credential,
		options: &FetchOptions,
	) -> Result<Vec<CanonicalRecord>> {
		let chunk_size =
			self.config.profile(SERVICE).chunk_size().unwrap_or(DEFAULT_CHUNK_SIZE).max(1);
		let remote = &self.remotes.alldebrid;
		let status =
			self.call(SERVICE, "magnet-status", options, || remote.status(credential)).await?;
		let magnets = status.into_magnets();
		let total = magnets.len();
		let mut records = Vec::with_capacity(total);

		#[cfg(feature = "tracing")]
		tracing::debug!(service = SERVICE.as_str(), total, chunk_size, "converting magnet list");

		for chunk in magnets.chunks(chunk_size) {
			options.ensure_active()?;

			let converted = self.converters.convert_all(SERVICE, chunk);

			options.emit_batch(&converted);
			records.extend(converted);
			options.report_progress(records.len(), Some(total));
		}

		Ok(records)
	}
}
