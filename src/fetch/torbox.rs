//! Offset pagination: pages are requested one after another until the listing runs dry.

// self
use crate::{
	_prelude::*,
	credential::Credential,
	fetch::{FetchOptions, LibraryFetcher},
	record::CanonicalRecord,
	remote::TorboxQuery,
	service::ServiceKind,
};

const SERVICE: ServiceKind = ServiceKind::Torbox;

impl LibraryFetcher {
	/// Ends on an unsuccessful page, an empty page, a short page, or once `max_items` is reached.
	pub(super) async fn fetch_torbox(
		&self,
		credential: &Credential,
		options: &FetchOptions,
	) -> Result<Vec<CanonicalRecord>> {
		let limit = self.config.profile(SERVICE).page_size(options.page_size).unwrap_or(1);
		let remote = &self.remotes.torbox;
		let mut records = Vec::new();
		let mut offset = 0;

		loop {
			if options.max_items.is_some_and(|max| records.len() >= max) {
				break;
			}

			// Freshness is governed by the library cache, not the service's own.
			let query = TorboxQuery { bypass_cache: true, offset, limit };
			let key = format!("offset-{offset}");
			let page = self.call(SERVICE, &key, options, || remote.list(credential, query)).await?;

			if !page.success || page.data.is_empty() {
				#[cfg(feature = "tracing")]
				tracing::trace!(
					service = SERVICE.as_str(),
					offset,
					success = page.success,
					"listing exhausted"
				);

				break;
			}

			let received = page.data.len();
			let converted = self.converters.convert_all(SERVICE, &page.data);

			options.emit_batch(&converted);
			records.extend(converted);
			options.report_progress(records.len(), None);

			if received < limit {
				break;
			}

			offset += received;
		}

		Ok(records)
	}
}
