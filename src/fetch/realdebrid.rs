//! Planned pagination: page 1 reveals the total, remaining pages are fetched in bounded batches.

// crates.io
use futures::future;
// self
use crate::{
	_prelude::*,
	credential::Credential,
	fetch::{FetchOptions, LibraryFetcher, ProgressCounter},
	record::CanonicalRecord,
	service::ServiceKind,
};

const SERVICE: ServiceKind = ServiceKind::RealDebrid;

/// Request shape shared by every page of one fetch.
#[derive(Clone, Copy, Debug)]
struct PagePlan {
	limit: usize,
	expected: usize,
}

impl LibraryFetcher {
	pub(super) async fn fetch_realdebrid(
		&self,
		credential: &Credential,
		options: &FetchOptions,
	) -> Result<Vec<CanonicalRecord>> {
		let profile = self.config.profile(SERVICE);
		let page_size = profile.page_size(options.page_size).unwrap_or(1);
		// Below one page the cap shrinks the request itself; above it, whole pages are kept.
		let limit = match options.max_items {
			Some(max) => page_size.min(max.max(1)),
			None => page_size,
		};
		let concurrency = profile.concurrency(options.concurrency);
		let remote = &self.remotes.realdebrid;
		let first =
			self.call(SERVICE, "page-1", options, || remote.list(credential, limit, 1)).await?;
		let total = first.total_count.max(first.items.len());
		let wanted = options.max_items.map_or(total, |max| total.min(max));
		let pages = wanted.div_ceil(limit).max(1);
		let plan = PagePlan { limit, expected: total.min(pages.saturating_mul(limit)) };

		#[cfg(feature = "tracing")]
		tracing::debug!(
			service = SERVICE.as_str(),
			total,
			pages,
			limit,
			concurrency,
			"planned library pagination"
		);

		let progress = ProgressCounter::default();
		let mut records = self.converters.convert_all(SERVICE, &first.items);

		options.emit_batch(&records);
		options.report_progress(progress.add(records.len()), Some(plan.expected));

		// The reported total is only a plan; a short page means the listing ran out early.
		let mut exhausted = first.items.len() < limit;
		let mut next = 2;

		while !exhausted && next <= pages {
			let last = pages.min(next.saturating_add(concurrency - 1));
			let requests = (next..=last)
				.map(|page| self.realdebrid_page(credential, options, plan, page, &progress));
			let fetched = future::try_join_all(requests).await?;

			exhausted = fetched.iter().any(|page| page.len() < limit);

			records.extend(fetched.into_iter().flatten());

			match last.checked_add(1) {
				Some(page) => next = page,
				None => break,
			}
		}

		#[cfg(feature = "tracing")]
		if exhausted && next <= pages {
			tracing::debug!(
				service = SERVICE.as_str(),
				total,
				received = records.len(),
				"listing ended before the reported total"
			);
		}

		Ok(records)
	}

	async fn realdebrid_page(
		&self,
		credential: &Credential,
		options: &FetchOptions,
		plan: PagePlan,
		page: usize,
		progress: &ProgressCounter,
	) -> Result<Vec<CanonicalRecord>> {
		let key = format!("page-{page}");
		let remote = &self.remotes.realdebrid;
		let listed =
			self.call(SERVICE, &key, options, || remote.list(credential, plan.limit, page)).await?;
		let converted = self.converters.convert_all(SERVICE, &listed.items);

		options.emit_batch(&converted);
		options.report_progress(progress.add(converted.len()), Some(plan.expected));

		Ok(converted)
	}
}
