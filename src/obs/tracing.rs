// self
use crate::{_prelude::*, service::ServiceKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFetch<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFetch<F> = F;

/// A span builder used by library fetches.
#[derive(Clone, Debug)]
pub struct FetchSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FetchSpan {
	/// Creates a span for one fetch of `service` using its `pagination` model.
	///
	/// `source` and `records` stay empty until [`record_result`](Self::record_result) fills them.
	pub fn new(service: ServiceKind, pagination: &'static str, force_refresh: bool) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"debrid_library_sync.fetch",
				service = service.as_str(),
				pagination,
				force_refresh,
				source = tracing::field::Empty,
				records = tracing::field::Empty,
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (service, pagination, force_refresh);

			Self {}
		}
	}

	/// Records where the listing came from (`cache` or `remote`) and how many records it holds.
	pub fn record_result(&self, source: &'static str, records: usize) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("source", source);
			self.span.record("records", records as u64);
		}
		#[cfg(not(feature = "tracing"))]
		let _ = (source, records);
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFetch<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}
