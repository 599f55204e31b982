// self
use crate::{obs::FetchOutcome, service::ServiceKind};

/// Records a fetch outcome via the global metrics recorder (when enabled).
pub fn record_fetch_outcome(service: ServiceKind, outcome: FetchOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"debrid_library_sync_fetch_total",
			"service" => service.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (service, outcome);
	}
}

/// Records one rate-limited remote call via the global metrics recorder (when enabled).
pub fn record_remote_call(service: ServiceKind) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("debrid_library_sync_remote_calls_total", "service" => service.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = service;
	}
}
