//! Caller-supplied conversion from raw service items to [`CanonicalRecord`] values.
//!
//! The fetcher never reads service-specific field names; every raw item is handed to the
//! converter registered for its service.

// self
use crate::{_prelude::*, record::CanonicalRecord, service::ServiceKind};

/// One raw item exactly as a remote service returned it.
pub type RawItem = serde_json::Value;

/// Pure conversion hook from a raw item to a canonical record.
pub trait RecordConverter
where
	Self: Send + Sync,
{
	/// Converts one raw item.
	fn convert(&self, raw: &RawItem) -> CanonicalRecord;
}
impl<F> RecordConverter for F
where
	F: Fn(&RawItem) -> CanonicalRecord + Send + Sync,
{
	fn convert(&self, raw: &RawItem) -> CanonicalRecord {
		self(raw)
	}
}

/// One converter per service.
#[derive(Clone)]
pub struct Converters {
	realdebrid: Arc<dyn RecordConverter>,
	alldebrid: Arc<dyn RecordConverter>,
	torbox: Arc<dyn RecordConverter>,
}
impl Converters {
	/// Bundles the three per-service converters.
	pub fn new(
		realdebrid: impl 'static + RecordConverter,
		alldebrid: impl 'static + RecordConverter,
		torbox: impl 'static + RecordConverter,
	) -> Self {
		Self {
			realdebrid: Arc::new(realdebrid),
			alldebrid: Arc::new(alldebrid),
			torbox: Arc::new(torbox),
		}
	}

	/// Returns the converter registered for `service`.
	pub fn get(&self, service: ServiceKind) -> &dyn RecordConverter {
		match service {
			ServiceKind::RealDebrid => self.realdebrid.as_ref(),
			ServiceKind::AllDebrid => self.alldebrid.as_ref(),
			ServiceKind::Torbox => self.torbox.as_ref(),
		}
	}

	/// Converts a slice of raw items for `service`, preserving order.
	pub fn convert_all(&self, service: ServiceKind, raw: &[RawItem]) -> Vec<CanonicalRecord> {
		let converter = self.get(service);

		raw.iter().map(|item| converter.convert(item)).collect()
	}
}
impl Debug for Converters {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Converters(..)")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn by_id(service: ServiceKind) -> impl Fn(&RawItem) -> CanonicalRecord + Send + Sync {
		move |raw| {
			let id = raw["id"].as_str().unwrap_or_default();

			CanonicalRecord::new(service, id, id, id)
		}
	}

	#[test]
	fn converters_dispatch_by_service_and_keep_order() {
		let converters = Converters::new(
			by_id(ServiceKind::RealDebrid),
			by_id(ServiceKind::AllDebrid),
			by_id(ServiceKind::Torbox),
		);
		let raw = [serde_json::json!({ "id": "b" }), serde_json::json!({ "id": "a" })];
		let records = converters.convert_all(ServiceKind::Torbox, &raw);
		let ids = records.iter().map(|record| record.id.to_string()).collect::<Vec<_>>();

		assert_eq!(ids, ["tb:b", "tb:a"]);
	}
}
