//! Validated per-service rate and pagination profiles.

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, limiter::RatePolicy, service::ServiceKind};

/// Errors raised while constructing or validating profiles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProfileError {
	/// The rate policy must admit at least one call.
	#[error("Rate policy must admit at least one call.")]
	ZeroRateBudget,
	/// The rate policy window must be positive.
	#[error("Rate policy window must be positive.")]
	ZeroRateWindow,
	/// Page and chunk sizes must be positive.
	#[error("The {field} must be positive.")]
	ZeroSize {
		/// Which knob failed validation.
		field: &'static str,
	},
	/// The default page size exceeds the service maximum.
	#[error("Page size {page_size} exceeds the maximum of {max_page_size}.")]
	PageSizeTooLarge {
		/// Requested default page size.
		page_size: usize,
		/// Service maximum page size.
		max_page_size: usize,
	},
	/// A knob was set that the service's pagination model does not have.
	#[error("The {service} pagination model has no {field}.")]
	NotApplicable {
		/// Service label.
		service: &'static str,
		/// Knob that does not apply.
		field: &'static str,
	},
}

/// Pagination model a service exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "model")]
pub enum Pagination {
	/// Page 1 reveals the total count; remaining pages are fetched in bounded batches.
	Planned {
		/// Default page size.
		page_size: usize,
		/// Largest page size the service accepts.
		max_page_size: usize,
		/// Default number of pages fetched concurrently per batch.
		concurrency: usize,
	},
	/// One call returns everything; conversion runs in fixed-size chunks.
	Unpaginated {
		/// Number of raw items converted per chunk.
		chunk_size: usize,
	},
	/// Offset pages requested one after another until a short page arrives.
	Offset {
		/// Default page size.
		page_size: usize,
		/// Largest page size the service accepts.
		max_page_size: usize,
	},
}
impl Pagination {
	/// Returns the model name used in span fields.
	pub const fn as_str(&self) -> &'static str {
		match self {
			Pagination::Planned { .. } => "planned",
			Pagination::Unpaginated { .. } => "unpaginated",
			Pagination::Offset { .. } => "offset",
		}
	}
}

/// Immutable profile consumed by the rate limiter and fetcher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProfile {
	/// Service the profile describes.
	pub kind: ServiceKind,
	/// Published call ceiling.
	pub rate: RatePolicy,
	/// Pagination model and its sizes.
	pub pagination: Pagination,
}
impl ServiceProfile {
	/// Creates a builder seeded with the service's defaults.
	pub fn builder(kind: ServiceKind) -> ServiceProfileBuilder {
		ServiceProfileBuilder::new(kind)
	}

	/// Returns the published defaults for `kind`.
	pub fn default_for(kind: ServiceKind) -> Self {
		match kind {
			ServiceKind::RealDebrid => Self {
				kind,
				rate: RatePolicy::new(4, StdDuration::from_secs(1)),
				pagination: Pagination::Planned {
					page_size: 1500,
					max_page_size: 1500,
					concurrency: 4,
				},
			},
			ServiceKind::AllDebrid => Self {
				kind,
				rate: RatePolicy::new(12, StdDuration::from_secs(1)),
				pagination: Pagination::Unpaginated { chunk_size: 50 },
			},
			ServiceKind::Torbox => Self {
				kind,
				rate: RatePolicy::new(1, StdDuration::from_millis(500)),
				pagination: Pagination::Offset { page_size: 100, max_page_size: 100 },
			},
		}
	}

	/// Resolves the effective page size, honoring a caller override clamped to the service maximum.
	pub fn page_size(&self, requested: Option<usize>) -> Option<usize> {
		match self.pagination {
			Pagination::Planned { page_size, max_page_size, .. }
			| Pagination::Offset { page_size, max_page_size } =>
				Some(requested.unwrap_or(page_size).clamp(1, max_page_size)),
			Pagination::Unpaginated { .. } => None,
		}
	}

	/// Resolves the effective batch width; only planned pagination fetches pages concurrently.
	pub fn concurrency(&self, requested: Option<usize>) -> usize {
		match self.pagination {
			Pagination::Planned { concurrency, .. } => requested.unwrap_or(concurrency).max(1),
			_ => 1,
		}
	}

	/// Returns the conversion chunk size of an unpaginated service.
	pub fn chunk_size(&self) -> Option<usize> {
		match self.pagination {
			Pagination::Unpaginated { chunk_size } => Some(chunk_size),
			_ => None,
		}
	}

	fn validate(&self) -> Result<(), ProfileError> {
		if self.rate.max_calls == 0 {
			return Err(ProfileError::ZeroRateBudget);
		}
		if self.rate.per.is_zero() {
			return Err(ProfileError::ZeroRateWindow);
		}

		match self.pagination {
			Pagination::Planned { page_size, max_page_size, concurrency } => {
				validate_page_sizes(page_size, max_page_size)?;

				if concurrency == 0 {
					return Err(ProfileError::ZeroSize { field: "concurrency" });
				}
			},
			Pagination::Offset { page_size, max_page_size } =>
				validate_page_sizes(page_size, max_page_size)?,
			Pagination::Unpaginated { chunk_size } =>
				if chunk_size == 0 {
					return Err(ProfileError::ZeroSize { field: "chunk size" });
				},
		}

		Ok(())
	}
}

/// Builder for [`ServiceProfile`] values.
#[derive(Debug)]
pub struct ServiceProfileBuilder {
	profile: ServiceProfile,
	error: Option<ProfileError>,
}
impl ServiceProfileBuilder {
	/// Creates a new builder seeded with the defaults for `kind`.
	pub fn new(kind: ServiceKind) -> Self {
		Self { profile: ServiceProfile::default_for(kind), error: None }
	}

	/// Overrides the rate policy.
	pub fn rate(mut self, rate: RatePolicy) -> Self {
		self.profile.rate = rate;

		self
	}

	/// Overrides the default page size.
	pub fn page_size(mut self, size: usize) -> Self {
		if let Pagination::Planned { page_size, .. } | Pagination::Offset { page_size, .. } =
			&mut self.profile.pagination
		{
			*page_size = size;
		} else {
			self.reject("page size");
		}

		self
	}

	/// Overrides the largest page size the service accepts.
	pub fn max_page_size(mut self, size: usize) -> Self {
		if let Pagination::Planned { max_page_size, .. }
		| Pagination::Offset { max_page_size, .. } = &mut self.profile.pagination
		{
			*max_page_size = size;
		} else {
			self.reject("maximum page size");
		}

		self
	}

	/// Overrides the default batch width.
	pub fn concurrency(mut self, width: usize) -> Self {
		if let Pagination::Planned { concurrency, .. } = &mut self.profile.pagination {
			*concurrency = width;
		} else {
			self.reject("concurrency");
		}

		self
	}

	/// Overrides the conversion chunk size.
	pub fn chunk_size(mut self, size: usize) -> Self {
		if let Pagination::Unpaginated { chunk_size } = &mut self.profile.pagination {
			*chunk_size = size;
		} else {
			self.reject("chunk size");
		}

		self
	}

	/// Consumes the builder and validates the resulting profile.
	pub fn build(self) -> Result<ServiceProfile, ProfileError> {
		if let Some(err) = self.error {
			return Err(err);
		}

		self.profile.validate()?;

		Ok(self.profile)
	}

	fn reject(&mut self, field: &'static str) {
		if self.error.is_none() {
			self.error =
				Some(ProfileError::NotApplicable { service: self.profile.kind.as_str(), field });
		}
	}
}

fn validate_page_sizes(page_size: usize, max_page_size: usize) -> Result<(), ProfileError> {
	if page_size == 0 {
		return Err(ProfileError::ZeroSize { field: "page size" });
	}
	if max_page_size == 0 {
		return Err(ProfileError::ZeroSize { field: "maximum page size" });
	}
	if page_size > max_page_size {
		return Err(ProfileError::PageSizeTooLarge { page_size, max_page_size });
	}

	Ok(())
}
