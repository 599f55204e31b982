//! Redacted per-service access tokens.

// std
use std::borrow::Borrow;
// self
use crate::_prelude::*;

const CREDENTIAL_MAX_LEN: usize = 512;

/// Error returned when credential validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum CredentialError {
	/// The credential was empty.
	#[error("Credential cannot be empty.")]
	Empty,
	/// The credential contains whitespace characters.
	#[error("Credential contains whitespace.")]
	ContainsWhitespace,
	/// The credential exceeded the allowed character count.
	#[error("Credential exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Opaque access token identifying a user to one remote service.
///
/// The raw value takes part in cache keys and in-flight keys but never in `Debug` or `Display`
/// output.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Credential(String);
impl Credential {
	/// Creates a new credential after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, CredentialError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for Credential {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Borrow<str> for Credential {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<Credential> for String {
	fn from(value: Credential) -> Self {
		value.0
	}
}
impl TryFrom<String> for Credential {
	type Error = CredentialError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl FromStr for Credential {
	type Err = CredentialError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Credential").field(&"<redacted>").finish()
	}
}
impl Display for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

fn validate_view(view: &str) -> Result<(), CredentialError> {
	if view.is_empty() {
		return Err(CredentialError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(CredentialError::ContainsWhitespace);
	}
	if view.chars().count() > CREDENTIAL_MAX_LEN {
		return Err(CredentialError::TooLong { max: CREDENTIAL_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn formatters_redact() {
		let credential = Credential::new("super-secret").expect("Credential fixture should be valid.");

		assert_eq!(format!("{credential:?}"), "Credential(\"<redacted>\")");
		assert_eq!(format!("{credential}"), "<redacted>");
		assert_eq!(credential.expose(), "super-secret");
	}

	#[test]
	fn validation_rejects_blank_and_oversized_values() {
		assert_eq!(Credential::new(""), Err(CredentialError::Empty));
		assert_eq!(Credential::new(" tok"), Err(CredentialError::ContainsWhitespace));
		assert_eq!(Credential::new("to\u{00A0}k"), Err(CredentialError::ContainsWhitespace));

		let exact = "a".repeat(CREDENTIAL_MAX_LEN);

		Credential::new(&exact).expect("Exact length should succeed.");

		assert_eq!(
			Credential::new("a".repeat(CREDENTIAL_MAX_LEN + 1)),
			Err(CredentialError::TooLong { max: CREDENTIAL_MAX_LEN })
		);
	}

	#[test]
	fn length_limit_counts_characters() {
		let wide = "é".repeat(CREDENTIAL_MAX_LEN);

		assert!(wide.len() > CREDENTIAL_MAX_LEN);

		Credential::new(&wide).expect("Multibyte tokens at the limit should succeed.");

		assert_eq!(
			Credential::new(format!("{wide}é")),
			Err(CredentialError::TooLong { max: CREDENTIAL_MAX_LEN })
		);
	}

	#[test]
	fn serde_enforces_validation() {
		let credential: Credential =
			serde_json::from_str("\"tok\"").expect("Credential should deserialize.");

		assert_eq!(credential.expose(), "tok");
		assert!(serde_json::from_str::<Credential>("\"with space\"").is_err());
	}
}
