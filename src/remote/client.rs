//! Reqwest-backed implementation of every remote contract.
//!
//! All three services authenticate with `Authorization: Bearer <credential>`. Responses are
//! decoded through `serde_path_to_error` so malformed bodies report the failing JSON path.

// crates.io
use reqwest::{
	RequestBuilder, Response, StatusCode,
	header::{AUTHORIZATION, HeaderMap},
};
// self
use crate::{
	_prelude::*,
	convert::RawItem,
	credential::Credential,
	error::{ConfigError, TransportError},
	remote::{
		AllDebridApi, AllDebridStatus, RealDebridApi, RealDebridPage, RemoteFuture, TorboxApi,
		TorboxPage, TorboxQuery,
	},
	service::ServiceKind,
};

const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Base URLs for the three services.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEndpoints {
	/// Real-Debrid REST root.
	pub realdebrid: Url,
	/// AllDebrid API root.
	pub alldebrid: Url,
	/// TorBox API root.
	pub torbox: Url,
}
impl RemoteEndpoints {
	/// Builds an endpoint set, normalizing each base to end with `/` so paths join beneath it.
	pub fn new(realdebrid: Url, alldebrid: Url, torbox: Url) -> Self {
		Self {
			realdebrid: with_trailing_slash(realdebrid),
			alldebrid: with_trailing_slash(alldebrid),
			torbox: with_trailing_slash(torbox),
		}
	}

	fn join(&self, service: ServiceKind, path: &'static str) -> Result<Url, ConfigError> {
		let base = match service {
			ServiceKind::RealDebrid => &self.realdebrid,
			ServiceKind::AllDebrid => &self.alldebrid,
			ServiceKind::Torbox => &self.torbox,
		};

		base.join(path).map_err(|_| ConfigError::InvalidEndpoint { base: base.to_string(), path })
	}
}
impl Default for RemoteEndpoints {
	fn default() -> Self {
		const REALDEBRID: &str = "https://api.real-debrid.com/rest/1.0/";
		const ALLDEBRID: &str = "https://api.alldebrid.com/v4/";
		const TORBOX: &str = "https://api.torbox.app/v1/api/";

		fn parse(raw: &str) -> Url {
			Url::parse(raw)
				.unwrap_or_else(|e| unreachable!("built-in endpoint `{raw}` is invalid: {e}"))
		}

		Self { realdebrid: parse(REALDEBRID), alldebrid: parse(ALLDEBRID), torbox: parse(TORBOX) }
	}
}

/// HTTP client for Real-Debrid, AllDebrid, and TorBox listings.
///
/// The client never follows up on failures: a non-2xx status, a network error, or an
/// undecodable body is returned as a [`TransportError`] on the first attempt.
#[derive(Clone, Debug)]
pub struct ReqwestRemote {
	client: ReqwestClient,
	endpoints: RemoteEndpoints,
	agent: String,
}
impl ReqwestRemote {
	/// Agent string AllDebrid requires on every call, unless overridden.
	pub const DEFAULT_AGENT: &'static str = "debrid-library-sync";

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self { client, endpoints: RemoteEndpoints::default(), agent: Self::DEFAULT_AGENT.into() }
	}

	/// Overrides the service base URLs.
	pub fn with_endpoints(mut self, endpoints: RemoteEndpoints) -> Self {
		self.endpoints = endpoints;

		self
	}

	/// Overrides the AllDebrid agent string.
	pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
		self.agent = agent.into();

		self
	}

	/// Returns the configured endpoints.
	pub fn endpoints(&self) -> &RemoteEndpoints {
		&self.endpoints
	}

	async fn send(
		service: ServiceKind,
		request: RequestBuilder,
		credential: &Credential,
	) -> Result<(StatusCode, HeaderMap, Vec<u8>), TransportError> {
		let response = request
			.header(AUTHORIZATION, format!("Bearer {}", credential.expose()))
			.send()
			.await
			.map_err(|e| TransportError::network(service.as_str(), e))?;

		read_response(service, response).await
	}
}
impl Default for ReqwestRemote {
	fn default() -> Self {
		Self::with_client(ReqwestClient::default())
	}
}
impl RealDebridApi for ReqwestRemote {
	fn list<'a>(
		&'a self,
		credential: &'a Credential,
		page_size: usize,
		page: usize,
	) -> RemoteFuture<'a, RealDebridPage> {
		const SERVICE: ServiceKind = ServiceKind::RealDebrid;

		Box::pin(async move {
			let url = self.endpoints.join(SERVICE, "torrents")?;
			let request = self
				.client
				.get(url)
				.query(&[("page", page.to_string()), ("limit", page_size.to_string())]);
			let (status, headers, body) = Self::send(SERVICE, request, credential).await?;

			if status == StatusCode::NO_CONTENT || body.is_empty() {
				return Ok(RealDebridPage { items: Vec::new(), total_count: total_count(&headers) });
			}

			let items: Vec<RawItem> = decode(SERVICE, &body)?;
			let total_count = match total_count(&headers) {
				0 => items.len(),
				reported => reported,
			};

			Ok(RealDebridPage { items, total_count })
		})
	}
}
impl AllDebridApi for ReqwestRemote {
	fn status<'a>(&'a self, credential: &'a Credential) -> RemoteFuture<'a, AllDebridStatus> {
		const SERVICE: ServiceKind = ServiceKind::AllDebrid;

		Box::pin(async move {
			let url = self.endpoints.join(SERVICE, "magnet/status")?;
			let request = self.client.get(url).query(&[("agent", self.agent.as_str())]);
			let (_, _, body) = Self::send(SERVICE, request, credential).await?;
			let envelope: AllDebridEnvelope = decode(SERVICE, &body)?;

			if envelope.status.as_deref() == Some("error") {
				let message = envelope
					.error
					.map(|e| format!("{} ({})", e.message, e.code))
					.unwrap_or_else(|| "unknown error".into());

				return Err(TransportError::Upstream { service: SERVICE.as_str(), message }.into());
			}

			let magnets = envelope.data.and_then(|data| data.magnets).map(|magnets| match magnets {
				// Single-magnet lookups come back keyed by id.
				serde_json::Value::Object(map) => map.into_values().collect(),
				serde_json::Value::Array(list) => list,
				_ => Vec::new(),
			});

			Ok(match magnets {
				Some(magnets) => AllDebridStatus::with_magnets(magnets),
				None => AllDebridStatus::default(),
			})
		})
	}
}
impl TorboxApi for ReqwestRemote {
	fn list<'a>(
		&'a self,
		credential: &'a Credential,
		query: TorboxQuery,
	) -> RemoteFuture<'a, TorboxPage> {
		const SERVICE: ServiceKind = ServiceKind::Torbox;

		Box::pin(async move {
			let url = self.endpoints.join(SERVICE, "torrents/mylist")?;
			let request = self.client.get(url).query(&[
				("bypass_cache", query.bypass_cache.to_string()),
				("offset", query.offset.to_string()),
				("limit", query.limit.to_string()),
			]);
			let (_, _, body) = Self::send(SERVICE, request, credential).await?;
			let envelope: TorboxEnvelope = decode(SERVICE, &body)?;
			let data = match envelope.data {
				Some(serde_json::Value::Array(list)) => list,
				Some(serde_json::Value::Null) | None => Vec::new(),
				Some(single) => vec![single],
			};

			Ok(TorboxPage { success: envelope.success, data })
		})
	}
}

#[derive(Deserialize)]
struct AllDebridEnvelope {
	#[serde(default)]
	status: Option<String>,
	#[serde(default)]
	data: Option<AllDebridEnvelopeData>,
	#[serde(default)]
	error: Option<AllDebridEnvelopeError>,
}

#[derive(Deserialize)]
struct AllDebridEnvelopeData {
	#[serde(default)]
	magnets: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct AllDebridEnvelopeError {
	#[serde(default)]
	code: String,
	#[serde(default)]
	message: String,
}

#[derive(Deserialize)]
struct TorboxEnvelope {
	#[serde(default)]
	success: bool,
	#[serde(default)]
	data: Option<serde_json::Value>,
}

async fn read_response(
	service: ServiceKind,
	response: Response,
) -> Result<(StatusCode, HeaderMap, Vec<u8>), TransportError> {
	let status = response.status();
	let headers = response.headers().to_owned();
	let body =
		response.bytes().await.map_err(|e| TransportError::network(service.as_str(), e))?.to_vec();

	if !status.is_success() {
		return Err(TransportError::Status {
			service: service.as_str(),
			status: status.as_u16(),
			body: String::from_utf8(body).ok().filter(|text| !text.is_empty()),
		});
	}

	Ok((status, headers, body))
}

fn decode<T>(service: ServiceKind, body: &[u8]) -> Result<T, TransportError>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|e| TransportError::decode(service.as_str(), e))
}

fn total_count(headers: &HeaderMap) -> usize {
	headers
		.get(TOTAL_COUNT_HEADER)
		.and_then(|value| value.to_str().ok())
		.and_then(|raw| raw.trim().parse().ok())
		.unwrap_or(0)
}

fn with_trailing_slash(mut url: Url) -> Url {
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	url
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn endpoints_load_from_configuration() {
		let endpoints: RemoteEndpoints = serde_json::from_value(serde_json::json!({
			"realdebrid": "http://127.0.0.1:9000/rd/",
			"alldebrid": "http://127.0.0.1:9000/ad/",
			"torbox": "http://127.0.0.1:9000/tb/",
		}))
		.expect("Endpoint configuration should deserialize.");

		assert_eq!(endpoints.torbox.as_str(), "http://127.0.0.1:9000/tb/");
		assert_eq!(
			serde_json::to_value(RemoteEndpoints::default()).expect("Endpoints should serialize.")
				["realdebrid"],
			"https://api.real-debrid.com/rest/1.0/"
		);
	}

	#[test]
	fn endpoints_join_beneath_their_base() {
		let endpoints = RemoteEndpoints::new(
			Url::parse("http://127.0.0.1:9000/rd").expect("RD base should parse."),
			Url::parse("http://127.0.0.1:9000/ad/").expect("AD base should parse."),
			Url::parse("http://127.0.0.1:9000").expect("TB base should parse."),
		);

		let join = |service, path| {
			endpoints.join(service, path).expect("Endpoint path should join.").to_string()
		};

		assert_eq!(join(ServiceKind::RealDebrid, "torrents"), "http://127.0.0.1:9000/rd/torrents");
		assert_eq!(
			join(ServiceKind::AllDebrid, "magnet/status"),
			"http://127.0.0.1:9000/ad/magnet/status"
		);
		assert_eq!(
			join(ServiceKind::Torbox, "torrents/mylist"),
			"http://127.0.0.1:9000/torrents/mylist"
		);
	}

	#[test]
	fn default_endpoints_point_at_public_apis() {
		let endpoints = RemoteEndpoints::default();

		assert_eq!(endpoints.realdebrid.host_str(), Some("api.real-debrid.com"));
		assert_eq!(endpoints.alldebrid.path(), "/v4/");
		assert_eq!(endpoints.torbox.path(), "/v1/api/");
	}

	#[test]
	fn total_count_header_is_optional() {
		let mut headers = HeaderMap::new();

		assert_eq!(total_count(&headers), 0);

		headers.insert(TOTAL_COUNT_HEADER, "2500".parse().expect("Header value should parse."));

		assert_eq!(total_count(&headers), 2500);
	}
}
