//! Reqwest-backed Google Directions adapter.
//!
//! This adapter owns transport details only: query construction, timeout and
//! HTTP error mapping, and JSON decoding into a distance.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use zeroize::Zeroizing;

use super::dto::DirectionsResponseDto;
use crate::domain::Meters;
use crate::domain::ports::{DirectionsRequest, RoutingService, RoutingServiceError};

/// Public Google Directions endpoint.
pub const DEFAULT_DIRECTIONS_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/directions/json";
const DEFAULT_USER_AGENT: &str = "bikage/0.1";

/// Routing adapter that performs HTTP GET requests against one endpoint.
pub struct GoogleDirectionsClient {
    client: Client,
    endpoint: Url,
    api_key: Zeroizing<String>,
}

impl GoogleDirectionsClient {
    /// Build an adapter. `timeout` bounds each HTTP exchange when set.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder().user_agent(DEFAULT_USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            endpoint,
            api_key: Zeroizing::new(api_key.into()),
        })
    }

    fn request_url(&self, request: &DirectionsRequest) -> Url {
        build_request_url(&self.endpoint, request, &self.api_key)
    }
}

#[async_trait]
impl RoutingService for GoogleDirectionsClient {
    async fn distance(&self, request: &DirectionsRequest) -> Result<Meters, RoutingServiceError> {
        let response = self
            .client
            .get(self.request_url(request))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        parse_distance(body.as_ref())
    }
}

fn build_request_url(endpoint: &Url, request: &DirectionsRequest, api_key: &str) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("origin", &request.origin.to_string())
        .append_pair("destination", &request.destination.to_string())
        .append_pair("mode", request.mode.as_str())
        .append_pair("key", api_key);
    url
}

fn parse_distance(body: &[u8]) -> Result<Meters, RoutingServiceError> {
    let decoded: DirectionsResponseDto = serde_json::from_slice(body).map_err(|error| {
        RoutingServiceError::malformed(format!("invalid directions JSON payload: {error}"))
    })?;
    let detail = decoded
        .error_message
        .as_deref()
        .map(|message| format!("{}: {message}", decoded.status))
        .unwrap_or_else(|| decoded.status.clone());

    match decoded.status.as_str() {
        "OK" => decoded
            .first_route_distance()
            .ok_or_else(|| RoutingServiceError::malformed("response contained no route legs")),
        "OVER_QUERY_LIMIT" => Err(RoutingServiceError::rate_limited(detail)),
        "ZERO_RESULTS" | "NOT_FOUND" => Err(RoutingServiceError::malformed(detail)),
        _ => Err(RoutingServiceError::rejected(detail)),
    }
}

fn map_transport_error(error: reqwest::Error) -> RoutingServiceError {
    // The request URL carries the API key.
    let error = error.without_url();
    if error.is_timeout() {
        RoutingServiceError::timeout(error.to_string())
    } else {
        RoutingServiceError::unavailable(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> RoutingServiceError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => RoutingServiceError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            RoutingServiceError::timeout(message)
        }
        _ if status.is_client_error() => RoutingServiceError::rejected(message),
        _ => RoutingServiceError::unavailable(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network directions helpers.

    use super::*;
    use crate::domain::{Coord, Route, Station};
    use rstest::rstest;

    fn request() -> DirectionsRequest {
        DirectionsRequest::bicycling(&Route::new(
            Station::new(72, "W 52 St & 11 Ave", Coord::new(40.76727216, -73.99392888)),
            Station::new(79, "Franklin St & W Broadway", Coord::new(40.71911552, -74.00666661)),
        ))
    }

    #[test]
    fn builds_query_with_eight_decimal_coordinates() {
        let endpoint = Url::parse(DEFAULT_DIRECTIONS_ENDPOINT).expect("valid endpoint");

        let url = build_request_url(&endpoint, &request(), "secret-key");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("origin".to_owned(), "40.76727216,-73.99392888".to_owned()),
                ("destination".to_owned(), "40.71911552,-74.00666661".to_owned()),
                ("mode".to_owned(), "bicycling".to_owned()),
                ("key".to_owned(), "secret-key".to_owned()),
            ]
        );
        assert_eq!(url.path(), "/maps/api/directions/json");
    }

    #[test]
    fn sums_the_legs_of_the_first_route() {
        let body = r#"{
            "status": "OK",
            "routes": [
                {"legs": [{"distance": {"text": "4.1 km", "value": 4100}},
                          {"distance": {"text": "0.9 km", "value": 900}}]},
                {"legs": [{"distance": {"text": "9.9 km", "value": 9900}}]}
            ]
        }"#;

        assert_eq!(parse_distance(body.as_bytes()), Ok(5000));
    }

    #[rstest]
    #[case::over_limit(r#"{"status":"OVER_QUERY_LIMIT","routes":[]}"#, "RateLimited")]
    #[case::zero_results(r#"{"status":"ZERO_RESULTS","routes":[]}"#, "Malformed")]
    #[case::not_found(r#"{"status":"NOT_FOUND","routes":[]}"#, "Malformed")]
    #[case::no_legs(r#"{"status":"OK","routes":[{"legs":[]}]}"#, "Malformed")]
    #[case::no_routes(r#"{"status":"OK","routes":[]}"#, "Malformed")]
    #[case::garbage("<html>oops</html>", "Malformed")]
    #[case::denied(
        r#"{"status":"REQUEST_DENIED","error_message":"The provided API key is invalid."}"#,
        "Rejected"
    )]
    fn maps_api_statuses_to_expected_domain_errors(#[case] body: &str, #[case] expected: &str) {
        let error = parse_distance(body.as_bytes()).expect_err("status should fail");
        let matched = match expected {
            "RateLimited" => matches!(error, RoutingServiceError::RateLimited { .. }),
            "Malformed" => matches!(error, RoutingServiceError::Malformed { .. }),
            "Rejected" => matches!(error, RoutingServiceError::Rejected { .. }),
            _ => panic!("unsupported test expectation: {expected}"),
        };
        assert!(matched, "expected {expected}, got {error:?}");
    }

    #[test]
    fn rejection_messages_carry_the_api_explanation() {
        let body = r#"{"status":"REQUEST_DENIED","error_message":"The provided API key is invalid."}"#;

        let error = parse_distance(body.as_bytes()).expect_err("denied");

        assert_eq!(
            error.to_string(),
            "routing service rejected request: REQUEST_DENIED: The provided API key is invalid."
        );
    }

    #[rstest]
    #[case::rate_limited(StatusCode::TOO_MANY_REQUESTS, "RateLimited")]
    #[case::request_timeout(StatusCode::REQUEST_TIMEOUT, "Timeout")]
    #[case::gateway_timeout(StatusCode::GATEWAY_TIMEOUT, "Timeout")]
    #[case::forbidden(StatusCode::FORBIDDEN, "Rejected")]
    #[case::server_error(StatusCode::BAD_GATEWAY, "Unavailable")]
    fn maps_http_statuses_to_expected_domain_errors(
        #[case] status: StatusCode,
        #[case] expected: &str,
    ) {
        let error = map_status_error(status, b"  <html>\n upstream   sad </html>");
        let matched = match expected {
            "RateLimited" => matches!(error, RoutingServiceError::RateLimited { .. }),
            "Timeout" => matches!(error, RoutingServiceError::Timeout { .. }),
            "Rejected" => matches!(error, RoutingServiceError::Rejected { .. }),
            "Unavailable" => matches!(error, RoutingServiceError::Unavailable { .. }),
            _ => panic!("unsupported test expectation: {expected}"),
        };
        assert!(matched, "expected {expected}, got {error:?}");
        assert!(error.to_string().contains("<html> upstream sad </html>"));
    }

    #[test]
    fn long_bodies_are_truncated_in_previews() {
        let body = "x".repeat(400);

        let preview = body_preview(body.as_bytes());

        assert_eq!(preview.len(), 163);
        assert!(preview.ends_with("..."));
    }

    #[tokio::test]
    async fn transport_errors_do_not_leak_the_api_key() {
        let endpoint = Url::parse("http://127.0.0.1:9/directions").expect("valid endpoint");
        let client = GoogleDirectionsClient::new(
            endpoint,
            "SUPER-SECRET-KEY",
            Some(std::time::Duration::from_secs(2)),
        )
        .expect("client builds");

        let error = client
            .distance(&request())
            .await
            .expect_err("nothing listens on the discard port");

        assert!(
            matches!(
                error,
                RoutingServiceError::Unavailable { .. } | RoutingServiceError::Timeout { .. }
            ),
            "got {error:?}"
        );
        assert!(!error.to_string().contains("SUPER-SECRET-KEY"), "leaked: {error}");
        assert!(!format!("{error:?}").contains("SUPER-SECRET-KEY"), "leaked: {error:?}");
    }
}
