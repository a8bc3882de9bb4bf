//! Pure helpers for request processing.

use std::net::IpAddr;

use axum::http::HeaderMap;
use serde::de::DeserializeOwned;

use super::error::ApiError;

/// The client identity used as the worker key: the `X-Real-Ip` header
/// when a proxy supplies it, otherwise the peer address, otherwise a
/// zero address.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> String {
    if let Some(real_ip) = headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
    {
        return real_ip.to_string();
    }
    match peer {
        Some(ip) => ip.to_string(),
        None => "0.0.0.0".to_string(),
    }
}

/// Decode a JSON request body, mapping failures to the API's uniform
/// decode error.
pub fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|err| {
        ApiError::BadRequest(format!("Error with decoding request body: {}", err))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_prefers_real_ip_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("203.0.113.9"));
        let peer = Some("10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers, peer), "203.0.113.9");
    }

    #[test]
    fn test_client_ip_falls_back_to_peer() {
        let headers = HeaderMap::new();
        let peer = Some("10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers, peer), "10.0.0.1");
    }

    #[test]
    fn test_client_ip_ignores_empty_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static(""));
        assert_eq!(client_ip(&headers, None), "0.0.0.0");
    }

    #[test]
    fn test_decode_body_reports_decode_errors() {
        let ok: crate::job::NewJob = decode_body(r#"{"download_url":"http://x"}"#).unwrap();
        assert_eq!(ok.download_url, "http://x");

        let err = decode_body::<crate::job::NewJob>("{broken").unwrap_err();
        match err {
            ApiError::BadRequest(message) => {
                assert!(message.starts_with("Error with decoding request body:"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
