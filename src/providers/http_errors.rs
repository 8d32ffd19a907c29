use std::error::Error as StdError;
use std::io::ErrorKind;

use serde::Deserialize;

use super::UpstreamError;

const FALLBACK_UPSTREAM_MESSAGE: &str = "Upstream error";

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

fn error_chain_has_kind(
    err: &(dyn StdError + 'static),
    kind: ErrorKind,
    needle: &str,
) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == kind
        {
            return true;
        }

        if source.to_string().to_ascii_lowercase().contains(needle) {
            return true;
        }

        current = source.source();
    }

    false
}

fn error_chain_has_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    error_chain_has_kind(err, ErrorKind::ConnectionRefused, "connection refused")
}

fn error_chain_has_timeout(err: &(dyn StdError + 'static)) -> bool {
    error_chain_has_kind(err, ErrorKind::TimedOut, "timed out")
}

pub(crate) fn model_api_request_error(
    err: reqwest::Error,
    model: &str,
    timeout_secs: u64,
) -> UpstreamError {
    if err.is_timeout() || error_chain_has_timeout(&err) {
        return UpstreamError::transport(format!(
            "Model '{model}' timed out after {timeout_secs}s. \
             Increase MODEL_TIMEOUT_SECS or try again later."
        ));
    }

    if err.is_connect() {
        if error_chain_has_connection_refused(&err) {
            return UpstreamError::transport(format!(
                "Connection refused while calling model '{model}'. \
                 Check GEMINI_BASE_URL and network connectivity."
            ));
        }

        return UpstreamError::transport(format!(
            "Failed to connect to the generative language API for model '{model}'. \
             Check GEMINI_BASE_URL and network connectivity."
        ));
    }

    UpstreamError::transport(format!("Failed to call model '{model}': {err}"))
}

/// Builds an error from a non-success response, preferring the API's own message.
pub(crate) fn model_api_status_error(status: u16, body: &str) -> UpstreamError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error.message.trim().to_string())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| FALLBACK_UPSTREAM_MESSAGE.to_string());
    UpstreamError::with_status(status, message)
}

#[cfg(test)]
mod tests {
    use super::{error_chain_has_timeout, model_api_request_error, model_api_status_error};
    use reqwest::Client;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    fn free_local_addr() -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().expect("address should be available");
        drop(listener);
        addr
    }

    #[tokio::test]
    async fn maps_connection_refused_errors_to_actionable_message() {
        let addr = free_local_addr();
        let api_url = format!("http://{}/v1beta/models/m:generateContent", addr);
        let client = Client::builder()
            .timeout(Duration::from_millis(300))
            .build()
            .expect("client should build");

        let req_err = client
            .post(&api_url)
            .send()
            .await
            .expect_err("request should fail with connection-refused");
        let mapped = model_api_request_error(req_err, "gemini-test", 1);

        assert_eq!(mapped.status, None);
        assert!(
            mapped.message.contains("Connection refused"),
            "unexpected message: {}",
            mapped.message
        );
        assert!(
            mapped.message.contains("GEMINI_BASE_URL"),
            "unexpected message: {}",
            mapped.message
        );
    }

    #[tokio::test]
    async fn maps_timeout_errors_to_actionable_message() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().expect("address should be available");
        let server = thread::spawn(move || {
            let (_stream, _) = listener.accept().expect("accept should succeed");
            thread::sleep(Duration::from_secs(1));
        });

        let api_url = format!("http://{}/v1beta/models/m:generateContent", addr);
        let client = Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("client should build");

        let req_err = client
            .post(&api_url)
            .send()
            .await
            .expect_err("request should fail with timeout");
        let mapped = model_api_request_error(req_err, "gemini-test", 2);

        assert!(
            mapped.message.contains("timed out after 2s"),
            "unexpected message: {}",
            mapped.message
        );
        assert!(
            mapped.message.contains("MODEL_TIMEOUT_SECS"),
            "unexpected message: {}",
            mapped.message
        );

        server.join().expect("server thread should join");
    }

    #[test]
    fn detects_timeout_from_error_kind() {
        let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        assert!(error_chain_has_timeout(&err));
    }

    #[test]
    fn status_error_prefers_api_message() {
        let err = model_api_status_error(
            429,
            r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#,
        );
        assert_eq!(err.status, Some(429));
        assert_eq!(err.message, "Quota exceeded");
    }

    #[test]
    fn status_error_falls_back_for_unparseable_bodies() {
        let err = model_api_status_error(502, "<html>bad gateway</html>");
        assert_eq!(err.status, Some(502));
        assert_eq!(err.message, "Upstream error");
    }
}
