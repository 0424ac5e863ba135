use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

/// Largest feed body accepted before giving up.
pub const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while fetching a feed document.
///
/// Every variant means the feed endpoint could not be reached or did not
/// answer with a usable body; none of them say anything about the XML.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection refused, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Response body exceeded [`MAX_FEED_SIZE`]
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// Fetches the raw bytes of a feed document.
///
/// A single GET is issued; there are no retries. The timeout covers the
/// whole exchange, from sending the request to the last body byte.
///
/// # Errors
///
/// - [`FetchError::Network`] - Connection refused, DNS or TLS errors
/// - [`FetchError::Timeout`] - Headers and body not received within `timeout`
/// - [`FetchError::HttpStatus`] - Non-2xx HTTP response
/// - [`FetchError::ResponseTooLarge`] - Body exceeded 10MB
/// - [`FetchError::IncompleteResponse`] - Body shorter than Content-Length
pub async fn fetch_feed(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<Vec<u8>, FetchError> {
    let bytes = tokio::time::timeout(timeout, fetch_body(client, url))
        .await
        .map_err(|_| FetchError::Timeout(timeout))??;

    tracing::debug!(url = %url, bytes = bytes.len(), "Fetched feed");
    Ok(bytes)
}

async fn fetch_body(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let response = client.get(url).send().await.map_err(FetchError::Network)?;

    if !response.status().is_success() {
        tracing::debug!(url = %url, status = %response.status(), "Feed endpoint returned error status");
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    read_limited_bytes(response, MAX_FEED_SIZE).await
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Capture Content-Length for completeness check
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            // Connection closed before Content-Length bytes arrived
            Err(e)
                if !e.is_timeout()
                    && expected_length.is_some_and(|n| (bytes.len() as u64) < n) =>
            {
                tracing::debug!(error = %e, received = bytes.len(), "Body ended early");
                return Err(FetchError::IncompleteResponse {
                    expected: expected_length.unwrap_or_default(),
                    received: bytes.len(),
                });
            }
            Err(e) => return Err(FetchError::Network(e)),
        };
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    /// Serves one connection with a canned response, then optionally keeps
    /// the socket open without sending anything more.
    async fn raw_server(response: &'static [u8], hold_open: bool) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;
            socket.write_all(response).await.unwrap();
            socket.flush().await.unwrap();
            if hold_open {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
        });
        format!("http://{}/feed.xml", addr)
    }

    #[tokio::test]
    async fn test_fetch_success_returns_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<rss/>")
                    .insert_header("Content-Type", "application/rss+xml"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/feed.xml", mock_server.uri());
        let bytes = fetch_feed(&client, &url, TIMEOUT).await.unwrap();
        assert_eq!(bytes, b"<rss/>");
    }

    #[tokio::test]
    async fn test_fetch_404_is_http_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/feed.xml", mock_server.uri());
        match fetch_feed(&client, &url, TIMEOUT).await {
            Err(FetchError::HttpStatus(404)) => {}
            other => panic!("Expected HttpStatus(404), got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_500_is_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/feed.xml", mock_server.uri());
        assert!(matches!(
            fetch_feed(&client, &url, TIMEOUT).await,
            Err(FetchError::HttpStatus(500))
        ));
    }

    #[tokio::test]
    async fn test_fetch_slow_server_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/feed.xml", mock_server.uri());
        let result = fetch_feed(&client, &url, Duration::from_millis(200)).await;
        assert!(matches!(result, Err(FetchError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_fetch_oversized_body_rejected() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'a'; MAX_FEED_SIZE + 1]))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/feed.xml", mock_server.uri());
        assert!(matches!(
            fetch_feed(&client, &url, TIMEOUT).await,
            Err(FetchError::ResponseTooLarge)
        ));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_network_error() {
        // Bind then drop to get a port with nothing listening
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let client = reqwest::Client::new();
        let url = format!("http://127.0.0.1:{}/feed.xml", port);
        assert!(matches!(
            fetch_feed(&client, &url, TIMEOUT).await,
            Err(FetchError::Network(_))
        ));
    }

    #[tokio::test]
    async fn test_stalled_body_times_out() {
        let url = raw_server(
            b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n<rss",
            true,
        )
        .await;

        let client = reqwest::Client::new();
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            fetch_feed(&client, &url, Duration::from_millis(500)),
        )
        .await
        .expect("fetch_feed should give up on its own timeout");

        assert!(matches!(result, Err(FetchError::Timeout(_))), "got {:?}", result);
    }

    #[tokio::test]
    async fn test_body_shorter_than_content_length() {
        let url = raw_server(
            b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\n<rss",
            false,
        )
        .await;

        let client = reqwest::Client::new();
        match fetch_feed(&client, &url, TIMEOUT).await {
            Err(FetchError::IncompleteResponse { expected, received }) => {
                assert_eq!(expected, 100);
                assert!(received < 100);
            }
            other => panic!("Expected IncompleteResponse, got {:?}", other),
        }
    }
}
