use std::time::Duration;
use thiserror::Error;

use super::fetcher::FetchError;

/// Default ports probed for a running feed server, in order.
pub const DEFAULT_PORTS: &[u16] = &[8789, 8788, 3000, 3001];

/// How long a single candidate port gets to answer.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Errors that can occur during server discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// No candidate port answered the probe path with a success status
    #[error("No server found on ports {}", format_ports(.ports))]
    ServerNotFound { ports: Vec<u16> },
}

fn format_ports(ports: &[u16]) -> String {
    if ports.is_empty() {
        return "(none configured)".to_string();
    }
    ports
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Finds the base URL of a running feed server by probing candidate ports.
///
/// Each port is tried in order with a GET of `probe_path`. The first one to
/// answer with a 2xx status within `probe_timeout` wins. Any failure on a
/// candidate (refused, timeout, error status) moves on to the next one.
///
/// # Returns
///
/// `http://{host}:{port}` for the first answering port.
///
/// # Errors
///
/// Returns [`DiscoveryError::ServerNotFound`] naming every port tried when
/// none of them answered.
pub async fn discover_base_url(
    client: &reqwest::Client,
    host: &str,
    ports: &[u16],
    probe_path: &str,
    probe_timeout: Duration,
) -> Result<String, DiscoveryError> {
    for &port in ports {
        let base_url = format!("http://{}:{}", host, port);
        let probe_url = format!("{}{}", base_url, probe_path);

        match probe(client, &probe_url, probe_timeout).await {
            Ok(()) => {
                tracing::info!(port = port, base_url = %base_url, "Feed server found");
                return Ok(base_url);
            }
            Err(e) => {
                tracing::debug!(port = port, url = %probe_url, error = %e, "Probe failed, trying next port");
            }
        }
    }

    Err(DiscoveryError::ServerNotFound {
        ports: ports.to_vec(),
    })
}

/// Checks that `url` answers with a success status. The body is not read.
async fn probe(client: &reqwest::Client, url: &str, timeout: Duration) -> Result<(), FetchError> {
    let response = tokio::time::timeout(timeout, client.get(url).send())
        .await
        .map_err(|_| FetchError::Timeout(timeout))?
        .map_err(FetchError::Network)?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }
    Ok(())
}
