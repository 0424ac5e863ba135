use thiserror::Error;
use url::Url;

/// Errors that can occur while validating a feed server base URL.
#[derive(Error, Debug)]
pub enum UrlError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
    /// Feed paths are appended to the base URL, so it cannot carry these.
    #[error("Base URL must not contain a query or fragment")]
    QueryOrFragment,
}

/// Validates a base URL that feed paths will be appended to.
///
/// Unlike feed URLs found in the wild, the base URL normally points at a
/// local development server, so loopback and private hosts are accepted.
///
/// # Errors
///
/// Returns [`UrlError`] if:
/// - The URL cannot be parsed ([`UrlError::InvalidUrl`])
/// - The scheme is not `http` or `https` ([`UrlError::UnsupportedScheme`])
/// - There is no host ([`UrlError::MissingHost`])
/// - A query string or fragment is present ([`UrlError::QueryOrFragment`])
///
/// # Examples
///
/// ```
/// use feedcheck::util::validate_base_url;
///
/// let url = validate_base_url("http://localhost:3001").unwrap();
/// assert_eq!(url.port(), Some(3001));
///
/// assert!(validate_base_url("file:///srv/feed.xml").is_err());
/// assert!(validate_base_url("http://localhost:3001/?page=2").is_err());
/// ```
pub fn validate_base_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str)?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(UrlError::QueryOrFragment);
    }

    Ok(url)
}

/// Appends a feed path to a base URL without doubling the slash.
///
/// ```
/// use feedcheck::util::join_feed_url;
///
/// assert_eq!(join_feed_url("http://localhost:3001/", "/feed.xml"), "http://localhost:3001/feed.xml");
/// assert_eq!(join_feed_url("http://localhost:3001", "/atom.xml"), "http://localhost:3001/atom.xml");
/// ```
pub fn join_feed_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_urls_accepted() {
        assert!(validate_base_url("http://localhost:3001").is_ok());
        assert!(validate_base_url("http://127.0.0.1:8788").is_ok());
        assert!(validate_base_url("http://[::1]:3000").is_ok());
        assert!(validate_base_url("https://preview.example.com").is_ok());
    }

    #[test]
    fn test_base_path_accepted() {
        let url = validate_base_url("http://localhost:3001/blog/").unwrap();
        assert_eq!(url.path(), "/blog/");
    }

    #[test]
    fn test_invalid_schemes() {
        assert!(matches!(
            validate_base_url("file:///etc/passwd"),
            Err(UrlError::UnsupportedScheme(_))
        ));
        assert!(validate_base_url("ftp://localhost").is_err());
    }

    #[test]
    fn test_unparseable_rejected() {
        assert!(matches!(
            validate_base_url("localhost:3001"),
            Err(UrlError::UnsupportedScheme(_)) | Err(UrlError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_base_url("not a url"),
            Err(UrlError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_query_and_fragment_rejected() {
        assert!(matches!(
            validate_base_url("http://localhost:3001?x=1"),
            Err(UrlError::QueryOrFragment)
        ));
        assert!(matches!(
            validate_base_url("http://localhost:3001#top"),
            Err(UrlError::QueryOrFragment)
        ));
    }

    #[test]
    fn test_join_keeps_base_path() {
        assert_eq!(
            join_feed_url("http://localhost:3001/blog", "/feed.xml"),
            "http://localhost:3001/blog/feed.xml"
        );
    }
}
