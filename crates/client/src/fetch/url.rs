//! Origin-scoped URL resolution for request identities.

use url::Url;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Parse and check the configured origin.
///
/// Any path, query or fragment on the input is dropped.
pub fn parse_origin(input: &str) -> Result<Url, UrlError> {
    let mut origin = canonicalize(input)?;
    origin.set_path("/");
    origin.set_query(None);
    Ok(origin)
}

/// Canonicalize an absolute URL string.
///
/// 1. Trim leading/trailing whitespace
/// 2. Require an http(s) scheme
/// 3. Lowercase the host (done by the parser)
/// 4. Remove fragment (#...), which never takes part in request identity
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    check_scheme(&parsed)?;
    parsed.set_fragment(None);

    Ok(parsed)
}

/// Resolve a page-relative path or absolute URL against `origin`.
///
/// `/play.html` and `play.html` both resolve under the origin root; an
/// absolute URL is kept as-is (and may name a different origin).
pub fn resolve(origin: &Url, target: &str) -> Result<Url, UrlError> {
    let trimmed = target.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut resolved = origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    check_scheme(&resolved)?;
    resolved.set_fragment(None);

    Ok(resolved)
}

/// Same scheme, host and port.
pub fn is_same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

fn check_scheme(url: &Url) -> Result<(), UrlError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        parse_origin("https://site.test").unwrap()
    }

    #[test]
    fn test_parse_origin_strips_path() {
        let url = parse_origin("https://Site.Test/play.html?x=1#top").unwrap();
        assert_eq!(url.as_str(), "https://site.test/");
    }

    #[test]
    fn test_canonicalize_remove_fragment() {
        let url = canonicalize("https://site.test/play.html#game").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/play.html");
    }

    #[test]
    fn test_canonicalize_preserve_query() {
        let url = canonicalize("https://site.test/?b=2&a=1").unwrap();
        assert_eq!(url.query(), Some("b=2&a=1"));
    }

    #[test]
    fn test_canonicalize_unsupported_scheme() {
        let result = canonicalize("file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_canonicalize_whitespace_only() {
        assert!(matches!(canonicalize("   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_resolve_absolute_path() {
        let url = resolve(&origin(), "/game/index.wasm").unwrap();
        assert_eq!(url.as_str(), "https://site.test/game/index.wasm");
    }

    #[test]
    fn test_resolve_relative_path() {
        let url = resolve(&origin(), "game/index.html").unwrap();
        assert_eq!(url.as_str(), "https://site.test/game/index.html");
    }

    #[test]
    fn test_resolve_drops_fragment() {
        let url = resolve(&origin(), "/#features").unwrap();
        assert_eq!(url.as_str(), "https://site.test/");
    }

    #[test]
    fn test_resolve_keeps_foreign_absolute_url() {
        let url = resolve(&origin(), "https://cdn.other.test/font.woff2").unwrap();
        assert!(!is_same_origin(&url, &origin()));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&origin(), ""), Err(UrlError::Empty)));
    }

    #[test]
    fn test_same_origin_port_matters() {
        let a = canonicalize("http://localhost:8080/").unwrap();
        let b = canonicalize("http://localhost:9090/").unwrap();
        assert!(!is_same_origin(&a, &b));
        assert!(is_same_origin(&a, &canonicalize("http://LOCALHOST:8080/play.html").unwrap()));
    }
}
