//! URL resolution so that one resource always maps to one cache key.

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

/// Resolve `input` against the application origin and normalize it.
///
/// Normalization requires an http(s) scheme, lowercases the host and drops
/// the fragment. The query string is kept as-is.
///
/// Absolute URLs are taken as-is; relative forms (`./app.js`, `/data/x.json`,
/// `//cdn.example/x.js`) are joined onto `origin` the way a browser resolves
/// them against the page.
pub fn resolve(origin: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let joined = origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    normalize(joined)
}

fn normalize(mut parsed: Url) -> Result<Url, UrlError> {
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        if lowered != host {
            parsed
                .set_host(Some(&lowered))
                .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
        }
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://exhibit.example/").unwrap()
    }

    #[test]
    fn test_resolve_lowercases_host_keeps_path_case() {
        let url = resolve(&origin(), "https://EXHIBIT.example/Assets/Logo.PNG").unwrap();
        assert_eq!(url.as_str(), "https://exhibit.example/Assets/Logo.PNG");
    }

    #[test]
    fn test_resolve_removes_fragment_keeps_query() {
        let url = resolve(&origin(), "https://fonts.googleapis.com/css2?family=Inter&display=swap#top").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.query(), Some("family=Inter&display=swap"));
    }

    #[test]
    fn test_resolve_trims_whitespace() {
        assert_eq!(resolve(&origin(), "  ./index.html  ").unwrap().as_str(), "https://exhibit.example/index.html");
    }

    #[test]
    fn test_resolve_manifest_forms() {
        assert_eq!(resolve(&origin(), "./").unwrap().as_str(), "https://exhibit.example/");
        assert_eq!(resolve(&origin(), "./index.html").unwrap().as_str(), "https://exhibit.example/index.html");
        assert_eq!(resolve(&origin(), "/data/songs.json").unwrap().as_str(), "https://exhibit.example/data/songs.json");
    }

    #[test]
    fn test_resolve_under_subpath_origin() {
        let origin = Url::parse("https://user.github.io/historia/").unwrap();
        assert_eq!(resolve(&origin, "./app.js").unwrap().as_str(), "https://user.github.io/historia/app.js");
    }

    #[test]
    fn test_resolve_absolute_and_scheme_relative() {
        assert_eq!(
            resolve(&origin(), "https://UNPKG.com/react.js#x").unwrap().as_str(),
            "https://unpkg.com/react.js"
        );
        assert_eq!(resolve(&origin(), "//cdn.example/x.js").unwrap().as_str(), "https://cdn.example/x.js");
    }

    #[test]
    fn test_resolve_rejects_other_schemes() {
        assert!(matches!(resolve(&origin(), "data:text/plain,hi"), Err(UrlError::UnsupportedScheme(_))));
        assert!(matches!(resolve(&origin(), "file:///etc/passwd"), Err(UrlError::UnsupportedScheme(_))));
        assert!(matches!(resolve(&origin(), ""), Err(UrlError::Empty)));
        assert!(matches!(resolve(&origin(), " "), Err(UrlError::Empty)));
    }
}
