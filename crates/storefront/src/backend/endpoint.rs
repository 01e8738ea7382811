//! Backend endpoint URL construction.
//!
//! Every backend call is `base URL + path + query`. The base may carry its own
//! path prefix (`https://api.example.com/v2`), so paths are appended as
//! segments instead of going through `Url::join`, which would drop the last
//! segment of a prefix without a trailing slash.

use url::Url;

use super::BackendError;

/// Build a backend URL.
///
/// `path` is split on `/` and each non-empty segment is percent-encoded and
/// appended to `base`. Query pairs are form-encoded; an empty `query` leaves
/// the URL without a `?`.
///
/// # Errors
///
/// Returns [`BackendError::InvalidUrl`] if `base` cannot carry a path
/// (e.g., `mailto:` URLs).
pub fn api_url(base: &Url, path: &str, query: &[(&str, String)]) -> Result<Url, BackendError> {
    let mut url = base.clone();

    url.path_segments_mut()
        .map_err(|()| BackendError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(path.split('/').filter(|segment| !segment.is_empty()));

    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }

    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn base(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_appends_path_to_bare_host() {
        let url = api_url(&base("https://api.example.com"), "/businesses", &[]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/businesses");
    }

    #[test]
    fn test_keeps_base_prefix_without_trailing_slash() {
        let url = api_url(&base("https://api.example.com/v2"), "orders/15", &[]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v2/orders/15");
    }

    #[test]
    fn test_keeps_base_prefix_with_trailing_slash() {
        let url = api_url(&base("https://api.example.com/v2/"), "/orders/", &[]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v2/orders");
    }

    #[test]
    fn test_query_is_form_encoded() {
        let url = api_url(
            &base("https://api.example.com"),
            "addresses/search",
            &[("query", "Rothschild Blvd 1 & Co".to_string())],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/addresses/search?query=Rothschild+Blvd+1+%26+Co"
        );
    }

    #[test]
    fn test_multiple_query_pairs_keep_order() {
        let url = api_url(
            &base("http://localhost:8080/api"),
            "delivery/quote",
            &[("business_id", "3".to_string()), ("address_id", "9".to_string())],
        )
        .unwrap();
        assert_eq!(url.query(), Some("business_id=3&address_id=9"));
    }

    #[test]
    fn test_segments_are_percent_encoded() {
        let url = api_url(&base("https://api.example.com"), "items/a b", &[]).unwrap();
        assert_eq!(url.path(), "/items/a%20b");
    }

    #[test]
    fn test_rejects_cannot_be_a_base() {
        let result = api_url(&base("mailto:ops@example.com"), "orders", &[]);
        assert!(matches!(result, Err(BackendError::InvalidUrl(_))));
    }
}
