use crate::{UrlError, UrlResult};
use std::collections::HashSet;
use url::Url;

/// Normalizes a URL into its cache key
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Lowercase the whole string
/// 3. Prefix `http://` when the string has no `http://` or `https://` scheme
///
/// An empty (or all-whitespace) input stays empty so that it keeps its own
/// entry in a batch and is reported as "url is empty" by the fetcher.
///
/// # Examples
///
/// ```
/// use page_sieve::url::normalize_url;
///
/// assert_eq!(normalize_url("  Example.COM/Page "), "http://example.com/page");
/// assert_eq!(normalize_url("https://example.com"), "https://example.com");
/// assert_eq!(normalize_url("   "), "");
/// ```
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim().to_lowercase();

    if trimmed.is_empty() || trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed
    } else {
        format!("http://{}", trimmed)
    }
}

/// Normalizes a batch of URLs and removes duplicates
///
/// The first occurrence of each normalized URL wins; relative order of the
/// survivors is preserved.
pub fn normalize_batch<I, S>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    urls.into_iter()
        .map(|u| normalize_url(u.as_ref()))
        .filter(|u| seen.insert(u.clone()))
        .collect()
}

/// Splits a comma-separated URL list into its entries
///
/// Entries are returned untouched apart from trimming; normalization happens
/// later. A blank list yields no entries, but a blank entry between commas is
/// kept so that it is reported back to the caller.
pub fn split_url_list(list: &str) -> Vec<String> {
    if list.trim().is_empty() {
        return Vec::new();
    }

    list.split(',').map(|u| u.trim().to_string()).collect()
}

/// Parses a normalized URL into a fetchable HTTP(S) target
pub fn parse_target(url: &str) -> UrlResult<Url> {
    if url.is_empty() {
        return Err(UrlError::Empty);
    }

    let parsed = Url::parse(url).map_err(|e| UrlError::Parse(e.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(UrlError::InvalidScheme(parsed.scheme().to_string()));
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(parsed)
}
