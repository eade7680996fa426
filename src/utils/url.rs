//! URL encoding/decoding utilities

/// Encodes a string using URL encoding
///
/// # Examples
/// ```
/// use uri_decoder::utils::url::url_encode;
///
/// let encoded = url_encode("obfs-local;obfs=http");
/// assert_eq!(encoded, "obfs-local%3Bobfs%3Dhttp");
/// ```
pub fn url_encode(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

/// Decodes a URL-encoded string
///
/// Returns the original string if decoding fails.
///
/// # Examples
/// ```
/// use uri_decoder::utils::url::url_decode;
///
/// let decoded = url_decode("p%40ss%3Aword");
/// assert_eq!(decoded, "p@ss:word");
/// ```
pub fn url_decode(input: &str) -> String {
    urlencoding::decode(input)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| input.to_string())
}

/// Splits `link` into the part before `#` and the decoded fragment, if any.
pub fn split_fragment(link: &str) -> (&str, Option<String>) {
    match link.split_once('#') {
        Some((head, fragment)) => (head, Some(url_decode(fragment))),
        None => (link, None),
    }
}

/// Returns `true` for `http://` and `https://` links.
pub fn is_link(link: &str) -> bool {
    let lower = link.get(..8).unwrap_or(link).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_fragment() {
        assert_eq!(
            split_fragment("ss://abc#My%20Node"),
            ("ss://abc", Some("My Node".to_string()))
        );
        assert_eq!(split_fragment("ss://abc"), ("ss://abc", None));
    }

    #[test]
    fn test_is_link() {
        assert!(is_link("https://example.com/sub"));
        assert!(is_link("HTTP://example.com"));
        assert!(!is_link("ss://abc"));
        assert!(!is_link("http"));
    }
}
