//! Endpoint URL helpers.

/// Strip trailing slashes so endpoint paths can be appended safely.
///
/// ```
/// use multiplyr::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://10.0.0.5:8000/v1/"), "http://10.0.0.5:8000/v1");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path with exactly one slash.
///
/// ```
/// use multiplyr::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://10.0.0.5:8000/v1/", "/chat/completions"),
///     "http://10.0.0.5:8000/v1/chat/completions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{normalized_base}/{endpoint}")
}

/// Check that a user-supplied base URL is an absolute http(s) URL and
/// return its normalized form.
pub fn validate_base_url(base_url: &str) -> Result<String, String> {
    let normalized = normalize_base_url(base_url);
    let rest = normalized
        .strip_prefix("https://")
        .or_else(|| normalized.strip_prefix("http://"))
        .ok_or_else(|| format!("Base URL must start with http:// or https:// (got '{base_url}')"))?;
    if rest.is_empty() || rest.starts_with('/') {
        return Err(format!("Base URL is missing a host (got '{base_url}')"));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_any_number_of_trailing_slashes() {
        assert_eq!(normalize_base_url("https://llm.example/v1"), "https://llm.example/v1");
        assert_eq!(normalize_base_url("https://llm.example/v1///"), "https://llm.example/v1");
        assert_eq!(normalize_base_url("  https://llm.example/  "), "https://llm.example");
        assert_eq!(normalize_base_url("///"), "");
    }

    #[test]
    fn construct_never_doubles_slashes() {
        for base in ["http://host:20186/v1", "http://host:20186/v1/"] {
            for endpoint in ["chat/completions", "/chat/completions", "///chat/completions"] {
                assert_eq!(
                    construct_api_url(base, endpoint),
                    "http://host:20186/v1/chat/completions"
                );
            }
        }
    }

    #[test]
    fn validate_accepts_http_and_https() {
        assert_eq!(
            validate_base_url("http://38.99.105.121:20186/v1/").as_deref(),
            Ok("http://38.99.105.121:20186/v1")
        );
        assert!(validate_base_url("https://llm.example").is_ok());
    }

    #[test]
    fn validate_rejects_missing_scheme_or_host() {
        assert!(validate_base_url("llm.example/v1").is_err());
        assert!(validate_base_url("ftp://llm.example").is_err());
        assert!(validate_base_url("https://").is_err());
        assert!(validate_base_url("http:///v1").is_err());
    }
}
