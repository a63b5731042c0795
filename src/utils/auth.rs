//! Request authentication.

/// Attach the bearer credential used by OpenAI-compatible servers.
pub fn add_auth_headers(request: reqwest::RequestBuilder, api_key: &str) -> reqwest::RequestBuilder {
    request.header("Authorization", format!("Bearer {api_key}"))
}

/// Keys shorter than this are masked completely.
const MIN_LEN_FOR_TAIL: usize = 8;

/// Mask a key for display, keeping only its last four characters.
pub fn mask_api_key(api_key: &str) -> String {
    let chars: Vec<char> = api_key.trim().chars().collect();
    if chars.len() < MIN_LEN_FOR_TAIL {
        return "•".repeat(chars.len());
    }
    let hidden = chars.len() - 4;
    let tail: String = chars[hidden..].iter().collect();
    format!("{}{}", "•".repeat(hidden.min(8)), tail)
}
