//! Scrubbing of Gemini error text before it leaves the provider

use crate::util::truncate_safe;

/// Longest upstream detail passed through unchanged
const MAX_DETAIL_BYTES: usize = 300;

/// Canonical Google API statuses (and loose phrasings of them) mapped to
/// replacement text that carries no credential or quota details.
const REDACTIONS: &[(&[&str], &str)] = &[
    (
        &[
            "unauthenticated",
            "permission_denied",
            "permission denied",
            "api key",
            "apikey",
            "unauthorized",
        ],
        "Gemini rejected the credentials. Check GEMINI_API_KEY.",
    ),
    (
        &["resource_exhausted", "quota", "rate limit"],
        "Gemini rate limit exceeded. Please try again later.",
    ),
    (
        &["internal", "unavailable", "deadline_exceeded", "server error"],
        "Gemini server error. Please try again later.",
    ),
];

/// Replace auth, quota and server failures with fixed text and cap the
/// length of anything else.
pub(crate) fn sanitize_api_error(detail: &str) -> String {
    let lower = detail.to_ascii_lowercase();
    if let Some((_, replacement)) = REDACTIONS
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
    {
        return (*replacement).to_string();
    }

    if detail.len() > MAX_DETAIL_BYTES {
        format!("{}...(truncated)", truncate_safe(detail, MAX_DETAIL_BYTES))
    } else {
        detail.to_string()
    }
}
