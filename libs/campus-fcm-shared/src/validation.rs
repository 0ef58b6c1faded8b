/// Minimum plausible length for an FCM registration token.
const MIN_TOKEN_LEN: usize = 20;

/// Syntactic pre-filter for device tokens.
///
/// Accepts one or two segments of alphanumeric/`_`/`-` characters joined by
/// at most a single `:` (legacy registration ids sometimes embed a
/// colon-delimited sender prefix). This is not a provider-confirmed validity
/// check; it only keeps obviously-malformed values from consuming a network
/// round trip.
pub fn is_plausible_token(token: &str) -> bool {
    if token.len() < MIN_TOKEN_LEN {
        return false;
    }

    let mut segments = 0;
    for segment in token.split(':') {
        segments += 1;
        if segments > 2 || segment.is_empty() {
            return false;
        }
        if !segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return false;
        }
    }
    true
}

/// Drops structurally invalid tokens, preserving order.
pub fn filter_plausible<I>(tokens: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    tokens
        .into_iter()
        .filter(|t| is_plausible_token(t))
        .collect()
}
