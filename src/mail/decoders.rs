use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

/// Gmail emits URL-safe base64, sometimes without padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode URL-safe base64 into text, dropping byte sequences that are not
/// valid UTF-8. `None` when the input is not base64 at all.
pub fn decode_base64_text(data: &str) -> Option<String> {
    let bytes = URL_SAFE_LENIENT.decode(data.trim()).ok()?;
    Some(utf8_ignoring_invalid(&bytes))
}

fn utf8_ignoring_invalid(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

/// First `max_chars` characters of `s`, with "..." appended when cut.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_padded_and_unpadded() {
        assert_eq!(decode_base64_text("SGVsbG8=").as_deref(), Some("Hello"));
        assert_eq!(decode_base64_text("SGVsbG8").as_deref(), Some("Hello"));
    }

    #[test]
    fn uses_url_safe_alphabet() {
        // "??>" encodes to "Pz8-" in the URL-safe alphabet
        assert_eq!(decode_base64_text("Pz8-").as_deref(), Some("??>"));
    }

    #[test]
    fn invalid_utf8_is_dropped() {
        // 'H' 0xFF 'i'
        assert_eq!(decode_base64_text("SP9p").as_deref(), Some("Hi"));
    }

    #[test]
    fn non_base64_is_none() {
        assert_eq!(decode_base64_text("not base64!!"), None);
    }

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate_chars("olá mundo", 3), "olá...");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("exact", 5), "exact");
    }
}
