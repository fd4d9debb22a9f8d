//! Base64 helpers tolerant of the variants found in real share links
//! (standard or URL-safe alphabet, padded or not, wrapped lines).

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;

pub(crate) fn decode_lenient(input: &str) -> Option<Vec<u8>> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_end_matches('=');
    if cleaned.is_empty() {
        return None;
    }
    URL_SAFE_NO_PAD.decode(cleaned).ok()
}

pub(crate) fn decode_text(input: &str) -> Option<String> {
    String::from_utf8(decode_lenient(input)?).ok()
}

/// SIP002 userinfo form.
pub(crate) fn encode_url_safe(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// vmess payload form.
pub(crate) fn encode_standard(data: &[u8]) -> String {
    STANDARD.encode(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_all_alphabets() {
        assert_eq!(decode_text("dGVzdA==").as_deref(), Some("test"));
        assert_eq!(decode_text("dGVzdA").as_deref(), Some("test"));
        assert_eq!(decode_text("aGVsbG8gd29ybGQ=").as_deref(), Some("hello world"));
        // "??>" encodes to Pz8+ (standard) / Pz8- (url-safe)
        assert_eq!(decode_text("Pz8+").as_deref(), Some("??>"));
        assert_eq!(decode_text("Pz8-").as_deref(), Some("??>"));
        assert_eq!(decode_text("dGVz\ndA==").as_deref(), Some("test"));
    }

    #[test]
    fn rejects_non_base64() {
        assert!(decode_lenient("aes-256-gcm:pass").is_none());
        assert!(decode_lenient("hello").is_none());
        assert!(decode_lenient("").is_none());
    }

    #[test]
    fn url_safe_has_no_padding() {
        assert_eq!(encode_url_safe(b"test"), "dGVzdA");
        assert_eq!(encode_standard(b"test"), "dGVzdA==");
    }
}
