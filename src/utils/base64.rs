use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::Engine as _;

use crate::error::DecodeError;

/// Standard alphabet, canonical padding, tolerant of non-zero trailing bits.
/// Subscription providers frequently emit such data.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Encodes a string to Base64 format.
pub fn base64_encode(input: &str) -> String {
    STANDARD.encode(input)
}

/// Reverses a URL-safe Base64 string to standard Base64 format.
pub fn url_safe_base64_reverse(input: &str) -> String {
    input.replace('-', "+").replace('_', "/")
}

/// Converts a Base64 string to URL-safe Base64 format by replacing specific characters.
pub fn url_safe_base64_apply(input: &str) -> String {
    input.replace('+', "-").replace('/', "_").replace('=', "")
}

/// Encodes a string to URL-safe Base64 format without padding.
pub fn url_safe_base64_encode(input: &str) -> String {
    url_safe_base64_apply(&base64_encode(input))
}

/// Decodes standard or URL-safe Base64, with or without padding.
///
/// `-`/`_` are mapped back to `+`/`/` and the input is padded up to a
/// multiple of four. A length of `4k + 1` can never be valid Base64 and is
/// rejected.
pub fn url_safe_base64_decode(input: &str) -> Result<String, DecodeError> {
    let mut data = url_safe_base64_reverse(input);
    match data.len() % 4 {
        0 => {}
        2 => data.push_str("=="),
        3 => data.push('='),
        _ => return Err(DecodeError::Base64Length(data.len())),
    }
    let bytes = LENIENT.decode(data.as_bytes())?;
    Ok(String::from_utf8(bytes)?)
}

/// Decodes a whole document that may be wrapped in a Base64 envelope.
///
/// Line breaks and surrounding whitespace are removed first, since encoders
/// commonly wrap long output. Returns `None` if the content is not Base64 or
/// does not decode to UTF-8 text.
pub fn decode_envelope(content: &str) -> Option<String> {
    let compact: String = content
        .trim()
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .collect();
    if compact.is_empty() {
        return None;
    }
    url_safe_base64_decode(&compact).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_without_padding() {
        assert_eq!(url_safe_base64_decode("YWJjZA").unwrap(), "abcd");
        assert_eq!(url_safe_base64_decode("YWJjZGU").unwrap(), "abcde");
        assert_eq!(url_safe_base64_decode("YWJj").unwrap(), "abc");
    }

    #[test]
    fn test_decode_with_padding() {
        assert_eq!(url_safe_base64_decode("YWJjZA==").unwrap(), "abcd");
    }

    #[test]
    fn test_decode_url_safe_alphabet() {
        // "??>" encodes to "Pz8+" in the standard alphabet
        assert_eq!(url_safe_base64_decode("Pz8-").unwrap(), "??>");
        // "???" encodes to "Pz8/"
        assert_eq!(url_safe_base64_decode("Pz8_").unwrap(), "???");
    }

    #[test]
    fn test_decode_rejects_length_mod_4_equal_1() {
        let err = url_safe_base64_decode("YWJjZ").unwrap_err();
        assert!(matches!(err, DecodeError::Base64Length(5)));
        assert!(url_safe_base64_decode("A").is_err());
    }

    #[test]
    fn test_decode_rejects_invalid_characters() {
        assert!(url_safe_base64_decode("ss://abc").is_err());
    }

    #[test]
    fn test_encode_then_decode_url_safe() {
        let input = "chacha20-ietf-poly1305:p@ss/w+rd?";
        let encoded = url_safe_base64_encode(input);
        assert!(!encoded.contains('='));
        assert_eq!(url_safe_base64_decode(&encoded).unwrap(), input);
    }

    #[test]
    fn test_decode_envelope_with_line_breaks() {
        let list = "ss://a\nssr://b\n";
        let encoded = base64_encode(list);
        let (head, tail) = encoded.split_at(8);
        let wrapped = format!("{}\r\n{}\n", head, tail);
        assert_eq!(decode_envelope(&wrapped).unwrap(), list);
    }

    #[test]
    fn test_decode_envelope_plain_text() {
        assert!(decode_envelope("ss://YWVz@1.2.3.4:443").is_none());
        assert!(decode_envelope("   ").is_none());
    }
}
