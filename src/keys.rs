use base64::STANDARD;

/// Decodes a VAPID public key from the URL-safe unpadded base64 the backend
/// serves into the raw bytes the platform key-agreement primitive expects.
///
/// The transform re-pads to a multiple of four, translates the URL-safe
/// alphabet to the standard one, then standard-decodes. Getting this exactly
/// right matters: a corrupted key produces an opaque subscribe failure at the
/// platform, not a decode error here.
pub fn url_base64_to_bytes(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let padding = (4 - input.len() % 4) % 4;
    let padded = format!("{}{}", input, "=".repeat(padding));
    let standard = padded.replace('-', "+").replace('_', "/");
    base64::decode_config(standard, STANDARD)
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use base64::URL_SAFE_NO_PAD;

    fn round_trip(bytes: &[u8]) {
        // Given
        let encoded = base64::encode_config(bytes, URL_SAFE_NO_PAD);

        // When
        let decoded = url_base64_to_bytes(&encoded).expect("decode");

        // Then
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn url_base64_to_bytes__should_round_trip_without_padding() {
        // 3 bytes encode to 4 chars, no padding needed
        round_trip(&[0x01, 0x02, 0x03]);
    }

    #[test]
    fn url_base64_to_bytes__should_round_trip_with_one_padding_char() {
        // 5 bytes leave a remainder needing "="
        round_trip(&[0xff, 0xfe, 0xfd, 0xfc, 0xfb]);
    }

    #[test]
    fn url_base64_to_bytes__should_round_trip_with_two_padding_chars() {
        // 4 bytes leave a remainder needing "=="
        round_trip(&[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn url_base64_to_bytes__should_translate_url_safe_alphabet() {
        // Given: bytes whose encoding exercises both '-' and '_'
        let bytes = [0xfb, 0xff, 0xbf];
        let encoded = base64::encode_config(bytes, URL_SAFE_NO_PAD);
        assert!(encoded.contains('-') || encoded.contains('_'));

        // Then
        assert_eq!(url_base64_to_bytes(&encoded).expect("decode"), bytes);
    }

    #[test]
    fn url_base64_to_bytes__should_reject_invalid_input() {
        assert!(url_base64_to_bytes("not base64 at all!").is_err());
    }
}
