//! Slack request signing (`v0`).
//!
//! The signed base string is `v0:<timestamp>:<raw body>`, HMAC-SHA256 keyed with
//! the app's signing secret, sent hex-encoded as `v0=<digest>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const TIMESTAMP_HEADER: &str = "X-Slack-Request-Timestamp";
pub const SIGNATURE_HEADER: &str = "X-Slack-Signature";
pub const SIGNATURE_VERSION: &str = "v0";
pub const DEFAULT_MAX_AGE_SECS: u64 = 300;

const DIGEST_HEX_LEN: usize = 64;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("signing secret is not configured")]
    MissingSecret,
    #[error("missing `{0}` header")]
    MissingHeader(&'static str),
    #[error("malformed request timestamp `{0}`")]
    MalformedTimestamp(String),
    #[error("request timestamp {timestamp} is outside the {max_age_secs}s replay window")]
    StaleTimestamp { timestamp: i64, max_age_secs: u64 },
    #[error("malformed request signature")]
    MalformedSignature,
    #[error("request signature mismatch")]
    SignatureMismatch,
}

impl VerificationError {
    /// True when the failure comes from our own setup rather than the request.
    pub fn is_configuration_fault(&self) -> bool {
        matches!(self, Self::MissingSecret)
    }
}

/// Accumulates the raw request body into a running HMAC and checks it against
/// the signature header once the body has been consumed.
pub struct SecretsVerifier {
    mac: HmacSha256,
    signature: String,
}

impl SecretsVerifier {
    pub fn new(
        secret: &str,
        timestamp: Option<&str>,
        signature: Option<&str>,
        now: i64,
        max_age_secs: u64,
    ) -> Result<Self, VerificationError> {
        if secret.is_empty() {
            return Err(VerificationError::MissingSecret);
        }

        let timestamp = timestamp
            .filter(|value| !value.is_empty())
            .ok_or(VerificationError::MissingHeader(TIMESTAMP_HEADER))?;
        let signature = signature
            .filter(|value| !value.is_empty())
            .ok_or(VerificationError::MissingHeader(SIGNATURE_HEADER))?;

        let sent_at = timestamp
            .parse::<i64>()
            .map_err(|_| VerificationError::MalformedTimestamp(timestamp.to_owned()))?;
        if now.abs_diff(sent_at) > max_age_secs {
            return Err(VerificationError::StaleTimestamp { timestamp: sent_at, max_age_secs });
        }

        Ok(Self { mac: signing_mac(secret, timestamp)?, signature: signature.to_owned() })
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.mac.update(bytes);
    }

    pub fn ensure(self) -> Result<(), VerificationError> {
        let digest_hex = self
            .signature
            .strip_prefix(SIGNATURE_VERSION)
            .and_then(|rest| rest.strip_prefix('='))
            .ok_or(VerificationError::MalformedSignature)?;
        let provided = decode_digest_hex(digest_hex).ok_or(VerificationError::MalformedSignature)?;

        self.mac.verify_slice(&provided).map_err(|_| VerificationError::SignatureMismatch)
    }
}

/// Signature header value Slack would send for `body` at `timestamp`.
pub fn compute_signature(
    secret: &str,
    timestamp: &str,
    body: &[u8],
) -> Result<String, VerificationError> {
    let mut mac = signing_mac(secret, timestamp)?;
    mac.update(body);
    Ok(format!("{SIGNATURE_VERSION}={}", encode_hex(mac.finalize().into_bytes().as_slice())))
}

fn signing_mac(secret: &str, timestamp: &str) -> Result<HmacSha256, VerificationError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| VerificationError::MissingSecret)?;
    mac.update(SIGNATURE_VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    Ok(mac)
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}

// Only the exact lowercase form Slack emits is accepted.
fn decode_digest_hex(value: &str) -> Option<Vec<u8>> {
    let bytes = value.as_bytes();
    if bytes.len() != DIGEST_HEX_LEN {
        return None;
    }

    bytes
        .chunks_exact(2)
        .map(|pair| Some((hex_nibble(pair[0])? << 4) | hex_nibble(pair[1])?))
        .collect()
}

fn hex_nibble(value: u8) -> Option<u8> {
    match value {
        b'0'..=b'9' => Some(value - b'0'),
        b'a'..=b'f' => Some(value - b'a' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    use super::{
        compute_signature, SecretsVerifier, VerificationError, DEFAULT_MAX_AGE_SECS,
        SIGNATURE_HEADER, TIMESTAMP_HEADER,
    };

    const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";
    const NOW: i64 = 1_531_420_618;
    const BODY: &[u8] =
        b"command=%2Frandomauthorquote&text=clarice&channel_id=C123&user_id=U456&trigger_id=1.2.3";

    fn reference_signature(secret: &str, timestamp: &str, body: &[u8]) -> String {
        let mut base = format!("v0:{timestamp}:").into_bytes();
        base.extend_from_slice(body);
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac key");
        mac.update(&base);
        let hex = mac
            .finalize()
            .into_bytes()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect::<String>();
        format!("v0={hex}")
    }

    fn verify(
        secret: &str,
        timestamp: &str,
        signature: &str,
        body: &[u8],
        now: i64,
    ) -> Result<(), VerificationError> {
        let mut verifier = SecretsVerifier::new(
            secret,
            Some(timestamp),
            Some(signature),
            now,
            DEFAULT_MAX_AGE_SECS,
        )?;
        verifier.update(body);
        verifier.ensure()
    }

    #[test]
    fn computed_signature_matches_reference_construction() {
        for (secret, timestamp, body) in [
            (SECRET, "1531420618", BODY),
            ("another-secret", "0", &b""[..]),
            ("s", "1700000000", &b"text=%C3%A9rico&command=%2Fq"[..]),
        ] {
            let computed = compute_signature(secret, timestamp, body).expect("signature");
            assert_eq!(computed, reference_signature(secret, timestamp, body));
            assert_eq!(computed.len(), "v0=".len() + 64);
        }
    }

    #[test]
    fn accepts_valid_signature() {
        let signature = compute_signature(SECRET, "1531420618", BODY).expect("signature");
        assert_eq!(verify(SECRET, "1531420618", &signature, BODY, NOW), Ok(()));
    }

    #[test]
    fn accepts_body_fed_in_chunks() {
        let signature = compute_signature(SECRET, "1531420618", BODY).expect("signature");
        let mut verifier = SecretsVerifier::new(
            SECRET,
            Some("1531420618"),
            Some(&signature),
            NOW,
            DEFAULT_MAX_AGE_SECS,
        )
        .expect("verifier");
        for chunk in BODY.chunks(7) {
            verifier.update(chunk);
        }
        assert_eq!(verifier.ensure(), Ok(()));
    }

    #[test]
    fn rejects_any_single_byte_mutation_of_the_body() {
        let signature = compute_signature(SECRET, "1531420618", BODY).expect("signature");
        for position in 0..BODY.len() {
            let mut tampered = BODY.to_vec();
            tampered[position] ^= 0x01;
            assert_eq!(
                verify(SECRET, "1531420618", &signature, &tampered, NOW),
                Err(VerificationError::SignatureMismatch),
                "mutation at byte {position} was accepted"
            );
        }
    }

    #[test]
    fn rejects_truncated_or_extended_body() {
        let signature = compute_signature(SECRET, "1531420618", BODY).expect("signature");
        assert_eq!(
            verify(SECRET, "1531420618", &signature, &BODY[..BODY.len() - 1], NOW),
            Err(VerificationError::SignatureMismatch)
        );
        let mut extended = BODY.to_vec();
        extended.push(b'&');
        assert_eq!(
            verify(SECRET, "1531420618", &signature, &extended, NOW),
            Err(VerificationError::SignatureMismatch)
        );
    }

    #[test]
    fn rejects_wrong_secret() {
        let signature = compute_signature("other-secret", "1531420618", BODY).expect("signature");
        assert_eq!(
            verify(SECRET, "1531420618", &signature, BODY, NOW),
            Err(VerificationError::SignatureMismatch)
        );
    }

    #[test]
    fn rejects_timestamps_outside_replay_window_even_when_signed() {
        let max_age = DEFAULT_MAX_AGE_SECS as i64;
        for offset in [max_age + 1, -(max_age + 1), 86_400, -86_400] {
            let timestamp = (NOW + offset).to_string();
            let signature = compute_signature(SECRET, &timestamp, BODY).expect("signature");
            assert!(
                matches!(
                    verify(SECRET, &timestamp, &signature, BODY, NOW),
                    Err(VerificationError::StaleTimestamp { .. })
                ),
                "timestamp offset {offset} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_timestamps_at_the_window_edge() {
        let max_age = DEFAULT_MAX_AGE_SECS as i64;
        for offset in [max_age, -max_age] {
            let timestamp = (NOW + offset).to_string();
            let signature = compute_signature(SECRET, &timestamp, BODY).expect("signature");
            assert_eq!(verify(SECRET, &timestamp, &signature, BODY, NOW), Ok(()));
        }
    }

    #[test]
    fn rejects_missing_or_malformed_headers() {
        assert_eq!(
            SecretsVerifier::new(SECRET, None, Some("v0=00"), NOW, DEFAULT_MAX_AGE_SECS).err(),
            Some(VerificationError::MissingHeader(TIMESTAMP_HEADER))
        );
        assert_eq!(
            SecretsVerifier::new(SECRET, Some("1531420618"), Some(""), NOW, DEFAULT_MAX_AGE_SECS)
                .err(),
            Some(VerificationError::MissingHeader(SIGNATURE_HEADER))
        );
        assert_eq!(
            SecretsVerifier::new(SECRET, Some("yesterday"), Some("v0=00"), NOW, DEFAULT_MAX_AGE_SECS)
                .err(),
            Some(VerificationError::MalformedTimestamp("yesterday".to_owned()))
        );
    }

    #[test]
    fn rejects_malformed_signatures() {
        let valid = compute_signature(SECRET, "1531420618", BODY).expect("signature");
        let digest = valid.trim_start_matches("v0=");
        for candidate in [
            digest.to_owned(),
            format!("v1={digest}"),
            format!("v0={}", &digest[..62]),
            format!("v0={}", digest.to_uppercase()),
            format!("v0={}zz", &digest[..62]),
        ] {
            assert_eq!(
                verify(SECRET, "1531420618", &candidate, BODY, NOW),
                Err(VerificationError::MalformedSignature),
                "candidate `{candidate}` should be malformed"
            );
        }
    }

    #[test]
    fn missing_secret_is_a_configuration_fault() {
        let error = SecretsVerifier::new("", Some("1531420618"), Some("v0=00"), NOW, 300)
            .err()
            .expect("empty secret must fail");
        assert_eq!(error, VerificationError::MissingSecret);
        assert!(error.is_configuration_fault());
        assert!(!VerificationError::SignatureMismatch.is_configuration_fault());
        assert!(!VerificationError::StaleTimestamp { timestamp: 0, max_age_secs: 300 }
            .is_configuration_fault());
    }
}
