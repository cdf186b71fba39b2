use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Length of a hex-encoded HMAC-SHA256 digest.
pub const SIGNATURE_HEX_LEN: usize = 64;

/// Generate HMAC-SHA256 signature
///
/// Format: lowercase hex of HMAC-SHA256(raw_body, secret). The MAC covers the
/// exact bytes on the wire, never a re-serialized form of the payload.
pub fn generate_signature(secret: &[u8], body: &[u8]) -> Result<String, anyhow::Error> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| anyhow::anyhow!("Invalid key length: {}", e))?;

    mac.update(body);
    let result = mac.finalize();

    Ok(hex::encode(result.into_bytes()))
}

/// Verify HMAC-SHA256 signature using constant-time comparison.
///
/// A missing signature or an unset secret never authenticates. Failure is a
/// normal outcome of the protocol, so this returns `false` rather than an error.
pub fn verify_signature(secret: &[u8], body: &[u8], signature: &str) -> bool {
    if signature.is_empty() || secret.is_empty() {
        return false;
    }

    let Ok(expected_signature) = generate_signature(secret, body) else {
        return false;
    };

    // Constant time comparison
    let expected_bytes = expected_signature.as_bytes();
    let signature_bytes = signature.as_bytes();

    if expected_bytes.len() != signature_bytes.len() {
        return false;
    }

    expected_bytes.ct_eq(signature_bytes).into()
}
