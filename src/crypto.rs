use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Key material shared by signer and relay: `{form_id}.{timestamp}.{secret}`.
pub fn signing_key(form_id: &str, timestamp: i64, secret: &str) -> String {
    format!("{form_id}.{timestamp}.{secret}")
}

/// Lowercase hex HMAC-SHA256 of `body` under the per-request signing key.
pub fn sign(form_id: &str, timestamp: i64, secret: &str, body: &[u8]) -> String {
    let key = signing_key(form_id, timestamp, secret);
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .expect("HMAC-SHA256 accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Recompute the signature and compare it against `signature` in constant time.
pub fn verify(form_id: &str, timestamp: i64, secret: &str, body: &[u8], signature: &str) -> bool {
    let expected = sign(form_id, timestamp, secret, body);
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}
