use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const VERIFIER_LABEL: &[u8] = b"roomwarden-api-token";

/// Generates a cryptographically secure 40-character hex token
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 20] = rng.random();
    hex::encode(bytes)
}

/// Checks presented bearer tokens against the configured shared secret.
///
/// Both sides are reduced to an HMAC tag and compared with
/// `verify_slice`, which runs in constant time regardless of where the
/// first mismatching byte is or how long the presented token is.
#[derive(Clone)]
pub struct TokenVerifier {
    tag: Vec<u8>,
}

impl TokenVerifier {
    pub fn new(expected: &str) -> Self {
        Self {
            tag: tag_for(expected.as_bytes()),
        }
    }

    pub fn verify(&self, presented: &str) -> bool {
        let Ok(mut mac) = HmacSha256::new_from_slice(presented.as_bytes()) else {
            return false;
        };
        mac.update(VERIFIER_LABEL);
        mac.verify_slice(&self.tag).is_ok()
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenVerifier(..)")
    }
}

// An empty tag never verifies, so a key HMAC refused fails closed
fn tag_for(key: &[u8]) -> Vec<u8> {
    HmacSha256::new_from_slice(key)
        .map(|mut mac| {
            mac.update(VERIFIER_LABEL);
            mac.finalize().into_bytes().to_vec()
        })
        .unwrap_or_default()
}
