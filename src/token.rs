use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use std::fmt::Write;
use uuid::Uuid;

/// Number of hex characters kept from the HMAC digest. Long enough to make
/// guessing infeasible, short enough to keep unsubscribe links tidy.
const TOKEN_LEN: usize = 32;

/// Derives and verifies per-subscriber unsubscribe tokens.
///
/// Tokens are `hex(HMAC-SHA256(secret, "{id}:{email}"))` truncated to 32
/// characters. Nothing is stored: the same inputs always yield the same
/// token, and rotating the secret invalidates every link ever issued.
#[derive(Clone)]
pub struct UnsubscribeKey(Secret<String>);

impl UnsubscribeKey {
    pub fn new(secret: Secret<String>) -> Self {
        Self(secret)
    }

    pub fn derive(&self, subscriber_id: Uuid, email: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.0.expose_secret().as_bytes())
            .expect("HMAC can take a key of any size");
        mac.update(format!("{subscriber_id}:{email}").as_bytes());

        let digest = mac.finalize().into_bytes();
        let mut token = String::with_capacity(digest.len() * 2);
        for byte in digest {
            // hex never fails to format
            let _ = write!(token, "{byte:02x}");
        }
        token.truncate(TOKEN_LEN);
        token
    }

    pub fn verify(&self, subscriber_id: Uuid, email: &str, token: &str) -> bool {
        self.derive(subscriber_id, email) == token
    }
}
