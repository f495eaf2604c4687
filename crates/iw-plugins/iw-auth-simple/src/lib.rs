//! # iw-auth-simple
//!
//! Stateless session-cookie implementation of `AuthProvider`. A token is
//! `base64url(id:username).hexsig` where the signature is HMAC-SHA256 over
//! the payload with a server secret. Verification is constant-time via the
//! `hmac` crate, and the named user must still exist in the store, so
//! tokens of deleted users die with them. Issuing credentials (login,
//! registration) is outside this system; the seed tool mints tokens for
//! demo users.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use iw_core::models::User;
use iw_core::traits::{AuthProvider, BlogRepo};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub struct SimpleAuthProvider {
    secret: Vec<u8>,
    repo: Arc<dyn BlogRepo>,
}

impl SimpleAuthProvider {
    /// Accepts the signing secret (e.g., from an environment variable) and
    /// the repo used to confirm the token's user still exists.
    pub fn new(secret: &str, repo: Arc<dyn BlogRepo>) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            repo,
        }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length
        HmacSha256::new_from_slice(&self.secret).expect("HMAC key")
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Checks the signature and parses the payload into (id, username).
    fn verify(&self, token: &str) -> Option<(Uuid, String)> {
        let (encoded, sig) = token.split_once('.')?;
        let payload = URL_SAFE_NO_PAD.decode(encoded).ok()?;
        let payload = String::from_utf8(payload).ok()?;

        let sig = hex::decode(sig).ok()?;
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&sig).ok()?;

        let (id, username) = payload.split_once(':')?;
        let id = Uuid::parse_str(id).ok()?;
        Some((id, username.to_string()))
    }
}

#[async_trait]
impl AuthProvider for SimpleAuthProvider {
    async fn actor_from_token(&self, token: &str) -> anyhow::Result<Option<User>> {
        let Some((id, username)) = self.verify(token) else {
            return Ok(None);
        };

        // The store is the source of truth: a signed token for a user that
        // no longer exists (or was renamed) resolves to anonymous.
        let user = self.repo.get_user_by_id(id).await?;
        Ok(user.filter(|u| u.username == username))
    }

    fn issue_token(&self, user: &User) -> String {
        let payload = format!("{}:{}", user.id, user.username);
        let encoded = URL_SAFE_NO_PAD.encode(payload.as_bytes());
        format!("{}.{}", encoded, self.sign(&payload))
    }

    fn login_path(&self) -> &str {
        "/auth/login/"
    }
}
