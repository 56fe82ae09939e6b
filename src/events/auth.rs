//! Stateless JWT authentication for event-stream subscribers. Grounded
//! on the teacher's `realtime_sync::auth::AuthManager`, narrowed to the
//! single claim the event stream actually needs: which task a bearer
//! is allowed to subscribe to.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventStreamClaims {
    pub sub: String,
    pub task_id: String,
    pub iat: u64,
    pub exp: u64,
}

pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_lifetime: Duration,
}

impl AuthManager {
    pub fn new(secret: &[u8], token_lifetime: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_lifetime,
        }
    }

    pub fn issue(&self, subject: &str, task_id: &str) -> Result<String> {
        let now = jsonwebtoken::get_current_timestamp();
        let claims = EventStreamClaims {
            sub: subject.to_string(),
            task_id: task_id.to_string(),
            iat: now,
            exp: now + self.token_lifetime.as_secs(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| Error::Internal(format!("jwt encode failed: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<EventStreamClaims> {
        decode::<EventStreamClaims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| Error::InvalidRequest(format!("invalid event stream token: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_and_round_trips_task_id() {
        let manager = AuthManager::new(b"test-secret", Duration::from_secs(300));
        let token = manager.issue("reviewer-1", "task-123").unwrap();
        let claims = manager.verify(&token).unwrap();
        assert_eq!(claims.task_id, "task-123");
        assert_eq!(claims.sub, "reviewer-1");
    }

    #[test]
    fn tampered_token_is_rejected() {
        let manager = AuthManager::new(b"test-secret", Duration::from_secs(300));
        let token = manager.issue("reviewer-1", "task-123").unwrap();
        let other = AuthManager::new(b"different-secret", Duration::from_secs(300));
        assert!(other.verify(&token).is_err());
    }
}
