use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;
use crate::{config::JwtConfig, state::AppState};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    /// Bad signature, malformed token, or wrong issuer/audience.
    #[error("invalid token")]
    InvalidSignature,
}

/// Signing and verification keys for session tokens.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::new(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs(cfg.ttl_minutes.max(0) as u64 * 60),
        }
    }

    pub fn issue(&self, email: &str, user_id: Uuid) -> anyhow::Result<String> {
        self.issue_at(email, user_id, OffsetDateTime::now_utc())
    }

    pub fn issue_at(
        &self,
        email: &str,
        user_id: Uuid,
        issued_at: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let exp = issued_at + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: issued_at.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::InvalidSignature,
            }
        })?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TTL_MINUTES;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: DEFAULT_TTL_MINUTES,
        })
    }

    #[test]
    fn issue_and_verify() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let user_id = Uuid::new_v4();
        let token = keys.issue("a@x.com", user_id).expect("issue");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.exp - claims.iat, 3 * 24 * 60 * 60);
    }

    #[test]
    fn accepted_until_three_days_elapse() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let almost = OffsetDateTime::now_utc() - TimeDuration::days(3) + TimeDuration::minutes(1);
        let token = keys.issue_at("a@x.com", Uuid::new_v4(), almost).unwrap();
        assert!(keys.verify(&token).is_ok());
    }

    #[test]
    fn rejects_after_three_days() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let stale = OffsetDateTime::now_utc() - TimeDuration::days(3) - TimeDuration::seconds(5);
        let token = keys.issue_at("a@x.com", Uuid::new_v4(), stale).unwrap();
        assert_eq!(keys.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn rejects_foreign_signature() {
        let ours = make_keys("secret-a", "iss", "aud");
        let theirs = make_keys("secret-b", "iss", "aud");
        let token = theirs.issue("a@x.com", Uuid::new_v4()).unwrap();
        assert_eq!(ours.verify(&token).unwrap_err(), TokenError::InvalidSignature);
    }

    #[test]
    fn rejects_wrong_issuer_or_audience() {
        let good = make_keys("same-secret", "good-iss", "good-aud");
        let bad = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good.issue("a@x.com", Uuid::new_v4()).unwrap();
        assert_eq!(bad.verify(&token).unwrap_err(), TokenError::InvalidSignature);
    }

    #[test]
    fn rejects_garbage() {
        let keys = make_keys("dev-secret", "iss", "aud");
        assert_eq!(keys.verify("not.a.jwt").unwrap_err(), TokenError::InvalidSignature);
        assert_eq!(keys.verify("").unwrap_err(), TokenError::InvalidSignature);
    }
}
