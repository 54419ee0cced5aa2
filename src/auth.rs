use crate::config::ServiceAccountKey;
use crate::debug_println;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize, PartialEq)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Exchanges a signed service-account assertion for a bearer token and
/// keeps it until shortly before it expires.
pub struct Authenticator {
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    http: reqwest::blocking::Client,
    cached: RefCell<Option<CachedToken>>,
}

impl Authenticator {
    pub fn new(key: ServiceAccountKey, http: reqwest::blocking::Client) -> Result<Self> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .context("GOOGLE_SHEETS_PRIVATE_KEY is not a valid RSA private key")?;

        Ok(Self {
            key,
            signing_key,
            http,
            cached: RefCell::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    pub fn access_token(&self) -> Result<String> {
        let now = Utc::now();
        if let Some(token) = self.cached.borrow().as_ref() {
            if token_is_fresh(token, now) {
                return Ok(token.value.clone());
            }
        }

        debug_println!("Requesting access token for {}", self.key.client_email);
        let token = self.request_token(now)?;
        let value = token.value.clone();
        *self.cached.borrow_mut() = Some(token);
        Ok(value)
    }

    fn request_token(&self, now: DateTime<Utc>) -> Result<CachedToken> {
        let claims = build_claims(&self.key, now);
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        let assertion = jsonwebtoken::encode(&header, &claims, &self.signing_key)
            .context("Failed to sign token request")?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .context("Failed to reach token endpoint")?
            .error_for_status()
            .context("Token endpoint rejected the service account")?;

        let body: TokenResponse = response.json().context("Failed to parse token response")?;
        let lifetime = body.expires_in.unwrap_or(TOKEN_LIFETIME_SECS);

        Ok(CachedToken {
            value: body.access_token,
            expires_at: now + Duration::seconds(lifetime),
        })
    }
}

fn build_claims(key: &ServiceAccountKey, now: DateTime<Utc>) -> Claims {
    let iat = now.timestamp();
    Claims {
        iss: key.client_email.clone(),
        scope: SCOPES.join(" "),
        aud: key.token_uri.clone(),
        iat,
        exp: iat + TOKEN_LIFETIME_SECS,
    }
}

fn token_is_fresh(token: &CachedToken, now: DateTime<Utc>) -> bool {
    token.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn key(private_key: &str) -> ServiceAccountKey {
        ServiceAccountKey {
            key_type: "service_account".to_string(),
            project_id: None,
            private_key_id: Some("kid-1".to_string()),
            private_key: private_key.to_string(),
            client_email: "bot@car-search.iam.gserviceaccount.com".to_string(),
            client_id: None,
            auth_uri: None,
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            auth_provider_x509_cert_url: None,
            client_x509_cert_url: None,
        }
    }

    #[test]
    fn claims_cover_both_scopes_for_one_hour() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let claims = build_claims(&key("unused"), now);

        assert_eq!(claims.iss, "bot@car-search.iam.gserviceaccount.com");
        assert_eq!(claims.aud, "https://oauth2.googleapis.com/token");
        assert_eq!(
            claims.scope,
            "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive"
        );
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.iat, now.timestamp());
    }

    #[test]
    fn token_refreshes_inside_margin() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let token = |secs_left: i64| CachedToken {
            value: "t".to_string(),
            expires_at: now + Duration::seconds(secs_left),
        };

        assert!(token_is_fresh(&token(3600), now));
        assert!(token_is_fresh(&token(61), now));
        assert!(!token_is_fresh(&token(60), now));
        assert!(!token_is_fresh(&token(-5), now));
    }

    #[test]
    fn garbage_key_is_rejected_up_front() {
        let result = Authenticator::new(key("not a pem block"), reqwest::blocking::Client::new());
        assert!(result.is_err());
    }
}
