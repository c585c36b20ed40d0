//! Service-account authentication (OAuth 2.0 JWT bearer grant, RFC 7523).
//!
//! The service account signs an RS256 assertion naming the impersonated admin
//! as `sub`, exchanges it at `token_uri`, and caches the access token until
//! shortly before it expires.

use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::debug;

use dirsync_core::DirectoryError;

/// Read-only scopes needed to list users, groups and members.
pub const DIRECTORY_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/admin.directory.user.readonly",
    "https://www.googleapis.com/auth/admin.directory.group.readonly",
    "https://www.googleapis.com/auth/admin.directory.group.member.readonly",
];

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_owned()
}

/// Fields of a service-account key file that the grant needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"[REDACTED]")
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    /// Parse key-file JSON.
    pub fn from_json(bytes: &[u8]) -> Result<Self, DirectoryError> {
        serde_json::from_slice(bytes)
            .map_err(|e| DirectoryError::Credentials(format!("service account key: {e}")))
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    scope: String,
    aud: &'a str,
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
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Issues access tokens for one service account + impersonated subject.
pub struct TokenSource {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    subject: String,
    scopes: Vec<String>,
    agent: ureq::Agent,
    cached: Mutex<Option<CachedToken>>,
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSource")
            .field("key", &self.key)
            .field("subject", &self.subject)
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl TokenSource {
    pub fn new(
        key: ServiceAccountKey,
        subject: impl Into<String>,
        scopes: &[&str],
        agent: ureq::Agent,
    ) -> Result<Self, DirectoryError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| DirectoryError::Credentials(format!("private key: {e}")))?;
        Ok(Self {
            key,
            encoding_key,
            subject: subject.into(),
            scopes: scopes.iter().map(|s| (*s).to_owned()).collect(),
            agent,
            cached: Mutex::new(None),
        })
    }

    /// A valid access token, fetching a new one if none is cached or the
    /// cached one expires within a minute.
    pub fn access_token(&self) -> Result<String, DirectoryError> {
        let now = Utc::now();
        let mut cached = self
            .cached
            .lock()
            .map_err(|_| DirectoryError::Credentials("token cache poisoned".to_owned()))?;

        if let Some(token) = cached.as_ref() {
            if token.expires_at - ChronoDuration::seconds(EXPIRY_MARGIN_SECS) > now {
                return Ok(token.access_token.clone());
            }
        }

        let fresh = self.fetch(now)?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    /// Drop the cached token so the next call re-authenticates.
    pub fn invalidate(&self) {
        if let Ok(mut cached) = self.cached.lock() {
            *cached = None;
        }
    }

    /// Signed JWT assertion for the bearer grant.
    pub fn assertion(&self, now: DateTime<Utc>) -> Result<String, DirectoryError> {
        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            sub: &self.subject,
            scope: self.scopes.join(" "),
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();
        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| DirectoryError::Credentials(format!("sign assertion: {e}")))
    }

    fn fetch(&self, now: DateTime<Utc>) -> Result<CachedToken, DirectoryError> {
        debug!(subject = %self.subject, token_uri = %self.key.token_uri, "requesting access token");
        let assertion = self.assertion(now)?;
        let response = self
            .agent
            .post(&self.key.token_uri)
            .send_form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .map_err(|err| match err {
                ureq::Error::Status(status, response) => {
                    let body = response.into_string().unwrap_or_default();
                    DirectoryError::Unauthorized(format!("token exchange HTTP {status}: {body}"))
                }
                ureq::Error::Transport(t) => DirectoryError::Transport(t.to_string()),
            })?;
        let token: TokenResponse = response
            .into_json()
            .map_err(|e| DirectoryError::Decode(format!("token response: {e}")))?;

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: now
                + ChronoDuration::seconds(token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS)),
        })
    }
}
