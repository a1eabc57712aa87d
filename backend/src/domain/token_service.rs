//! Signed tokens: bearer access tokens for users and short-lived download
//! links for backups.
//!
//! Both are HS256 JWTs signed with the server's secret. The two claim sets are
//! disjoint, so a download link cannot be used as an access token and the
//! other way round.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::error::{BudgetError, BudgetResult};
use crate::domain::models::user::User;

pub const ACCESS_TOKEN_TTL_DAYS: i64 = 30;
pub const DOWNLOAD_LINK_TTL_SECONDS: i64 = 300;

const DOWNLOAD_AUDIENCE: &str = "backup-download";

/// Claims carried by a bearer access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// The user's email
    pub sub: String,
    pub user_id: i64,
    /// Display name for audit columns
    #[serde(default)]
    pub name: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct DownloadClaims {
    /// Backup file name
    sub: String,
    aud: String,
    exp: i64,
}

/// A signed download link for one backup file
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSignature {
    pub signature: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue_access_token(&self, user: &User) -> BudgetResult<String> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user.email.clone(),
            user_id: user.id,
            name: Some(user.display_name().to_string()),
            iat: now.timestamp(),
            exp: (now + Duration::days(ACCESS_TOKEN_TTL_DAYS)).timestamp(),
        };
        self.sign(&claims)
    }

    /// Check signature and expiry of a bearer token
    pub fn verify_access_token(&self, token: &str) -> BudgetResult<AccessClaims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Rejected access token: {}", e);
                BudgetError::unauthorized("Invalid authentication credentials")
            })
    }

    pub fn sign_download(&self, filename: &str) -> BudgetResult<DownloadSignature> {
        self.sign_download_until(filename, Utc::now() + Duration::seconds(DOWNLOAD_LINK_TTL_SECONDS))
    }

    pub fn sign_download_until(
        &self,
        filename: &str,
        expires_at: DateTime<Utc>,
    ) -> BudgetResult<DownloadSignature> {
        let claims = DownloadClaims {
            sub: filename.to_string(),
            aud: DOWNLOAD_AUDIENCE.to_string(),
            exp: expires_at.timestamp(),
        };
        Ok(DownloadSignature {
            signature: self.sign(&claims)?,
            expires_at,
        })
    }

    /// Check a download link for `filename`; `expires` is the timestamp from the URL
    pub fn verify_download(&self, filename: &str, expires: i64, signature: &str) -> BudgetResult<()> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[DOWNLOAD_AUDIENCE]);
        validation.leeway = 0;

        let claims = match decode::<DownloadClaims>(signature, &self.decoding_key, &validation) {
            Ok(data) => data.claims,
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
                return Err(BudgetError::forbidden("Download link has expired"));
            }
            Err(e) => {
                debug!("Rejected download signature: {}", e);
                return Err(BudgetError::forbidden("Invalid signature"));
            }
        };

        if claims.sub != filename || claims.exp != expires {
            return Err(BudgetError::forbidden("Invalid signature"));
        }
        Ok(())
    }

    fn sign<T: Serialize>(&self, claims: &T) -> BudgetResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| BudgetError::Storage(anyhow::anyhow!("Token signing failed: {}", e)))
    }
}
